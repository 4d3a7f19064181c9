//! Share Executor
//!
//! Applies a confirmed share plan. Confirmation is a single yes/no for the
//! whole batch and happens before any share is touched. Updates delete the
//! existing share and recreate it; creation tries the principal candidates in
//! order and only moves on when the principal cannot be resolved (1332).

use tracing::{error, info, warn};

use crate::error::Result;
use crate::process_runner::{run_logged, ProcessOutput, ProcessRunner};
use crate::share_inspector::ShareInspector;
use crate::share_model::{Aktion, FreigabeAenderung, FreigabeErgebnis, SollFreigabe};
use crate::share_planner::plan_diff_text;
use crate::system_error::{decode_system_error, describe_code, SystemErrorCode};

/// Remark set on every managed share
pub const SHARE_REMARK: &str = "Automatisch verwaltet";

/// Outcome of a single grant attempt with one principal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantAttempt {
    /// Share was created
    Granted,
    /// Principal unknown on this host, next candidate may work
    PrincipalUnresolvable,
    /// Any other failure, further candidates are not tried
    Failed(Option<SystemErrorCode>),
}

impl GrantAttempt {
    pub fn classify(output: &ProcessOutput) -> Self {
        if output.success() {
            return GrantAttempt::Granted;
        }
        match decode_system_error(&output.stdout, &output.stderr) {
            Some(SystemErrorCode::PrincipalUnresolvable) => GrantAttempt::PrincipalUnresolvable,
            code => GrantAttempt::Failed(code),
        }
    }
}

/// Convert a path to backslash form for `net share`
pub fn to_windows_path(path: &str) -> String {
    path.replace('/', "\\")
}

/// Command creating a share with one grant
pub fn share_create_command(soll: &SollFreigabe, principal: &str) -> Vec<String> {
    vec![
        "net".to_string(),
        "share".to_string(),
        format!("{}={}", soll.name, to_windows_path(&soll.ordner)),
        format!("/GRANT:{},{}", principal, soll.rechte),
        format!("/REMARK:{}", SHARE_REMARK),
    ]
}

/// Command deleting a share
pub fn share_delete_command(share_name: &str) -> Vec<String> {
    vec![
        "net".to_string(),
        "share".to_string(),
        share_name.to_string(),
        "/DELETE".to_string(),
        "/Y".to_string(),
    ]
}

/// Whether a command line would change the share table
pub fn is_mutating_command(command: &[String]) -> bool {
    command.len() >= 3
        && command[0].eq_ignore_ascii_case("net")
        && command[1].eq_ignore_ascii_case("share")
        && (command[2].contains('=')
            || command
                .iter()
                .any(|arg| arg.eq_ignore_ascii_case("/DELETE")))
}

fn with_process(mut result: FreigabeErgebnis, output: &ProcessOutput) -> FreigabeErgebnis {
    result.returncode = Some(output.returncode);
    result.stdout = output.stdout.clone();
    result.stderr = output.stderr.clone();
    result
}

/// Applies share plans against the OS
pub struct ShareExecutor<R: ProcessRunner> {
    runner: R,
}

impl<R: ProcessRunner> ShareExecutor<R> {
    pub fn new(runner: R) -> Self {
        ShareExecutor { runner }
    }

    /// Apply `plan` after asking `confirm` once with the combined diff.
    ///
    /// `confirm` is not consulted when every entry is `noop`. A rejection
    /// yields one `abgebrochen` result per entry and no command at all.
    pub fn execute<F>(
        &self,
        plan: &[FreigabeAenderung],
        principal_candidates: &[String],
        confirm: F,
    ) -> Result<Vec<FreigabeErgebnis>>
    where
        F: FnOnce(&str) -> bool,
    {
        let has_changes = plan.iter().any(|e| e.aktion.is_mutating());
        if has_changes {
            let confirmed = confirm(&plan_diff_text(plan));
            info!("Bestätigung für Share-Anpassungen: {}", confirmed);
            if !confirmed {
                let results: Vec<FreigabeErgebnis> = plan
                    .iter()
                    .map(|e| {
                        let mut result = FreigabeErgebnis::for_change(
                            e,
                            false,
                            format!("Änderung durch Benutzer abgebrochen ({}).", e.soll.name),
                            Aktion::Abgebrochen,
                        );
                        result.nachher = Some(e.ist.clone());
                        result
                    })
                    .collect();
                return Ok(results);
            }
        }

        let mut results = Vec::with_capacity(plan.len());
        for aenderung in plan {
            results.push(self.apply_change(aenderung, principal_candidates)?);
        }
        Ok(results)
    }

    /// Apply a single planned change without asking for confirmation
    pub fn apply_change(
        &self,
        aenderung: &FreigabeAenderung,
        principal_candidates: &[String],
    ) -> Result<FreigabeErgebnis> {
        let soll = &aenderung.soll;

        match aenderung.aktion {
            Aktion::Noop => {
                let meldung = format!("Keine Änderung erforderlich: {}", soll.name);
                info!("{}", meldung);
                let mut result =
                    FreigabeErgebnis::for_change(aenderung, true, meldung, Aktion::Noop);
                result.nachher = Some(aenderung.ist.clone());
                return Ok(result);
            }
            Aktion::Abgebrochen => {
                return Ok(FreigabeErgebnis::for_change(
                    aenderung,
                    false,
                    format!("Änderung durch Benutzer abgebrochen ({}).", soll.name),
                    Aktion::Abgebrochen,
                ));
            }
            Aktion::Create | Aktion::Update => {}
        }

        if aenderung.aktion == Aktion::Update && aenderung.ist.existiert {
            let output = run_logged(
                &self.runner,
                &format!("Freigabe löschen {}", soll.name),
                &share_delete_command(&soll.name),
            )?;
            if !output.success() {
                let meldung = format!(
                    "Vorhandene Freigabe konnte nicht gelöscht werden ({}, Systemfehler: {}).",
                    soll.name,
                    describe_code(decode_system_error(&output.stdout, &output.stderr))
                );
                error!("{}", meldung);
                let result =
                    FreigabeErgebnis::for_change(aenderung, false, meldung, aenderung.aktion);
                return Ok(with_process(result, &output));
            }
        }

        self.grant_with_fallback(aenderung, principal_candidates)
    }

    fn grant_with_fallback(
        &self,
        aenderung: &FreigabeAenderung,
        principal_candidates: &[String],
    ) -> Result<FreigabeErgebnis> {
        let soll = &aenderung.soll;
        let mut last_attempt: Option<(&str, ProcessOutput)> = None;
        let mut last_message = String::new();

        for principal in principal_candidates {
            let output = run_logged(
                &self.runner,
                &format!("Freigabe {} {}", aenderung.aktion, soll.name),
                &share_create_command(soll, principal),
            )?;

            match GrantAttempt::classify(&output) {
                GrantAttempt::Granted => {
                    let nachher = match ShareInspector::new(&self.runner).inspect(&soll.name) {
                        Ok(state) => Some(state),
                        Err(e) => {
                            warn!("Zustand von {} nach Änderung nicht lesbar: {}", soll.name, e);
                            None
                        }
                    };
                    let meldung = format!(
                        "Freigabe {} erfolgreich: {} -> {} mit Recht {}",
                        aenderung.aktion,
                        soll.name,
                        principal,
                        soll.rechte
                    );
                    info!("{}", meldung);
                    let mut result =
                        FreigabeErgebnis::for_change(aenderung, true, meldung, aenderung.aktion);
                    result.principal = principal.clone();
                    result.nachher = nachher;
                    return Ok(with_process(result, &output));
                }
                GrantAttempt::PrincipalUnresolvable => {
                    last_message = failure_message(
                        soll,
                        principal,
                        Some(SystemErrorCode::PrincipalUnresolvable),
                    );
                    warn!("{} Fallback wird versucht.", last_message);
                    last_attempt = Some((principal.as_str(), output));
                }
                GrantAttempt::Failed(code) => {
                    last_message = failure_message(soll, principal, code);
                    last_attempt = Some((principal.as_str(), output));
                    break;
                }
            }
        }

        let meldung = if last_message.is_empty() {
            format!(
                "Freigabe {} konnte nicht angepasst werden (keine Principal-Kandidaten).",
                soll.name
            )
        } else {
            last_message
        };
        error!("{}", meldung);

        let mut result = FreigabeErgebnis::for_change(aenderung, false, meldung, aenderung.aktion);
        if let Some((principal, output)) = last_attempt {
            result.principal = principal.to_string();
            result = with_process(result, &output);
        }
        Ok(result)
    }
}

fn failure_message(soll: &SollFreigabe, principal: &str, code: Option<SystemErrorCode>) -> String {
    format!(
        "Freigabe {} mit Principal '{}' fehlgeschlagen (Systemfehler: {}).",
        soll.name,
        principal,
        describe_code(code)
    )
}
