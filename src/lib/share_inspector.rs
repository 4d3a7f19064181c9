//! Share Inspector
//!
//! Reads the Ist state of a named share via `net share <name>`. The output is
//! labeled free text whose labels depend on the system language:
//!
//! ```text
//! Freigabename      SystemAG$
//! Pfad              C:\SystemAG
//! Beschreibung      Automatisch verwaltet
//! Berechtigung      Jeder, ÄNDERN
//!                   VORDEFINIERT\Administratoren, VOLLZUGRIFF
//! Der Befehl wurde erfolgreich ausgeführt.
//! ```
//!
//! Permission entries after the first are printed as indented continuation
//! lines without a label.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::Result;
use crate::process_runner::{run_logged, ProcessRunner};
use crate::share_model::{FreigabeIstZustand, Recht};
use crate::system_error::{decode_system_error, SystemErrorCode};

static PATH_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:ressource|path|pfad)\s+(.+)$").expect("valid path line regex")
});

static PERMISSION_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:berechtigungen|berechtigung|permissions|permission)\s+(.+)$")
        .expect("valid permission line regex")
});

/// Command querying a single share
pub fn share_query_command(share_name: &str) -> Vec<String> {
    vec!["net".to_string(), "share".to_string(), share_name.to_string()]
}

/// Split a `principal, right` entry
pub fn parse_permission_entry(entry: &str) -> Option<(String, Recht)> {
    let (principal, right) = entry.rsplit_once(',')?;
    let principal = principal.trim();
    if principal.is_empty() {
        return None;
    }
    match Recht::parse(right) {
        Some(recht) => Some((principal.to_string(), recht)),
        None => {
            debug!("Ignoring unknown share right '{}' for {}", right.trim(), principal);
            None
        }
    }
}

/// Parsed fields of a successful `net share <name>` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareDetails {
    pub path: Option<String>,
    pub grants: BTreeMap<String, BTreeSet<Recht>>,
}

/// Parse the labeled output of `net share <name>`.
///
/// Tolerates missing fields, zero or many permission lines and several rights
/// for the same principal.
pub fn parse_share_output(stdout: &str) -> ShareDetails {
    let mut details = ShareDetails::default();
    let mut in_permissions = false;

    for raw_line in stdout.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            in_permissions = false;
            continue;
        }

        if let Some(caps) = PATH_LINE_RE.captures(line) {
            details.path = Some(caps[1].trim().to_string());
            in_permissions = false;
            continue;
        }

        if let Some(caps) = PERMISSION_LINE_RE.captures(line) {
            in_permissions = true;
            add_grant(&mut details, &caps[1]);
            continue;
        }

        let is_continuation = raw_line.starts_with(char::is_whitespace);
        if in_permissions && is_continuation {
            add_grant(&mut details, line);
        } else {
            in_permissions = false;
        }
    }

    details
}

fn add_grant(details: &mut ShareDetails, entry: &str) {
    if let Some((principal, recht)) = parse_permission_entry(entry) {
        details.grants.entry(principal).or_default().insert(recht);
    }
}

/// Queries the OS for the Ist state of shares
pub struct ShareInspector<R: ProcessRunner> {
    runner: R,
}

impl<R: ProcessRunner> ShareInspector<R> {
    pub fn new(runner: R) -> Self {
        ShareInspector { runner }
    }

    /// Inspect one share.
    ///
    /// Only a launch failure of `net` is returned as `Err`; every other
    /// outcome is encoded in the returned state.
    pub fn inspect(&self, share_name: &str) -> Result<FreigabeIstZustand> {
        let output = run_logged(
            &self.runner,
            &format!("Freigabe-Prüfung {}", share_name),
            &share_query_command(share_name),
        )?;

        if !output.success() {
            return Ok(
                match decode_system_error(&output.stdout, &output.stderr) {
                    Some(SystemErrorCode::ShareNotFound) => {
                        debug!("Share {} does not exist", share_name);
                        FreigabeIstZustand::missing(output.stdout, output.stderr)
                    }
                    code => {
                        warn!(
                            "State of share {} unknown (rc={}, code={:?})",
                            share_name, output.returncode, code
                        );
                        FreigabeIstZustand::unknown(output.stdout, output.stderr)
                    }
                },
            );
        }

        let details = parse_share_output(&output.stdout);
        Ok(FreigabeIstZustand {
            existiert: true,
            zustand_bekannt: true,
            pfad: details.path,
            rechte: details.grants,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
