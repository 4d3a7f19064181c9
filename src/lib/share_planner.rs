//! Share Planner
//!
//! Compares the desired share table against the Ist state and decides per
//! share whether nothing, a creation or a delete-and-recreate is needed.
//! [`plan_change`] is a pure function; [`SharePlanner`] adds exactly one
//! inspection query per share in front of it.

use tracing::{debug, info};

use crate::error::Result;
use crate::principals::normalize_principal;
use crate::process_runner::ProcessRunner;
use crate::share_inspector::ShareInspector;
use crate::share_model::{Aktion, FreigabeAenderung, FreigabeIstZustand, Recht, SollFreigabe};

/// Static definition of one managed share relative to the base folder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareDefinition {
    pub name: &'static str,
    /// Folder below the base path, empty for the base itself
    pub relative_folder: &'static str,
    pub rechte: Recht,
}

/// Managed shares; the top-level share comes first
pub const STANDARD_SHARES: [ShareDefinition; 3] = [
    ShareDefinition {
        name: "SystemAG$",
        relative_folder: "",
        rechte: Recht::Change,
    },
    ShareDefinition {
        name: "AddinsOL$",
        relative_folder: "AddinsOL",
        rechte: Recht::Change,
    },
    ShareDefinition {
        name: "LiveupdateOL$",
        relative_folder: "LiveupdateOL",
        rechte: Recht::Change,
    },
];

/// Label used for the granted principal in diffs, independent of locale
pub const TARGET_PRINCIPAL_LABEL: &str = "Everyone/Jeder";

impl ShareDefinition {
    /// Backing folder of this share below `base`
    pub fn folder_under(&self, base: &str) -> String {
        join_share_path(base, self.relative_folder)
    }

    pub fn soll(&self, base: &str) -> SollFreigabe {
        SollFreigabe::new(self.name, self.folder_under(base), self.rechte)
    }
}

/// Desired shares for a base path, in declaration order
pub fn desired_shares(base: &str) -> Vec<SollFreigabe> {
    STANDARD_SHARES.iter().map(|d| d.soll(base)).collect()
}

/// Join a child folder onto a base path using the base's separator style
pub fn join_share_path(base: &str, child: &str) -> String {
    let trimmed = base.trim_end_matches(['/', '\\']);
    let separator = if base.contains('/') && !base.contains('\\') {
        '/'
    } else {
        '\\'
    };
    if child.is_empty() {
        // `C:` alone is drive-relative, the root needs its separator
        if is_drive_letter(trimmed) {
            return format!("{}{}", trimmed, separator);
        }
        return trimmed.to_string();
    }
    format!("{}{}{}", trimmed, separator, child)
}

fn is_drive_letter(path: &str) -> bool {
    let mut chars = path.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(letter), Some(':'), None) if letter.is_ascii_alphabetic()
    )
}

/// Normalize a Windows path for comparison (separators, trailing chars, case)
pub fn normalize_path(path: &str) -> String {
    path.replace('/', "\\")
        .trim_end_matches(['\\', ' '])
        .to_lowercase()
}

/// Whether any accepted principal variant already holds at least `required`
pub fn has_required_rights(
    ist: &FreigabeIstZustand,
    principal_candidates: &[String],
    required: Recht,
) -> bool {
    let accepted: Vec<String> = principal_candidates
        .iter()
        .map(|p| normalize_principal(p))
        .collect();

    ist.rechte.iter().any(|(principal, rights)| {
        accepted.contains(&normalize_principal(principal))
            && rights.iter().any(|r| r.satisfies(required))
    })
}

/// The alternate folder the observed path points to, if any
pub fn matched_alternate<'a>(
    ist: &FreigabeIstZustand,
    alternates: &'a [String],
) -> Option<&'a str> {
    let observed = normalize_path(ist.pfad.as_deref().filter(|p| !p.is_empty())?);
    alternates
        .iter()
        .find(|candidate| normalize_path(candidate) == observed)
        .map(|c| c.as_str())
}

/// Render the human-readable diff shown before applying a plan
pub fn format_diff(
    soll: &SollFreigabe,
    ist: &FreigabeIstZustand,
    aktion: Aktion,
    begruendung: &str,
) -> String {
    let rights_ist = if ist.rechte.is_empty() {
        "(keine)".to_string()
    } else {
        ist.rechte
            .iter()
            .map(|(principal, rights)| {
                let levels: Vec<&str> = rights.iter().map(|r| r.as_str()).collect();
                format!("{}:{}", principal, levels.join("/"))
            })
            .collect::<Vec<_>>()
            .join(", ")
    };
    let path_ist = ist
        .pfad
        .as_deref()
        .filter(|p| !p.is_empty())
        .unwrap_or("(nicht gesetzt)");

    format!(
        "[{}] {}\n  Begründung : {}\n  Pfad       : {}  ->  {}\n  Rechte     : {}  ->  {}:{}\n",
        aktion.as_str().to_uppercase(),
        soll.name,
        begruendung,
        path_ist,
        soll.ordner,
        rights_ist,
        TARGET_PRINCIPAL_LABEL,
        soll.rechte
    )
}

/// Decide the action for one share. Pure: same inputs, same plan entry.
pub fn plan_change(
    soll: &SollFreigabe,
    ist: FreigabeIstZustand,
    principal_candidates: &[String],
    alternate_folders: &[String],
) -> FreigabeAenderung {
    let (aktion, begruendung) = if !ist.existiert {
        let reason = if ist.zustand_bekannt {
            "Freigabe fehlt".to_string()
        } else {
            "Freigabe fehlt (Zustand nicht ermittelbar)".to_string()
        };
        (Aktion::Create, reason)
    } else {
        let path_ok = ist
            .pfad
            .as_deref()
            .is_some_and(|p| normalize_path(p) == normalize_path(&soll.ordner));
        let rights_ok = has_required_rights(&ist, principal_candidates, soll.rechte);

        if path_ok && rights_ok {
            (Aktion::Noop, "Freigabe bereits konform".to_string())
        } else {
            let mut reasons = Vec::new();
            if !path_ok {
                match matched_alternate(&ist, alternate_folders) {
                    Some(candidate) => reasons.push(format!(
                        "Share-Pfad weicht ab (gefunden unter Kandidat: {})",
                        candidate
                    )),
                    None => reasons.push("Share-Pfad weicht ab".to_string()),
                }
            }
            if !rights_ok {
                reasons.push("erforderliche Rechte fehlen".to_string());
            }
            (Aktion::Update, reasons.join(" und "))
        }
    };

    let diff_text = format_diff(soll, &ist, aktion, &begruendung);
    FreigabeAenderung {
        soll: soll.clone(),
        ist,
        aktion,
        begruendung,
        diff_text,
    }
}

/// Combined diff of all entries that would change something
pub fn plan_diff_text(plan: &[FreigabeAenderung]) -> String {
    let changes: Vec<&str> = plan
        .iter()
        .filter(|e| e.aktion.is_mutating())
        .map(|e| e.diff_text.as_str())
        .collect();
    if changes.is_empty() {
        "Keine Share-Änderungen notwendig.".to_string()
    } else {
        changes.join("\n")
    }
}

/// Plans share changes by inspecting each managed share once
pub struct SharePlanner<R: ProcessRunner> {
    inspector: ShareInspector<R>,
}

impl<R: ProcessRunner> SharePlanner<R> {
    pub fn new(runner: R) -> Self {
        SharePlanner {
            inspector: ShareInspector::new(runner),
        }
    }

    /// One plan entry per managed share, in declaration order.
    ///
    /// `alternate_bases` are other base folders where an existing structure
    /// may live; they only change the justification text.
    pub fn plan(
        &self,
        base_path: &str,
        principal_candidates: &[String],
        alternate_bases: &[String],
    ) -> Result<Vec<FreigabeAenderung>> {
        let mut plan = Vec::with_capacity(STANDARD_SHARES.len());

        for definition in STANDARD_SHARES.iter() {
            let soll = definition.soll(base_path);
            let ist = self.inspector.inspect(&soll.name)?;

            let mut alternates: Vec<String> = Vec::new();
            for base in alternate_bases {
                let folder = definition.folder_under(base);
                if !alternates.contains(&folder) {
                    alternates.push(folder);
                }
                if !alternates.contains(base) {
                    alternates.push(base.clone());
                }
            }

            let entry = plan_change(&soll, ist, principal_candidates, &alternates);
            debug!("Plan {} -> {} ({})", soll.name, entry.aktion, entry.begruendung);
            plan.push(entry);
        }

        let changes = plan.iter().filter(|e| e.aktion.is_mutating()).count();
        info!(
            "Freigabe-Plan erstellt: {} von {} Freigaben mit Änderungsbedarf",
            changes,
            plan.len()
        );
        Ok(plan)
    }
}
