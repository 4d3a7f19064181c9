//! Run Protocol - JSON audit record per reconciliation run
//!
//! Each run writes one document to `<app_folder>/folder_runs/` containing:
//! - lauf_id: run identifier (`lauf-YYYYMMDD-HHMMSS-<8 hex>`)
//! - zeitstempel: RFC 3339 timestamp of the run
//! - basis_pfad: base folder of the SystemAG structure
//! - plan: every planned change, observed rights as ordered lists
//! - ergebnisse: every execution result
//! - abschluss: derived completion flags
//! - abschlussmeldungen: the flags as German status lines

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::share_model::{Aktion, FreigabeAenderung, FreigabeErgebnis};

/// Default application folder name
const DEFAULT_APP_FOLDER_NAME: &str = ".sage-helper";
/// Sub folder holding the protocol files
const PROTOCOL_FOLDER_NAME: &str = "folder_runs";

/// Generate a run id from the local time and a short random suffix
pub fn generate_run_id() -> String {
    let timestamp = Local::now().format("%Y%m%d-%H%M%S");
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
    format!("lauf-{}-{}", timestamp, suffix)
}

/// Derived completion flags of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionFlags {
    /// Folder structure was complete before the run
    pub ordner_bereits_vorhanden: bool,
    /// Number of folders created by the run
    pub ordner_ergaenzt: usize,
    /// At least one share was created or updated successfully
    pub freigaben_geaendert: bool,
    /// Every share was already compliant
    pub keine_aktion_noetig: bool,
}

impl CompletionFlags {
    pub fn derive(created_folders: usize, results: &[FreigabeErgebnis]) -> Self {
        CompletionFlags {
            ordner_bereits_vorhanden: created_folders == 0,
            ordner_ergaenzt: created_folders,
            freigaben_geaendert: results
                .iter()
                .any(|r| r.erfolg && matches!(r.aktion, Aktion::Create | Aktion::Update)),
            keine_aktion_noetig: !results.is_empty()
                && results.iter().all(|r| r.aktion == Aktion::Noop),
        }
    }

    /// Status lines shown at the end of a run
    pub fn messages(&self) -> Vec<String> {
        let folders = if self.ordner_bereits_vorhanden {
            "Ordner vorhanden: ja (Struktur war bereits vollständig).".to_string()
        } else {
            format!(
                "Ordner vorhanden: ja (fehlende Ordner ergänzt: {}).",
                self.ordner_ergaenzt
            )
        };
        let shares = if self.freigaben_geaendert {
            "Freigaben ergänzt: ja."
        } else {
            "Freigaben ergänzt: nein."
        };
        let noop = if self.keine_aktion_noetig {
            "Keine Aktion nötig: ja."
        } else {
            "Keine Aktion nötig: nein."
        };
        vec![folders, shares.to_string(), noop.to_string()]
    }
}

/// Audit record of one reconciliation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunProtocol {
    pub lauf_id: String,
    pub zeitstempel: String,
    pub basis_pfad: String,
    pub plan: Vec<FreigabeAenderung>,
    pub ergebnisse: Vec<FreigabeErgebnis>,
    pub abschluss: CompletionFlags,
    pub abschlussmeldungen: Vec<String>,
}

impl RunProtocol {
    /// Build a protocol stamped with the current time
    pub fn new(
        lauf_id: impl Into<String>,
        basis_pfad: impl Into<String>,
        plan: Vec<FreigabeAenderung>,
        ergebnisse: Vec<FreigabeErgebnis>,
        created_folders: usize,
    ) -> Self {
        let abschluss = CompletionFlags::derive(created_folders, &ergebnisse);
        RunProtocol {
            lauf_id: lauf_id.into(),
            zeitstempel: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            basis_pfad: basis_pfad.into(),
            plan,
            ergebnisse,
            abschlussmeldungen: abschluss.messages(),
            abschluss,
        }
    }

    /// File name used by the store
    pub fn file_name(&self) -> String {
        format!("{}_{}.json", self.lauf_id, self.zeitstempel.replace(':', "-"))
    }

    /// Convert to JSON Value
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Create from JSON Value
    pub fn from_json(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

/// Get the default application folder path
pub fn get_default_app_folder() -> PathBuf {
    if let Ok(custom) = env::var("SAGE_HELPER_APP_FOLDER") {
        return PathBuf::from(custom);
    }

    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_APP_FOLDER_NAME)
}

/// Options for creating a ProtocolStore
#[derive(Debug, Default)]
pub struct ProtocolStoreOptions {
    pub app_folder: Option<PathBuf>,
}

/// File-based store of run protocols
#[derive(Debug, Clone)]
pub struct ProtocolStore {
    protocol_folder: PathBuf,
}

impl Default for ProtocolStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolStore {
    /// Create a new ProtocolStore with default options
    pub fn new() -> Self {
        Self::with_options(ProtocolStoreOptions::default())
    }

    /// Create a new ProtocolStore with options
    pub fn with_options(options: ProtocolStoreOptions) -> Self {
        let app_folder = options.app_folder.unwrap_or_else(get_default_app_folder);
        ProtocolStore {
            protocol_folder: app_folder.join(PROTOCOL_FOLDER_NAME),
        }
    }

    /// Folder holding the protocol files
    pub fn protocol_folder(&self) -> &Path {
        &self.protocol_folder
    }

    /// Write a protocol and return its path
    pub fn save(&self, protocol: &RunProtocol) -> Result<PathBuf> {
        fs::create_dir_all(&self.protocol_folder)?;
        let path = self.protocol_folder.join(protocol.file_name());
        let content = serde_json::to_string_pretty(protocol)?;
        fs::write(&path, content)?;
        info!("Laufprotokoll gespeichert: {}", path.display());
        Ok(path)
    }

    /// Read all protocols, newest first. Unreadable files are skipped.
    pub fn get_all(&self) -> Vec<RunProtocol> {
        let entries = match fs::read_dir(&self.protocol_folder) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("No protocol folder {}: {}", self.protocol_folder.display(), e);
                return Vec::new();
            }
        };

        let mut protocols: Vec<RunProtocol> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| match read_protocol(&path) {
                Ok(protocol) => Some(protocol),
                Err(e) => {
                    warn!("Skipping unreadable protocol {}: {}", path.display(), e);
                    None
                }
            })
            .collect();

        protocols.sort_by(|a, b| b.zeitstempel.cmp(&a.zeitstempel));
        protocols
    }

    /// Most recent protocols
    pub fn get_recent(&self, limit: usize) -> Vec<RunProtocol> {
        let mut protocols = self.get_all();
        protocols.truncate(limit);
        protocols
    }

    /// Protocol of one run
    pub fn get(&self, lauf_id: &str) -> Result<RunProtocol> {
        self.get_all()
            .into_iter()
            .find(|p| p.lauf_id == lauf_id)
            .ok_or_else(|| Error::ProtocolNotFound(lauf_id.to_string()))
    }
}

fn read_protocol(path: &Path) -> Result<RunProtocol> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
