//! Share data model
//!
//! Soll (desired) and Ist (observed) share state, planned changes and execution
//! results. All values are immutable after construction and serialize into the
//! per-run JSON protocol with the field names the protocol files use.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Share permission level, ordered READ < CHANGE < FULL
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recht {
    Read,
    Change,
    Full,
}

impl Recht {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recht::Read => "READ",
            Recht::Change => "CHANGE",
            Recht::Full => "FULL",
        }
    }

    /// Parse English or German right names as printed by `net share`
    pub fn parse(value: &str) -> Option<Recht> {
        let upper = value.trim().to_uppercase().replace('Ä', "AE");
        match upper.as_str() {
            "READ" | "LESEN" => Some(Recht::Read),
            "CHANGE" | "AENDERN" => Some(Recht::Change),
            "FULL" | "VOLLZUGRIFF" | "VOLLSTAENDIG" => Some(Recht::Full),
            _ => None,
        }
    }

    /// Whether holding `self` satisfies a requirement of `required`
    pub fn satisfies(&self, required: Recht) -> bool {
        *self >= required
    }
}

impl FromStr for Recht {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Recht::parse(s).ok_or_else(|| format!("Unknown share right: {}", s))
    }
}

impl std::fmt::Display for Recht {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reconciliation action for one share
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aktion {
    Noop,
    Create,
    Update,
    Abgebrochen,
}

impl Aktion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aktion::Noop => "noop",
            Aktion::Create => "create",
            Aktion::Update => "update",
            Aktion::Abgebrochen => "abgebrochen",
        }
    }

    /// Whether applying this action mutates the share table
    pub fn is_mutating(&self) -> bool {
        matches!(self, Aktion::Create | Aktion::Update)
    }
}

impl std::fmt::Display for Aktion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Desired share declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SollFreigabe {
    /// Share name, `$`-suffixed shares are hidden
    pub name: String,
    /// Absolute backing folder
    pub ordner: String,
    /// Minimum right that must be granted
    pub rechte: Recht,
}

impl SollFreigabe {
    pub fn new(name: impl Into<String>, ordner: impl Into<String>, rechte: Recht) -> Self {
        SollFreigabe {
            name: name.into(),
            ordner: ordner.into(),
            rechte,
        }
    }
}

/// Observed share state as reported by the OS
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreigabeIstZustand {
    pub existiert: bool,
    /// `false` when the query failed in a way that could not be interpreted
    #[serde(default = "default_true")]
    pub zustand_bekannt: bool,
    pub pfad: Option<String>,
    /// Principal (as printed by the OS) to granted rights
    pub rechte: BTreeMap<String, BTreeSet<Recht>>,
    pub stdout: String,
    pub stderr: String,
}

fn default_true() -> bool {
    true
}

impl FreigabeIstZustand {
    /// The share does not exist
    pub fn missing(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        FreigabeIstZustand {
            existiert: false,
            zustand_bekannt: true,
            stdout: stdout.into(),
            stderr: stderr.into(),
            ..Default::default()
        }
    }

    /// The query failed and the state could not be determined
    pub fn unknown(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        FreigabeIstZustand {
            existiert: false,
            zustand_bekannt: false,
            stdout: stdout.into(),
            stderr: stderr.into(),
            ..Default::default()
        }
    }

    /// An existing share with the given path and grants
    pub fn present(
        pfad: impl Into<String>,
        rechte: BTreeMap<String, BTreeSet<Recht>>,
    ) -> Self {
        FreigabeIstZustand {
            existiert: true,
            zustand_bekannt: true,
            pfad: Some(pfad.into()),
            rechte,
            ..Default::default()
        }
    }

    /// Builder-style helper to add one grant
    pub fn with_grant(mut self, principal: impl Into<String>, recht: Recht) -> Self {
        self.rechte.entry(principal.into()).or_default().insert(recht);
        self
    }
}

/// Planned change between Ist and Soll for one share
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreigabeAenderung {
    pub soll: SollFreigabe,
    pub ist: FreigabeIstZustand,
    pub aktion: Aktion,
    pub begruendung: String,
    pub diff_text: String,
}

/// Outcome of processing one share
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreigabeErgebnis {
    pub name: String,
    pub ordner: String,
    pub erfolg: bool,
    pub meldung: String,
    /// Principal that was granted, empty when none was
    pub principal: String,
    pub returncode: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub aktion: Aktion,
    /// State before execution (from the plan)
    pub vorher: Option<FreigabeIstZustand>,
    /// State read back after a successful change
    pub nachher: Option<FreigabeIstZustand>,
}

impl FreigabeErgebnis {
    /// Result skeleton for a planned change, without process details
    pub fn for_change(
        aenderung: &FreigabeAenderung,
        erfolg: bool,
        meldung: impl Into<String>,
        aktion: Aktion,
    ) -> Self {
        FreigabeErgebnis {
            name: aenderung.soll.name.clone(),
            ordner: aenderung.soll.ordner.clone(),
            erfolg,
            meldung: meldung.into(),
            principal: String::new(),
            returncode: None,
            stdout: String::new(),
            stderr: String::new(),
            aktion,
            vorher: Some(aenderung.ist.clone()),
            nachher: None,
        }
    }
}
