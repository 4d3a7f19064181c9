//! System-Error Decoder
//!
//! `net` reports failures as localized free text with an embedded numeric code,
//! e.g. `Systemfehler 2310 aufgetreten.` or `System error 1332 has occurred.`
//! Most messages end with `NET HELPMSG <code>`, which reads the same in every
//! language. The markers and the number are stable across locales, the rest
//! is not.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// "The share name does not exist"
pub const SHARE_NOT_FOUND: u32 = 2310;
/// "No mapping between account names and security IDs was done"
pub const PRINCIPAL_UNRESOLVABLE: u32 = 1332;

static SYSTEM_ERROR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:systemfehler|system\s+error|net\s+helpmsg)\s+(\d+)")
        .expect("valid system error regex")
});

/// Classified Windows system error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemErrorCode {
    ShareNotFound,
    PrincipalUnresolvable,
    Other(u32),
}

impl SystemErrorCode {
    pub fn from_code(code: u32) -> Self {
        match code {
            SHARE_NOT_FOUND => SystemErrorCode::ShareNotFound,
            PRINCIPAL_UNRESOLVABLE => SystemErrorCode::PrincipalUnresolvable,
            other => SystemErrorCode::Other(other),
        }
    }

    /// The raw numeric code
    pub fn code(&self) -> u32 {
        match self {
            SystemErrorCode::ShareNotFound => SHARE_NOT_FOUND,
            SystemErrorCode::PrincipalUnresolvable => PRINCIPAL_UNRESOLVABLE,
            SystemErrorCode::Other(code) => *code,
        }
    }
}

impl std::fmt::Display for SystemErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Extract the first system error code from combined stdout/stderr.
///
/// `None` means "unknown failure", never "success".
pub fn decode_system_error(stdout: &str, stderr: &str) -> Option<SystemErrorCode> {
    let combined = format!("{}\n{}", stdout, stderr);
    SYSTEM_ERROR_RE
        .captures(&combined)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map(SystemErrorCode::from_code)
}

/// Human-readable code for messages, `unbekannt` when nothing was decoded
pub fn describe_code(code: Option<SystemErrorCode>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "unbekannt".to_string())
}
