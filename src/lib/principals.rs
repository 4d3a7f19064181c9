//! Principal Resolver
//!
//! Determines which principal names can be used in a `/GRANT:` on this host.
//! The SID `S-1-1-0` ("Everyone") is translated to its localized account name
//! first; a fixed list of known display names follows as fallback.

use tracing::{debug, warn};

use crate::process_runner::{run_logged, ProcessRunner};

/// Well-known SID of the "Everyone" group
pub const EVERYONE_SID: &str = "S-1-1-0";

/// Localized fallbacks, tried in this order after the SID translation
pub const FALLBACK_PRINCIPALS: [&str; 4] = [
    "Everyone",
    "Jeder",
    "Authenticated Users",
    "Authentifizierte Benutzer",
];

/// Display names that all denote the "Everyone" identity
const EVERYONE_ALIASES: [&str; 3] = ["everyone", "jeder", "tout le monde"];

/// Canonical key for the "Everyone" identity
pub const EVERYONE_KEY: &str = "everyone";

/// Command translating the "Everyone" SID into the localized account name
pub fn sid_translation_command() -> Vec<String> {
    vec![
        "powershell".to_string(),
        "-NoProfile".to_string(),
        "-Command".to_string(),
        format!(
            "([System.Security.Principal.SecurityIdentifier]'{}').Translate([System.Security.Principal.NTAccount]).Value",
            EVERYONE_SID
        ),
    ]
}

/// Map a principal name onto a comparison key.
///
/// Domain or machine prefixes are dropped (`BUILTIN\Users` -> `users`) and all
/// localized "Everyone" names collapse to [`EVERYONE_KEY`].
pub fn normalize_principal(principal: &str) -> String {
    let cleaned = principal.trim().to_lowercase();
    let short = cleaned.rsplit('\\').next().unwrap_or(&cleaned).trim();
    if EVERYONE_ALIASES.contains(&short) {
        EVERYONE_KEY.to_string()
    } else {
        short.to_string()
    }
}

/// Remove duplicates while keeping the first occurrence
pub fn dedup_preserving_order(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();
    for name in names {
        if !name.is_empty() && !result.contains(&name) {
            result.push(name);
        }
    }
    result
}

/// Resolves candidate principal names for share grants
pub struct PrincipalResolver<R: ProcessRunner> {
    runner: R,
}

impl<R: ProcessRunner> PrincipalResolver<R> {
    pub fn new(runner: R) -> Self {
        PrincipalResolver { runner }
    }

    /// Ordered, deduplicated candidates; never empty.
    ///
    /// Any failure of the SID translation, including PowerShell not being
    /// launchable, only drops the translated name from the front of the list.
    pub fn resolve_candidates(&self) -> Vec<String> {
        let mut candidates = Vec::new();
        match run_logged(
            &self.runner,
            "Principal-Auflösung via SID",
            &sid_translation_command(),
        ) {
            Ok(output) if output.success() && !output.stdout.trim().is_empty() => {
                let translated = output.stdout.trim();
                debug!("SID {} resolved to '{}'", EVERYONE_SID, translated);
                candidates.push(translated.to_string());
            }
            Ok(output) => {
                warn!(
                    "SID {} could not be translated (rc={}), using fallback principals",
                    EVERYONE_SID, output.returncode
                );
            }
            Err(e) => {
                warn!("SID translation unavailable: {}", e);
            }
        }

        candidates.extend(FALLBACK_PRINCIPALS.iter().map(|p| p.to_string()));
        dedup_preserving_order(candidates)
    }
}
