//! Formatter for run protocols and share results
//!
//! Output formats:
//! - text: human-readable summary
//! - json: the stored protocol document

use crate::error::{Error, Result};
use crate::run_protocol::{ProtocolStore, RunProtocol};
use crate::share_model::{FreigabeAenderung, FreigabeErgebnis};

/// Valid output formats for `status`
pub const VALID_OUTPUT_FORMATS: [&str; 2] = ["text", "json"];

/// Marker for successful results
pub const SUCCESS_MARKER: &str = "✓";
/// Marker for failed results
pub const FAILURE_MARKER: &str = "✗";

/// One line per plan entry: action, share, justification
pub fn format_plan_summary(plan: &[FreigabeAenderung]) -> String {
    plan.iter()
        .map(|e| {
            format!(
                "{:<12} {:<16} {}",
                format!("[{}]", e.aktion.as_str().to_uppercase()),
                e.soll.name,
                e.begruendung
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line per result with a success/failure marker
pub fn format_results(results: &[FreigabeErgebnis]) -> String {
    results
        .iter()
        .map(|r| {
            let marker = if r.erfolg { SUCCESS_MARKER } else { FAILURE_MARKER };
            format!("{} [{}] {}", marker, r.aktion, r.meldung)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a run protocol as human-readable text
pub fn format_protocol_as_text(protocol: &RunProtocol) -> String {
    let mut lines = vec![
        "Ordner- und Freigabelauf".to_string(),
        "=".repeat(50),
        format!("Lauf-ID:           {}", protocol.lauf_id),
        format!("Zeitstempel:       {}", protocol.zeitstempel),
        format!("Basispfad:         {}", protocol.basis_pfad),
    ];

    if !protocol.plan.is_empty() {
        lines.push("Plan:".to_string());
        for line in format_plan_summary(&protocol.plan).lines() {
            lines.push(format!("  {}", line));
        }
    }

    if !protocol.ergebnisse.is_empty() {
        lines.push("Ergebnisse:".to_string());
        for line in format_results(&protocol.ergebnisse).lines() {
            lines.push(format!("  {}", line));
        }
    }

    lines.push("Abschluss:".to_string());
    for message in &protocol.abschlussmeldungen {
        lines.push(format!("  {}", message));
    }

    lines.join("\n")
}

/// Format a run protocol based on format type
pub fn format_protocol(protocol: &RunProtocol, format: &str) -> Result<String> {
    match format {
        "json" => Ok(serde_json::to_string_pretty(protocol)?),
        "text" => Ok(format_protocol_as_text(protocol)),
        _ => Err(Error::InvalidArgument(format!(
            "Unknown output format: {}",
            format
        ))),
    }
}

/// Format a list of protocols as one line each
pub fn format_protocol_list(protocols: &[RunProtocol]) -> String {
    if protocols.is_empty() {
        return "Keine Laufprotokolle vorhanden.".to_string();
    }
    protocols
        .iter()
        .map(|p| {
            let marker = if p.ergebnisse.iter().all(|r| r.erfolg) {
                SUCCESS_MARKER
            } else {
                FAILURE_MARKER
            };
            format!("{} {}  {}  {}", marker, p.lauf_id, p.zeitstempel, p.basis_pfad)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Show one protocol by run id, or the recent list when none is given
pub fn query_status(
    store: &ProtocolStore,
    lauf_id: Option<&str>,
    output_format: Option<&str>,
    limit: usize,
) -> Result<String> {
    let format = output_format.unwrap_or("text");
    match lauf_id {
        Some(id) => {
            let protocol = store.get(id)?;
            format_protocol(&protocol, format)
        }
        None => {
            let protocols = store.get_recent(limit);
            match format {
                "json" => Ok(serde_json::to_string_pretty(&protocols)?),
                "text" => Ok(format_protocol_list(&protocols)),
                other => Err(Error::InvalidArgument(format!(
                    "Unknown output format: {}",
                    other
                ))),
            }
        }
    }
}
