//! Confirmation boundary for share plans
//!
//! The executor only needs a `FnOnce(&str) -> bool`. This module provides the
//! CLI variant that shows the diff and asks for `anwenden` or `abbrechen`.

use std::io::{BufRead, Write};

/// Answer that applies the plan
pub const APPLY_ANSWER: &str = "anwenden";
/// Answer that cancels the plan
pub const CANCEL_ANSWER: &str = "abbrechen";

/// Show `diff_text` on `output` and read one answer line from `input`.
///
/// Only `anwenden` (case-insensitive) confirms; anything else, including EOF
/// or a read error, cancels.
pub fn confirm_cli<I: BufRead, O: Write>(diff_text: &str, input: &mut I, output: &mut O) -> bool {
    let _ = writeln!(output, "\nGeplante Share-Änderungen:\n");
    let _ = writeln!(output, "{}", diff_text);
    let _ = write!(output, "Aktion wählen [{}/{}]: ", APPLY_ANSWER, CANCEL_ANSWER);
    let _ = output.flush();

    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(_) => answer.trim().eq_ignore_ascii_case(APPLY_ANSWER),
        Err(_) => false,
    }
}

/// Confirmation that always applies (non-interactive `--yes`)
pub fn always_apply(_diff_text: &str) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_confirm_cli_apply() {
        let mut input = Cursor::new("Anwenden\n");
        let mut output = Vec::new();
        assert!(confirm_cli("[UPDATE] SystemAG$", &mut input, &mut output));
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("[UPDATE] SystemAG$"));
        assert!(shown.contains("anwenden/abbrechen"));
    }

    #[test]
    fn test_confirm_cli_cancel_and_eof() {
        let mut output = Vec::new();
        assert!(!confirm_cli("diff", &mut Cursor::new("abbrechen\n"), &mut output));
        assert!(!confirm_cli("diff", &mut Cursor::new("ja\n"), &mut output));
        assert!(!confirm_cli("diff", &mut Cursor::new(""), &mut output));
    }
}
