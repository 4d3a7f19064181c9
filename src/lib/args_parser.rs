//! Argument Parser for the sage-helper CLI
//!
//! Syntax: $ sage-helper <subcommand> [options]
//!
//! Subcommands:
//! plan                             Show the planned share changes (read-only)
//! apply                            Create folders, confirm and apply share changes
//! ordner-check                     Report missing folders of the structure
//! status [lauf_id]                 Show stored run protocols
//!
//! Options:
//! --basis, -b <path>               Base folder of the SystemAG structure
//! --kandidat <path>                Alternate base folder (repeatable)
//! --kopie                          Also create the `<base>_Kopie` folder
//! --doku                           Also create Dokumentation/Analysen and /Aenderungen
//! --yes, -y                        Apply without asking (apply)
//! --anlegen                        Create the missing folders (ordner-check)
//! --output-format <format>         Output format for status (text, json)
//! --verbose                        Debug logging
//! --version, -v                    Show version
//! --help, -h                       Show usage

use crate::folder_structure::SharePolicy;
use crate::protocol_formatter::VALID_OUTPUT_FORMATS;

/// CLI subcommands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subcommand {
    Plan,
    Apply,
    OrdnerCheck,
    Status,
}

impl Subcommand {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "plan" => Some(Subcommand::Plan),
            "apply" => Some(Subcommand::Apply),
            "ordner-check" => Some(Subcommand::OrdnerCheck),
            "status" => Some(Subcommand::Status),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Subcommand::Plan => "plan",
            Subcommand::Apply => "apply",
            Subcommand::OrdnerCheck => "ordner-check",
            Subcommand::Status => "status",
        }
    }
}

/// Options parsed from command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOptions {
    /// Base folder, falls back to the configured default
    pub basis: Option<String>,
    /// Alternate base folders
    pub kandidaten: Vec<String>,
    /// Create the copy folder
    pub kopie: bool,
    /// Create the documentation sub folders
    pub doku: bool,
    /// Apply without confirmation prompt
    pub yes: bool,
    /// Create missing folders in ordner-check
    pub anlegen: bool,
    /// Output format for status (text, json)
    pub output_format: Option<String>,
    /// Debug logging
    pub verbose: bool,
    /// Show usage
    pub help: bool,
    /// Show version
    pub version: bool,
}

impl CliOptions {
    /// Folder policy requested by `--kopie` / `--doku`
    pub fn policy(&self) -> Option<SharePolicy> {
        if self.kopie || self.doku {
            Some(SharePolicy {
                create_copy_folder: self.kopie,
                create_documentation_subfolders: self.doku,
            })
        } else {
            None
        }
    }
}

/// Result of parsing arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArgs {
    pub subcommand: Option<Subcommand>,
    /// Run id for `status`
    pub lauf_id: Option<String>,
    pub options: CliOptions,
}

/// Parse command line arguments (without the program name)
pub fn parse_args(args: &[String]) -> Result<ParsedArgs, String> {
    let mut options = CliOptions::default();
    let mut positionals: Vec<String> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        if arg.starts_with('-') && arg.len() > 1 {
            match parse_option(args, i, &mut options)? {
                0 => return Err(format!("Unknown option: {}", arg)),
                consumed => i += consumed,
            }
        } else {
            positionals.push(arg.clone());
            i += 1;
        }
    }

    let mut positionals = positionals.into_iter();
    let subcommand = match positionals.next() {
        Some(name) => Some(
            Subcommand::parse(&name).ok_or_else(|| format!("Unknown subcommand: {}", name))?,
        ),
        None => None,
    };
    let lauf_id = positionals.next();
    if let Some(extra) = positionals.next() {
        return Err(format!("Unexpected argument: {}", extra));
    }

    let parsed = ParsedArgs {
        subcommand,
        lauf_id,
        options,
    };
    validate_args(&parsed)?;
    Ok(parsed)
}

/// Value of an option given as `--name value` or `--name=value`.
/// Returns the value and the number of arguments consumed.
fn option_value(
    args: &[String],
    index: usize,
    names: &[&str],
) -> Result<Option<(String, usize)>, String> {
    let arg = &args[index];

    if names.contains(&arg.as_str()) {
        return match args.get(index + 1) {
            Some(next) if !next.starts_with('-') => Ok(Some((next.clone(), 2))),
            _ => Err(format!("Option {} requires a value", arg)),
        };
    }

    for name in names.iter().filter(|n| n.starts_with("--")) {
        if let Some(value) = arg.strip_prefix(name).and_then(|rest| rest.strip_prefix('=')) {
            if value.is_empty() {
                return Err(format!("Option {} requires a value", name));
            }
            return Ok(Some((value.to_string(), 1)));
        }
    }

    Ok(None)
}

/// Parse a single option from args array
/// Returns number of arguments consumed (0 if not recognized)
fn parse_option(args: &[String], index: usize, options: &mut CliOptions) -> Result<usize, String> {
    let arg = args[index].as_str();

    // Flags
    match arg {
        "--kopie" => options.kopie = true,
        "--doku" => options.doku = true,
        "--yes" | "-y" => options.yes = true,
        "--anlegen" => options.anlegen = true,
        "--verbose" => options.verbose = true,
        "--help" | "-h" => options.help = true,
        "--version" | "-v" => options.version = true,
        _ => {
            // Options with a value
            if let Some((value, consumed)) = option_value(args, index, &["--basis", "-b"])? {
                options.basis = Some(value);
                return Ok(consumed);
            }
            if let Some((value, consumed)) = option_value(args, index, &["--kandidat"])? {
                options.kandidaten.push(value);
                return Ok(consumed);
            }
            if let Some((value, consumed)) = option_value(args, index, &["--output-format"])? {
                options.output_format = Some(value.to_lowercase());
                return Ok(consumed);
            }
            return Ok(0);
        }
    }
    Ok(1)
}

/// Reject option combinations that make no sense for the subcommand
pub fn validate_args(parsed: &ParsedArgs) -> Result<(), String> {
    let options = &parsed.options;

    if options.help || options.version {
        return Ok(());
    }

    let subcommand = parsed
        .subcommand
        .ok_or_else(|| "No subcommand given (plan, apply, ordner-check, status)".to_string())?;

    if let Some(ref format) = options.output_format {
        if !VALID_OUTPUT_FORMATS.contains(&format.as_str()) {
            return Err(format!(
                "Invalid output format: {}. Valid options are: {}",
                format,
                VALID_OUTPUT_FORMATS.join(", ")
            ));
        }
        if subcommand != Subcommand::Status {
            return Err("--output-format is only valid for status".to_string());
        }
    }

    if parsed.lauf_id.is_some() && subcommand != Subcommand::Status {
        return Err(format!(
            "{} takes no positional arguments",
            subcommand.as_str()
        ));
    }

    if options.yes && subcommand != Subcommand::Apply {
        return Err("--yes is only valid for apply".to_string());
    }

    if options.anlegen && subcommand != Subcommand::OrdnerCheck {
        return Err("--anlegen is only valid for ordner-check".to_string());
    }

    if (options.kopie || options.doku)
        && !matches!(subcommand, Subcommand::Apply | Subcommand::OrdnerCheck)
    {
        return Err("--kopie and --doku are only valid for apply and ordner-check".to_string());
    }

    if !options.kandidaten.is_empty()
        && !matches!(subcommand, Subcommand::Plan | Subcommand::Apply)
    {
        return Err("--kandidat is only valid for plan and apply".to_string());
    }

    Ok(())
}

/// Usage text
pub fn usage() -> &'static str {
    "Usage: sage-helper <subcommand> [options]

Subcommands:
  plan                      Show the planned share changes (read-only)
  apply                     Create folders, confirm and apply share changes
  ordner-check              Report missing folders of the structure
  status [lauf_id]          Show stored run protocols

Options:
  --basis, -b <path>        Base folder of the SystemAG structure
  --kandidat <path>         Alternate base folder (repeatable)
  --kopie                   Also create the <base>_Kopie folder
  --doku                    Also create Dokumentation/Analysen and /Aenderungen
  --yes, -y                 Apply without asking (apply)
  --anlegen                 Create the missing folders (ordner-check)
  --output-format <format>  Output format for status (text, json)
  --verbose                 Debug logging
  --version, -v             Show version
  --help, -h                Show this help"
}
