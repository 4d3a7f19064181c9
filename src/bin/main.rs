//! sage-helper CLI
//!
//! A command-line tool for the SystemAG installation:
//! - Folder structure check and creation
//! - Share reconciliation (SystemAG$, AddinsOL$, LiveupdateOL$)
//! - Run protocols with status lookup

use std::env;
use std::io;
use std::path::Path;
use std::process;

use tracing::{error, info_span};

use sage_helper::{
    args_parser::{parse_args, usage, CliOptions, ParsedArgs, Subcommand},
    confirmation::{always_apply, confirm_cli},
    folder_structure::{create_folders, missing_folders},
    generate_run_id, init_logging, is_command_available,
    protocol_formatter::{format_plan_summary, format_results},
    query_status, plan_diff_text, Config, ReconcileOptions, Reconciler, SystemProcessRunner,
};

/// Number of protocols listed by `status` without a run id
const STATUS_LIST_LIMIT: usize = 10;

/// Exit code for runtime failures
const EXIT_FAILURE: i32 = 1;
/// Exit code for invalid arguments
const EXIT_USAGE: i32 = 2;

fn main() {
    let mut config = Config::from_env();
    let args: Vec<String> = env::args().skip(1).collect();

    if args.is_empty() {
        println!("{}", usage());
        process::exit(0);
    }

    let parsed = match parse_args(&args) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            eprintln!("{}", usage());
            process::exit(EXIT_USAGE);
        }
    };

    if parsed.options.version {
        print_version();
        process::exit(0);
    }

    if parsed.options.help {
        println!("{}", usage());
        process::exit(0);
    }

    config.verbose = config.verbose || parsed.options.verbose;
    if let Err(e) = init_logging(&config) {
        eprintln!("Warning: {}", e);
    }

    let exit_code = match parsed.subcommand {
        Some(Subcommand::Plan) => handle_plan(&config, &parsed.options),
        Some(Subcommand::Apply) => handle_apply(&config, &parsed.options),
        Some(Subcommand::OrdnerCheck) => handle_folder_check(&config, &parsed.options),
        Some(Subcommand::Status) => handle_status(&config, &parsed),
        None => {
            println!("{}", usage());
            EXIT_USAGE
        }
    };
    process::exit(exit_code);
}

fn print_version() {
    let version = env!("CARGO_PKG_VERSION");
    println!("sage-helper version: {}", version);
    println!();

    println!("OS: {}", env::consts::OS);
    println!("Architecture: {}", env::consts::ARCH);
    println!();

    println!("System tools:");
    for tool in ["net", "powershell"] {
        let state = if is_command_available(tool) {
            "available"
        } else {
            "not found"
        };
        println!("  {}: {}", tool, state);
    }
}

fn base_path<'a>(config: &'a Config, options: &'a CliOptions) -> &'a str {
    options.basis.as_deref().unwrap_or(&config.base_path)
}

/// Read-only preview of the share changes
fn handle_plan(config: &Config, options: &CliOptions) -> i32 {
    let base = base_path(config, options);
    let span = info_span!("lauf", lauf_id = %generate_run_id());
    let _guard = span.enter();

    let reconciler = Reconciler::new(SystemProcessRunner::new());
    match reconciler.preview(base, &options.kandidaten) {
        Ok(preview) => {
            println!("Basispfad: {}", base);
            println!("Principal-Kandidaten: {}", preview.principal_candidates.join(", "));
            println!();
            println!("{}", format_plan_summary(&preview.plan));
            println!();
            println!("{}", plan_diff_text(&preview.plan));
            0
        }
        Err(e) => {
            error!("Planung fehlgeschlagen: {}", e);
            eprintln!("Error: {}", e);
            EXIT_FAILURE
        }
    }
}

/// Full reconciliation with confirmation and run protocol
fn handle_apply(config: &Config, options: &CliOptions) -> i32 {
    let lauf_id = generate_run_id();
    let span = info_span!("lauf", lauf_id = %lauf_id);
    let _guard = span.enter();

    let run_options = ReconcileOptions {
        base_path: base_path(config, options).to_string(),
        alternate_bases: options.kandidaten.clone(),
        policy: options.policy(),
        lauf_id: Some(lauf_id),
    };

    let reconciler = Reconciler::new(SystemProcessRunner::new());
    let outcome = if options.yes {
        reconciler.run(&run_options, always_apply)
    } else {
        reconciler.run(&run_options, |diff| {
            confirm_cli(diff, &mut io::stdin().lock(), &mut io::stdout())
        })
    };

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Lauf fehlgeschlagen: {}", e);
            eprintln!("Error: {}", e);
            return EXIT_FAILURE;
        }
    };

    let protocol = &outcome.protocol;
    println!();
    for folder in &outcome.folders.created {
        println!("Ordner erstellt: {}", folder.display());
    }
    println!("{}", format_results(&protocol.ergebnisse));
    println!();
    for message in &protocol.abschlussmeldungen {
        println!("{}", message);
    }

    match config.protocol_store().save(protocol) {
        Ok(path) => println!("Laufprotokoll: {}", path.display()),
        Err(e) => {
            error!("Laufprotokoll konnte nicht gespeichert werden: {}", e);
            eprintln!("Warning: Could not save run protocol: {}", e);
        }
    }

    if protocol.ergebnisse.iter().all(|r| r.erfolg) {
        0
    } else {
        EXIT_FAILURE
    }
}

/// Missing folders, optionally created
fn handle_folder_check(config: &Config, options: &CliOptions) -> i32 {
    let base = Path::new(base_path(config, options));
    let policy = options.policy();
    let missing = missing_folders(base, policy.as_ref());

    if missing.is_empty() {
        println!("Ordnerstruktur vollständig: {}", base.display());
        return 0;
    }

    println!("Fehlende Ordner ({}):", missing.len());
    for folder in &missing {
        println!("  {}", folder.display());
    }

    if !options.anlegen {
        return EXIT_FAILURE;
    }

    match create_folders(&missing) {
        Ok(()) => {
            println!("{} Ordner angelegt.", missing.len());
            0
        }
        Err(e) => {
            error!("Ordner konnten nicht angelegt werden: {}", e);
            eprintln!("Error: {}", e);
            EXIT_FAILURE
        }
    }
}

/// Show one stored protocol or the recent list
fn handle_status(config: &Config, parsed: &ParsedArgs) -> i32 {
    let store = config.protocol_store();
    match query_status(
        &store,
        parsed.lauf_id.as_deref(),
        parsed.options.output_format.as_deref(),
        STATUS_LIST_LIMIT,
    ) {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_FAILURE
        }
    }
}
