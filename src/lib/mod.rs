//! sage-helper library
//!
//! Reconciles the SystemAG folder structure and its Windows network shares
//! against the desired state, with an auditable run protocol.

pub mod args_parser;
pub mod config;
pub mod confirmation;
pub mod error;
pub mod folder_structure;
pub mod logging;
pub mod principals;
pub mod process_runner;
pub mod protocol_formatter;
pub mod reconciler;
pub mod run_protocol;
pub mod share_executor;
pub mod share_inspector;
pub mod share_model;
pub mod share_planner;
pub mod system_error;

// Re-export commonly used items
pub use args_parser::{parse_args, CliOptions, ParsedArgs, Subcommand};
pub use config::Config;
pub use confirmation::{always_apply, confirm_cli};
pub use error::{Error, Result};
pub use folder_structure::{
    create_folders, ensure_structure, missing_folders, FolderReport, SharePolicy,
};
pub use logging::init_logging;
pub use principals::{normalize_principal, PrincipalResolver};
pub use process_runner::{
    is_command_available, ProcessOutput, ProcessRunner, SystemProcessRunner,
};
pub use protocol_formatter::{format_protocol, query_status, VALID_OUTPUT_FORMATS};
pub use reconciler::{PlanPreview, ReconcileOptions, ReconcileOutcome, Reconciler};
pub use run_protocol::{generate_run_id, CompletionFlags, ProtocolStore, RunProtocol};
pub use share_executor::ShareExecutor;
pub use share_inspector::ShareInspector;
pub use share_model::{
    Aktion, FreigabeAenderung, FreigabeErgebnis, FreigabeIstZustand, Recht, SollFreigabe,
};
pub use share_planner::{desired_shares, plan_change, plan_diff_text, SharePlanner};
pub use system_error::{decode_system_error, SystemErrorCode};
