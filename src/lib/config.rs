//! Configuration from environment variables
//!
//! - `SAGE_HELPER_VERBOSE`: debug logging (`1`/`true`)
//! - `SAGE_HELPER_LOG_DIR`: write logs to `<dir>/folder_manager.log`
//! - `SAGE_HELPER_APP_FOLDER`: app folder for run protocols
//! - `SAGE_HELPER_BASE_PATH`: base folder when `--basis` is not given

use std::env;
use std::path::PathBuf;

use crate::run_protocol::{ProtocolStore, ProtocolStoreOptions};

/// Base folder used when nothing else is configured
pub const DEFAULT_BASE_PATH: &str = "C:\\SystemAG";

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Verbose (debug) logging
    pub verbose: bool,
    /// Log file directory, stderr when unset
    pub log_dir: Option<PathBuf>,
    /// App folder for run protocols
    pub app_folder: Option<PathBuf>,
    /// Default base path of the SystemAG structure
    pub base_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            verbose: false,
            log_dir: None,
            app_folder: None,
            base_path: DEFAULT_BASE_PATH.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Config {
            verbose: non_empty("SAGE_HELPER_VERBOSE").is_some_and(|v| is_truthy(&v)),
            log_dir: non_empty("SAGE_HELPER_LOG_DIR").map(PathBuf::from),
            app_folder: non_empty("SAGE_HELPER_APP_FOLDER").map(PathBuf::from),
            base_path: non_empty("SAGE_HELPER_BASE_PATH")
                .unwrap_or_else(|| DEFAULT_BASE_PATH.to_string()),
        }
    }

    /// Create the protocol store based on config
    pub fn protocol_store(&self) -> ProtocolStore {
        ProtocolStore::with_options(ProtocolStoreOptions {
            app_folder: self.app_folder.clone(),
        })
    }
}

fn is_truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
