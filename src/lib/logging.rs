//! Logging setup
//!
//! All modules log through `tracing`. The subscriber honours `RUST_LOG` and
//! defaults to `info` (`debug` in verbose mode). With a configured log
//! directory, lines are appended to `folder_manager.log` there.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::{Error, Result};

/// Log file written when a log directory is configured
pub const LOG_FILE_NAME: &str = "folder_manager.log";

/// Path of the log file for a configuration, if file logging is enabled
pub fn log_file_path(config: &Config) -> Option<PathBuf> {
    config.log_dir.as_ref().map(|dir| dir.join(LOG_FILE_NAME))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &Config) -> Result<()> {
    let level = if config.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let installed = match log_file_path(config) {
        Some(path) => {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    installed.map_err(|e| Error::Config(format!("logging already initialised: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_path() {
        let mut config = Config::default();
        assert!(log_file_path(&config).is_none());

        config.log_dir = Some(PathBuf::from("/var/log/sage"));
        assert_eq!(
            log_file_path(&config),
            Some(PathBuf::from("/var/log/sage/folder_manager.log"))
        );
    }
}
