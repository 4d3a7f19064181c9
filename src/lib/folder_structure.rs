//! Folder Structure Checker
//!
//! Computes and creates the standard SystemAG directory tree below a base
//! folder. Optional policy folders can be added, they never add shares.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;

/// Standard folders relative to the base path
pub const STANDARD_FOLDERS: [&str; 11] = [
    "AddinsOL/abf",
    "AddinsOL/rewe",
    "Installation/Anpassungen",
    "Installation/AppDesigner",
    "Installation/CD_Ablage",
    "Installation/Lizenzen",
    "Installation/Programmierung",
    "Installation/Update",
    "LiveupdateOL",
    "Dokumentation/Kundenstammblatt",
    "Dokumentation/Logs",
];

/// Optional extra folders
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SharePolicy {
    /// Sibling folder `<base>_Kopie`
    pub create_copy_folder: bool,
    /// `Dokumentation/Analysen` and `Dokumentation/Aenderungen`
    pub create_documentation_subfolders: bool,
}

/// Extra folders requested by the policy
pub fn policy_folders(base: &Path, policy: &SharePolicy) -> Vec<PathBuf> {
    let mut folders = Vec::new();

    if policy.create_copy_folder {
        if let Some(name) = base.file_name() {
            let copy_name = format!("{}_Kopie", name.to_string_lossy());
            folders.push(base.with_file_name(copy_name));
        }
    }

    if policy.create_documentation_subfolders {
        folders.push(base.join("Dokumentation").join("Analysen"));
        folders.push(base.join("Dokumentation").join("Aenderungen"));
    }

    folders
}

/// All target folders: standard tree plus policy extras
pub fn target_folders(base: &Path, policy: Option<&SharePolicy>) -> Vec<PathBuf> {
    let mut folders: Vec<PathBuf> = STANDARD_FOLDERS.iter().map(|rel| base.join(rel)).collect();
    if let Some(policy) = policy {
        folders.extend(policy_folders(base, policy));
    }
    folders
}

/// Target folders that do not exist yet
pub fn missing_folders(base: &Path, policy: Option<&SharePolicy>) -> Vec<PathBuf> {
    target_folders(base, policy)
        .into_iter()
        .filter(|p| !p.exists())
        .collect()
}

/// Create the given folders including parents; existing ones are fine
pub fn create_folders(paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        fs::create_dir_all(path)?;
        info!("Ordner erstellt oder vorhanden: {}", path.display());
    }
    Ok(())
}

/// Result of [`ensure_structure`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderReport {
    /// Folders that were missing before and have been created
    pub created: Vec<PathBuf>,
}

impl FolderReport {
    /// The structure was complete before the run
    pub fn already_complete(&self) -> bool {
        self.created.is_empty()
    }
}

/// Create every missing target folder below `base`
pub fn ensure_structure(base: &Path, policy: Option<&SharePolicy>) -> Result<FolderReport> {
    if !base.exists() {
        info!("Basisstruktur nicht vorhanden, wird erstellt: {}", base.display());
    }
    let missing = missing_folders(base, policy);
    create_folders(&missing)?;
    Ok(FolderReport { created: missing })
}
