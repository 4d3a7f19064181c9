//! End-to-end reconciliation run
//!
//! Order of a run:
//! 1. ensure the folder structure below the base path
//! 2. resolve the principal candidates
//! 3. inspect and plan the managed shares
//! 4. confirm and execute the plan
//! 5. build the run protocol

use std::path::Path;

use tracing::{info, warn};

use crate::error::Result;
use crate::folder_structure::{ensure_structure, FolderReport, SharePolicy};
use crate::principals::PrincipalResolver;
use crate::process_runner::ProcessRunner;
use crate::run_protocol::{generate_run_id, RunProtocol};
use crate::share_executor::ShareExecutor;
use crate::share_model::FreigabeAenderung;
use crate::share_planner::SharePlanner;

/// Inputs of one reconciliation run
#[derive(Debug, Clone, Default)]
pub struct ReconcileOptions {
    /// Base folder of the SystemAG structure
    pub base_path: String,
    /// Other base folders an existing structure may live under
    pub alternate_bases: Vec<String>,
    /// Extra folders to create
    pub policy: Option<SharePolicy>,
    /// Run id, generated when absent
    pub lauf_id: Option<String>,
}

impl ReconcileOptions {
    pub fn new(base_path: impl Into<String>) -> Self {
        ReconcileOptions {
            base_path: base_path.into(),
            ..Default::default()
        }
    }
}

/// Plan computed without touching folders or shares
#[derive(Debug, Clone)]
pub struct PlanPreview {
    pub principal_candidates: Vec<String>,
    pub plan: Vec<FreigabeAenderung>,
}

/// Outcome of [`Reconciler::run`]
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub folders: FolderReport,
    pub principal_candidates: Vec<String>,
    pub protocol: RunProtocol,
}

/// Drives folders, principals, planner and executor over one runner
pub struct Reconciler<R: ProcessRunner> {
    runner: R,
}

impl<R: ProcessRunner> Reconciler<R> {
    pub fn new(runner: R) -> Self {
        Reconciler { runner }
    }

    /// Resolve principals and plan the shares. Only read-only commands run.
    pub fn preview(&self, base_path: &str, alternate_bases: &[String]) -> Result<PlanPreview> {
        let principal_candidates = PrincipalResolver::new(&self.runner).resolve_candidates();
        let plan = SharePlanner::new(&self.runner).plan(
            base_path,
            &principal_candidates,
            alternate_bases,
        )?;
        Ok(PlanPreview {
            principal_candidates,
            plan,
        })
    }

    /// Full run. `confirm` sees the combined diff once, if anything changes.
    pub fn run<F>(&self, options: &ReconcileOptions, confirm: F) -> Result<ReconcileOutcome>
    where
        F: FnOnce(&str) -> bool,
    {
        let lauf_id = options.lauf_id.clone().unwrap_or_else(generate_run_id);
        info!("Starte Lauf {} für {}", lauf_id, options.base_path);

        let folders = ensure_structure(Path::new(&options.base_path), options.policy.as_ref())?;
        if folders.already_complete() {
            info!("Ordnerstruktur bereits vollständig");
        } else {
            info!("{} fehlende Ordner ergänzt", folders.created.len());
        }

        let PlanPreview {
            principal_candidates,
            plan,
        } = self.preview(&options.base_path, &options.alternate_bases)?;

        let ergebnisse = ShareExecutor::new(&self.runner).execute(
            &plan,
            &principal_candidates,
            confirm,
        )?;
        for failed in ergebnisse.iter().filter(|r| !r.erfolg) {
            warn!("{}", failed.meldung);
        }

        let protocol = RunProtocol::new(
            lauf_id,
            options.base_path.clone(),
            plan,
            ergebnisse,
            folders.created.len(),
        );

        Ok(ReconcileOutcome {
            folders,
            principal_candidates,
            protocol,
        })
    }
}
