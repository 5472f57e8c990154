// src/commands/check.rs

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use kiln_sema::NullSink;

use super::common::{failure_summary, load_project, render_diagnostics};
use crate::manifest::BuildOverrides;

/// Load and schedule each manifest, reporting every error found.
pub fn check_manifests(manifests: &[PathBuf], overrides: BuildOverrides) -> ExitCode {
    let mut had_error = false;

    for path in manifests {
        if check_manifest(path, overrides).is_err() {
            had_error = true;
        }
    }

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Check a single manifest, returns Ok(()) on success
fn check_manifest(path: &Path, overrides: BuildOverrides) -> Result<(), ()> {
    let mut project = load_project(path, overrides)?;
    let stats = project.run(&mut NullSink);
    let count = render_diagnostics(&mut project);
    if count > 0 {
        eprintln!("{}", failure_summary(&project.name, count));
        return Err(());
    }

    if let Ok(stats) = stats {
        tracing::info!(
            manifest = %project.name,
            passes = stats.passes,
            entities = stats.entities,
            variants = stats.variants_created,
            "check finished"
        );
    }
    Ok(())
}
