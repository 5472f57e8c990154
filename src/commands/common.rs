// src/commands/common.rs
//! Shared utilities for CLI commands.

use std::path::Path;

use crate::errors::{render_to_stderr, with_source};
use crate::manifest::{BuildOverrides, Project};

/// Load a manifest, rendering a load failure to stderr.
pub fn load_project(path: &Path, overrides: BuildOverrides) -> Result<Project, ()> {
    match Project::load(path, overrides) {
        Ok(project) => Ok(project),
        Err(error) => {
            let name = path.display().to_string();
            // Manifest errors point into the file when it could be read.
            let source = std::fs::read_to_string(path).unwrap_or_default();
            render_to_stderr(with_source(error, &name, &source).as_ref());
            Err(())
        }
    }
}

/// Render every semantic error of `project` to stderr. Returns how many
/// there were.
pub fn render_diagnostics(project: &mut Project) -> usize {
    let errors = project.program.take_diagnostics();
    for error in &errors {
        render_to_stderr(with_source(error.clone(), &project.name, &project.source).as_ref());
    }
    errors.len()
}

/// The closing line after a failed manifest.
pub fn failure_summary(name: &str, count: usize) -> String {
    let plural = if count == 1 { "" } else { "s" };
    format!("error: could not check '{name}' due to {count} previous error{plural}")
}
