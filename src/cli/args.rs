// src/cli/args.rs

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::manifest::BuildOverrides;

/// Kiln module tree and declaration scheduler
#[derive(Parser)]
#[command(name = "kiln")]
#[command(version)]
#[command(about = "Resolve and schedule the declarations of a kiln project", long_about = None)]
pub struct Cli {
    /// Stop at the first error
    #[arg(long, global = true)]
    pub fail_fast: bool,

    /// Give up after this many scheduler passes
    #[arg(long, global = true, value_name = "N")]
    pub max_passes: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn overrides(&self) -> BuildOverrides {
        BuildOverrides {
            fail_fast: self.fail_fast,
            max_passes: self.max_passes,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check project manifests for errors
    #[command(visible_alias = "c")]
    Check {
        /// Manifests to check
        #[arg(value_name = "MANIFEST", required = true)]
        manifests: Vec<PathBuf>,
    },
    /// Show the module tree, generic variants and emitted items of a project
    #[command(visible_alias = "i")]
    Inspect(InspectArgs),
}

#[derive(Args)]
pub struct InspectArgs {
    /// Manifest to inspect
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Print the module tree with full names
    #[arg(long)]
    pub modules: bool,

    /// Print the generic variants that were created
    #[arg(long)]
    pub variants: bool,

    /// Print what was handed to code generation
    #[arg(long)]
    pub emitted: bool,
}

impl InspectArgs {
    /// With no section selected, every section is printed.
    pub fn sections(&self) -> (bool, bool, bool) {
        if self.modules || self.variants || self.emitted {
            (self.modules, self.variants, self.emitted)
        } else {
            (true, true, true)
        }
    }
}
