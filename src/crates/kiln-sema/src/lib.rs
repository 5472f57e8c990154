// src/crates/kiln-sema/src/lib.rs
//
// Module tree, visibility-scoped lookup, and the fixpoint scheduler that
// drives declarations through their phases, instantiating generics on
// demand.

pub mod codegen;
pub mod config;
pub mod const_eval;
pub mod db;
pub mod decl;
pub mod entity;
pub mod errors;
pub mod generic;
pub mod module;
pub mod program;
pub mod scheduler;
pub mod types;
pub mod visibility;

#[cfg(test)]
mod test_support;

pub use codegen::{CodegenSink, Emitted, EmittedItem, NullSink, RecordingSink};
pub use config::SchedulerConfig;
pub use db::SemaDb;
pub use decl::DeclNode;
pub use entity::{DependencyStrength, EntityState, Phase, Status};
pub use errors::{Abort, Diagnostics, ReportMode, SemanticError, StuckEntity};
pub use module::{DeclKind, ModuleKind, ModuleTree};
pub use program::Program;
pub use scheduler::{Scheduler, SchedulerStats};
pub use types::{ConstValue, GenericArg, Ty};
pub use visibility::{AccessInfo, VisibilityInfo, VisibilityKind, VisibilitySpec, is_visible};
