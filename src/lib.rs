// src/lib.rs
//! The `kiln` driver: loads project manifests into the semantic core,
//! runs the scheduler and reports what happened.

pub mod cli;
pub mod commands;
pub mod errors;
pub mod manifest;

pub use kiln_sema::{Program, SchedulerConfig};
pub use manifest::{BuildOverrides, Manifest, Project};
