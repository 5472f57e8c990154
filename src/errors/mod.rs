// src/errors/mod.rs
//! Driver-level errors of the `kiln` tool, and rendering of every
//! diagnostic through miette.

#![allow(unused_assignments)] // False positives from thiserror derive

pub mod report;

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

pub use kiln_sema::errors::{SemanticError, StuckEntity};

pub use report::{render_to_stderr, render_to_string, render_to_writer, with_source};

/// Problems with a project manifest itself, found before any declaration
/// reaches the scheduler.
#[derive(Error, Debug, Diagnostic)]
pub enum ManifestError {
    #[error("could not read '{path}'")]
    #[diagnostic(code(E0001))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest: {message}")]
    #[diagnostic(code(E0002))]
    Toml {
        message: String,
        #[label("here")]
        span: Option<SourceSpan>,
    },

    #[error("unknown {what} '{value}'")]
    #[diagnostic(code(E0003), help("expected one of: {expected}"))]
    UnknownKeyword {
        what: &'static str,
        value: String,
        expected: &'static str,
        #[label("not recognized")]
        span: SourceSpan,
    },

    #[error("no module with path '{path}'")]
    #[diagnostic(
        code(E0004),
        help("a [[module]] table must come before anything placed in it")
    )]
    UnknownModule {
        path: String,
        #[label("unknown module")]
        span: SourceSpan,
    },

    #[error("module '{path}' is declared twice")]
    #[diagnostic(code(E0005))]
    DuplicateModule {
        path: String,
        #[label("declared again here")]
        span: SourceSpan,
    },

    #[error("{message}")]
    #[diagnostic(code(E0006))]
    Syntax {
        message: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("{kind} '{name}' needs a `{field}` entry")]
    #[diagnostic(code(E0007))]
    MissingField {
        kind: String,
        name: String,
        field: &'static str,
        #[label("declared here")]
        span: SourceSpan,
    },

    #[error("a bring names exactly one of `module` or `decl`")]
    #[diagnostic(code(E0008))]
    BringTarget {
        #[label("in this bring")]
        span: SourceSpan,
    },
}

impl ManifestError {
    pub fn from_toml(error: toml::de::Error) -> Self {
        ManifestError::Toml {
            message: error.message().to_string(),
            span: error.span().map(SourceSpan::from),
        }
    }
}
