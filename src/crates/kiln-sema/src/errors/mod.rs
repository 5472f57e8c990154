// errors/mod.rs
//! Semantic errors of the module tree and the scheduler (E3xxx), and the
//! single reporting hand-off every fatal condition goes through.

#![allow(unused_assignments)] // False positives from thiserror derive

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum SemanticError {
    #[error("the name '{name}' is defined multiple times")]
    #[diagnostic(
        code(E3001),
        help("declarations of one library share a namespace across all of its files and folders")
    )]
    NameCollision {
        name: String,
        #[label("redefined here")]
        span: SourceSpan,
        #[label("previous definition of '{name}' here")]
        previous: SourceSpan,
    },

    #[error("cannot find {kind} '{name}' in this scope")]
    #[diagnostic(code(E3002))]
    NotFound {
        kind: &'static str,
        name: String,
        #[label("not found")]
        span: SourceSpan,
    },

    #[error("cannot find module '{name}'")]
    #[diagnostic(code(E3003))]
    ModuleNotFound {
        name: String,
        #[label("no visible library with this name")]
        span: SourceSpan,
    },

    #[error("arguments of '{variant}' do not satisfy the constraint of '{generic}'")]
    #[diagnostic(code(E3010))]
    ConstraintViolation {
        generic: String,
        variant: String,
        #[label("instantiated here")]
        span: SourceSpan,
        #[label("constraint declared here")]
        constraint: SourceSpan,
    },

    #[error("'{generic}' expects {expected} generic arguments, found {found}")]
    #[diagnostic(code(E3011))]
    WrongGenericArgCount {
        generic: String,
        expected: String,
        found: usize,
        #[label("wrong number of generic arguments")]
        span: SourceSpan,
    },

    #[error("generic parameter '{param}' expects {expected}, found {found}")]
    #[diagnostic(code(E3012))]
    GenericArgKindMismatch {
        param: String,
        expected: String,
        found: String,
        #[label("mismatched generic argument")]
        span: SourceSpan,
    },

    #[error("missing generic argument for parameter '{param}' of '{generic}'")]
    #[diagnostic(code(E3013), help("'{param}' has no default value"))]
    MissingGenericArg {
        generic: String,
        param: String,
        #[label("instantiated here")]
        span: SourceSpan,
    },

    #[error("'{name}' is not generic")]
    #[diagnostic(code(E3014))]
    NotGeneric {
        name: String,
        #[label("generic arguments given here")]
        span: SourceSpan,
    },

    #[error("generic '{name}' used without generic arguments")]
    #[diagnostic(code(E3015))]
    MissingGenericArgs {
        name: String,
        #[label("expected '{name}<...>'")]
        span: SourceSpan,
    },

    #[error("cannot evaluate compile-time expression: {reason}")]
    #[diagnostic(code(E3016))]
    ConstEval {
        reason: String,
        #[label("evaluated here")]
        span: SourceSpan,
    },

    #[error("compile-time parameter '{name}' is not bound here")]
    #[diagnostic(code(E3017))]
    UnboundParameter {
        name: String,
        #[label("only generic parameters can be used here")]
        span: SourceSpan,
    },

    #[error("'{name}' is instantiated while its own arguments are being bound")]
    #[diagnostic(code(E3018), help("a parameter default cannot refer to the generic it belongs to"))]
    RecursiveInstantiation {
        name: String,
        #[label("instantiated here")]
        span: SourceSpan,
    },

    #[error("{count} declarations cannot make progress")]
    #[diagnostic(
        code(E3020),
        help("break the cycle by referring to one of the declarations through a pointer")
    )]
    Deadlock {
        count: usize,
        #[related]
        stuck: Vec<StuckEntity>,
    },

    #[error("scheduler gave up after {limit} passes")]
    #[diagnostic(code(E3021), help("raise `max_passes` in the [build] table"))]
    PassLimitExceeded { limit: usize },
}

/// One member of a deadlock batch.
#[derive(Error, Debug, Diagnostic, Clone)]
#[error("'{name}' is stuck before its {phase} phase, waiting on {waiting_on}")]
#[diagnostic(code(E3020), help("dependency chain: {chain}"))]
pub struct StuckEntity {
    pub name: String,
    pub phase: &'static str,
    pub waiting_on: String,
    pub chain: String,
    #[label("declared here")]
    pub span: SourceSpan,
}

impl SemanticError {
    /// Primary location of the error, if it has one.
    pub fn primary_span(&self) -> Option<SourceSpan> {
        match self {
            SemanticError::NameCollision { span, .. }
            | SemanticError::NotFound { span, .. }
            | SemanticError::ModuleNotFound { span, .. }
            | SemanticError::ConstraintViolation { span, .. }
            | SemanticError::WrongGenericArgCount { span, .. }
            | SemanticError::GenericArgKindMismatch { span, .. }
            | SemanticError::MissingGenericArg { span, .. }
            | SemanticError::NotGeneric { span, .. }
            | SemanticError::MissingGenericArgs { span, .. }
            | SemanticError::ConstEval { span, .. }
            | SemanticError::UnboundParameter { span, .. }
            | SemanticError::RecursiveInstantiation { span, .. } => Some(*span),
            SemanticError::Deadlock { .. } | SemanticError::PassLimitExceeded { .. } => None,
        }
    }
}

/// Whether the driver keeps going after an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportMode {
    /// Accumulate every error; failed entities are poisoned and skipped.
    #[default]
    Batched,
    /// Stop at the first error.
    FailFast,
}

/// Returned through `?` when a fail-fast run hits its first error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Abort;

impl std::fmt::Display for Abort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("compilation aborted")
    }
}

impl std::error::Error for Abort {}

/// Accumulator behind the reporting hand-off.
#[derive(Debug, Default)]
pub struct Diagnostics {
    mode: ReportMode,
    errors: Vec<SemanticError>,
}

impl Diagnostics {
    pub fn new(mode: ReportMode) -> Self {
        Self {
            mode,
            errors: Vec::new(),
        }
    }

    pub fn mode(&self) -> ReportMode {
        self.mode
    }

    /// Record one error. Fails with [`Abort`] in fail-fast mode.
    pub fn report(&mut self, error: SemanticError) -> Result<(), Abort> {
        tracing::debug!(%error, "semantic error reported");
        self.errors.push(error);
        match self.mode {
            ReportMode::Batched => Ok(()),
            ReportMode::FailFast => Err(Abort),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SemanticError> {
        self.errors.iter()
    }

    pub fn take(&mut self) -> Vec<SemanticError> {
        std::mem::take(&mut self.errors)
    }
}
