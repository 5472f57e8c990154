// program.rs
//
// Front door of the core: build the module tree, declare nodes, run the
// scheduler, collect diagnostics.

use std::path::PathBuf;

use kiln_identity::{DeclId, EntityId, Identifier, Interner, ModuleId, Span};

use crate::codegen::CodegenSink;
use crate::config::SchedulerConfig;
use crate::db::SemaDb;
use crate::decl::DeclNode;
use crate::errors::{Abort, Diagnostics, SemanticError};
use crate::module::ModuleKind;
use crate::scheduler::{Scheduler, SchedulerStats};
use crate::visibility::{VisibilityInfo, VisibilityKind};

#[derive(Debug)]
pub struct Program {
    db: SemaDb,
    scheduler: Scheduler,
    diagnostics: Diagnostics,
}

impl Program {
    pub fn new(config: SchedulerConfig) -> Self {
        Self::with_interner(Interner::new(), config)
    }

    pub fn with_interner(interner: Interner, config: SchedulerConfig) -> Self {
        Self {
            db: SemaDb::with_interner(interner),
            scheduler: Scheduler::new(config),
            diagnostics: Diagnostics::new(config.mode),
        }
    }

    pub fn db(&self) -> &SemaDb {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut SemaDb {
        &mut self.db
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn ident(&mut self, name: &str, span: Span) -> Identifier {
        Identifier::intern(&mut self.db.interner, name, span)
    }

    /// Scope a visibility kind written in `module`.
    fn scoped(&self, kind: VisibilityKind, module: Option<ModuleId>) -> VisibilityInfo {
        match module.and_then(|module| self.db.modules.visibility_scope(kind, module)) {
            Some(scope) if kind == VisibilityKind::Parent => VisibilityInfo::parent(scope, None),
            Some(scope) => VisibilityInfo::scoped(kind, scope),
            None => VisibilityInfo::public(),
        }
    }

    /// Create a module. Its visibility is scoped relative to its parent;
    /// top-level modules are always public.
    pub fn add_module(
        &mut self,
        name: Identifier,
        path: impl Into<PathBuf>,
        parent: Option<ModuleId>,
        kind: ModuleKind,
        visibility: VisibilityKind,
    ) -> ModuleId {
        let visibility = self.scoped(visibility, parent);
        self.db
            .modules
            .create(name, path, parent, kind, visibility)
    }

    /// Declare a node in `module`. A failed declaration is reported and
    /// yields `None`.
    pub fn declare(&mut self, module: ModuleId, node: DeclNode) -> Result<Option<EntityId>, Abort> {
        match node.create_entity(module, &mut self.db) {
            Ok(entity) => {
                self.scheduler.adopt(entity, node);
                Ok(Some(entity))
            }
            Err(error) => {
                self.diagnostics.report(error)?;
                Ok(None)
            }
        }
    }

    pub fn bring(
        &mut self,
        module: ModuleId,
        target: DeclId,
        visibility: VisibilityKind,
        rename: Option<Identifier>,
        span: Span,
    ) {
        let visibility = self.scoped(visibility, Some(module));
        self.db
            .modules
            .bring(module, target, visibility, rename, span);
    }

    pub fn bring_module(
        &mut self,
        module: ModuleId,
        target: ModuleId,
        visibility: VisibilityKind,
        rename: Option<Identifier>,
        wildcard: bool,
        span: Span,
    ) {
        let visibility = self.scoped(visibility, Some(module));
        self.db
            .modules
            .bring_module(module, target, visibility, rename, wildcard, span);
    }

    /// Report an error found outside the core, such as an unresolvable
    /// bring in the project description.
    pub fn report(&mut self, error: SemanticError) -> Result<(), Abort> {
        self.diagnostics.report(error)
    }

    pub fn run(&mut self, sink: &mut dyn CodegenSink) -> Result<SchedulerStats, Abort> {
        self.scheduler
            .run(&mut self.db, &mut self.diagnostics, sink)
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<SemanticError> {
        self.diagnostics.take()
    }

    pub fn into_parts(self) -> (SemaDb, Diagnostics) {
        (self.db, self.diagnostics)
    }
}
