// module/brought.rs
//
// Non-owning references a module brings into scope.

use kiln_identity::{DeclId, Identifier, ModuleId, Span, Symbol};

use super::ModuleTree;
use crate::visibility::VisibilityInfo;

/// A brought entity. Its visibility gates who can see the bring itself and
/// is independent of the target's own visibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Brought<T> {
    pub target: T,
    pub rename: Option<Identifier>,
    pub visibility: VisibilityInfo,
    pub span: Span,
}

impl<T> Brought<T> {
    pub fn new(target: T, rename: Option<Identifier>, visibility: VisibilityInfo, span: Span) -> Self {
        Self {
            target,
            rename,
            visibility,
            span,
        }
    }

    /// The name the target is known by in the bringing module.
    pub fn local_name(&self, target_name: Symbol) -> Symbol {
        self.rename.map_or(target_name, |rename| rename.name)
    }
}

/// A brought module. A wildcard bring makes the module's contents
/// transparent to unqualified lookup instead of naming the module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroughtModule {
    pub brought: Brought<ModuleId>,
    pub wildcard: bool,
}

impl ModuleTree {
    /// Bring the declaration `target` into `module`.
    pub fn bring(
        &mut self,
        module: ModuleId,
        target: DeclId,
        visibility: VisibilityInfo,
        rename: Option<Identifier>,
        span: Span,
    ) {
        let kind = self.decl(target).kind;
        self.module_mut(module)
            .brought
            .of_mut(kind)
            .push(Brought::new(target, rename, visibility, span));
    }

    /// Bring the module `target` into `module`, either by name or as a
    /// wildcard.
    pub fn bring_module(
        &mut self,
        module: ModuleId,
        target: ModuleId,
        visibility: VisibilityInfo,
        rename: Option<Identifier>,
        wildcard: bool,
        span: Span,
    ) {
        self.module_mut(module).brought_modules.push(BroughtModule {
            brought: Brought::new(target, rename, visibility, span),
            wildcard,
        });
    }
}
