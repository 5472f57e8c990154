// db.rs
//
// The compilation database every declaration phase works against.

use kiln_identity::{DeclId, EntityId, Interner, ModuleId, Symbol};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::decl::DeclNode;
use crate::entity::{Dependency, DependencyStrength, EntityTable, PhasePlan};
use crate::errors::SemanticError;
use crate::generic::{BindingFrame, GenericRegistry, InstantiationContext};
use crate::module::{DeclKind, ModuleTree};
use crate::types::{GenericArg, Ty};
use crate::visibility::{AccessInfo, VisibilityInfo, VisibilitySpec};

/// Members of an aggregate, resolved in its members phase and read again
/// by its layout phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Members {
    pub fields: Vec<(Symbol, Ty)>,
    pub mixins: Vec<Ty>,
    pub cases: Vec<(Symbol, Option<Ty>)>,
}

impl Members {
    pub fn types(&self) -> impl Iterator<Item = &Ty> {
        self.fields
            .iter()
            .map(|(_, ty)| ty)
            .chain(self.mixins.iter())
            .chain(self.cases.iter().filter_map(|(_, payload)| payload.as_ref()))
    }
}

#[derive(Debug, Default)]
pub struct SemaDb {
    pub interner: Interner,
    pub modules: ModuleTree,
    pub entities: EntityTable,
    pub generics: GenericRegistry,
    pub instantiation: InstantiationContext,
    alias_targets: FxHashMap<DeclId, Ty>,
    members: FxHashMap<DeclId, Members>,
    /// Declarations created during a pass, waiting for the scheduler.
    spawned: Vec<(EntityId, DeclNode)>,
}

impl SemaDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interner(interner: Interner) -> Self {
        Self {
            interner,
            ..Self::default()
        }
    }

    pub fn decl_name(&self, decl: DeclId) -> &str {
        self.modules.decl(decl).name.as_str(&self.interner)
    }

    pub fn qualified_name(&self, decl: DeclId) -> String {
        self.modules.qualified_decl_name(decl, &self.interner)
    }

    pub fn entity_of(&self, decl: DeclId) -> Option<EntityId> {
        self.modules.decl(decl).entity
    }

    /// The kind a declaration behaves as: a variant behaves as its
    /// template's kind.
    pub fn effective_kind(&self, decl: DeclId) -> DeclKind {
        match self.entity_of(decl) {
            Some(entity) => self.entities.get(entity).kind,
            None => self.modules.decl(decl).kind,
        }
    }

    /// Requester context for code inside `decl`: aggregates see their own
    /// type-scoped declarations.
    pub fn access_for(&self, decl: DeclId) -> AccessInfo {
        let module = self.modules.decl(decl).module;
        match self.effective_kind(decl) {
            DeclKind::Struct | DeclKind::Mix | DeclKind::Opaque | DeclKind::Choice => {
                AccessInfo::in_type(module, decl)
            }
            _ => AccessInfo::from_module(module),
        }
    }

    /// Resolve a written visibility to its scope, relative to `module`.
    pub fn visibility_info(
        &self,
        spec: VisibilitySpec,
        module: ModuleId,
    ) -> Result<VisibilityInfo, SemanticError> {
        match spec {
            VisibilitySpec::Public => Ok(VisibilityInfo::public()),
            VisibilitySpec::Parent => Ok(VisibilityInfo::parent(module, None)),
            VisibilitySpec::Type(owner) => self
                .modules
                .resolve_unqualified(
                    module,
                    DeclKind::TYPES,
                    owner.name,
                    &AccessInfo::from_module(module),
                )
                .map(VisibilityInfo::type_scoped)
                .ok_or_else(|| SemanticError::NotFound {
                    kind: "type",
                    name: owner.as_str(&self.interner).to_string(),
                    span: owner.span.into(),
                }),
            scoped => {
                let kind = scoped.kind();
                Ok(match self.modules.visibility_scope(kind, module) {
                    Some(scope) => VisibilityInfo::scoped(kind, scope),
                    None => VisibilityInfo::public(),
                })
            }
        }
    }

    /// Create the scheduler state of a registered declaration.
    pub fn create_entity(
        &mut self,
        decl: DeclId,
        kind: DeclKind,
        plan: &'static PhasePlan,
    ) -> EntityId {
        let module = self.modules.decl(decl).module;
        let entity = self.entities.create(decl, module, kind, plan);
        self.modules.decl_mut(decl).entity = Some(entity);
        entity
    }

    /// Record that the next phase of `entity` needs `target` at `strength`.
    pub fn require(&mut self, entity: EntityId, target: DeclId, strength: DependencyStrength) {
        if let Some(target) = self.entity_of(target) {
            self.entities
                .add_dependency(entity, Dependency { target, strength });
        }
    }

    /// Record every named type in `ty` as a dependency.
    pub fn require_type(&mut self, entity: EntityId, ty: &Ty, strength: DependencyStrength) {
        for (decl, _) in ty.named_parts() {
            self.require(entity, decl, strength);
        }
    }

    pub(crate) fn spawn(&mut self, entity: EntityId, node: DeclNode) {
        self.spawned.push((entity, node));
    }

    pub(crate) fn take_spawned(&mut self) -> Vec<(EntityId, DeclNode)> {
        std::mem::take(&mut self.spawned)
    }

    /// Run `f` with `frame` pushed. The frame is popped on every path out.
    pub fn with_frame<R>(&mut self, frame: BindingFrame, f: impl FnOnce(&mut SemaDb) -> R) -> R {
        self.instantiation.push(frame);
        let result = f(self);
        self.instantiation.pop();
        result
    }

    pub(crate) fn set_alias_target(&mut self, alias: DeclId, target: Ty) {
        self.alias_targets.insert(alias, target);
    }

    pub fn alias_target(&self, alias: DeclId) -> Option<&Ty> {
        self.alias_targets.get(&alias)
    }

    pub(crate) fn set_members(&mut self, decl: DeclId, members: Members) {
        self.members.insert(decl, members);
    }

    pub fn members(&self, decl: DeclId) -> Option<&Members> {
        self.members.get(&decl)
    }

    /// `ty` with every resolved alias replaced by its target.
    pub fn canonical(&self, ty: &Ty) -> Ty {
        let mut seen = FxHashSet::default();
        self.canonical_inner(ty, &mut seen)
    }

    fn canonical_inner(&self, ty: &Ty, seen: &mut FxHashSet<DeclId>) -> Ty {
        match ty {
            Ty::Named(decl) => match self.alias_targets.get(decl) {
                Some(target) if seen.insert(*decl) => self.canonical_inner(target, seen),
                _ => ty.clone(),
            },
            Ty::Pointer(inner) => Ty::Pointer(Box::new(self.canonical_inner(inner, seen))),
            Ty::Array(elem, len) => Ty::Array(Box::new(self.canonical_inner(elem, seen)), *len),
            Ty::Primitive(_) => ty.clone(),
        }
    }

    pub fn display_ty(&self, ty: &Ty) -> String {
        match ty {
            Ty::Primitive(prim) => prim.as_str().to_string(),
            Ty::Named(decl) => self.qualified_name(*decl),
            Ty::Pointer(inner) => format!("*{}", self.display_ty(inner)),
            Ty::Array(elem, len) => format!("[{}; {len}]", self.display_ty(elem)),
        }
    }

    pub fn display_arg(&self, arg: &GenericArg) -> String {
        match arg {
            GenericArg::Type(ty) => self.display_ty(ty),
            GenericArg::Value(value) => value.to_string(),
        }
    }
}
