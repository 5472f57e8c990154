// decl/phases.rs
//
// The scheduler contract: register a declaration, declare what its next
// phase needs, then perform that phase.

use kiln_identity::{DeclId, EntityId, ModuleId};
use rustc_hash::FxHashSet;

use super::{
    AggregateKind, AliasDecl, DeclNode, FunctionDecl, GenericDecl, GlobalDecl, Resolver, TypeDecl,
};
use crate::codegen::{CodegenSink, Emitted, EmittedItem};
use crate::db::{Members, SemaDb};
use crate::entity::{
    AGGREGATE_PLAN, ALIAS_PLAN, DependencyStrength, FUNCTION_PLAN, GENERIC_PLAN, GLOBAL_PLAN,
    OPAQUE_PLAN, Phase, PhasePlan,
};
use crate::errors::SemanticError;
use crate::module::DeclKind;
use crate::types::Ty;

type Result<T> = std::result::Result<T, SemanticError>;

use DependencyStrength::{Full, Partial};

impl DeclNode {
    pub fn plan(&self) -> &'static PhasePlan {
        match self {
            DeclNode::Function(_) => &FUNCTION_PLAN,
            DeclNode::Type(decl) if decl.kind == AggregateKind::Opaque => &OPAQUE_PLAN,
            DeclNode::Type(_) => &AGGREGATE_PLAN,
            DeclNode::Global(_) => &GLOBAL_PLAN,
            DeclNode::Alias(_) => &ALIAS_PLAN,
            DeclNode::Generic(_) => &GENERIC_PLAN,
        }
    }

    /// Register the declaration in `module` and create its entity.
    pub fn create_entity(&self, module: ModuleId, db: &mut SemaDb) -> Result<EntityId> {
        let name = self.name();
        let namespace = self.namespace();
        if let Some(previous) = db.modules.find_collision(module, namespace, name.name) {
            return Err(SemanticError::NameCollision {
                name: name.as_str(&db.interner).to_string(),
                span: name.span.into(),
                previous: db.modules.decl(previous).name.span.into(),
            });
        }

        let visibility = db.visibility_info(self.visibility(), module)?;
        let kind = self.kind();
        let decl = db
            .modules
            .add_declaration(module, kind, namespace, name, visibility);
        if let DeclNode::Generic(generic) = self {
            db.generics.register(decl, module, generic.clone());
        }
        let entity = db.create_entity(decl, kind, self.plan());
        tracing::trace!(name = %db.qualified_name(decl), kind = kind.as_str(), "entity created");
        Ok(entity)
    }

    /// Declare the dependencies of `phase`, before it runs.
    pub fn update_dependencies(&self, phase: Phase, entity: EntityId, db: &mut SemaDb) -> Result<()> {
        match self {
            DeclNode::Function(decl) => decl.update_dependencies(phase, entity, db),
            DeclNode::Type(decl) => decl.update_dependencies(phase, entity, db),
            DeclNode::Global(decl) => decl.update_dependencies(phase, entity, db),
            DeclNode::Alias(decl) => decl.update_dependencies(phase, entity, db),
            DeclNode::Generic(_) => Ok(()),
        }
    }

    /// Perform `phase`, handing finished results to `sink`.
    pub fn do_phase(
        &self,
        phase: Phase,
        entity: EntityId,
        db: &mut SemaDb,
        sink: &mut dyn CodegenSink,
    ) -> Result<()> {
        let payload = match self {
            DeclNode::Function(decl) => decl.do_phase(phase, entity, db)?,
            DeclNode::Type(decl) => decl.do_phase(phase, entity, db)?,
            DeclNode::Global(decl) => decl.do_phase(phase, entity, db)?,
            DeclNode::Alias(decl) => decl.do_phase(phase, entity, db)?,
            DeclNode::Generic(decl) => decl.do_phase(phase, db)?,
        };
        if let Some(payload) = payload {
            let state = db.entities.get(entity);
            let (decl, module) = (state.decl, state.module);
            sink.emit(EmittedItem {
                decl,
                entity,
                module,
                name: db.qualified_name(decl),
                payload,
            });
        }
        Ok(())
    }
}

fn resolver(db: &mut SemaDb, entity: EntityId) -> Resolver<'_> {
    let decl = db.entities.get(entity).decl;
    Resolver::for_decl(db, decl)
}

impl FunctionDecl {
    fn signature(&self, entity: EntityId, db: &mut SemaDb) -> Result<(Vec<Ty>, Option<Ty>)> {
        let mut resolver = resolver(db, entity);
        let params = self
            .params
            .iter()
            .map(|param| resolver.resolve_type(&param.ty))
            .collect::<Result<Vec<_>>>()?;
        let ret = self
            .ret
            .as_ref()
            .map(|ret| resolver.resolve_type(ret))
            .transpose()?;
        Ok((params, ret))
    }

    fn calls(&self, entity: EntityId, db: &mut SemaDb) -> Result<Vec<DeclId>> {
        let mut resolver = resolver(db, entity);
        self.body
            .iter()
            .map(|call| resolver.resolve_value(call))
            .collect()
    }

    fn update_dependencies(&self, phase: Phase, entity: EntityId, db: &mut SemaDb) -> Result<()> {
        match phase {
            Phase::Signature => {
                let (params, ret) = self.signature(entity, db)?;
                for ty in params.iter().chain(ret.as_ref()) {
                    db.require_type(entity, ty, Partial);
                }
            }
            Phase::Body => {
                for target in self.calls(entity, db)? {
                    db.require(entity, target, Partial);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn do_phase(&self, phase: Phase, entity: EntityId, db: &mut SemaDb) -> Result<Option<Emitted>> {
        Ok(match phase {
            Phase::Signature => {
                let (params, ret) = self.signature(entity, db)?;
                Some(Emitted::Signature { params, ret })
            }
            Phase::Body => Some(Emitted::Body {
                calls: self.calls(entity, db)?,
            }),
            _ => None,
        })
    }
}

impl TypeDecl {
    fn resolve_members(&self, entity: EntityId, db: &mut SemaDb) -> Result<Members> {
        let mut resolver = resolver(db, entity);
        let mut members = Members::default();
        for field in &self.fields {
            members
                .fields
                .push((field.name.name, resolver.resolve_type(&field.ty)?));
        }
        for mixin in &self.mixins {
            members.mixins.push(resolver.resolve_type(mixin)?);
        }
        for case in &self.cases {
            let payload = case
                .payload
                .as_ref()
                .map(|payload| resolver.resolve_type(payload))
                .transpose()?;
            members.cases.push((case.name.name, payload));
        }
        Ok(members)
    }

    fn update_dependencies(&self, phase: Phase, entity: EntityId, db: &mut SemaDb) -> Result<()> {
        match phase {
            Phase::Members => {
                let members = self.resolve_members(entity, db)?;
                for ty in members.types() {
                    db.require_type(entity, ty, Partial);
                }
            }
            Phase::Layout => {
                // Aliases are complete by now, so by-value parts can be
                // followed to the types they name.
                let decl = db.entities.get(entity).decl;
                let by_value: FxHashSet<_> = db
                    .members(decl)
                    .into_iter()
                    .flat_map(Members::types)
                    .flat_map(|ty| db.canonical(ty).named_parts())
                    .filter_map(|(target, by_value)| by_value.then_some(target))
                    .collect();
                let mut targets: Vec<_> = by_value.into_iter().collect();
                targets.sort();
                for target in targets {
                    db.require(entity, target, Full);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn do_phase(&self, phase: Phase, entity: EntityId, db: &mut SemaDb) -> Result<Option<Emitted>> {
        let decl = db.entities.get(entity).decl;
        Ok(match (phase, self.kind.decl_kind()) {
            (Phase::Header, DeclKind::Opaque) => Some(Emitted::Opaque),
            (Phase::Header, _) => None,
            (Phase::Members, _) => {
                let members = self.resolve_members(entity, db)?;
                db.set_members(decl, members);
                None
            }
            (Phase::Layout, _) => {
                let members = db.members(decl).cloned().unwrap_or_default();
                Some(Emitted::Layout {
                    fields: members
                        .fields
                        .iter()
                        .map(|(name, ty)| (*name, db.canonical(ty)))
                        .collect(),
                    mixins: members.mixins.iter().map(|ty| db.canonical(ty)).collect(),
                    cases: members
                        .cases
                        .iter()
                        .map(|(name, payload)| (*name, payload.as_ref().map(|ty| db.canonical(ty))))
                        .collect(),
                })
            }
            _ => None,
        })
    }
}

impl GlobalDecl {
    fn update_dependencies(&self, phase: Phase, entity: EntityId, db: &mut SemaDb) -> Result<()> {
        match phase {
            Phase::Signature => {
                let ty = resolver(db, entity).resolve_type(&self.ty)?;
                db.require_type(entity, &ty, Partial);
            }
            Phase::Initializer => {
                let mut reads = Vec::with_capacity(self.init.len());
                let mut resolver = resolver(db, entity);
                for read in &self.init {
                    reads.push(resolver.resolve_value(read)?);
                }
                for target in reads {
                    let strength = if db.effective_kind(target) == DeclKind::Global {
                        Full
                    } else {
                        Partial
                    };
                    db.require(entity, target, strength);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn do_phase(&self, phase: Phase, entity: EntityId, db: &mut SemaDb) -> Result<Option<Emitted>> {
        Ok(match phase {
            Phase::Signature => Some(Emitted::GlobalType {
                ty: resolver(db, entity).resolve_type(&self.ty)?,
            }),
            Phase::Initializer => {
                let mut resolver = resolver(db, entity);
                let reads = self
                    .init
                    .iter()
                    .map(|read| resolver.resolve_value(read))
                    .collect::<Result<Vec<_>>>()?;
                Some(Emitted::GlobalInit { reads })
            }
            _ => None,
        })
    }
}

impl AliasDecl {
    fn update_dependencies(&self, phase: Phase, entity: EntityId, db: &mut SemaDb) -> Result<()> {
        if phase != Phase::Target {
            return Ok(());
        }
        let target = resolver(db, entity).resolve_type(&self.target)?;
        match target {
            Ty::Named(decl) if db.effective_kind(decl) == DeclKind::Alias => {
                db.require(entity, decl, Full);
            }
            ref other => db.require_type(entity, other, Partial),
        }
        Ok(())
    }

    fn do_phase(&self, phase: Phase, entity: EntityId, db: &mut SemaDb) -> Result<Option<Emitted>> {
        if phase != Phase::Target {
            return Ok(None);
        }
        let target = resolver(db, entity).resolve_type(&self.target)?;
        let target = db.canonical(&target);
        let decl = db.entities.get(entity).decl;
        db.set_alias_target(decl, target.clone());
        Ok(Some(Emitted::AliasTarget { target }))
    }
}

impl GenericDecl {
    /// Headers only check the parameter list; bodies are checked per
    /// variant.
    fn do_phase(&self, phase: Phase, db: &mut SemaDb) -> Result<Option<Emitted>> {
        if phase != Phase::Header {
            return Ok(None);
        }
        for (index, param) in self.params.iter().enumerate() {
            if let Some(previous) = self.params[..index]
                .iter()
                .find(|earlier| earlier.name.name == param.name.name)
            {
                return Err(SemanticError::NameCollision {
                    name: param.name.as_str(&db.interner).to_string(),
                    span: param.name.span.into(),
                    previous: previous.name.span.into(),
                });
            }
        }
        Ok(None)
    }
}
