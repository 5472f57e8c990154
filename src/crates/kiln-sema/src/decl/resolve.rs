// decl/resolve.rs
//
// Turning written type and value references into declarations, with
// generic instantiation on demand.

use kiln_identity::{DeclId, Identifier, ModuleId, Span, Symbol};

use super::{GenericArgRef, TypeRef, TypeRefKind, ValueRef};
use crate::const_eval::{eval, eval_len};
use crate::db::SemaDb;
use crate::errors::SemanticError;
use crate::generic::instantiate;
use crate::module::{DeclKind, Namespace, PathError};
use crate::types::{GenericArg, GenericArgs, Ty};
use crate::visibility::AccessInfo;

type Result<T> = std::result::Result<T, SemanticError>;

const TYPE_LOOKUP: &[DeclKind] = &[
    DeclKind::Struct,
    DeclKind::Mix,
    DeclKind::Opaque,
    DeclKind::Choice,
    DeclKind::Alias,
    DeclKind::Generic,
];

const VALUE_LOOKUP: &[DeclKind] = &[DeclKind::Function, DeclKind::Global, DeclKind::Generic];

/// Resolves references written inside one declaration.
pub struct Resolver<'db> {
    db: &'db mut SemaDb,
    module: ModuleId,
    access: AccessInfo,
}

impl<'db> Resolver<'db> {
    pub fn new(db: &'db mut SemaDb, module: ModuleId, access: AccessInfo) -> Self {
        Self { db, module, access }
    }

    /// Resolver for code inside `decl`, with its module and access.
    pub fn for_decl(db: &'db mut SemaDb, decl: DeclId) -> Self {
        let module = db.modules.decl(decl).module;
        let access = db.access_for(decl);
        Self::new(db, module, access)
    }

    pub fn resolve_type(&mut self, tref: &TypeRef) -> Result<Ty> {
        match &tref.kind {
            TypeRefKind::Primitive(prim) => Ok(Ty::Primitive(*prim)),
            TypeRefKind::Resolved(ty) => Ok(ty.clone()),
            TypeRefKind::Pointer(inner) => Ok(Ty::Pointer(Box::new(self.resolve_type(inner)?))),
            TypeRefKind::Array { elem, len } => {
                let elem = self.resolve_type(elem)?;
                let len = eval_len(len, None, &self.db.interner)?;
                Ok(Ty::Array(Box::new(elem), len))
            }
            TypeRefKind::Path { segments, args } => {
                let decl = self.lookup_path(segments, TYPE_LOOKUP, Namespace::Type, "type", tref.span)?;
                self.apply_args(decl, args, tref.span).map(Ty::Named)
            }
        }
    }

    /// Resolve a called function or read global.
    pub fn resolve_value(&mut self, vref: &ValueRef) -> Result<DeclId> {
        let decl = self.lookup_path(&vref.segments, VALUE_LOOKUP, Namespace::Value, "value", vref.span)?;
        self.apply_args(decl, &vref.args, vref.span)
    }

    fn lookup_path(
        &self,
        segments: &[Identifier],
        kinds: &[DeclKind],
        namespace: Namespace,
        what: &'static str,
        span: Span,
    ) -> Result<DeclId> {
        let symbols: Vec<Symbol> = segments.iter().map(|segment| segment.name).collect();
        let tree = &self.db.modules;
        let found = tree.resolve_path(self.module, &symbols, kinds, &self.access);
        match found {
            Ok(decl) if tree.decl(decl).namespace == namespace => Ok(decl),
            Ok(_) | Err(PathError::Decl) => Err(SemanticError::NotFound {
                kind: what,
                name: self.join(segments),
                span: span.into(),
            }),
            Err(PathError::Module(index)) => Err(SemanticError::ModuleNotFound {
                name: self.join(&segments[..=index]),
                span: segments[index].span.into(),
            }),
        }
    }

    fn join(&self, segments: &[Identifier]) -> String {
        segments
            .iter()
            .map(|segment| segment.as_str(&self.db.interner))
            .collect::<Vec<_>>()
            .join("::")
    }

    /// Instantiate `decl` with `args` when it is generic; reject arguments
    /// on anything else. A bare generic is only accepted when every
    /// parameter has a default.
    fn apply_args(&mut self, decl: DeclId, args: &[GenericArgRef], span: Span) -> Result<DeclId> {
        let min_args = self.db.generics.template(decl).map(|template| template.min_args());
        match (min_args, args.is_empty()) {
            (None, true) => Ok(decl),
            (None, false) => Err(SemanticError::NotGeneric {
                name: self.db.qualified_name(decl),
                span: span.into(),
            }),
            (Some(0), true) => instantiate(self.db, decl, GenericArgs::new(), span),
            (Some(_), true) => Err(SemanticError::MissingGenericArgs {
                name: self.db.qualified_name(decl),
                span: span.into(),
            }),
            (Some(_), false) => {
                let args = self.resolve_args(args)?;
                instantiate(self.db, decl, args, span)
            }
        }
    }

    pub fn resolve_args(&mut self, args: &[GenericArgRef]) -> Result<GenericArgs> {
        args.iter()
            .map(|arg| match arg {
                GenericArgRef::Type(tref) => self.resolve_type(tref).map(GenericArg::Type),
                GenericArgRef::Value(expr) => eval(expr, None, &self.db.interner),
            })
            .collect()
    }
}
