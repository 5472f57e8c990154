// test_support.rs
//
// Builders for declaration nodes in unit tests.

use kiln_identity::{DeclId, Identifier, ModuleId, PrimitiveType, Span};

use crate::codegen::RecordingSink;
use crate::config::SchedulerConfig;
use crate::const_eval::{ConstExpr, ConstExprKind};
use crate::decl::{
    AggregateKind, AliasDecl, Case, DeclNode, Field, FunctionDecl, GenericArgRef, GenericBody,
    GenericDecl, GlobalDecl, Param, TypeDecl, TypeRef, ValueRef,
};
use crate::generic::{GenericDefault, GenericParam, GenericParamKind};
use crate::module::{DeclKind, ModuleKind};
use crate::program::Program;
use crate::scheduler::SchedulerStats;
use crate::visibility::{AccessInfo, VisibilityKind, VisibilitySpec};

pub struct Fixture {
    pub program: Program,
    pub sink: RecordingSink,
    /// Hands out distinct spans so diagnostics can be told apart.
    next_offset: usize,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::new())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            program: Program::new(config),
            sink: RecordingSink::new(),
            next_offset: 0,
        }
    }

    pub fn span(&mut self) -> Span {
        let start = self.next_offset;
        self.next_offset += 2;
        Span::new(start, start + 1)
    }

    pub fn ident(&mut self, name: &str) -> Identifier {
        let span = self.span();
        self.program.ident(name, span)
    }

    pub fn library(&mut self, name: &str, parent: Option<ModuleId>) -> ModuleId {
        self.module(name, parent, ModuleKind::Library)
    }

    pub fn file(&mut self, name: &str, parent: ModuleId) -> ModuleId {
        self.module(name, Some(parent), ModuleKind::File)
    }

    pub fn module(&mut self, name: &str, parent: Option<ModuleId>, kind: ModuleKind) -> ModuleId {
        let ident = self.ident(name);
        self.program
            .add_module(ident, name, parent, kind, VisibilityKind::Public)
    }

    pub fn declare(&mut self, module: ModuleId, node: DeclNode) -> Option<DeclId> {
        let entity = self.program.declare(module, node).ok().flatten()?;
        Some(self.program.db().entities.get(entity).decl)
    }

    pub fn run(&mut self) -> SchedulerStats {
        let mut sink = std::mem::take(&mut self.sink);
        let stats = self.program.run(&mut sink);
        self.sink = sink;
        stats.unwrap_or_default()
    }

    pub fn errors(&self) -> Vec<String> {
        self.program
            .diagnostics()
            .iter()
            .map(|error| error.to_string())
            .collect()
    }

    pub fn status(&self, decl: DeclId) -> crate::entity::Status {
        let db = self.program.db();
        let entity = db.entity_of(decl).unwrap_or_else(|| panic!("{decl:?} has no entity"));
        db.entities.get(entity).status()
    }

    pub fn is_poisoned(&self, decl: DeclId) -> bool {
        let db = self.program.db();
        db.entity_of(decl)
            .is_some_and(|entity| db.entities.get(entity).is_poisoned())
    }

    /// A variant of `generic` by its canonical name, like `Pair<i32,4>`.
    pub fn variant(&mut self, module: ModuleId, name: &str) -> Option<DeclId> {
        let symbol = self.program.db_mut().interner.intern(name);
        self.program.db().modules.get(
            module,
            DeclKind::Variant,
            symbol,
            &AccessInfo::from_module(module),
        )
    }

    // Type references.

    pub fn prim(&mut self, prim: PrimitiveType) -> TypeRef {
        let span = self.span();
        TypeRef::primitive(prim, span)
    }

    pub fn named(&mut self, path: &str) -> TypeRef {
        self.generic_ty(path, Vec::new())
    }

    pub fn generic_ty(&mut self, path: &str, args: Vec<GenericArgRef>) -> TypeRef {
        let segments = path.split("::").map(|s| self.ident(s)).collect();
        let span = self.span();
        TypeRef::path(segments, args, span)
    }

    pub fn ptr(&mut self, inner: TypeRef) -> TypeRef {
        let span = self.span();
        TypeRef::pointer(inner, span)
    }

    pub fn array(&mut self, elem: TypeRef, len: ConstExpr) -> TypeRef {
        let span = self.span();
        TypeRef::array(elem, len, span)
    }

    pub fn int(&mut self, value: i64) -> ConstExpr {
        let span = self.span();
        ConstExpr::new(ConstExprKind::Int(value), span)
    }

    pub fn param_ref(&mut self, name: &str) -> ConstExpr {
        let ident = self.ident(name);
        ConstExpr::new(ConstExprKind::Param(ident), ident.span)
    }

    pub fn binary(&mut self, op: crate::const_eval::BinaryOp, lhs: ConstExpr, rhs: ConstExpr) -> ConstExpr {
        let span = lhs.span.merge(rhs.span);
        ConstExpr::new(ConstExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), span)
    }

    pub fn value_ref(&mut self, path: &str, args: Vec<GenericArgRef>) -> ValueRef {
        let segments = path.split("::").map(|s| self.ident(s)).collect();
        let span = self.span();
        ValueRef {
            segments,
            args,
            span,
        }
    }

    // Declarations.

    pub fn function(
        &mut self,
        name: &str,
        params: Vec<TypeRef>,
        ret: Option<TypeRef>,
        calls: Vec<ValueRef>,
    ) -> FunctionDecl {
        let name = self.ident(name);
        let params = params
            .into_iter()
            .enumerate()
            .map(|(index, ty)| Param {
                name: self.ident(&format!("p{index}")),
                ty,
            })
            .collect();
        FunctionDecl {
            name,
            visibility: VisibilitySpec::Public,
            params,
            ret,
            body: calls,
        }
    }

    pub fn aggregate(&mut self, kind: AggregateKind, name: &str, fields: Vec<(&str, TypeRef)>) -> TypeDecl {
        let name = self.ident(name);
        let fields = fields
            .into_iter()
            .map(|(field, ty)| Field {
                name: self.ident(field),
                ty,
            })
            .collect();
        TypeDecl {
            name,
            visibility: VisibilitySpec::Public,
            kind,
            fields,
            mixins: Vec::new(),
            cases: Vec::new(),
        }
    }

    pub fn strukt(&mut self, name: &str, fields: Vec<(&str, TypeRef)>) -> DeclNode {
        DeclNode::Type(self.aggregate(AggregateKind::Struct, name, fields))
    }

    pub fn choice(&mut self, name: &str, cases: Vec<(&str, Option<TypeRef>)>) -> DeclNode {
        let mut decl = self.aggregate(AggregateKind::Choice, name, Vec::new());
        decl.cases = cases
            .into_iter()
            .map(|(case, payload)| Case {
                name: self.ident(case),
                payload,
            })
            .collect();
        DeclNode::Type(decl)
    }

    pub fn opaque(&mut self, name: &str) -> DeclNode {
        DeclNode::Type(self.aggregate(AggregateKind::Opaque, name, Vec::new()))
    }

    pub fn alias(&mut self, name: &str, target: TypeRef) -> DeclNode {
        let name = self.ident(name);
        DeclNode::Alias(AliasDecl {
            name,
            visibility: VisibilitySpec::Public,
            target,
        })
    }

    pub fn global(&mut self, name: &str, ty: TypeRef, reads: Vec<ValueRef>) -> DeclNode {
        let name = self.ident(name);
        DeclNode::Global(GlobalDecl {
            name,
            visibility: VisibilitySpec::Public,
            ty,
            init: reads,
        })
    }

    pub fn type_param(&mut self, name: &str, default: Option<TypeRef>) -> GenericParam {
        GenericParam {
            name: self.ident(name),
            kind: GenericParamKind::Type,
            default: default.map(GenericDefault::Type),
        }
    }

    pub fn int_param(&mut self, name: &str, default: Option<ConstExpr>) -> GenericParam {
        GenericParam {
            name: self.ident(name),
            kind: GenericParamKind::Value(crate::types::ValueType::Int),
            default: default.map(GenericDefault::Value),
        }
    }

    pub fn generic(
        &mut self,
        name: &str,
        params: Vec<GenericParam>,
        constraint: Option<ConstExpr>,
        body: GenericBody,
    ) -> DeclNode {
        let name = self.ident(name);
        DeclNode::Generic(GenericDecl {
            name,
            visibility: VisibilitySpec::Public,
            params,
            constraint,
            body,
        })
    }
}

pub fn with_visibility(mut node: DeclNode, visibility: VisibilitySpec) -> DeclNode {
    match &mut node {
        DeclNode::Function(decl) => decl.visibility = visibility,
        DeclNode::Type(decl) => decl.visibility = visibility,
        DeclNode::Global(decl) => decl.visibility = visibility,
        DeclNode::Alias(decl) => decl.visibility = visibility,
        DeclNode::Generic(decl) => decl.visibility = visibility,
    }
    node
}
