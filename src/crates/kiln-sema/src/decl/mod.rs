// decl/mod.rs
//
// Declaration nodes handed over by the front end, and the three-method
// contract the scheduler drives them through.

mod phases;
mod resolve;
mod substitute;

#[cfg(test)]
mod tests;

use kiln_identity::{Identifier, PrimitiveType, Span};

use crate::const_eval::ConstExpr;
use crate::generic::GenericParam;
use crate::module::{DeclKind, Namespace};
use crate::types::Ty;
use crate::visibility::VisibilitySpec;

pub use resolve::Resolver;

/// A type as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub kind: TypeRefKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRefKind {
    /// `a::b::Name` or `Name<Args>`.
    Path {
        segments: Vec<Identifier>,
        args: Vec<GenericArgRef>,
    },
    Primitive(PrimitiveType),
    Pointer(Box<TypeRef>),
    Array {
        elem: Box<TypeRef>,
        len: ConstExpr,
    },
    /// A type already resolved, left behind by parameter substitution.
    Resolved(Ty),
}

impl TypeRef {
    pub fn new(kind: TypeRefKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn path(segments: Vec<Identifier>, args: Vec<GenericArgRef>, span: Span) -> Self {
        Self::new(TypeRefKind::Path { segments, args }, span)
    }

    pub fn primitive(ty: PrimitiveType, span: Span) -> Self {
        Self::new(TypeRefKind::Primitive(ty), span)
    }

    pub fn pointer(inner: TypeRef, span: Span) -> Self {
        Self::new(TypeRefKind::Pointer(Box::new(inner)), span)
    }

    pub fn array(elem: TypeRef, len: ConstExpr, span: Span) -> Self {
        Self::new(
            TypeRefKind::Array {
                elem: Box::new(elem),
                len,
            },
            span,
        )
    }
}

/// A generic argument as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GenericArgRef {
    Type(TypeRef),
    Value(ConstExpr),
}

impl GenericArgRef {
    pub fn span(&self) -> Span {
        match self {
            GenericArgRef::Type(ty) => ty.span,
            GenericArgRef::Value(expr) => expr.span,
        }
    }
}

/// A reference to a function or global from a body or an initializer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueRef {
    pub segments: Vec<Identifier>,
    pub args: Vec<GenericArgRef>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    pub name: Identifier,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionDecl {
    pub name: Identifier,
    pub visibility: VisibilitySpec,
    pub params: Vec<Param>,
    pub ret: Option<TypeRef>,
    /// Functions called and globals read by the body.
    pub body: Vec<ValueRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    Struct,
    Mix,
    Opaque,
    Choice,
}

impl AggregateKind {
    pub fn decl_kind(self) -> DeclKind {
        match self {
            AggregateKind::Struct => DeclKind::Struct,
            AggregateKind::Mix => DeclKind::Mix,
            AggregateKind::Opaque => DeclKind::Opaque,
            AggregateKind::Choice => DeclKind::Choice,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: Identifier,
    pub ty: TypeRef,
}

/// One case of a choice type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Case {
    pub name: Identifier,
    pub payload: Option<TypeRef>,
}

/// Struct, mix, opaque and choice declarations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDecl {
    pub name: Identifier,
    pub visibility: VisibilitySpec,
    pub kind: AggregateKind,
    pub fields: Vec<Field>,
    /// Mix types whose members are included.
    pub mixins: Vec<TypeRef>,
    pub cases: Vec<Case>,
}

impl TypeDecl {
    /// Every type the members mention, in declaration order.
    pub fn member_types(&self) -> impl Iterator<Item = &TypeRef> {
        self.fields
            .iter()
            .map(|field| &field.ty)
            .chain(self.mixins.iter())
            .chain(self.cases.iter().filter_map(|case| case.payload.as_ref()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlobalDecl {
    pub name: Identifier,
    pub visibility: VisibilitySpec,
    pub ty: TypeRef,
    /// Functions called and globals read by the initializer.
    pub init: Vec<ValueRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AliasDecl {
    pub name: Identifier,
    pub visibility: VisibilitySpec,
    pub target: TypeRef,
}

/// What a generic instantiates into.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GenericBody {
    Function(FunctionDecl),
    Type(TypeDecl),
    Alias(AliasDecl),
}

impl GenericBody {
    pub fn kind(&self) -> DeclKind {
        match self {
            GenericBody::Function(_) => DeclKind::Function,
            GenericBody::Type(ty) => ty.kind.decl_kind(),
            GenericBody::Alias(_) => DeclKind::Alias,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenericDecl {
    pub name: Identifier,
    pub visibility: VisibilitySpec,
    pub params: Vec<GenericParam>,
    pub constraint: Option<ConstExpr>,
    pub body: GenericBody,
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeclNode {
    Function(FunctionDecl),
    Type(TypeDecl),
    Global(GlobalDecl),
    Alias(AliasDecl),
    Generic(GenericDecl),
}

impl DeclNode {
    pub fn name(&self) -> Identifier {
        match self {
            DeclNode::Function(decl) => decl.name,
            DeclNode::Type(decl) => decl.name,
            DeclNode::Global(decl) => decl.name,
            DeclNode::Alias(decl) => decl.name,
            DeclNode::Generic(decl) => decl.name,
        }
    }

    pub fn visibility(&self) -> VisibilitySpec {
        match self {
            DeclNode::Function(decl) => decl.visibility,
            DeclNode::Type(decl) => decl.visibility,
            DeclNode::Global(decl) => decl.visibility,
            DeclNode::Alias(decl) => decl.visibility,
            DeclNode::Generic(decl) => decl.visibility,
        }
    }

    pub fn kind(&self) -> DeclKind {
        match self {
            DeclNode::Function(_) => DeclKind::Function,
            DeclNode::Type(decl) => decl.kind.decl_kind(),
            DeclNode::Global(_) => DeclKind::Global,
            DeclNode::Alias(_) => DeclKind::Alias,
            DeclNode::Generic(_) => DeclKind::Generic,
        }
    }

    /// Generics share the namespace of what they instantiate into.
    pub fn namespace(&self) -> Namespace {
        match self {
            DeclNode::Generic(decl) => decl.body.kind().namespace(),
            other => other.kind().namespace(),
        }
    }
}
