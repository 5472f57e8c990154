// decl/substitute.rs
//
// Replacing generic parameters by their bound arguments in a template.

use kiln_identity::{Identifier, Interner};

use super::{
    AliasDecl, Case, DeclNode, Field, FunctionDecl, GenericArgRef, GenericBody, Param, TypeDecl,
    TypeRef, TypeRefKind, ValueRef,
};
use crate::const_eval::ConstExpr;
use crate::errors::SemanticError;
use crate::generic::BindingFrame;
use crate::types::GenericArg;

type Result<T> = std::result::Result<T, SemanticError>;

/// The single identifier of a path like `T`, if that is all it is.
fn bare_name(tref: &TypeRef) -> Option<Identifier> {
    match &tref.kind {
        TypeRefKind::Path { segments, args } if args.is_empty() && segments.len() == 1 => {
            Some(segments[0])
        }
        _ => None,
    }
}

impl TypeRef {
    pub(crate) fn substitute(&self, frame: &BindingFrame, interner: &Interner) -> Result<TypeRef> {
        if let Some(name) = bare_name(self)
            && let Some(arg) = frame.get(name.name)
        {
            return match arg {
                GenericArg::Type(ty) => Ok(TypeRef::new(TypeRefKind::Resolved(ty.clone()), self.span)),
                GenericArg::Value(_) => Err(SemanticError::GenericArgKindMismatch {
                    param: name.as_str(interner).to_string(),
                    expected: "type".to_string(),
                    found: arg.describe().to_string(),
                    span: self.span.into(),
                }),
            };
        }

        let kind = match &self.kind {
            TypeRefKind::Path { segments, args } => TypeRefKind::Path {
                segments: segments.clone(),
                args: substitute_args(args, frame, interner)?,
            },
            TypeRefKind::Pointer(inner) => {
                TypeRefKind::Pointer(Box::new(inner.substitute(frame, interner)?))
            }
            TypeRefKind::Array { elem, len } => TypeRefKind::Array {
                elem: Box::new(elem.substitute(frame, interner)?),
                len: len.bind(frame),
            },
            other => other.clone(),
        };
        Ok(TypeRef::new(kind, self.span))
    }
}

fn substitute_args(
    args: &[GenericArgRef],
    frame: &BindingFrame,
    interner: &Interner,
) -> Result<Vec<GenericArgRef>> {
    args.iter()
        .map(|arg| match arg {
            GenericArgRef::Type(tref) => {
                // `N` parses as a type path; a value binding turns it back
                // into a value argument.
                if let Some(name) = bare_name(tref)
                    && let Some(bound @ GenericArg::Value(_)) = frame.get(name.name)
                {
                    return Ok(GenericArgRef::Value(ConstExpr::literal(bound, tref.span)));
                }
                Ok(GenericArgRef::Type(tref.substitute(frame, interner)?))
            }
            GenericArgRef::Value(expr) => Ok(GenericArgRef::Value(expr.bind(frame))),
        })
        .collect()
}

impl ValueRef {
    pub(crate) fn substitute(&self, frame: &BindingFrame, interner: &Interner) -> Result<ValueRef> {
        Ok(ValueRef {
            segments: self.segments.clone(),
            args: substitute_args(&self.args, frame, interner)?,
            span: self.span,
        })
    }
}

impl FunctionDecl {
    fn substitute(&self, name: Identifier, frame: &BindingFrame, interner: &Interner) -> Result<Self> {
        Ok(FunctionDecl {
            name,
            visibility: self.visibility,
            params: self
                .params
                .iter()
                .map(|param| {
                    Ok(Param {
                        name: param.name,
                        ty: param.ty.substitute(frame, interner)?,
                    })
                })
                .collect::<Result<_>>()?,
            ret: self
                .ret
                .as_ref()
                .map(|ret| ret.substitute(frame, interner))
                .transpose()?,
            body: self
                .body
                .iter()
                .map(|call| call.substitute(frame, interner))
                .collect::<Result<_>>()?,
        })
    }
}

impl TypeDecl {
    fn substitute(&self, name: Identifier, frame: &BindingFrame, interner: &Interner) -> Result<Self> {
        Ok(TypeDecl {
            name,
            visibility: self.visibility,
            kind: self.kind,
            fields: self
                .fields
                .iter()
                .map(|field| {
                    Ok(Field {
                        name: field.name,
                        ty: field.ty.substitute(frame, interner)?,
                    })
                })
                .collect::<Result<_>>()?,
            mixins: self
                .mixins
                .iter()
                .map(|mixin| mixin.substitute(frame, interner))
                .collect::<Result<_>>()?,
            cases: self
                .cases
                .iter()
                .map(|case| {
                    Ok(Case {
                        name: case.name,
                        payload: case
                            .payload
                            .as_ref()
                            .map(|payload| payload.substitute(frame, interner))
                            .transpose()?,
                    })
                })
                .collect::<Result<_>>()?,
        })
    }
}

impl GenericBody {
    /// The declaration this body becomes under `frame`, named `name`.
    pub(crate) fn instantiate(
        &self,
        name: Identifier,
        frame: &BindingFrame,
        interner: &Interner,
    ) -> Result<DeclNode> {
        Ok(match self {
            GenericBody::Function(decl) => {
                DeclNode::Function(decl.substitute(name, frame, interner)?)
            }
            GenericBody::Type(decl) => DeclNode::Type(decl.substitute(name, frame, interner)?),
            GenericBody::Alias(decl) => DeclNode::Alias(AliasDecl {
                name,
                visibility: decl.visibility,
                target: decl.target.substitute(frame, interner)?,
            }),
        })
    }
}
