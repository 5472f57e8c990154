// generic/instantiate.rs
//
// Monomorphization of a generic for one argument list.

use kiln_identity::{DeclId, Identifier, Span};

use super::{BindingFrame, GenericDefault, GenericParam, GenericTemplate};
use crate::const_eval::{eval, eval_bool};
use crate::db::SemaDb;
use crate::decl::{DeclNode, Resolver};
use crate::errors::SemanticError;
use crate::module::DeclKind;
use crate::types::{GenericArg, GenericArgs};
use crate::visibility::AccessInfo;

type Result<T> = std::result::Result<T, SemanticError>;

enum Built {
    /// Defaults completed the arguments to a list already cached.
    Cached(DeclId),
    New {
        args: GenericArgs,
        name: Identifier,
        node: DeclNode,
    },
}

/// The variant of `generic` for `args`, created on first request.
///
/// The new variant is registered in the generic's module and its entity is
/// queued on the database for the scheduler to adopt.
#[tracing::instrument(level = "debug", skip_all, fields(generic = generic.index()))]
pub fn instantiate(db: &mut SemaDb, generic: DeclId, args: GenericArgs, span: Span) -> Result<DeclId> {
    // Only a list that misses after defaults counts as a miss.
    if db.generics.contains(generic, &args)
        && let Some(variant) = db.generics.lookup(generic, &args)
    {
        tracing::trace!(variant = %db.qualified_name(variant), "variant cache hit");
        return Ok(variant);
    }
    let Some(template) = db.generics.template(generic).cloned() else {
        return Err(SemanticError::NotGeneric {
            name: db.qualified_name(generic),
            span: span.into(),
        });
    };
    if db.instantiation.is_active(generic) {
        return Err(SemanticError::RecursiveInstantiation {
            name: db.qualified_name(generic),
            span: span.into(),
        });
    }

    let (min, max) = (template.min_args(), template.max_args());
    if args.len() > max {
        return Err(SemanticError::WrongGenericArgCount {
            generic: db.qualified_name(generic),
            expected: if min == max {
                max.to_string()
            } else {
                format!("{min} to {max}")
            },
            found: args.len(),
            span: span.into(),
        });
    }

    let built = db.with_frame(BindingFrame::new(generic), |db| {
        build_variant(db, &template, &args, span)
    })?;
    let (args, name, node) = match built {
        Built::Cached(variant) => return Ok(variant),
        Built::New { args, name, node } => (args, name, node),
    };

    let info = db.modules.decl(generic);
    let (namespace, visibility) = (info.namespace, info.visibility);
    let variant = db.modules.add_declaration(
        template.module,
        DeclKind::Variant,
        namespace,
        name,
        visibility,
    );
    db.modules.decl_mut(variant).generic = Some(generic);
    let entity = db.create_entity(variant, node.kind(), node.plan());
    db.spawn(entity, node);
    db.generics.insert(generic, args, variant);

    tracing::debug!(variant = %db.qualified_name(variant), "variant created");
    Ok(variant)
}

/// Snapshot of the innermost frame.
fn current_frame(db: &SemaDb, generic: DeclId) -> BindingFrame {
    db.instantiation
        .current()
        .cloned()
        .unwrap_or_else(|| BindingFrame::new(generic))
}

fn build_variant(
    db: &mut SemaDb,
    template: &GenericTemplate,
    args: &GenericArgs,
    span: Span,
) -> Result<Built> {
    for (index, param) in template.node.params.iter().enumerate() {
        let arg = match args.get(index) {
            Some(arg) => arg.clone(),
            None => default_arg(db, template, param, span)?,
        };
        if !param.kind.accepts(&arg) {
            return Err(SemanticError::GenericArgKindMismatch {
                param: param.name.as_str(&db.interner).to_string(),
                expected: param.kind.describe().to_string(),
                found: arg.describe().to_string(),
                span: span.into(),
            });
        }
        if let Some(frame) = db.instantiation.current_mut() {
            frame.bind(param.name.name, arg);
        }
    }

    let frame = current_frame(db, template.decl);
    let full: GenericArgs = frame.args().cloned().collect();

    if let Some(constraint) = &template.node.constraint
        && !eval_bool(constraint, Some(&frame), &db.interner)?
    {
        return Err(SemanticError::ConstraintViolation {
            generic: db.qualified_name(template.decl),
            variant: canonical_name(db, template, &full),
            span: span.into(),
            constraint: constraint.span.into(),
        });
    }

    if let Some(variant) = db.generics.lookup(template.decl, &full) {
        return Ok(Built::Cached(variant));
    }

    let name_text = canonical_name(db, template, &full);
    let name = Identifier::intern(&mut db.interner, &name_text, template.node.name.span);
    let node = template.node.body.instantiate(name, &frame, &db.interner)?;
    Ok(Built::New {
        args: full,
        name,
        node,
    })
}

/// Value of an omitted parameter. Defaults see the parameters bound
/// before them.
fn default_arg(
    db: &mut SemaDb,
    template: &GenericTemplate,
    param: &GenericParam,
    span: Span,
) -> Result<GenericArg> {
    let frame = current_frame(db, template.decl);
    match &param.default {
        None => Err(SemanticError::MissingGenericArg {
            generic: db.qualified_name(template.decl),
            param: param.name.as_str(&db.interner).to_string(),
            span: span.into(),
        }),
        Some(GenericDefault::Value(expr)) => eval(expr, Some(&frame), &db.interner),
        Some(GenericDefault::Type(tref)) => {
            let bound = tref.substitute(&frame, &db.interner)?;
            let access = AccessInfo::from_module(template.module);
            Resolver::new(db, template.module, access)
                .resolve_type(&bound)
                .map(GenericArg::Type)
        }
    }
}

/// `Name<arg,arg,...>` with types written by their qualified names.
fn canonical_name(db: &SemaDb, template: &GenericTemplate, args: &GenericArgs) -> String {
    let args: Vec<String> = args.iter().map(|arg| db.display_arg(arg)).collect();
    format!(
        "{}<{}>",
        template.node.name.as_str(&db.interner),
        args.join(",")
    )
}
