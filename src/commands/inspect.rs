// src/commands/inspect.rs

use std::fmt::Write as _;
use std::process::ExitCode;

use kiln_sema::{Emitted, RecordingSink, SemaDb};

use super::common::{failure_summary, load_project, render_diagnostics};
use crate::cli::InspectArgs;
use crate::manifest::{BuildOverrides, Project};

/// Run a manifest and print the selected views of the result.
pub fn inspect_manifest(args: &InspectArgs, overrides: BuildOverrides) -> ExitCode {
    let Ok(mut project) = load_project(&args.manifest, overrides) else {
        return ExitCode::FAILURE;
    };
    let mut sink = RecordingSink::new();
    // Errors are rendered below; whatever completed is still shown.
    let _ = project.run(&mut sink);

    let (modules, variants, emitted) = args.sections();
    print!("{}", render_sections(&project, &sink, modules, variants, emitted));

    let count = render_diagnostics(&mut project);
    if count > 0 {
        eprintln!("{}", failure_summary(&project.name, count));
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

pub fn render_sections(
    project: &Project,
    sink: &RecordingSink,
    modules: bool,
    variants: bool,
    emitted: bool,
) -> String {
    let db = project.program.db();
    let mut out = String::new();
    if modules {
        out.push_str("modules:\n");
        render_modules(db, &mut out);
    }
    if variants {
        out.push_str("variants:\n");
        for (generic, variant) in db.generics.all_variants() {
            let _ = writeln!(
                out,
                "  {} -> {}",
                db.qualified_name(generic),
                db.qualified_name(variant)
            );
        }
    }
    if emitted {
        out.push_str("emitted:\n");
        for item in &sink.items {
            let _ = writeln!(out, "  {} {}{}", item.payload.label(), item.name, detail(db, &item.payload));
        }
        for (_, name) in &sink.completed_modules {
            let _ = writeln!(out, "  module complete {name}");
        }
    }
    out
}

fn render_modules(db: &SemaDb, out: &mut String) {
    for module in db.modules.iter() {
        let depth = db.modules.ancestors(module.id).count();
        let _ = writeln!(
            out,
            "{:indent$}{} [{}] {}",
            "",
            module.name.as_str(&db.interner),
            module.kind.as_str(),
            db.modules.full_name(module.id, &db.interner),
            indent = depth * 2,
        );
    }
}

fn detail(db: &SemaDb, payload: &Emitted) -> String {
    let list = |tys: &mut dyn Iterator<Item = String>| tys.collect::<Vec<_>>().join(", ");
    match payload {
        Emitted::Signature { params, ret } => {
            let params = list(&mut params.iter().map(|ty| db.display_ty(ty)));
            match ret {
                Some(ret) => format!(" ({params}) -> {}", db.display_ty(ret)),
                None => format!(" ({params})"),
            }
        }
        Emitted::Body { calls } | Emitted::GlobalInit { reads: calls } => {
            format!(" [{}]", list(&mut calls.iter().map(|decl| db.qualified_name(*decl))))
        }
        Emitted::Layout {
            fields,
            mixins,
            cases,
        } => {
            let fields = fields.iter().map(|(name, ty)| {
                format!("{}: {}", db.interner.resolve(*name), db.display_ty(ty))
            });
            let mixins = mixins.iter().map(|ty| format!("..{}", db.display_ty(ty)));
            let cases = cases.iter().map(|(name, payload)| match payload {
                Some(ty) => format!("{}({})", db.interner.resolve(*name), db.display_ty(ty)),
                None => db.interner.resolve(*name).to_string(),
            });
            format!(" {{ {} }}", list(&mut mixins.chain(fields).chain(cases)))
        }
        Emitted::Opaque => String::new(),
        Emitted::GlobalType { ty } | Emitted::AliasTarget { target: ty } => {
            format!(" = {}", db.display_ty(ty))
        }
    }
}
