// src/manifest/load.rs
//
// Turning a parsed manifest into a populated `Program`: modules first,
// then declarations, then brings.

use std::fs;
use std::ops::Range;
use std::path::Path;

use rustc_hash::FxHashMap;
use toml::Spanned;

use kiln_identity::{Identifier, ModuleId, Span, Symbol};
use kiln_sema::codegen::CodegenSink;
use kiln_sema::const_eval::ConstExpr;
use kiln_sema::decl::{
    AggregateKind, AliasDecl, Case, DeclNode, Field, FunctionDecl, GenericBody, GenericDecl,
    GlobalDecl, Param, TypeDecl, TypeRef, ValueRef,
};
use kiln_sema::errors::Abort;
use kiln_sema::generic::{GenericDefault, GenericParam, GenericParamKind};
use kiln_sema::types::ValueType;
use kiln_sema::{
    AccessInfo, DeclKind, ModuleKind, Program, SchedulerConfig, SchedulerStats, SemanticError,
    VisibilityKind, VisibilitySpec,
};

use super::syntax::{parse_const_expr, parse_type, parse_value_ref};
use super::{
    BringEntry, DeclEntry, GenericParamEntry, Manifest, ModuleEntry, TypedName, VisibilityEntry,
};
use crate::errors::ManifestError;

type Result<T> = std::result::Result<T, ManifestError>;

const MODULE_KINDS: &str = "library, folder, file";
const VISIBILITIES: &str = "public, library, folder, file, parent";
const DECL_KINDS: &str = "function, struct, mix, opaque, choice, global, alias, generic";
const BODY_KINDS: &str = "function, struct, mix, opaque, choice, alias";
const PARAM_KINDS: &str = "type, int, bool";

/// Command-line settings that win over the manifest's `[build]` table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOverrides {
    pub fail_fast: bool,
    pub max_passes: Option<usize>,
}

impl BuildOverrides {
    fn apply(self, mut config: SchedulerConfig) -> SchedulerConfig {
        if self.fail_fast {
            config = config.fail_fast(true);
        }
        if self.max_passes.is_some() {
            config = config.max_passes(self.max_passes);
        }
        config
    }
}

/// A loaded manifest, ready to run.
#[derive(Debug)]
pub struct Project {
    /// How diagnostics name the manifest.
    pub name: String,
    pub source: String,
    pub program: Program,
    /// Loading stopped at its first error in fail-fast mode.
    pub aborted: bool,
}

impl Project {
    pub fn load(path: &Path, overrides: BuildOverrides) -> Result<Self> {
        let name = path.display().to_string();
        let source = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: name.clone(),
            source,
        })?;
        Self::from_source(name, source, overrides)
    }

    pub fn from_source(
        name: impl Into<String>,
        source: impl Into<String>,
        overrides: BuildOverrides,
    ) -> Result<Self> {
        let name = name.into();
        let source = source.into();
        let manifest = Manifest::parse(&source)?;
        let config = overrides.apply(manifest.build.config());
        tracing::debug!(
            manifest = %name,
            modules = manifest.modules.len(),
            decls = manifest.decls.len(),
            brings = manifest.brings.len(),
            "loading manifest"
        );

        let mut loader = Loader {
            source: &source,
            program: Program::new(config),
            modules: FxHashMap::default(),
        };
        let aborted = loader.load(&manifest)?.is_err();
        let program = loader.program;
        Ok(Self {
            name,
            source,
            program,
            aborted,
        })
    }

    /// Schedule every declaration. A project whose loading already
    /// aborted does not run.
    pub fn run(&mut self, sink: &mut dyn CodegenSink) -> std::result::Result<SchedulerStats, Abort> {
        if self.aborted {
            return Err(Abort);
        }
        self.program.run(sink)
    }

    pub fn has_errors(&self) -> bool {
        self.program.diagnostics().has_errors()
    }
}

struct Loader<'s> {
    source: &'s str,
    program: Program,
    modules: FxHashMap<String, ModuleId>,
}

impl Loader<'_> {
    /// The outer error stops loading; the inner one is a fail-fast abort
    /// with the cause already reported.
    fn load(&mut self, manifest: &Manifest) -> Result<std::result::Result<(), Abort>> {
        for entry in &manifest.modules {
            self.add_module(entry)?;
        }

        // Type-scoped declarations name their owner, so owners go first.
        let (scoped, plain): (Vec<&DeclEntry>, Vec<&DeclEntry>) =
            manifest.decls.iter().partition(|entry| {
                matches!(
                    entry.visibility.as_ref().map(Spanned::get_ref),
                    Some(VisibilityEntry::Type { .. })
                )
            });
        for entry in plain.into_iter().chain(scoped) {
            let module = self.module(&entry.module)?;
            let node = self.decl_node(entry)?;
            if let Err(abort) = self.program.declare(module, node) {
                return Ok(Err(abort));
            }
        }

        for entry in &manifest.brings {
            if let Err(abort) = self.bring(entry)? {
                return Ok(Err(abort));
            }
        }
        Ok(Ok(()))
    }

    /// Span of the text inside a string value, quotes excluded.
    fn inner_span(&self, range: Range<usize>) -> Span {
        let raw = &self.source[range.clone()];
        let quote = ["\"\"\"", "'''", "\"", "'"]
            .into_iter()
            .find(|quote| raw.len() >= 2 * quote.len() && raw.starts_with(quote) && raw.ends_with(quote))
            .map_or(0, str::len);
        Span::new(range.start + quote, range.end - quote)
    }

    fn base(&self, value: &Spanned<String>) -> usize {
        self.inner_span(value.span()).start
    }

    fn ident(&mut self, value: &Spanned<String>) -> Identifier {
        let span = self.inner_span(value.span());
        self.program.ident(value.get_ref(), span)
    }

    fn keyword<T>(
        &self,
        value: &Spanned<String>,
        what: &'static str,
        expected: &'static str,
        parse: impl FnOnce(&str) -> Option<T>,
    ) -> Result<T> {
        parse(value.get_ref()).ok_or_else(|| ManifestError::UnknownKeyword {
            what,
            value: value.get_ref().clone(),
            expected,
            span: self.inner_span(value.span()).into(),
        })
    }

    fn module(&self, path: &Spanned<String>) -> Result<ModuleId> {
        self.modules
            .get(path.get_ref().trim_matches('/'))
            .copied()
            .ok_or_else(|| ManifestError::UnknownModule {
                path: path.get_ref().clone(),
                span: self.inner_span(path.span()).into(),
            })
    }

    fn add_module(&mut self, entry: &ModuleEntry) -> Result<()> {
        let path = entry.path.get_ref().trim_matches('/').to_string();
        let span = self.inner_span(entry.path.span());
        if self.modules.contains_key(&path) {
            return Err(ManifestError::DuplicateModule {
                path,
                span: span.into(),
            });
        }
        let (parent, name) = match path.rsplit_once('/') {
            Some((parent, name)) => {
                let parent = self.modules.get(parent).copied().ok_or_else(|| {
                    ManifestError::UnknownModule {
                        path: parent.to_string(),
                        span: span.into(),
                    }
                })?;
                (Some(parent), name)
            }
            None => (None, path.as_str()),
        };
        let kind = match &entry.kind {
            Some(kind) => self.keyword(kind, "module kind", MODULE_KINDS, ModuleKind::from_name)?,
            None => ModuleKind::Library,
        };
        let visibility = match &entry.visibility {
            Some(vis) => self.keyword(vis, "visibility", VISIBILITIES, module_visibility)?,
            None => VisibilityKind::Public,
        };

        let name_start = span.end - name.len();
        let ident = self
            .program
            .ident(name, Span::new(name_start, span.end));
        let id = self
            .program
            .add_module(ident, path.as_str(), parent, kind, visibility);
        tracing::trace!(path = %path, kind = kind.as_str(), "module added");
        self.modules.insert(path, id);
        Ok(())
    }

    fn visibility(&mut self, entry: Option<&Spanned<VisibilityEntry>>) -> Result<VisibilitySpec> {
        let Some(entry) = entry else {
            return Ok(VisibilitySpec::Public);
        };
        let span = self.inner_span(entry.span());
        match entry.get_ref() {
            VisibilityEntry::Keyword(word) => {
                decl_visibility(word).ok_or_else(|| ManifestError::UnknownKeyword {
                    what: "visibility",
                    value: word.clone(),
                    expected: VISIBILITIES,
                    span: span.into(),
                })
            }
            VisibilityEntry::Type { owner } => {
                Ok(VisibilitySpec::Type(self.program.ident(owner, span)))
            }
        }
    }

    fn ty(&mut self, text: &Spanned<String>) -> Result<TypeRef> {
        let base = self.base(text);
        parse_type(text.get_ref(), base, &mut self.program.db_mut().interner)
    }

    fn value_ref(&mut self, text: &Spanned<String>) -> Result<ValueRef> {
        let base = self.base(text);
        parse_value_ref(text.get_ref(), base, &mut self.program.db_mut().interner)
    }

    fn const_expr(&mut self, text: &Spanned<String>) -> Result<ConstExpr> {
        let base = self.base(text);
        parse_const_expr(text.get_ref(), base, &mut self.program.db_mut().interner)
    }

    fn typed_names(&mut self, entries: &[TypedName]) -> Result<Vec<(Identifier, TypeRef)>> {
        entries
            .iter()
            .map(|entry| Ok((self.ident(&entry.name), self.ty(&entry.ty)?)))
            .collect()
    }

    fn required<'e>(
        &self,
        entry: &DeclEntry,
        value: &'e Option<Spanned<String>>,
        field: &'static str,
    ) -> Result<&'e Spanned<String>> {
        value.as_ref().ok_or_else(|| ManifestError::MissingField {
            kind: entry.kind.get_ref().clone(),
            name: entry.name.get_ref().clone(),
            field,
            span: self.inner_span(entry.name.span()).into(),
        })
    }

    fn decl_node(&mut self, entry: &DeclEntry) -> Result<DeclNode> {
        let name = self.ident(&entry.name);
        let visibility = self.visibility(entry.visibility.as_ref())?;
        if entry.kind.get_ref() != "generic" {
            return self.plain_node(entry, &entry.kind, name, visibility);
        }

        let body_kind = self.required(entry, &entry.body, "body")?;
        let body = match self.plain_node(entry, body_kind, name, visibility)? {
            DeclNode::Function(decl) => GenericBody::Function(decl),
            DeclNode::Type(decl) => GenericBody::Type(decl),
            DeclNode::Alias(decl) => GenericBody::Alias(decl),
            DeclNode::Global(_) | DeclNode::Generic(_) => {
                return Err(ManifestError::UnknownKeyword {
                    what: "generic body",
                    value: body_kind.get_ref().clone(),
                    expected: BODY_KINDS,
                    span: self.inner_span(body_kind.span()).into(),
                });
            }
        };
        let params = entry
            .generic_params
            .iter()
            .map(|param| self.generic_param(param))
            .collect::<Result<_>>()?;
        let constraint = entry
            .constraint
            .as_ref()
            .map(|text| self.const_expr(text))
            .transpose()?;
        Ok(DeclNode::Generic(GenericDecl {
            name,
            visibility,
            params,
            constraint,
            body,
        }))
    }

    fn plain_node(
        &mut self,
        entry: &DeclEntry,
        kind: &Spanned<String>,
        name: Identifier,
        visibility: VisibilitySpec,
    ) -> Result<DeclNode> {
        let aggregate = match kind.get_ref().as_str() {
            "struct" => AggregateKind::Struct,
            "mix" => AggregateKind::Mix,
            "opaque" => AggregateKind::Opaque,
            "choice" => AggregateKind::Choice,
            "function" => {
                let params = self
                    .typed_names(&entry.params)?
                    .into_iter()
                    .map(|(name, ty)| Param { name, ty })
                    .collect();
                let ret = entry.returns.as_ref().map(|text| self.ty(text)).transpose()?;
                let body = entry
                    .calls
                    .iter()
                    .map(|text| self.value_ref(text))
                    .collect::<Result<_>>()?;
                return Ok(DeclNode::Function(FunctionDecl {
                    name,
                    visibility,
                    params,
                    ret,
                    body,
                }));
            }
            "global" => {
                let ty = self.required(entry, &entry.ty, "type")?;
                let ty = self.ty(ty)?;
                let init = entry
                    .reads
                    .iter()
                    .map(|text| self.value_ref(text))
                    .collect::<Result<_>>()?;
                return Ok(DeclNode::Global(GlobalDecl {
                    name,
                    visibility,
                    ty,
                    init,
                }));
            }
            "alias" => {
                let target = self.required(entry, &entry.target, "target")?;
                let target = self.ty(target)?;
                return Ok(DeclNode::Alias(AliasDecl {
                    name,
                    visibility,
                    target,
                }));
            }
            other => {
                return Err(ManifestError::UnknownKeyword {
                    what: "declaration kind",
                    value: other.to_string(),
                    expected: DECL_KINDS,
                    span: self.inner_span(kind.span()).into(),
                });
            }
        };

        let fields = self
            .typed_names(&entry.fields)?
            .into_iter()
            .map(|(name, ty)| Field { name, ty })
            .collect();
        let mixins = entry
            .mixins
            .iter()
            .map(|text| self.ty(text))
            .collect::<Result<_>>()?;
        let cases = entry
            .cases
            .iter()
            .map(|case| {
                Ok(Case {
                    name: self.ident(&case.name),
                    payload: case.payload.as_ref().map(|text| self.ty(text)).transpose()?,
                })
            })
            .collect::<Result<_>>()?;
        Ok(DeclNode::Type(TypeDecl {
            name,
            visibility,
            kind: aggregate,
            fields,
            mixins,
            cases,
        }))
    }

    fn generic_param(&mut self, entry: &GenericParamEntry) -> Result<GenericParam> {
        let name = self.ident(&entry.name);
        let kind = match &entry.kind {
            Some(kind) => self.keyword(kind, "generic parameter kind", PARAM_KINDS, param_kind)?,
            None => GenericParamKind::Type,
        };
        let default = match (&entry.default, kind) {
            (None, _) => None,
            (Some(text), GenericParamKind::Type) => Some(GenericDefault::Type(self.ty(text)?)),
            (Some(text), GenericParamKind::Value(_)) => {
                Some(GenericDefault::Value(self.const_expr(text)?))
            }
        };
        Ok(GenericParam {
            name,
            kind,
            default,
        })
    }

    /// Returns the inner error when a fail-fast program aborts on an
    /// unresolved target.
    fn bring(&mut self, entry: &BringEntry) -> Result<std::result::Result<(), Abort>> {
        let into = self.module(&entry.into)?;
        let visibility = match &entry.visibility {
            Some(vis) => self.keyword(vis, "visibility", VISIBILITIES, module_visibility)?,
            None => VisibilityKind::File,
        };
        let rename = entry.rename.as_ref().map(|rename| self.ident(rename));

        match (&entry.module, &entry.decl) {
            (Some(path), None) => {
                let target = self.module(path)?;
                let span = self.inner_span(path.span());
                self.program
                    .bring_module(into, target, visibility, rename, entry.wildcard, span);
                Ok(Ok(()))
            }
            (None, Some(path)) => {
                let span = self.inner_span(path.span());
                let db = self.program.db_mut();
                let segments: Vec<Symbol> = path
                    .get_ref()
                    .split("::")
                    .map(|segment| db.interner.intern(segment.trim()))
                    .collect();
                let access = AccessInfo::from_module(into);
                match db
                    .modules
                    .resolve_path(into, &segments, DeclKind::ALL, &access)
                {
                    Ok(target) => {
                        self.program.bring(into, target, visibility, rename, span);
                        Ok(Ok(()))
                    }
                    Err(_) => Ok(self.program.report(SemanticError::NotFound {
                        kind: "declaration",
                        name: path.get_ref().clone(),
                        span: span.into(),
                    })),
                }
            }
            _ => Err(ManifestError::BringTarget {
                span: self.inner_span(entry.into.span()).into(),
            }),
        }
    }
}

/// Visibility of a module or a bring: anything but type scoping.
fn module_visibility(word: &str) -> Option<VisibilityKind> {
    VisibilityKind::from_name(word).filter(|kind| *kind != VisibilityKind::Type)
}

fn decl_visibility(word: &str) -> Option<VisibilitySpec> {
    Some(match module_visibility(word)? {
        VisibilityKind::Public => VisibilitySpec::Public,
        VisibilityKind::Library => VisibilitySpec::Library,
        VisibilityKind::Folder => VisibilitySpec::Folder,
        VisibilityKind::File => VisibilitySpec::File,
        VisibilityKind::Parent => VisibilitySpec::Parent,
        VisibilityKind::Type => return None,
    })
}

fn param_kind(word: &str) -> Option<GenericParamKind> {
    match word {
        "type" => Some(GenericParamKind::Type),
        "int" => Some(GenericParamKind::Value(ValueType::Int)),
        "bool" => Some(GenericParamKind::Value(ValueType::Bool)),
        _ => None,
    }
}
