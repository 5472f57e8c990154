// src/manifest/mod.rs
//! Project manifests: a TOML description of modules, declarations and
//! brings that stands in for parsed source.
//!
//! ```toml
//! [build]
//! fail_fast = false
//!
//! [[module]]
//! path = "geo"
//!
//! [[decl]]
//! module = "geo"
//! kind = "struct"
//! name = "Point"
//! fields = [{ name = "x", type = "i32" }]
//! ```
//!
//! Tables omitted from a manifest take their `Default`, like vole-stress
//! profiles.

mod load;
pub mod syntax;

use serde::Deserialize;
use toml::Spanned;

use kiln_sema::SchedulerConfig;

use crate::errors::ManifestError;

pub use load::{BuildOverrides, Project};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Manifest {
    pub build: BuildTable,
    #[serde(rename = "module")]
    pub modules: Vec<ModuleEntry>,
    #[serde(rename = "decl")]
    pub decls: Vec<DeclEntry>,
    #[serde(rename = "bring")]
    pub brings: Vec<BringEntry>,
}

/// Scheduler settings, overridable from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildTable {
    pub fail_fast: bool,
    pub max_passes: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleEntry {
    /// `/`-joined path; the last segment names the module.
    pub path: Spanned<String>,
    #[serde(default)]
    pub kind: Option<Spanned<String>>,
    #[serde(default)]
    pub visibility: Option<Spanned<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeclEntry {
    pub module: Spanned<String>,
    pub kind: Spanned<String>,
    pub name: Spanned<String>,
    #[serde(default)]
    pub visibility: Option<Spanned<VisibilityEntry>>,

    // Aggregates.
    #[serde(default)]
    pub fields: Vec<TypedName>,
    #[serde(default)]
    pub mixins: Vec<Spanned<String>>,
    #[serde(default)]
    pub cases: Vec<CaseEntry>,

    // Functions.
    #[serde(default)]
    pub params: Vec<TypedName>,
    #[serde(default)]
    pub returns: Option<Spanned<String>>,
    #[serde(default)]
    pub calls: Vec<Spanned<String>>,

    // Globals.
    #[serde(default, rename = "type")]
    pub ty: Option<Spanned<String>>,
    #[serde(default)]
    pub reads: Vec<Spanned<String>>,

    // Aliases.
    #[serde(default)]
    pub target: Option<Spanned<String>>,

    // Generics.
    #[serde(default)]
    pub body: Option<Spanned<String>>,
    #[serde(default)]
    pub generic_params: Vec<GenericParamEntry>,
    #[serde(default)]
    pub constraint: Option<Spanned<String>>,
}

/// `"library"`, or `{ type = "Owner" }` for a type-scoped declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum VisibilityEntry {
    Keyword(String),
    Type {
        #[serde(rename = "type")]
        owner: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypedName {
    pub name: Spanned<String>,
    #[serde(rename = "type")]
    pub ty: Spanned<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseEntry {
    pub name: Spanned<String>,
    #[serde(default)]
    pub payload: Option<Spanned<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenericParamEntry {
    pub name: Spanned<String>,
    /// `type` (the default), `int` or `bool`.
    #[serde(default)]
    pub kind: Option<Spanned<String>>,
    #[serde(default)]
    pub default: Option<Spanned<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BringEntry {
    pub into: Spanned<String>,
    /// Path of a module to bring, like `geo/shapes`.
    #[serde(default)]
    pub module: Option<Spanned<String>>,
    /// Qualified name of a declaration to bring, like `geo::Point`.
    #[serde(default)]
    pub decl: Option<Spanned<String>>,
    #[serde(default)]
    pub wildcard: bool,
    #[serde(default)]
    pub rename: Option<Spanned<String>>,
    #[serde(default)]
    pub visibility: Option<Spanned<String>>,
}

impl Manifest {
    pub fn parse(source: &str) -> Result<Self, ManifestError> {
        toml::from_str(source).map_err(ManifestError::from_toml)
    }
}

impl BuildTable {
    pub fn config(self) -> SchedulerConfig {
        SchedulerConfig::new()
            .fail_fast(self.fail_fast)
            .max_passes(self.max_passes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_sema::ReportMode;

    #[test]
    fn empty_manifest_uses_defaults() {
        let manifest = Manifest::parse("").unwrap();
        assert_eq!(manifest.build, BuildTable::default());
        assert!(manifest.modules.is_empty());
        assert_eq!(manifest.build.config().mode, ReportMode::Batched);
    }

    #[test]
    fn build_table_sets_the_scheduler() {
        let manifest = Manifest::parse("[build]\nfail_fast = true\nmax_passes = 50\n").unwrap();
        let config = manifest.build.config();
        assert_eq!(config.mode, ReportMode::FailFast);
        assert_eq!(config.max_passes, Some(50));
    }

    #[test]
    fn entries_keep_their_spans() {
        let source = r#"
[[module]]
path = "geo"

[[decl]]
module = "geo"
kind = "struct"
name = "Point"
visibility = { type = "Shape" }
fields = [{ name = "x", type = "i32" }]
"#;
        let manifest = Manifest::parse(source).unwrap();
        let decl = &manifest.decls[0];
        assert_eq!(decl.name.get_ref(), "Point");
        assert_eq!(&source[decl.name.span()], "\"Point\"");
        assert_eq!(
            decl.visibility.as_ref().map(|v| v.get_ref().clone()),
            Some(VisibilityEntry::Type {
                owner: "Shape".to_string()
            })
        );
        assert_eq!(decl.fields[0].ty.get_ref(), "i32");
    }

    #[test]
    fn unknown_fields_are_rejected_with_a_span() {
        let err = Manifest::parse("[[module]]\npath = \"geo\"\ncolour = \"red\"\n").unwrap_err();
        let ManifestError::Toml { message, span } = err else {
            panic!("expected a TOML error");
        };
        assert!(message.contains("colour"), "{message}");
        assert!(span.is_some());
    }
}
