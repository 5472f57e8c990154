// module/mod.rs
//
// The module tree: files, folders and libraries arranged in an arena, each
// owning its declarations and its brought references.

mod brought;
mod decls;
mod lookup;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use kiln_identity::{DeclId, Identifier, Interner, ModuleId};

use crate::visibility::{VisibilityInfo, VisibilityKind};

pub use brought::{Brought, BroughtModule};
pub use decls::{BroughtLists, DeclInfo, DeclKind, DeclLists, Namespace};
pub use lookup::PathError;

/// What a module node stands for on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    File,
    Folder,
    Library,
}

impl ModuleKind {
    /// Files and folders are unnamed namespaces: their contents belong to
    /// the enclosing library.
    pub fn is_transparent(self) -> bool {
        !matches!(self, ModuleKind::Library)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModuleKind::File => "file",
            ModuleKind::Folder => "folder",
            ModuleKind::Library => "library",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "file" => Some(ModuleKind::File),
            "folder" => Some(ModuleKind::Folder),
            "library" => Some(ModuleKind::Library),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Module {
    pub id: ModuleId,
    pub name: Identifier,
    pub path: PathBuf,
    pub kind: ModuleKind,
    pub parent: Option<ModuleId>,
    pub visibility: VisibilityInfo,
    pub(crate) children: Vec<ModuleId>,
    pub(crate) decls: DeclLists,
    pub(crate) brought: BroughtLists,
    pub(crate) brought_modules: Vec<BroughtModule>,
}

impl Module {
    pub fn children(&self) -> &[ModuleId] {
        &self.children
    }

    /// Declarations of one kind owned by this module, in declaration order.
    pub fn declarations(&self, kind: DeclKind) -> &[DeclId] {
        self.decls.of(kind)
    }

    pub fn brought(&self, kind: DeclKind) -> &[Brought<DeclId>] {
        self.brought.of(kind)
    }

    pub fn brought_modules(&self) -> &[BroughtModule] {
        &self.brought_modules
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Arena of every module and every declaration of a compilation.
#[derive(Debug, Default, Clone)]
pub struct ModuleTree {
    modules: Vec<Module>,
    decls: Vec<DeclInfo>,
    roots: Vec<ModuleId>,
}

impl ModuleTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module and append it to its parent's children.
    pub fn create(
        &mut self,
        name: Identifier,
        path: impl Into<PathBuf>,
        parent: Option<ModuleId>,
        kind: ModuleKind,
        visibility: VisibilityInfo,
    ) -> ModuleId {
        let id = ModuleId::new(self.modules.len() as u32);
        self.modules.push(Module {
            id,
            name,
            path: path.into(),
            kind,
            parent,
            visibility,
            children: Vec::new(),
            decls: DeclLists::default(),
            brought: BroughtLists::default(),
            brought_modules: Vec::new(),
        });
        match parent {
            Some(parent) => self.modules[parent.as_usize()].children.push(id),
            None => self.roots.push(id),
        }
        tracing::trace!(module = id.index(), kind = kind.as_str(), "module created");
        id
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.as_usize()]
    }

    pub(crate) fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.as_usize()]
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Module> {
        self.modules.iter()
    }

    /// Modules without a parent, in creation order.
    pub fn roots(&self) -> &[ModuleId] {
        &self.roots
    }

    /// `module` followed by each of its ancestors up to the root.
    pub fn ancestors(&self, module: ModuleId) -> impl Iterator<Item = ModuleId> + '_ {
        std::iter::successors(Some(module), move |&id| self.module(id).parent)
    }

    /// Whether `module` equals `ancestor` or lies below it.
    pub fn descends_from(&self, module: ModuleId, ancestor: ModuleId) -> bool {
        self.ancestors(module).any(|id| id == ancestor)
    }

    /// Nearest module of `kind` at or above `module`.
    pub fn nearest(&self, module: ModuleId, kind: ModuleKind) -> Option<ModuleId> {
        self.ancestors(module)
            .find(|&id| self.module(id).kind == kind)
    }

    /// The namespace a module's declarations live in: the nearest library,
    /// or the topmost ancestor when no library encloses it.
    pub fn namespace_root(&self, module: ModuleId) -> ModuleId {
        let mut last = module;
        for id in self.ancestors(module) {
            last = id;
            if self.module(id).kind == ModuleKind::Library {
                break;
            }
        }
        last
    }

    /// Scope module for a scoped visibility kind declared in `module`.
    ///
    /// A folder scope with no enclosing folder widens to the library.
    /// Returns `None` for the kinds that are not module scoped.
    pub fn visibility_scope(&self, kind: VisibilityKind, module: ModuleId) -> Option<ModuleId> {
        match kind {
            VisibilityKind::Library => Some(self.namespace_root(module)),
            VisibilityKind::Folder => {
                let library = self.namespace_root(module);
                let folder = self
                    .ancestors(module)
                    .take_while(|&id| id != library)
                    .find(|&id| self.module(id).kind == ModuleKind::Folder);
                Some(folder.unwrap_or(library))
            }
            VisibilityKind::File => Some(
                self.nearest(module, ModuleKind::File)
                    .unwrap_or(module),
            ),
            VisibilityKind::Parent => Some(module),
            VisibilityKind::Public | VisibilityKind::Type => None,
        }
    }

    /// Library-qualified name of a module: `a::b` for a file inside library
    /// `b` inside library `a`. File and folder segments are skipped.
    pub fn full_name(&self, module: ModuleId, interner: &Interner) -> String {
        let mut segments: Vec<&str> = self
            .ancestors(module)
            .filter(|&id| self.module(id).kind == ModuleKind::Library)
            .map(|id| self.module(id).name.as_str(interner))
            .collect();
        segments.reverse();
        segments.join("::")
    }

    /// `lib::Name`, or just `Name` outside any library.
    pub fn qualified_decl_name(&self, decl: DeclId, interner: &Interner) -> String {
        let info = self.decl(decl);
        let prefix = self.full_name(info.module, interner);
        let name = info.name.as_str(interner);
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}::{name}")
        }
    }

    /// Find a module by its `/`-joined path of names from a root.
    pub fn find_by_path(&self, path: &str, interner: &Interner) -> Option<ModuleId> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let first = segments.next()?;
        let mut current = *self
            .roots
            .iter()
            .find(|&&id| self.module(id).name.as_str(interner) == first)?;
        for segment in segments {
            current = *self
                .module(current)
                .children
                .iter()
                .find(|&&id| self.module(id).name.as_str(interner) == segment)?;
        }
        Some(current)
    }
}
