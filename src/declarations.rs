//! Discovery and indexing of type declaration sources.
//!
//! The declaration source is a single Rust file (the default, `api.rs`) or a
//! directory scanned recursively for `.rs` files. Nested `pub mod` items act
//! as namespaces: the dotted model name `ProjectApi.GetFunc.Response`
//! resolves to a type `Response` inside modules matching `ProjectApi` and
//! `GetFunc`. Matching is case-insensitive and ignores underscores, so
//! conventional `snake_case` module names resolve PascalCase name segments.

use crate::error::{Error, Result};
use log::{debug, warn};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Which top-level declarations are eligible for compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expose {
    /// Only `pub` modules and `pub` type declarations (the default).
    #[default]
    Export,
    /// Every top-level declaration, public or not.
    All,
}

/// A successfully parsed declaration source file.
#[derive(Debug)]
pub struct ParsedSource {
    pub path: PathBuf,
    pub syntax_tree: syn::File,
}

/// An indexed type declaration with its dotted namespace path.
#[derive(Debug, Clone)]
pub struct ExportedDeclaration {
    /// The dotted path as declared, e.g. `project_api.get_func.Response`.
    pub path: String,
    pub kind: DeclarationKind,
}

/// The syntactic kind of an indexed declaration.
#[derive(Debug, Clone)]
pub enum DeclarationKind {
    Struct(syn::ItemStruct),
    Enum(syn::ItemEnum),
    Alias(syn::ItemType),
}

/// Index of exported type declarations keyed by normalized dotted path.
#[derive(Debug, Default)]
pub struct DeclarationIndex {
    declarations: Vec<ExportedDeclaration>,
}

impl DeclarationIndex {
    /// Loads the declaration index from a file or directory.
    ///
    /// A single-file source must parse; in directory mode files that fail to
    /// parse are logged and skipped so one broken file does not take down the
    /// whole run.
    pub fn load(root: &Path, expose: Expose) -> Result<Self> {
        let sources = discover_sources(root)?;
        debug!("Found {} declaration source(s)", sources.len());

        let single_file = root.is_file();
        let mut parsed = Vec::new();
        for path in &sources {
            match parse_source(path) {
                Ok(source) => parsed.push(source),
                Err(e) if single_file => return Err(e),
                Err(e) => warn!("Skipping declaration source {}: {}", path.display(), e),
            }
        }

        let mut index = DeclarationIndex::default();
        for source in &parsed {
            index.collect_items(&source.syntax_tree.items, &mut Vec::new(), expose);
        }
        debug!("Indexed {} exported declarations", index.declarations.len());
        Ok(index)
    }

    /// Builds an index straight from parsed sources. Used by tests.
    pub fn from_sources(sources: &[ParsedSource], expose: Expose) -> Self {
        let mut index = DeclarationIndex::default();
        for source in sources {
            index.collect_items(&source.syntax_tree.items, &mut Vec::new(), expose);
        }
        index
    }

    fn collect_items(&mut self, items: &[syn::Item], stack: &mut Vec<String>, expose: Expose) {
        for item in items {
            match item {
                syn::Item::Mod(module) => {
                    if expose == Expose::Export && !is_public(&module.vis) {
                        continue;
                    }
                    if let Some((_, nested)) = &module.content {
                        stack.push(module.ident.to_string());
                        self.collect_items(nested, stack, expose);
                        stack.pop();
                    }
                }
                syn::Item::Struct(decl) => {
                    if expose == Expose::All || is_public(&decl.vis) {
                        self.insert(stack, &decl.ident, DeclarationKind::Struct(decl.clone()));
                    }
                }
                syn::Item::Enum(decl) => {
                    if expose == Expose::All || is_public(&decl.vis) {
                        self.insert(stack, &decl.ident, DeclarationKind::Enum(decl.clone()));
                    }
                }
                syn::Item::Type(decl) => {
                    if expose == Expose::All || is_public(&decl.vis) {
                        self.insert(stack, &decl.ident, DeclarationKind::Alias(decl.clone()));
                    }
                }
                _ => {}
            }
        }
    }

    fn insert(&mut self, stack: &[String], ident: &syn::Ident, kind: DeclarationKind) {
        let mut segments = stack.to_vec();
        segments.push(ident.to_string());
        let path = segments.join(".");
        debug!("Indexing declaration {}", path);
        self.declarations.push(ExportedDeclaration { path, kind });
    }

    /// Resolves a fully qualified dotted name such as
    /// `ProjectApi.GetFunc.Response`.
    pub fn resolve(&self, dotted_name: &str) -> Option<&ExportedDeclaration> {
        let wanted = normalize_path(dotted_name);
        self.declarations
            .iter()
            .find(|decl| normalize_path(&decl.path) == wanted)
    }

    /// Resolves a bare type identifier by its final path segment. Used for
    /// field types referenced without a namespace.
    pub fn resolve_ident(&self, ident: &str) -> Option<&ExportedDeclaration> {
        let wanted = normalize_segment(ident);
        self.declarations.iter().find(|decl| {
            decl.path
                .rsplit('.')
                .next()
                .is_some_and(|last| normalize_segment(last) == wanted)
        })
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

fn is_public(vis: &syn::Visibility) -> bool {
    matches!(vis, syn::Visibility::Public(_))
}

fn normalize_segment(segment: &str) -> String {
    segment
        .chars()
        .filter(|c| *c != '_')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

fn normalize_path(path: &str) -> String {
    path.split('.')
        .map(normalize_segment)
        .collect::<Vec<_>>()
        .join(".")
}

/// Collects declaration source paths: the file itself, or every `.rs` file
/// under the directory, skipping `target` and hidden entries.
pub fn discover_sources(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(Error::ConfigError(format!(
            "declaration source not found: {}",
            root.display()
        )));
    }
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut sources = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_entry(|e| {
        if e.path() == root {
            return true;
        }
        let file_name = e.file_name().to_string_lossy();
        !file_name.starts_with('.') && file_name != "target"
    }) {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("rs") {
                    sources.push(path.to_path_buf());
                }
            }
            Err(e) => warn!("Failed to access path: {}", e),
        }
    }
    Ok(sources)
}

/// Parses one declaration source file.
pub fn parse_source(path: &Path) -> Result<ParsedSource> {
    debug!("Parsing declaration source: {}", path.display());
    let content = fs::read_to_string(path)?;
    let syntax_tree = syn::parse_file(&content).map_err(|e| {
        Error::ConfigError(format!(
            "failed to parse declaration source {}: {}",
            path.display(),
            e
        ))
    })?;
    Ok(ParsedSource {
        path: path.to_path_buf(),
        syntax_tree,
    })
}

/// A use of a type in a declaration: base name plus generic arguments, with
/// the container shapes the schema generator special-cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeShape {
    pub name: String,
    pub args: Vec<TypeShape>,
}

impl TypeShape {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn is_option(&self) -> bool {
        self.name == "Option"
    }

    pub fn is_vec(&self) -> bool {
        self.name == "Vec" || self.name == "VecDeque" || self.name == "HashSet"
    }

    pub fn is_map(&self) -> bool {
        self.name == "HashMap" || self.name == "BTreeMap" || self.name == "IndexMap"
    }

    /// The single wrapped type of `Option`/`Vec`, when present.
    pub fn inner(&self) -> Option<&TypeShape> {
        self.args.first()
    }

    /// Display form used for generic definition names: `Name<Arg, Arg>`.
    pub fn display_name(&self) -> String {
        if self.args.is_empty() {
            self.name.clone()
        } else {
            let args: Vec<String> = self.args.iter().map(|a| a.display_name()).collect();
            format!("{}<{}>", self.name, args.join(", "))
        }
    }

    /// Extracts the shape of a `syn` type.
    pub fn from_type(ty: &syn::Type) -> TypeShape {
        match ty {
            syn::Type::Path(type_path) => {
                let Some(segment) = type_path.path.segments.last() else {
                    return TypeShape::new("object");
                };
                let mut shape = TypeShape::new(segment.ident.to_string());
                if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                    for arg in &args.args {
                        if let syn::GenericArgument::Type(inner) = arg {
                            shape.args.push(TypeShape::from_type(inner));
                        }
                    }
                }
                shape
            }
            syn::Type::Reference(reference) => TypeShape::from_type(&reference.elem),
            syn::Type::Paren(paren) => TypeShape::from_type(&paren.elem),
            syn::Type::Array(array) => {
                let mut shape = TypeShape::new("Vec");
                shape.args.push(TypeShape::from_type(&array.elem));
                shape
            }
            syn::Type::Slice(slice) => {
                let mut shape = TypeShape::new("Vec");
                shape.args.push(TypeShape::from_type(&slice.elem));
                shape
            }
            _ => TypeShape::new("object"),
        }
    }

    /// Rewrites every occurrence of a generic parameter name with a concrete
    /// shape. Used when instantiating generic type aliases.
    pub fn substitute(&self, param: &str, replacement: &TypeShape) -> TypeShape {
        if self.name == param && self.args.is_empty() {
            return replacement.clone();
        }
        TypeShape {
            name: self.name.clone(),
            args: self
                .args
                .iter()
                .map(|a| a.substitute(param, replacement))
                .collect(),
        }
    }
}
