//! The type-to-schema compiler adapter.
//!
//! Wraps declaration indexing and schema generation behind the
//! [`TypeCompiler`] seam the population stage depends on. The production
//! compiler is constructed once per run from the resolved declaration-source
//! and config paths, then reused for every model. Every compiled schema goes
//! through the `const` to single-value `enum` rewrite so downstream OpenAPI
//! tooling that chokes on bare `const` keeps working.

use crate::declarations::{DeclarationIndex, Expose};
use crate::error::{Error, Result};
use crate::schema::SchemaBuilder;
use log::{debug, info};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Compiles a fully qualified type name to a JSON-Schema tree.
pub trait TypeCompiler {
    fn compile(&mut self, type_name: &str) -> Result<Value>;
}

/// Resolved source locations for the compiler.
#[derive(Debug, Clone)]
pub struct CompilerSettings {
    /// Declaration source: a `.rs` file or a directory of them.
    pub declarations_path: PathBuf,
    /// Compiler options file (TOML); missing means defaults.
    pub config_path: PathBuf,
}

/// Options read from the typegen config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TypegenOptions {
    /// Which declarations are eligible: exported only, or all.
    pub expose: Expose,
    /// Wrap the output in a top-level `$ref` instead of inlining the root.
    pub top_ref: bool,
}

impl TypegenOptions {
    /// Loads options from a TOML file; an absent file means defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(
                "No typegen config at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

/// The production compiler over exported type declarations.
#[derive(Debug)]
pub struct DeclarationCompiler {
    index: DeclarationIndex,
    options: TypegenOptions,
}

impl DeclarationCompiler {
    pub fn new(settings: &CompilerSettings) -> Result<Self> {
        let options = TypegenOptions::load(&settings.config_path)?;
        let index = DeclarationIndex::load(&settings.declarations_path, options.expose)?;
        info!(
            "Indexed {} exported declaration(s) from {}",
            index.len(),
            settings.declarations_path.display()
        );
        Ok(Self { index, options })
    }
}

impl TypeCompiler for DeclarationCompiler {
    fn compile(&mut self, type_name: &str) -> Result<Value> {
        debug!("Generating schema for {}", type_name);
        let declaration = self
            .index
            .resolve(type_name)
            .ok_or_else(|| Error::RootTypeNotFound(type_name.to_string()))?
            .clone();
        let mut builder = SchemaBuilder::new(&self.index);
        let schema = builder.build(&declaration, self.options.top_ref);
        Ok(const_to_enum(schema))
    }
}

/// Rewrites every `const` schema node into a single-value `enum` node.
///
/// Deep, order-preserving traversal over arbitrarily nested object/array
/// structure; sibling keys are untouched and keep their relative order, with
/// the replacement `enum` appended where the original appended it.
pub fn const_to_enum(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut rewritten = Map::new();
            let mut const_value = None;
            for (key, entry) in map {
                if key == "const" {
                    const_value = Some(entry);
                } else {
                    rewritten.insert(key, const_to_enum(entry));
                }
            }
            if let Some(single) = const_value {
                rewritten.insert("enum".to_string(), Value::Array(vec![single]));
            }
            Value::Object(rewritten)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(const_to_enum).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    const API: &str = r#"
        pub mod project_api {
            pub mod create_func {
                pub mod request {
                    pub struct Body {
                        pub data: String,
                        pub replace: Marker,
                    }
                }
                pub struct Response {
                    pub id: String,
                }
            }
            pub enum Marker {
                Test,
            }
        }
    "#;

    fn compiler_for(code: &str) -> (TempDir, DeclarationCompiler) {
        let temp_dir = TempDir::new().unwrap();
        let api_path = temp_dir.path().join("api.rs");
        fs::write(&api_path, code).unwrap();
        let settings = CompilerSettings {
            declarations_path: api_path,
            config_path: temp_dir.path().join("typegen.toml"),
        };
        let compiler = DeclarationCompiler::new(&settings).unwrap();
        (temp_dir, compiler)
    }

    #[test]
    fn test_compile_resolves_root_type() {
        let (_dir, mut compiler) = compiler_for(API);
        let schema = compiler.compile("ProjectApi.CreateFunc.Response").unwrap();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["id"]["type"], "string");
    }

    #[test]
    fn test_compile_missing_type_fails() {
        let (_dir, mut compiler) = compiler_for(API);
        let err = compiler
            .compile("ProjectApi.MissingFunc.Response")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "No root type \"ProjectApi.MissingFunc.Response\" found"
        );
    }

    #[test]
    fn test_compile_rewrites_const_to_enum() {
        let (_dir, mut compiler) = compiler_for(API);
        let schema = compiler
            .compile("ProjectApi.CreateFunc.Request.Body")
            .unwrap();
        let marker = &schema["definitions"]["Marker"];
        assert_eq!(marker["enum"], json!(["Test"]));
        assert!(marker.get("const").is_none());
        // Sibling keys survive the rewrite.
        assert_eq!(marker["type"], "string");
    }

    #[test]
    fn test_const_to_enum_nested() {
        let input = json!({
            "type": "object",
            "properties": {
                "replace": {
                    "type": "string",
                    "const": "TEST",
                    "description": "fixed value"
                },
                "list": [
                    {"const": 1, "title": "one"}
                ]
            }
        });

        let rewritten = const_to_enum(input);
        assert_eq!(
            rewritten["properties"]["replace"],
            json!({"type": "string", "description": "fixed value", "enum": ["TEST"]})
        );
        assert_eq!(
            rewritten["properties"]["list"][0],
            json!({"title": "one", "enum": [1]})
        );
    }

    #[test]
    fn test_const_to_enum_leaves_plain_schemas_alone() {
        let input = json!({"type": "string", "enum": ["a", "b"]});
        assert_eq!(const_to_enum(input.clone()), input);
    }

    #[test]
    fn test_options_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("typegen.toml");
        fs::write(&config_path, "expose = \"all\"\ntop_ref = true\n").unwrap();

        let options = TypegenOptions::load(&config_path).unwrap();
        assert_eq!(options.expose, Expose::All);
        assert!(options.top_ref);
    }

    #[test]
    fn test_options_default_when_missing() {
        let options = TypegenOptions::load(Path::new("/nonexistent/typegen.toml")).unwrap();
        assert_eq!(options.expose, Expose::Export);
        assert!(!options.top_ref);
    }

    #[test]
    fn test_invalid_options_fail() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("typegen.toml");
        fs::write(&config_path, "expose = \"everything\"\n").unwrap();

        let err = TypegenOptions::load(&config_path).unwrap_err();
        assert!(err.to_string().contains("invalid typegen config"));
    }
}
