//! JSON-Schema generation from indexed type declarations.
//!
//! The root declaration is emitted inline (no top-level `$ref` unless the
//! compiler is configured otherwise); named types it references are emitted
//! as `definitions` entries and linked with `$ref`. Generic alias
//! instantiations get a definition named after the instantiation
//! (`GenericType<Inner>`), and the `$ref` pointing at it percent-encodes the
//! angle brackets, which is what the post-processing sanitizer later rewrites.

use crate::declarations::{DeclarationIndex, DeclarationKind, ExportedDeclaration, TypeShape};
use indexmap::IndexMap;
use log::debug;
use serde_json::{json, Map, Value};

/// Serde attributes honored on struct fields.
#[derive(Debug, Clone, Default)]
struct SerdeAttributes {
    rename: Option<String>,
    skip: bool,
}

/// Converts declarations to JSON-Schema trees against a declaration index.
pub struct SchemaBuilder<'a> {
    index: &'a DeclarationIndex,
    /// Definition names currently being generated; breaks reference cycles.
    resolving: Vec<String>,
    definitions: IndexMap<String, Value>,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(index: &'a DeclarationIndex) -> Self {
        Self {
            index,
            resolving: Vec::new(),
            definitions: IndexMap::new(),
        }
    }

    /// Builds the schema for one declaration. With `top_ref` the root schema
    /// itself becomes a definition referenced from the top level.
    pub fn build(&mut self, declaration: &ExportedDeclaration, top_ref: bool) -> Value {
        debug!("Building schema for {}", declaration.path);
        self.resolving.clear();
        self.definitions.clear();

        let root_name = declaration
            .path
            .rsplit('.')
            .next()
            .unwrap_or(&declaration.path)
            .to_string();
        self.resolving.push(root_name.clone());
        let schema = self.declaration_schema(declaration);
        self.resolving.pop();

        if top_ref {
            self.definitions.insert(root_name.clone(), schema);
            let mut root = Map::new();
            root.insert(
                "$ref".to_string(),
                Value::String(format!("#/definitions/{}", encode_ref_segment(&root_name))),
            );
            root.insert("definitions".to_string(), self.take_definitions());
            return Value::Object(root);
        }

        let mut schema = schema;
        if !self.definitions.is_empty() {
            if let Value::Object(map) = &mut schema {
                map.insert("definitions".to_string(), self.take_definitions());
            }
        }
        schema
    }

    fn take_definitions(&mut self) -> Value {
        let mut map = Map::new();
        for (name, schema) in self.definitions.drain(..) {
            map.insert(name, schema);
        }
        Value::Object(map)
    }

    fn declaration_schema(&mut self, declaration: &ExportedDeclaration) -> Value {
        match &declaration.kind {
            DeclarationKind::Struct(decl) => self.struct_schema(decl),
            DeclarationKind::Enum(decl) => Self::enum_schema(decl),
            DeclarationKind::Alias(decl) => {
                let shape = TypeShape::from_type(&decl.ty);
                self.shape_schema(&shape)
            }
        }
    }

    fn struct_schema(&mut self, decl: &syn::ItemStruct) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        if let syn::Fields::Named(named) = &decl.fields {
            for field in &named.named {
                let attrs = serde_attributes(&field.attrs);
                if attrs.skip {
                    continue;
                }
                let Some(ident) = &field.ident else { continue };
                let name = attrs.rename.unwrap_or_else(|| ident.to_string());

                let shape = TypeShape::from_type(&field.ty);
                if !shape.is_option() {
                    required.push(Value::String(name.clone()));
                }
                properties.insert(name, self.shape_schema(&shape));
            }
        }

        let mut schema = Map::new();
        schema.insert("type".to_string(), Value::String("object".to_string()));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), Value::Array(required));
        }
        schema.insert("additionalProperties".to_string(), Value::Bool(false));
        Value::Object(schema)
    }

    fn enum_schema(decl: &syn::ItemEnum) -> Value {
        let unit_variants: Vec<&syn::Variant> = decl
            .variants
            .iter()
            .filter(|v| matches!(v.fields, syn::Fields::Unit))
            .collect();

        if unit_variants.len() != decl.variants.len() || unit_variants.is_empty() {
            // Data-carrying enums are out of scope for parameter/model types.
            return json!({"type": "object"});
        }

        if let [only] = unit_variants.as_slice() {
            return json!({"type": "string", "const": only.ident.to_string()});
        }

        let values: Vec<Value> = unit_variants
            .iter()
            .map(|v| Value::String(v.ident.to_string()))
            .collect();
        json!({"type": "string", "enum": values})
    }

    fn shape_schema(&mut self, shape: &TypeShape) -> Value {
        if shape.is_option() {
            return match shape.inner() {
                Some(inner) => self.shape_schema(inner),
                None => json!({"type": "object"}),
            };
        }
        if shape.is_vec() {
            let items = match shape.inner() {
                Some(inner) => self.shape_schema(inner),
                None => json!({"type": "object"}),
            };
            return json!({"type": "array", "items": items});
        }
        if shape.is_map() {
            let values = match shape.args.get(1) {
                Some(value_shape) => self.shape_schema(value_shape),
                None => json!({"type": "object"}),
            };
            return json!({"type": "object", "additionalProperties": values});
        }

        if let Some(primitive) = primitive_schema(&shape.name) {
            return primitive;
        }

        if !shape.args.is_empty() {
            return self.generic_instance_schema(shape);
        }

        if let Some(declaration) = self.index.resolve_ident(&shape.name).cloned() {
            return self.named_reference(&shape.name, &declaration);
        }

        // No type-checking pass: unknown types degrade to a permissive object.
        debug!("Unknown type {}, using object placeholder", shape.name);
        json!({"type": "object"})
    }

    /// Emits a definition for a named declaration and returns a `$ref` to it.
    fn named_reference(&mut self, name: &str, declaration: &ExportedDeclaration) -> Value {
        if !self.definitions.contains_key(name) && !self.resolving.iter().any(|n| n == name) {
            self.resolving.push(name.to_string());
            let schema = self.declaration_schema(declaration);
            self.resolving.pop();
            self.definitions.insert(name.to_string(), schema);
        }
        json!({"$ref": format!("#/definitions/{}", encode_ref_segment(name))})
    }

    /// Instantiates a generic type alias, e.g. `GenericType<Inner>`, as a
    /// definition named after the instantiation.
    fn generic_instance_schema(&mut self, shape: &TypeShape) -> Value {
        let Some(declaration) = self.index.resolve_ident(&shape.name).cloned() else {
            debug!("Unknown generic type {}, using object placeholder", shape.name);
            return json!({"type": "object"});
        };
        let DeclarationKind::Alias(alias) = &declaration.kind else {
            // Generic structs/enums are not substituted; their parameters
            // degrade to object placeholders inside the plain definition.
            return self.named_reference(&shape.name, &declaration);
        };

        let params: Vec<String> = alias
            .generics
            .type_params()
            .map(|p| p.ident.to_string())
            .collect();

        let mut target = TypeShape::from_type(&alias.ty);
        for (param, arg) in params.iter().zip(shape.args.iter()) {
            target = target.substitute(param, arg);
        }

        let definition_name = shape.display_name();
        if !self.definitions.contains_key(&definition_name)
            && !self.resolving.iter().any(|n| n == &definition_name)
        {
            self.resolving.push(definition_name.clone());
            let schema = self.shape_schema(&target);
            self.resolving.pop();
            self.definitions.insert(definition_name.clone(), schema);
        }
        json!({"$ref": format!("#/definitions/{}", encode_ref_segment(&definition_name))})
    }
}

/// Percent-encodes the characters the OpenAPI toolchain cannot digest in
/// reference segments. Mirrors what schema compilers emit for generic names.
fn encode_ref_segment(name: &str) -> String {
    name.replace('<', "%3C").replace('>', "%3E")
}

fn primitive_schema(name: &str) -> Option<Value> {
    let schema = match name {
        "String" | "str" | "char" | "PathBuf" | "Uuid" => json!({"type": "string"}),
        "i8" | "i16" | "i32" | "u8" | "u16" | "u32" => {
            json!({"type": "integer", "format": "int32"})
        }
        "i64" | "i128" | "isize" | "u64" | "u128" | "usize" => {
            json!({"type": "integer", "format": "int64"})
        }
        "f32" => json!({"type": "number", "format": "float"}),
        "f64" => json!({"type": "number", "format": "double"}),
        "bool" => json!({"type": "boolean"}),
        "Value" => json!({}),
        _ => return None,
    };
    Some(schema)
}

fn serde_attributes(attrs: &[syn::Attribute]) -> SerdeAttributes {
    let mut out = SerdeAttributes::default();
    for attr in attrs {
        if !attr.path().is_ident("serde") {
            continue;
        }
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                out.rename = Some(lit.value());
            } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                out.skip = true;
            } else if meta.input.peek(syn::Token![=]) {
                let _: syn::Expr = meta.value()?.parse()?;
            }
            Ok(())
        });
    }
    out
}
