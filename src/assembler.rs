//! Built-in document-assembly collaborator.
//!
//! Owns the `openapi:generate:serverless` hook and turns the populated
//! configuration into an OpenAPI document on disk: one path item per
//! documented HTTP event, `operationId` set to the declared function name,
//! and `components.schemas` filled from the model registry. Nested
//! `definitions` emitted by the schema compiler are hoisted into components
//! and their `$ref`s relocated. Any plugin registered under the same hook
//! replaces this one.

use crate::hooks::{GenerationContext, PipelinePlugin, ASSEMBLY_HOOK};
use crate::population::ModelRegistry;
use crate::serializer;
use crate::service::{DocumentationBlock, HttpEvent, ParamDocumentation, ParamSchema, ServiceConfig};
use crate::error::Result;
use log::{debug, info, warn};
use serde_json::{json, Map, Value};

const DEFINITIONS_PREFIX: &str = "#/definitions/";
const COMPONENTS_PREFIX: &str = "#/components/schemas/";

pub struct DocumentAssembler;

impl PipelinePlugin for DocumentAssembler {
    fn name(&self) -> &'static str {
        "openapi-assembler"
    }

    fn hooks(&self) -> Vec<String> {
        vec![ASSEMBLY_HOOK.to_string()]
    }

    fn invoke(&mut self, _hook: &str, ctx: &mut GenerationContext) -> Result<()> {
        info!("Assembling OpenAPI document");
        let document = build_document(&ctx.service, &ctx.models);
        serializer::write_document(&ctx.output_path, &document)?;
        info!("Wrote OpenAPI document to {}", ctx.output_path.display());
        Ok(())
    }
}

/// Builds the document from the populated configuration and model registry.
pub fn build_document(service: &ServiceConfig, models: &ModelRegistry) -> Value {
    let settings = service.documentation_settings();
    let title = settings
        .and_then(|s| s.title.clone())
        .unwrap_or_else(|| service.service.clone());
    let description = settings
        .and_then(|s| s.description.clone())
        .unwrap_or_default();
    let version = settings
        .and_then(|s| s.version.clone())
        .unwrap_or_else(|| "1.0.0".to_string());

    let mut paths = Map::new();
    for (function_name, function) in &service.functions {
        for event in &function.events {
            let Some(http) = &event.http else { continue };
            let Some(doc) = http.documentation.as_block() else {
                continue;
            };

            let path_key = format!("/{}", http.path.trim_start_matches('/'));
            let method_key = http.method.to_lowercase();
            debug!("Adding operation {} {}", method_key, path_key);

            let operation = build_operation(function_name, http, doc, models);
            let path_item = paths
                .entry(path_key)
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(item) = path_item {
                item.insert(method_key, operation);
            }
        }
    }

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": title,
            "description": description,
            "version": version,
        },
        "paths": paths,
        "components": {
            "schemas": component_schemas(models),
        },
    })
}

fn build_operation(
    function_name: &str,
    http: &HttpEvent,
    doc: &DocumentationBlock,
    models: &ModelRegistry,
) -> Value {
    let mut operation = Map::new();
    operation.insert(
        "operationId".to_string(),
        Value::String(function_name.to_string()),
    );
    if let Some(summary) = &doc.summary {
        operation.insert("summary".to_string(), Value::String(summary.clone()));
    }
    if let Some(description) = &doc.description {
        operation.insert("description".to_string(), Value::String(description.clone()));
    }

    let mut parameters = Vec::new();
    for param in &doc.path_params {
        parameters.push(parameter_value(param, "path", models));
    }
    for param in &doc.query_params {
        parameters.push(parameter_value(param, "query", models));
    }
    if !parameters.is_empty() {
        operation.insert("parameters".to_string(), Value::Array(parameters));
    }

    if !doc.request_models.is_empty() {
        let mut content = Map::new();
        for (content_type, model_name) in &doc.request_models {
            content.insert(
                content_type.clone(),
                json!({"schema": {"$ref": format!("{}{}", COMPONENTS_PREFIX, model_name)}}),
            );
        }
        let description = doc
            .request_body
            .as_ref()
            .and_then(|body| body.get("description"))
            .cloned()
            .unwrap_or_else(|| Value::String(String::new()));
        operation.insert(
            "requestBody".to_string(),
            json!({"description": description, "content": content}),
        );
    }

    let mut responses = Map::new();
    for response in &doc.method_responses {
        let mut entry = Map::new();
        let description = response
            .response_body
            .as_ref()
            .and_then(|body| body.get("description"))
            .cloned()
            .unwrap_or_else(|| Value::String(String::new()));
        entry.insert("description".to_string(), description);

        if !response.response_models.is_empty() {
            let mut content = Map::new();
            for (content_type, model_name) in &response.response_models {
                content.insert(
                    content_type.clone(),
                    json!({"schema": {"$ref": format!("{}{}", COMPONENTS_PREFIX, model_name)}}),
                );
            }
            entry.insert("content".to_string(), Value::Object(content));
        }
        responses.insert(response.status_code.to_string(), Value::Object(entry));
    }
    operation.insert("responses".to_string(), Value::Object(responses));

    Value::Object(operation)
}

fn parameter_value(param: &ParamDocumentation, location: &str, models: &ModelRegistry) -> Value {
    let schema = match &param.schema {
        Some(ParamSchema::Inline(schema)) => schema.clone(),
        Some(ParamSchema::Model(model_name)) => match models.find(model_name) {
            Some(entry) => entry.schema.clone(),
            None => {
                warn!(
                    "Parameter {} references unknown model {}, defaulting to string",
                    param.name, model_name
                );
                json!({"type": "string"})
            }
        },
        None => json!({"type": "string"}),
    };

    let mut value = Map::new();
    value.insert("name".to_string(), Value::String(param.name.clone()));
    value.insert("in".to_string(), Value::String(location.to_string()));
    value.insert(
        "required".to_string(),
        Value::Bool(param.required.unwrap_or(location == "path")),
    );
    if let Some(description) = &param.description {
        value.insert("description".to_string(), Value::String(description.clone()));
    }
    value.insert("schema".to_string(), schema);
    Value::Object(value)
}

/// Collects registry schemas into `components.schemas`, hoisting nested
/// `definitions` and relocating their `$ref`s. Duplicate names keep the last
/// registered schema.
fn component_schemas(models: &ModelRegistry) -> Value {
    let mut schemas = Map::new();
    for entry in models.entries() {
        let mut schema = entry.schema.clone();
        if let Value::Object(map) = &mut schema {
            if let Some(Value::Object(definitions)) = map.remove("definitions") {
                for (name, definition) in definitions {
                    schemas.insert(name, definition);
                }
            }
        }
        schemas.insert(entry.name.clone(), schema);
    }

    let mut value = Value::Object(schemas);
    relocate_refs(&mut value);
    value
}

/// Rewrites `#/definitions/…` references to `#/components/schemas/…`.
fn relocate_refs(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                if key == "$ref" {
                    if let Value::String(reference) = entry {
                        if let Some(rest) = reference.strip_prefix(DEFINITIONS_PREFIX) {
                            *reference = format!("{}{}", COMPONENTS_PREFIX, rest);
                        }
                    }
                } else {
                    relocate_refs(entry);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                relocate_refs(item);
            }
        }
        _ => {}
    }
}
