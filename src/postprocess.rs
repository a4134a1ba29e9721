//! Post-processing of the assembled OpenAPI document.
//!
//! Runs after the assembly hook, against the document on disk: forces the
//! target OpenAPI version, derives the title tag and per-operation tags,
//! rewrites operation ids to kebab-case, sanitizes angle brackets that
//! generic schema names leak into keys and `$ref` values, writes the result
//! back, and optionally copies it to an object-storage bucket.

use crate::error::{Error, Result};
use crate::hooks::GenerationContext;
use crate::naming;
use crate::serializer;
use crate::service::ServiceConfig;
use log::{info, warn};
use serde_json::{json, Map, Value};
use std::path::Path;
use std::process::Command;

/// The version stamped on every produced document.
pub const TARGET_OPENAPI_VERSION: &str = "3.1.0";

/// The full post-processing pipeline, strictly ordered.
pub fn post_process(ctx: &GenerationContext) -> Result<()> {
    let mut document = serializer::read_document(&ctx.output_path)?;
    patch_openapi_version(&mut document);
    enrich_operations(&mut document, &ctx.service)?;
    let document = sanitize_document(document);
    serializer::write_document(&ctx.output_path, &document)?;

    let bucket = ctx
        .service
        .documentation_settings()
        .and_then(|settings| settings.s3_bucket.clone());
    if let Some(bucket) = bucket {
        upload_to_bucket(&ctx.output_path, &bucket);
    }
    Ok(())
}

/// Forces the `openapi` field to the target version.
pub fn patch_openapi_version(document: &mut Value) {
    info!("Setting openapi version to {}", TARGET_OPENAPI_VERSION);
    if let Value::Object(map) = document {
        map.insert(
            "openapi".to_string(),
            Value::String(TARGET_OPENAPI_VERSION.to_string()),
        );
    }
}

/// Derives the title tag, appends custom tags, and rewrites every operation:
/// tag list from the originating function's documentation (title tag as the
/// fallback) and kebab-case `operationId`. An operation that does not trace
/// back to a declared function fails the run.
pub fn enrich_operations(document: &mut Value, service: &ServiceConfig) -> Result<()> {
    let title = document
        .get("info")
        .and_then(|info| info.get("title"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let description = document
        .get("info")
        .and_then(|info| info.get("description"))
        .cloned()
        .unwrap_or(Value::Null);

    let mut tags = vec![json!({"name": title, "description": description})];
    if let Some(settings) = service.documentation_settings() {
        for tag in &settings.tags {
            tags.push(serde_json::to_value(tag)?);
        }
    }
    if let Value::Object(map) = document {
        map.insert("tags".to_string(), Value::Array(tags));
    }

    let Some(paths) = document.get_mut("paths").and_then(Value::as_object_mut) else {
        return Ok(());
    };
    for (_path, path_item) in paths.iter_mut() {
        let Some(path_item) = path_item.as_object_mut() else {
            continue;
        };
        for (_method, operation) in path_item.iter_mut() {
            let Some(operation) = operation.as_object_mut() else {
                continue;
            };
            let operation_id = operation
                .get("operationId")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            let function = service
                .functions
                .get(&operation_id)
                .ok_or_else(|| Error::UnknownOperation(operation_id.clone()))?;
            let tag = function
                .http_event()
                .and_then(|http| http.documentation.as_block())
                .and_then(|doc| doc.tag.clone())
                .unwrap_or_else(|| title.clone());

            operation.insert("tags".to_string(), json!([tag]));
            operation.insert(
                "operationId".to_string(),
                Value::String(naming::kebab_case(&operation_id)),
            );
        }
    }
    Ok(())
}

/// Applies both sanitization passes: angle brackets in keys, then
/// percent-encoded angle brackets in `$ref` values.
pub fn sanitize_document(document: Value) -> Value {
    let mut document = sanitize_keys(document);
    sanitize_refs(&mut document);
    document
}

/// Deep key rewrite replacing `<` and `>` with `_` across the whole tree.
fn sanitize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut rewritten = Map::new();
            for (key, entry) in map {
                let key = if key.contains('<') || key.contains('>') {
                    key.replace(['<', '>'], "_")
                } else {
                    key
                };
                rewritten.insert(key, sanitize_keys(entry));
            }
            Value::Object(rewritten)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_keys).collect()),
        other => other,
    }
}

/// Deep value rewrite replacing `%3C`/`%3E` with `_`, restricted to values
/// of keys named `$ref`.
fn sanitize_refs(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                if key == "$ref" {
                    if let Value::String(reference) = entry {
                        if reference.contains("%3C") || reference.contains("%3E") {
                            *reference = reference.replace("%3C", "_").replace("%3E", "_");
                        }
                    }
                } else {
                    sanitize_refs(entry);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                sanitize_refs(item);
            }
        }
        _ => {}
    }
}

/// Copies the final document to the bucket with the `aws` CLI. Best effort:
/// failures are logged and the run continues.
fn upload_to_bucket(path: &Path, bucket: &str) {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("openapi.json");
    let destination = format!("s3://{}/{}", bucket, file_name);

    match Command::new("aws")
        .arg("s3")
        .arg("cp")
        .arg(path)
        .arg(&destination)
        .output()
    {
        Ok(output) if output.status.success() => {
            info!("File uploaded successfully to {}", destination);
        }
        Ok(output) => {
            warn!(
                "Error uploading file: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Err(e) => warn!("Error uploading file: {}", e),
    }
}
