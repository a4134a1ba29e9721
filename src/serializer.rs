//! On-disk document IO.
//!
//! The assembled OpenAPI document travels as plain structured data
//! (`serde_json::Value`); the storage format is chosen by file extension.
//! JSON is written pretty-printed with 2-space indentation, everything else
//! as YAML.

use crate::error::Result;
use log::debug;
use serde_json::Value;
use std::fs;
use std::path::Path;

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("json")
}

/// Reads a document from disk, parsing JSON or YAML by extension.
pub fn read_document(path: &Path) -> Result<Value> {
    debug!("Reading document from {}", path.display());
    let content = fs::read_to_string(path)?;
    let value = if is_json(path) {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    Ok(value)
}

/// Writes a document in place, JSON (2-space pretty) or YAML by extension.
/// Parent directories are created when missing.
pub fn write_document(path: &Path, document: &Value) -> Result<()> {
    let content = if is_json(path) {
        serde_json::to_string_pretty(document)?
    } else {
        serde_yaml::to_string(document)?
    };
    write_to_file(&content, path)
}

/// Writes string content to a file, creating parent directories as needed.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing {} bytes to {}", content.len(), path.display());
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, content)?;
    Ok(())
}
