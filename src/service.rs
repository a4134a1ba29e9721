//! Typed model of the host service configuration.
//!
//! This mirrors the subtree of the deployment framework's configuration that
//! the documentation pipeline consumes: declared functions with their HTTP
//! events, the per-event `documentation` block, and the project-level
//! `custom.documentation` settings. Maps preserve declaration order so model
//! registration and error reporting follow the configuration file.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Root of the service configuration file (`serverless.yml` style).
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Service name.
    pub service: String,
    /// Declared functions, in declaration order.
    #[serde(default)]
    pub functions: IndexMap<String, FunctionDeclaration>,
    /// Project-level custom configuration.
    #[serde(default)]
    pub custom: CustomConfig,
}

impl ServiceConfig {
    /// The project documentation settings, if the project declares any.
    pub fn documentation_settings(&self) -> Option<&DocumentationSettings> {
        self.custom.documentation.as_ref()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomConfig {
    #[serde(default)]
    pub documentation: Option<DocumentationSettings>,
}

/// Project-level documentation settings under `custom.documentation`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentationSettings {
    /// Namespace prefixed to every derived model name.
    #[serde(default)]
    pub api_namespace: Option<String>,
    /// Document title; falls back to the service name.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    /// Custom tags appended after the title-derived tag.
    #[serde(default)]
    pub tags: Vec<TagDeclaration>,
    /// Optional object-storage bucket the final document is copied to.
    #[serde(default)]
    pub s3_bucket: Option<String>,
    /// Project-level override for the type-declaration source path.
    #[serde(default)]
    pub api_types_path: Option<String>,
    /// Project-level override for the compiler configuration path.
    #[serde(default)]
    pub typegen_config_path: Option<String>,
    /// Models declared directly in the configuration; seed the registry.
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

/// A named schema model in the shared registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelEntry {
    pub name: String,
    pub content_type: String,
    pub schema: Value,
}

/// A documentation tag with its description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagDeclaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A declared function and its trigger events.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionDeclaration {
    #[serde(default)]
    pub handler: Option<String>,
    #[serde(default)]
    pub events: Vec<EventDeclaration>,
}

impl FunctionDeclaration {
    /// First HTTP event of this function, if any.
    pub fn http_event(&self) -> Option<&HttpEvent> {
        self.events.iter().find_map(|e| e.http.as_ref())
    }
}

/// One event entry; only `http` events are relevant to documentation.
#[derive(Debug, Clone, Deserialize)]
pub struct EventDeclaration {
    #[serde(default)]
    pub http: Option<HttpEvent>,
}

/// An HTTP trigger declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpEvent {
    pub method: String,
    pub path: String,
    /// Private endpoints may stay undocumented without failing the run.
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub request: RequestSpec,
    /// Tri-state: absent, explicitly `~`, or a populated block.
    #[serde(default, deserialize_with = "deserialize_documentation")]
    pub documentation: DocumentationState,
}

/// Host-declared request shape: parameters plus generated validator schemas.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestSpec {
    #[serde(default)]
    pub parameters: RequestParameters,
    /// Content-type keyed validator entries, written during population.
    #[serde(default)]
    pub schemas: IndexMap<String, ValidatorSchema>,
}

/// Declared path and query string parameters, name to required-flag.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestParameters {
    #[serde(default)]
    pub paths: IndexMap<String, bool>,
    #[serde(default)]
    pub querystrings: IndexMap<String, bool>,
}

/// A generated request validator entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorSchema {
    pub name: String,
    pub schema: Value,
    pub description: String,
}

/// The three observable states of an event's `documentation` attribute.
///
/// `OptedOut` (an explicit `documentation: ~`) marks an intentionally
/// undocumented endpoint and is skipped without error. `Unset` on a
/// non-private event is a configuration error reported at the end of the
/// population scan.
#[derive(Debug, Clone, Default)]
pub enum DocumentationState {
    #[default]
    Unset,
    OptedOut,
    Configured(DocumentationBlock),
}

impl DocumentationState {
    pub fn as_block(&self) -> Option<&DocumentationBlock> {
        match self {
            DocumentationState::Configured(block) => Some(block),
            _ => None,
        }
    }

    pub fn as_block_mut(&mut self) -> Option<&mut DocumentationBlock> {
        match self {
            DocumentationState::Configured(block) => Some(block),
            _ => None,
        }
    }
}

fn deserialize_documentation<'de, D>(deserializer: D) -> Result<DocumentationState, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<DocumentationBlock>::deserialize(deserializer)?;
    Ok(match value {
        None => DocumentationState::OptedOut,
        Some(block) => DocumentationState::Configured(block),
    })
}

/// The per-event documentation block, enriched in place during population.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentationBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Operation tag; falls back to the document title during post-processing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Content-type to model name for the request body.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub request_models: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub method_responses: Vec<MethodResponse>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path_params: Vec<ParamDocumentation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query_params: Vec<ParamDocumentation>,
}

/// One status-code entry under `methodResponses`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodResponse {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<Value>,
    /// Content-type to model name; empty for schema-less responses.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub response_models: IndexMap<String, String>,
}

/// Documentation for a single path or query string parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDocumentation {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<ParamSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A parameter schema is either an unresolved model name or an already
/// expanded JSON-schema tree. Unresolved names are expanded eagerly during
/// population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamSchema {
    Model(String),
    Inline(Value),
}
