//! Model population: walks declared functions and injects per-endpoint
//! schema models into the shared registry and event documentation.
//!
//! Method dispatch is an explicit policy table ([`models_for_method`]): write
//! methods require a request body model and, like `GET`, a response model;
//! query and path parameter models are attempted for every method and fall
//! back to implicit string-typed parameters when the type does not exist.

use crate::compiler::TypeCompiler;
use crate::error::{Error, Result};
use crate::naming;
use crate::service::{
    DocumentationState, HttpEvent, MethodResponse, ModelEntry, ParamDocumentation, ParamSchema,
    ServiceConfig, ValidatorSchema,
};
use indexmap::IndexMap;
use log::{debug, info};
use serde_json::{json, Value};

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// The shared, accumulating model registry attached to the run.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    entries: Vec<ModelEntry>,
}

impl ModelRegistry {
    /// Starts from the models declared directly in the configuration.
    pub fn seeded_from(service: &ServiceConfig) -> Self {
        let entries = service
            .documentation_settings()
            .map(|settings| settings.models.clone())
            .unwrap_or_default();
        Self { entries }
    }

    /// Appends an entry. Names are not deduplicated: a model name produced
    /// by two functions yields two entries.
    pub fn push(&mut self, name: String, schema: Value) {
        self.entries.push(ModelEntry {
            name,
            content_type: JSON_CONTENT_TYPE.to_string(),
            schema,
        });
    }

    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    pub fn find(&self, name: &str) -> Option<&ModelEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The model kinds an endpoint can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    RequestBody,
    Response,
    QueryParams,
    PathParams,
}

impl ModelKind {
    fn suffix(self) -> &'static str {
        match self {
            ModelKind::RequestBody => naming::REQUEST_BODY_SUFFIX,
            ModelKind::Response => naming::RESPONSE_SUFFIX,
            ModelKind::QueryParams => naming::QUERY_PARAMS_SUFFIX,
            ModelKind::PathParams => naming::PATH_PARAMS_SUFFIX,
        }
    }
}

/// One planned model for an endpoint. Required models abort the run when the
/// type does not resolve; optional ones are logged and skipped.
#[derive(Debug, Clone, Copy)]
pub struct PlannedModel {
    pub kind: ModelKind,
    pub required: bool,
}

/// Per-method model policy. `POST`/`PUT`/`PATCH` also receive a response
/// model; parameter models are attempted regardless of method.
pub fn models_for_method(method: &str) -> Vec<PlannedModel> {
    let mut plan = Vec::new();
    match method.to_lowercase().as_str() {
        "post" | "put" | "patch" => {
            plan.push(PlannedModel {
                kind: ModelKind::RequestBody,
                required: true,
            });
            plan.push(PlannedModel {
                kind: ModelKind::Response,
                required: true,
            });
        }
        "get" => plan.push(PlannedModel {
            kind: ModelKind::Response,
            required: true,
        }),
        _ => {}
    }
    plan.push(PlannedModel {
        kind: ModelKind::QueryParams,
        required: false,
    });
    plan.push(PlannedModel {
        kind: ModelKind::PathParams,
        required: false,
    });
    plan
}

/// Walks every declared function and enriches documented HTTP events with
/// derived models and default parameter documentation. Fails after the full
/// scan when any non-private HTTP event is neither documented nor opted out.
pub fn populate(
    service: &mut ServiceConfig,
    registry: &mut ModelRegistry,
    compiler: &mut dyn TypeCompiler,
) -> Result<()> {
    info!("Scanning functions for documentation attribute");

    let namespace = service
        .documentation_settings()
        .and_then(|settings| settings.api_namespace.clone())
        .ok_or_else(|| {
            Error::ConfigError(
                "custom.documentation.apiNamespace must be set when documentation generation is enabled"
                    .to_string(),
            )
        })?;

    let mut missing_documentation = Vec::new();
    for (function_name, function) in service.functions.iter_mut() {
        for event in function.events.iter_mut() {
            let Some(http) = event.http.as_mut() else {
                continue;
            };
            match &http.documentation {
                DocumentationState::Configured(_) => {
                    info!("Generating docs for {}", function_name);
                    set_models(http, function_name, &namespace, registry, compiler)?;
                    apply_default_parameters(http, compiler)?;
                }
                DocumentationState::OptedOut => {
                    debug!("{} is explicitly undocumented, skipping", function_name);
                }
                DocumentationState::Unset => {
                    if !http.private {
                        missing_documentation.push(function_name.clone());
                    }
                }
            }
        }
    }

    if !missing_documentation.is_empty() {
        return Err(Error::UndocumentedFunctions(missing_documentation));
    }
    Ok(())
}

fn set_models(
    http: &mut HttpEvent,
    function_name: &str,
    namespace: &str,
    registry: &mut ModelRegistry,
    compiler: &mut dyn TypeCompiler,
) -> Result<()> {
    let prefix = naming::definition_prefix(namespace, function_name);
    let method = http.method.to_lowercase();

    if method == "delete" {
        if let Some(doc) = http.documentation.as_block_mut() {
            doc.method_responses = vec![MethodResponse {
                status_code: 204,
                response_body: Some(json!({
                    "description": "Mocked response for the delete endpoint."
                })),
                response_models: IndexMap::new(),
            }];
        }
    }

    for planned in models_for_method(&method) {
        let model_name = naming::model_name(&prefix, planned.kind.suffix());
        match planned.kind {
            ModelKind::RequestBody => {
                let schema = compiler.compile(&model_name)?;
                registry.push(model_name.clone(), schema.clone());
                if let Some(doc) = http.documentation.as_block_mut() {
                    doc.request_models
                        .insert(JSON_CONTENT_TYPE.to_string(), model_name.clone());
                    doc.request_body = Some(json!({"description": ""}));
                }
                http.request.schemas.insert(
                    JSON_CONTENT_TYPE.to_string(),
                    ValidatorSchema {
                        name: naming::format_name(&model_name),
                        schema,
                        description: format!("Generated schema for {}", model_name),
                    },
                );
            }
            ModelKind::Response => {
                let schema = compiler.compile(&model_name)?;
                registry.push(model_name.clone(), schema);
                if let Some(doc) = http.documentation.as_block_mut() {
                    doc.method_responses = vec![MethodResponse {
                        status_code: 200,
                        response_body: Some(json!({"description": ""})),
                        response_models: IndexMap::from([(
                            JSON_CONTENT_TYPE.to_string(),
                            model_name.clone(),
                        )]),
                    }];
                }
            }
            ModelKind::QueryParams | ModelKind::PathParams => {
                match compiler.compile(&model_name) {
                    Ok(schema) => registry.push(model_name.clone(), schema),
                    Err(_) => {
                        let param_kind = if planned.kind == ModelKind::QueryParams {
                            "query"
                        } else {
                            "path"
                        };
                        info!(
                            "Skipped generation of \"{}\" - model is missing - will be using the default {} param of type string",
                            model_name, param_kind
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

/// Back-fills default documentation for host-declared parameters and eagerly
/// resolves documented schemas given as model names. The synthesized default
/// supplies the required-flag; explicit entry fields win over the default.
fn apply_default_parameters(http: &mut HttpEvent, compiler: &mut dyn TypeCompiler) -> Result<()> {
    let declared: [(IndexMap<String, bool>, bool); 2] = [
        (http.request.parameters.paths.clone(), true),
        (http.request.parameters.querystrings.clone(), false),
    ];

    for (params, is_path) in declared {
        for (name, required) in params {
            let Some(doc) = http.documentation.as_block_mut() else {
                return Ok(());
            };
            let list = if is_path {
                &mut doc.path_params
            } else {
                &mut doc.query_params
            };

            match list.iter_mut().find(|param| param.name == name) {
                Some(existing) => {
                    let unresolved = match &existing.schema {
                        Some(ParamSchema::Model(model_name)) => Some(model_name.clone()),
                        _ => None,
                    };
                    if let Some(model_name) = unresolved {
                        let schema = compiler.compile(&model_name)?;
                        existing.schema = Some(ParamSchema::Inline(schema));
                    }
                    if existing.required.is_none() {
                        existing.required = Some(required);
                    }
                    if existing.schema.is_none() {
                        existing.schema = Some(ParamSchema::Inline(json!({"type": "string"})));
                    }
                }
                None => list.push(ParamDocumentation {
                    name,
                    required: Some(required),
                    schema: Some(ParamSchema::Inline(json!({"type": "string"}))),
                    description: None,
                }),
            }
        }
    }
    Ok(())
}
