use openapi_typegen::assembler::DocumentAssembler;
use openapi_typegen::error::{Error, Result};
use openapi_typegen::hooks::{GenerationContext, PluginManager, GENERATE_COMMAND};
use openapi_typegen::plugin::{OpenApiTypeGen, PluginOptions};
use openapi_typegen::serializer;
use openapi_typegen::service::ServiceConfig;
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const FULL_API: &str = r#"
pub mod project_api {
    pub struct ObjectType {
        pub types: Option<Vec<String>>,
        pub children: Option<Vec<ObjectType>>,
    }

    pub mod create_func {
        pub mod request {
            pub struct Body {
                pub data: String,
                pub status_code: Option<u32>,
                pub enable: bool,
                pub object: Option<ObjectType>,
            }
        }
        pub struct Response {
            pub id: String,
            pub uuid: String,
        }
    }

    pub mod get_func {
        pub struct Response {
            pub data: String,
        }
    }
}
"#;

const FULL_SERVICE: &str = r#"
service: my-service
custom:
  documentation:
    apiNamespace: ProjectApi
    title: My Service
    description: Service under test
    version: "1"
functions:
  getFunc:
    handler: handler.get
    events:
      - http:
          method: get
          path: get-func
          documentation: {}
          request:
            parameters:
              querystrings:
                verbose: false
  createFunc:
    handler: handler.create
    events:
      - http:
          method: post
          path: create-func
          documentation:
            tag: Creation
  deleteFunc:
    handler: handler.delete
    events:
      - http:
          method: delete
          path: delete-func
          documentation: {}
  statusFunc:
    handler: handler.status
    events:
      - http:
          method: get
          path: status
          private: true
  legacyFunc:
    handler: handler.legacy
    events:
      - http:
          method: get
          path: legacy
          documentation: ~
"#;

struct Project {
    _dir: TempDir,
    output_path: PathBuf,
    manager: PluginManager,
    ctx: GenerationContext,
}

/// Sets up a temp project and the plugin pipeline without running it.
fn project(service_yaml: &str, api_rs: &str, output_name: &str) -> Project {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("serverless.yml"), service_yaml).unwrap();
    fs::write(dir.path().join("api.rs"), api_rs).unwrap();
    let output_path = dir.path().join(output_name);

    let service: ServiceConfig = serde_yaml::from_str(service_yaml).unwrap();

    let mut manager = PluginManager::new();
    manager.register(Box::new(DocumentAssembler));
    let options = PluginOptions {
        api_types_path: Some(dir.path().join("api.rs")),
        typegen_config_path: Some(dir.path().join("typegen.toml")),
    };
    let plugin = OpenApiTypeGen::new(&mut manager, &service, &options).unwrap();
    manager.register(Box::new(plugin));

    let ctx = GenerationContext::new(service, output_path.clone());
    Project {
        _dir: dir,
        output_path,
        manager,
        ctx,
    }
}

fn run(service_yaml: &str, api_rs: &str, output_name: &str) -> (Project, Result<()>) {
    let mut project = project(service_yaml, api_rs, output_name);
    let result = project.manager.run_command("package", &mut project.ctx);
    (project, result)
}

#[test]
fn test_full_project_end_to_end() {
    let (project, result) = run(FULL_SERVICE, FULL_API, "openapi.json");
    result.unwrap();

    let document = serializer::read_document(&project.output_path).unwrap();

    assert_eq!(document["openapi"], "3.1.0");
    assert_eq!(document["info"]["title"], "My Service");

    // Title-derived tag.
    assert_eq!(document["tags"][0]["name"], "My Service");
    assert_eq!(document["tags"][0]["description"], "Service under test");

    // GET operation: kebab-case id, title tag, 200 response model.
    let get = &document["paths"]["/get-func"]["get"];
    assert_eq!(get["operationId"], "get-func");
    assert_eq!(get["tags"], json!(["My Service"]));
    assert_eq!(
        get["responses"]["200"]["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/ProjectApi.GetFunc.Response"
    );
    let get_schema = &document["components"]["schemas"]["ProjectApi.GetFunc.Response"];
    assert_eq!(get_schema["properties"]["data"]["type"], "string");

    // The declared query string parameter was synthesized as string-typed.
    let parameters = get["parameters"].as_array().unwrap();
    assert_eq!(parameters.len(), 1);
    assert_eq!(parameters[0]["name"], "verbose");
    assert_eq!(parameters[0]["in"], "query");
    assert_eq!(parameters[0]["required"], false);
    assert_eq!(parameters[0]["schema"]["type"], "string");

    // POST operation: documented tag wins, request body model attached.
    let post = &document["paths"]["/create-func"]["post"];
    assert_eq!(post["operationId"], "create-func");
    assert_eq!(post["tags"], json!(["Creation"]));
    assert_eq!(
        post["requestBody"]["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/ProjectApi.CreateFunc.Request.Body"
    );
    // Write endpoints also get a response model.
    assert_eq!(
        post["responses"]["200"]["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/ProjectApi.CreateFunc.Response"
    );

    // DELETE: exactly one 204 response without a schema-bearing model.
    let delete = &document["paths"]["/delete-func"]["delete"];
    let responses = delete["responses"].as_object().unwrap();
    assert_eq!(responses.len(), 1);
    assert!(responses["204"].get("content").is_none());

    // Private and opted-out functions are not documented.
    assert!(document["paths"].get("/status").is_none());
    assert!(document["paths"].get("/legacy").is_none());

    // The recursive nested type was hoisted into components.
    let object_type = &document["components"]["schemas"]["ObjectType"];
    assert_eq!(
        object_type["properties"]["children"]["items"]["$ref"],
        "#/components/schemas/ObjectType"
    );
}

#[test]
fn test_yaml_output_format() {
    let (project, result) = run(FULL_SERVICE, FULL_API, "openapi.yml");
    result.unwrap();

    let content = fs::read_to_string(&project.output_path).unwrap();
    assert!(content.contains("openapi: 3.1.0"));

    let document = serializer::read_document(&project.output_path).unwrap();
    assert_eq!(document["paths"]["/get-func"]["get"]["operationId"], "get-func");
}

#[test]
fn test_request_validator_schema_matches_compiled_model() {
    let (project, result) = run(FULL_SERVICE, FULL_API, "openapi.json");
    result.unwrap();

    let validator = &project.ctx.service.functions["createFunc"]
        .http_event()
        .unwrap()
        .request
        .schemas["application/json"];
    assert_eq!(validator.name, "ProjectApiCreateFuncRequestBody");

    let registered = project
        .ctx
        .models
        .find("ProjectApi.CreateFunc.Request.Body")
        .unwrap();
    assert_eq!(validator.schema, registered.schema);
    assert_eq!(
        validator.schema["properties"]["data"],
        json!({"type": "string"})
    );
}

#[test]
fn test_missing_assembler_is_an_ordering_error() {
    let service: ServiceConfig = serde_yaml::from_str(FULL_SERVICE).unwrap();
    let mut manager = PluginManager::new();
    let err =
        OpenApiTypeGen::new(&mut manager, &service, &PluginOptions::default()).unwrap_err();
    assert!(matches!(err, Error::PluginOrder));
    assert!(err.to_string().contains("AFTER"));
}

#[test]
fn test_undocumented_function_fails_naming_it() {
    let service_yaml = r#"
service: my-service
custom:
  documentation:
    apiNamespace: ProjectApi
functions:
  getFunc:
    events:
      - http:
          method: get
          path: get-func
          documentation: {}
  deleteFunc:
    events:
      - http:
          method: delete
          path: delete-func
"#;
    let (project, result) = run(service_yaml, FULL_API, "openapi.json");
    let err = result.unwrap_err();
    assert!(err.to_string().contains("deleteFunc"));
    assert!(!project.output_path.exists());
}

#[test]
fn test_missing_root_type_fails() {
    let service_yaml = r#"
service: my-service
custom:
  documentation:
    apiNamespace: ProjectApi
functions:
  createFunc:
    events:
      - http:
          method: post
          path: create-func
          documentation: {}
"#;
    let api_rs = r#"
pub mod project_api {
    pub mod get_func {
        pub struct Response {
            pub data: String,
        }
    }
}
"#;
    let (_project, result) = run(service_yaml, api_rs, "openapi.json");
    assert_eq!(
        result.unwrap_err().to_string(),
        "No root type \"ProjectApi.CreateFunc.Request.Body\" found"
    );
}

#[test]
fn test_disabled_project_generates_nothing() {
    let service_yaml = r#"
service: my-service
functions:
  getFunc:
    events:
      - http:
          method: get
          path: get-func
"#;
    let (project, result) = run(service_yaml, FULL_API, "openapi.json");
    result.unwrap();
    assert!(!project.output_path.exists());
}

#[test]
fn test_disabled_project_ignores_direct_generation() {
    let service_yaml = "service: my-service\n";
    let mut project = project(service_yaml, FULL_API, "openapi.json");
    project
        .manager
        .run_command(GENERATE_COMMAND, &mut project.ctx)
        .unwrap();
    assert!(!project.output_path.exists());
}

#[test]
fn test_natural_firing_after_trigger_is_a_no_op() {
    let (mut project, result) = run(FULL_SERVICE, FULL_API, "openapi.json");
    result.unwrap();
    assert!(project.output_path.exists());

    // The host firing the generation command again must not regenerate.
    fs::remove_file(&project.output_path).unwrap();
    project
        .manager
        .run_command(GENERATE_COMMAND, &mut project.ctx)
        .unwrap();
    assert!(!project.output_path.exists());
}

#[test]
fn test_const_replacement_in_generated_models() {
    let service_yaml = r#"
service: my-service
custom:
  documentation:
    apiNamespace: ProjectApi
functions:
  createFunc:
    events:
      - http:
          method: post
          path: create-func
          documentation: {}
"#;
    let api_rs = r#"
pub mod project_api {
    pub enum Marker {
        Test,
    }

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
}
"#;
    let (project, result) = run(service_yaml, api_rs, "openapi.json");
    result.unwrap();

    let document = serializer::read_document(&project.output_path).unwrap();
    let marker = &document["components"]["schemas"]["Marker"];
    assert_eq!(marker["enum"], json!(["Test"]));
    assert!(marker.get("const").is_none());
}

#[test]
fn test_generic_type_names_are_sanitized() {
    let service_yaml = r#"
service: my-service
custom:
  documentation:
    apiNamespace: ProjectApi
functions:
  getFunc:
    events:
      - http:
          method: get
          path: get-func
          documentation: {}
"#;
    let api_rs = r#"
pub mod project_api {
    pub type GenericType<T> = Vec<T>;

    pub struct Inner {
        pub key: String,
        pub name: u32,
    }

    pub mod get_func {
        pub struct Response {
            pub data: String,
            pub generic: GenericType<Inner>,
        }
    }
}
"#;
    let (project, result) = run(service_yaml, api_rs, "openapi.json");
    result.unwrap();

    let document = serializer::read_document(&project.output_path).unwrap();
    let schemas = document["components"]["schemas"].as_object().unwrap();

    // The instantiation key lost its angle brackets.
    assert!(schemas.contains_key("GenericType_Inner_"));
    assert!(!schemas.keys().any(|k| k.contains('<')));

    // References were rewritten consistently and still resolve.
    let response = &schemas["ProjectApi.GetFunc.Response"];
    let reference = response["properties"]["generic"]["$ref"].as_str().unwrap();
    assert_eq!(reference, "#/components/schemas/GenericType_Inner_");

    let instance = &schemas["GenericType_Inner_"];
    assert_eq!(instance["type"], "array");
    assert_eq!(instance["items"]["$ref"], "#/components/schemas/Inner");
}

#[test]
fn test_custom_tags_are_appended() {
    let service_yaml = r#"
service: my-service
custom:
  documentation:
    apiNamespace: ProjectApi
    title: My Service
    tags:
      - name: Webhooks
        description: Callback endpoints
functions:
  getFunc:
    events:
      - http:
          method: get
          path: get-func
          documentation: {}
"#;
    let (project, result) = run(service_yaml, FULL_API, "openapi.json");
    result.unwrap();

    let document = serializer::read_document(&project.output_path).unwrap();
    let tags = document["tags"].as_array().unwrap();
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0]["name"], "My Service");
    assert_eq!(tags[1]["name"], "Webhooks");
    assert_eq!(tags[1]["description"], "Callback endpoints");
}

#[test]
fn test_documented_param_model_is_resolved() {
    let service_yaml = r#"
service: my-service
custom:
  documentation:
    apiNamespace: ProjectApi
functions:
  getFunc:
    events:
      - http:
          method: get
          path: get-func/{id}
          documentation:
            pathParams:
              - name: id
                schema: ProjectApi.GetFunc.Request.PathParams
          request:
            parameters:
              paths:
                id: true
"#;
    let api_rs = r#"
pub mod project_api {
    pub mod get_func {
        pub mod request {
            pub struct PathParams {
                pub id: u64,
            }
        }
        pub struct Response {
            pub data: String,
        }
    }
}
"#;
    let (project, result) = run(service_yaml, api_rs, "openapi.json");
    result.unwrap();

    let document = serializer::read_document(&project.output_path).unwrap();
    let parameters = document["paths"]["/get-func/{id}"]["get"]["parameters"]
        .as_array()
        .unwrap();
    assert_eq!(parameters.len(), 1);
    assert_eq!(parameters[0]["name"], "id");
    assert_eq!(parameters[0]["required"], true);
    // The model-name schema was expanded into the real schema tree.
    assert_eq!(
        parameters[0]["schema"]["properties"]["id"]["type"],
        "integer"
    );
}
