//! openapi-typegen - OpenAPI documentation for serverless-style deployment
//! pipelines, generated from Rust type declarations.
//!
//! The crate plugs into a host deployment lifecycle: it scans declared
//! HTTP-triggered functions, compiles request/response models from exported
//! type declarations, injects them into the shared documentation
//! configuration, triggers the document-assembly step, and post-processes
//! the assembled OpenAPI document on disk.
//!
//! # Architecture
//!
//! The library is organized into modules that mirror the pipeline stages:
//!
//! 1. [`service`] - Typed model of the host service configuration
//! 2. [`hooks`] - Plugin manager and hook lifecycle dispatch
//! 3. [`plugin`] - The typegen plugin: gate, trigger, stage wiring
//! 4. [`declarations`] - Discovery and indexing of type declaration sources
//! 5. [`schema`] - JSON-Schema generation from indexed declarations
//! 6. [`compiler`] - The type-to-schema compiler adapter
//! 7. [`population`] - Model population and parameter defaulting
//! 8. [`assembler`] - Built-in document-assembly collaborator
//! 9. [`postprocess`] - Version tagging, tag enrichment, sanitization
//! 10. [`serializer`] - YAML/JSON document IO
//!
//! # Example Usage
//!
//! ```no_run
//! use openapi_typegen::assembler::DocumentAssembler;
//! use openapi_typegen::hooks::{GenerationContext, PluginManager};
//! use openapi_typegen::plugin::{OpenApiTypeGen, PluginOptions};
//! use openapi_typegen::service::ServiceConfig;
//! use std::path::PathBuf;
//!
//! let yaml = std::fs::read_to_string("serverless.yml").unwrap();
//! let service: ServiceConfig = serde_yaml::from_str(&yaml).unwrap();
//!
//! let mut manager = PluginManager::new();
//! manager.register(Box::new(DocumentAssembler));
//! let plugin = OpenApiTypeGen::new(&mut manager, &service, &PluginOptions::default()).unwrap();
//! manager.register(Box::new(plugin));
//!
//! let mut ctx = GenerationContext::new(service, PathBuf::from("openapi.json"));
//! manager.run_command("package", &mut ctx).unwrap();
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module which provides a complete
//! CLI application.

pub mod assembler;
pub mod cli;
pub mod compiler;
pub mod declarations;
pub mod error;
pub mod hooks;
pub mod naming;
pub mod plugin;
pub mod population;
pub mod postprocess;
pub mod schema;
pub mod serializer;
pub mod service;
