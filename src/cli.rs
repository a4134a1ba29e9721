use crate::assembler::DocumentAssembler;
use crate::hooks::{GenerationContext, PluginManager};
use crate::plugin::{OpenApiTypeGen, PluginOptions};
use crate::service::ServiceConfig;
use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use std::fs;
use std::path::PathBuf;

/// openapi-typegen - Generate OpenAPI documentation from Rust type declarations
#[derive(Parser, Debug)]
#[command(name = "openapi-typegen")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the service configuration file
    #[arg(value_name = "CONFIG", default_value = "serverless.yml")]
    pub config_path: PathBuf,

    /// Output file path; the extension selects YAML or JSON
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        default_value = "openapi.json"
    )]
    pub output_path: PathBuf,

    /// Path to the type declaration source (a .rs file or a directory)
    #[arg(long = "api-types", value_name = "PATH")]
    pub api_types_path: Option<PathBuf>,

    /// Path to the typegen compiler configuration file
    #[arg(long = "typegen-config", value_name = "FILE")]
    pub typegen_config_path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.config_path.exists() {
        anyhow::bail!(
            "Service configuration not found: {}",
            args.config_path.display()
        );
    }

    info!("Service configuration: {}", args.config_path.display());
    info!("Output file: {}", args.output_path.display());
    if let Some(ref path) = args.api_types_path {
        info!("Type declarations: {}", path.display());
    }

    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting OpenAPI document generation...");

    // Step 1: Load the service configuration
    let content = fs::read_to_string(&args.config_path).with_context(|| {
        format!(
            "Failed to read service configuration: {}",
            args.config_path.display()
        )
    })?;
    let service: ServiceConfig = serde_yaml::from_str(&content).with_context(|| {
        format!(
            "Failed to parse service configuration: {}",
            args.config_path.display()
        )
    })?;
    info!(
        "Loaded {} function(s) for service {}",
        service.functions.len(),
        service.service
    );

    // Step 2: Register the assembly collaborator, then this plugin
    let mut manager = PluginManager::new();
    manager.register(Box::new(DocumentAssembler));

    let options = PluginOptions {
        api_types_path: args.api_types_path.clone(),
        typegen_config_path: args.typegen_config_path.clone(),
    };
    let plugin = OpenApiTypeGen::new(&mut manager, &service, &options)?;
    let disabled = plugin.is_disabled();
    manager.register(Box::new(plugin));

    // Step 3: Run the packaging lifecycle; the plugin triggers generation
    let mut ctx = GenerationContext::new(service, args.output_path.clone());
    manager.run_command("package", &mut ctx)?;

    if disabled {
        info!("Documentation generation is disabled; nothing to do");
        return Ok(());
    }

    // Step 4: Display summary
    info!("Generation complete!");
    info!("Summary:");
    info!("  - Models registered: {}", ctx.models.len());
    info!("  - Output: {}", args.output_path.display());

    Ok(())
}
