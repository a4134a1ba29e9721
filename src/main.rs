//! openapi-typegen - Command-line driver for the documentation pipeline.
//!
//! # Usage
//!
//! ```bash
//! openapi-typegen [OPTIONS] [CONFIG]
//! ```
//!
//! # Examples
//!
//! Generate documentation for the project in the current directory:
//! ```bash
//! openapi-typegen serverless.yml -o openapi.yml
//! ```
//!
//! Point at a declaration source outside the project root:
//! ```bash
//! openapi-typegen serverless.yml --api-types types/api.rs -o openapi.json
//! ```
//!
//! Enable verbose logging:
//! ```bash
//! openapi-typegen -v
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_typegen::cli;

fn main() -> Result<()> {
    // Parse args twice: once to get the verbose flag, then again after the
    // logger is initialized so validation messages are visible.
    let args_for_verbose = cli::CliArgs::parse();

    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("openapi-typegen starting...");

    let args = cli::parse_args_from_parsed(args_for_verbose)?;

    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");

    Ok(())
}
