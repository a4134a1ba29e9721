//! Hook lifecycle dispatch, modeled on the host framework's plugin manager.
//!
//! Plugins bind named hooks; commands expand to `before:`/main/`after:`
//! phases of their lifecycle events, fired strictly sequentially in
//! registration order. A hook may request that another command be spawned;
//! requests are drained after the hook returns, and a command never runs
//! twice within one lifecycle, which makes explicit re-triggers idempotent.

use crate::error::Result;
use crate::population::ModelRegistry;
use crate::service::ServiceConfig;
use log::{debug, info};
use std::collections::HashSet;
use std::path::PathBuf;

/// The hook owned by the document-assembly collaborator. This plugin's
/// population and post-processing run before and after it.
pub const ASSEMBLY_HOOK: &str = "openapi:generate:serverless";
/// The packaging hook used to trigger generation explicitly.
pub const PACKAGE_HOOK: &str = "before:package:createDeploymentArtifacts";
/// The command whose lifecycle carries the generation hooks.
pub const GENERATE_COMMAND: &str = "openapi:generate";

/// Lifecycle events per command, in firing order.
fn lifecycle_events(command: &str) -> &'static [&'static str] {
    match command {
        "package" => &["package:createDeploymentArtifacts"],
        GENERATE_COMMAND => &[ASSEMBLY_HOOK],
        _ => &[],
    }
}

/// State shared by all hooks of one generation run.
pub struct GenerationContext {
    pub service: ServiceConfig,
    pub models: ModelRegistry,
    pub output_path: PathBuf,
    spawn_requests: Vec<String>,
}

impl GenerationContext {
    pub fn new(service: ServiceConfig, output_path: PathBuf) -> Self {
        let models = ModelRegistry::seeded_from(&service);
        Self {
            service,
            models,
            output_path,
            spawn_requests: Vec::new(),
        }
    }

    /// Asks the manager to run another command once the current hook returns.
    pub fn request_spawn(&mut self, command: &str) {
        self.spawn_requests.push(command.to_string());
    }

    fn take_spawn_requests(&mut self) -> Vec<String> {
        std::mem::take(&mut self.spawn_requests)
    }
}

/// A plugin participating in the lifecycle.
pub trait PipelinePlugin {
    fn name(&self) -> &'static str;
    /// Hook names this plugin binds, in binding order.
    fn hooks(&self) -> Vec<String>;
    fn invoke(&mut self, hook: &str, ctx: &mut GenerationContext) -> Result<()>;
}

struct HookBinding {
    hook: String,
    plugin: usize,
}

/// Ordered hook table over registered plugins.
#[derive(Default)]
pub struct PluginManager {
    plugins: Vec<Box<dyn PipelinePlugin>>,
    bindings: Vec<HookBinding>,
    completed: HashSet<String>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Box<dyn PipelinePlugin>) {
        let index = self.plugins.len();
        for hook in plugin.hooks() {
            debug!("Plugin {} binds hook {}", plugin.name(), hook);
            self.bindings.push(HookBinding {
                hook,
                plugin: index,
            });
        }
        self.plugins.push(plugin);
    }

    pub fn has_hook(&self, hook: &str) -> bool {
        self.bindings.iter().any(|binding| binding.hook == hook)
    }

    /// Drops every binding for a hook, detaching its owner from the run.
    pub fn remove_hook(&mut self, hook: &str) {
        self.bindings.retain(|binding| binding.hook != hook);
    }

    /// Runs one command's lifecycle. A command already run in this lifecycle
    /// is a logged no-op, so a natural firing after an explicit trigger does
    /// not run the pipeline twice.
    pub fn run_command(&mut self, command: &str, ctx: &mut GenerationContext) -> Result<()> {
        if !self.completed.insert(command.to_string()) {
            debug!("Command {} already ran in this lifecycle, skipping", command);
            return Ok(());
        }
        info!("Running command {}", command);
        for event in lifecycle_events(command) {
            for phase in ["before:", "", "after:"] {
                let hook = format!("{}{}", phase, event);
                self.fire(&hook, ctx)?;
            }
        }
        Ok(())
    }

    fn fire(&mut self, hook: &str, ctx: &mut GenerationContext) -> Result<()> {
        let targets: Vec<usize> = self
            .bindings
            .iter()
            .filter(|binding| binding.hook == hook)
            .map(|binding| binding.plugin)
            .collect();

        for index in targets {
            debug!("Firing {} on {}", hook, self.plugins[index].name());
            self.plugins[index].invoke(hook, ctx)?;
            for command in ctx.take_spawn_requests() {
                self.run_command(&command, ctx)?;
            }
        }
        Ok(())
    }
}
