//! The typegen plugin: configuration gate, generation trigger, and the
//! population / post-processing hooks around the assembly collaborator.

use crate::compiler::{CompilerSettings, DeclarationCompiler};
use crate::error::{Error, Result};
use crate::hooks::{
    GenerationContext, PipelinePlugin, PluginManager, ASSEMBLY_HOOK, GENERATE_COMMAND, PACKAGE_HOOK,
};
use crate::population;
use crate::postprocess;
use crate::service::ServiceConfig;
use log::{debug, info};
use std::path::PathBuf;

/// Default declaration source, relative to the project root.
pub const DEFAULT_API_TYPES_PATH: &str = "api.rs";
/// Default compiler configuration file.
pub const DEFAULT_TYPEGEN_CONFIG_PATH: &str = "typegen.toml";

/// Explicit plugin options; the highest tier of the fallback chain.
#[derive(Debug, Clone, Default)]
pub struct PluginOptions {
    pub api_types_path: Option<PathBuf>,
    pub typegen_config_path: Option<PathBuf>,
}

/// The plugin instance for one generation run.
#[derive(Debug)]
pub struct OpenApiTypeGen {
    disabled: bool,
    settings: CompilerSettings,
    /// Constructed on first use, reused for every model in the run.
    compiler: Option<DeclarationCompiler>,
}

impl OpenApiTypeGen {
    /// Validates plugin ordering and resolves options.
    ///
    /// The assembly collaborator's hook must already be registered; its
    /// absence is a fatal ordering error. A project without
    /// `custom.documentation` opts out silently: the collaborator hook is
    /// deregistered and this plugin binds nothing.
    pub fn new(
        manager: &mut PluginManager,
        service: &ServiceConfig,
        options: &PluginOptions,
    ) -> Result<Self> {
        if !manager.has_hook(ASSEMBLY_HOOK) {
            return Err(Error::PluginOrder);
        }

        let settings = resolve_settings(service, options);
        debug!(
            "Using declarations at {} with config {}",
            settings.declarations_path.display(),
            settings.config_path.display()
        );

        let disabled = service.documentation_settings().is_none();
        if disabled {
            info!(
                "Disabling OpenAPI generation for {} - no 'custom.documentation' attribute found",
                service.service
            );
            manager.remove_hook(ASSEMBLY_HOOK);
        }

        Ok(Self {
            disabled,
            settings,
            compiler: None,
        })
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn compiler(&mut self) -> Result<&mut DeclarationCompiler> {
        let compiler = match self.compiler.take() {
            Some(compiler) => compiler,
            None => {
                debug!("Constructing declaration compiler");
                DeclarationCompiler::new(&self.settings)?
            }
        };
        Ok(self.compiler.insert(compiler))
    }
}

/// Three-tier fallback for the two compiler paths: explicit plugin option,
/// project documentation-settings override, fixed default.
fn resolve_settings(service: &ServiceConfig, options: &PluginOptions) -> CompilerSettings {
    let settings = service.documentation_settings();
    let declarations_path = options
        .api_types_path
        .clone()
        .or_else(|| {
            settings
                .and_then(|s| s.api_types_path.clone())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from(DEFAULT_API_TYPES_PATH));
    let config_path = options
        .typegen_config_path
        .clone()
        .or_else(|| {
            settings
                .and_then(|s| s.typegen_config_path.clone())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TYPEGEN_CONFIG_PATH));
    CompilerSettings {
        declarations_path,
        config_path,
    }
}

impl PipelinePlugin for OpenApiTypeGen {
    fn name(&self) -> &'static str {
        "openapi-typegen"
    }

    fn hooks(&self) -> Vec<String> {
        if self.disabled {
            return Vec::new();
        }
        vec![
            PACKAGE_HOOK.to_string(),
            format!("before:{}", ASSEMBLY_HOOK),
            format!("after:{}", ASSEMBLY_HOOK),
        ]
    }

    fn invoke(&mut self, hook: &str, ctx: &mut GenerationContext) -> Result<()> {
        if hook == PACKAGE_HOOK {
            debug!("Requesting {} before packaging", GENERATE_COMMAND);
            ctx.request_spawn(GENERATE_COMMAND);
            return Ok(());
        }
        if hook == format!("before:{}", ASSEMBLY_HOOK) {
            let compiler = self.compiler()?;
            return population::populate(&mut ctx.service, &mut ctx.models, compiler);
        }
        if hook == format!("after:{}", ASSEMBLY_HOOK) {
            return postprocess::post_process(ctx);
        }
        Ok(())
    }
}
