//! `plinth serve` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use plinth_config::{CacheBackend, CliSettings, Config};
use plinth_server::{run_server, server_config_from_config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover plinth.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// YAML content snapshot to serve (overrides config).
    #[arg(short, long, env = "PLINTH_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose output (request contexts and info logs).
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable the placeholder cache (default: enabled).
    #[arg(long)]
    cache: Option<bool>,

    /// Disable the placeholder cache.
    #[arg(long, conflicts_with = "cache")]
    no_cache: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self, version: &str) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host.clone(),
            port: self.port,
            snapshot: self.snapshot.clone(),
            cache_enabled: self.resolve_cache_enabled(),
        };

        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        output.info(&format!(
            "Starting server on {}:{}{}",
            config.server.host, config.server.port, config.server.api_prefix
        ));
        output.info(&format!(
            "Content snapshot: {}",
            config.content_resolved.snapshot.display()
        ));

        if !config.cache.enabled {
            output.warning("Placeholder cache: disabled");
        } else if config.cache.backend == CacheBackend::File {
            ensure_project_dir(&config.content_resolved.project_dir)?;
            output.info(&format!(
                "Cache directory: {}",
                config.content_resolved.cache_dir().display()
            ));
        } else {
            output.info(&format!(
                "Placeholder cache: {}",
                backend_name(config.cache.backend)
            ));
        }

        let server_config = server_config_from_config(&config, version.to_owned(), self.verbose);
        run_server(server_config)
            .await
            .map_err(|e| CliError::Server(e.to_string()))?;

        Ok(())
    }

    /// Resolve `cache_enabled` from --cache/--no-cache flags.
    fn resolve_cache_enabled(&self) -> Option<bool> {
        self.no_cache.then_some(false).or(self.cache)
    }
}

fn backend_name(backend: CacheBackend) -> &'static str {
    match backend {
        CacheBackend::Memory => "memory",
        CacheBackend::File => "file",
        CacheBackend::None => "none",
    }
}

/// Ensure the `.plinth/` project directory exists with a `.gitignore`.
fn ensure_project_dir(project_dir: &Path) -> Result<(), CliError> {
    std::fs::create_dir_all(project_dir)?;

    let gitignore_path = project_dir.join(".gitignore");
    if !gitignore_path.exists() {
        let _ = std::fs::write(&gitignore_path, "# Automatically created by plinth\n*\n");
    }

    Ok(())
}
