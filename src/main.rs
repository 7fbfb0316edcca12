use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use forge_ci::ci::registry::ProjectRegistry;
use forge_ci::ci::server;
use forge_ci::config::{self, Settings, SharedSecret};
use forge_ci::logging::{self, LogFormat, LogLevel};

#[derive(Parser)]
#[command(name = "forge-ci")]
#[command(version, about = "Minimal CI trigger: run a project's build on request and serve its badge")]
pub struct Cli {
    /// Path to the project file (JSON, or TOML with a .toml extension)
    #[arg(long, env = "FORGE_CI_CONFIG", default_value = "./config.json")]
    pub config: PathBuf,

    /// Directory holding passing.png, failing.png and pending.png
    #[arg(long, env = "FORGE_CI_BADGES", default_value = "./badges")]
    pub badges: PathBuf,

    /// Address to serve on
    #[arg(long, env = "FORGE_CI_ADDR", default_value = "0.0.0.0:3001")]
    pub addr: String,

    /// Secret that authorizes build triggers
    #[arg(long, env = "FORGE_CI_SECRET", hide_env_values = true)]
    pub secret: String,

    /// Directory under which each project gets its working directory
    #[arg(long, env = "FORGE_CI_WORKSPACE", default_value = ".")]
    pub workspace: PathBuf,

    /// Shell used to run build scripts
    #[arg(long, env = "FORGE_CI_SHELL", default_value = "bash")]
    pub shell: String,

    /// Log level (FORGE_CI_LOG takes precedence)
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let secret = SharedSecret::new(&self.secret).context("Invalid --secret")?;
        Ok(Settings {
            addr: self.addr.clone(),
            config_path: self.config.clone(),
            badge_dir: self.badges.clone(),
            workspace_dir: self.workspace.clone(),
            shell: self.shell.clone(),
            secret,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level, cli.log_format)?;

    let settings = cli.settings()?;
    let specs = config::load_projects(&settings.config_path).context("Failed to load projects")?;
    let registry = ProjectRegistry::from_specs(specs).context("Failed to load projects")?;
    info!(
        config = %settings.config_path.display(),
        projects = registry.len(),
        "configuration loaded"
    );

    server::start_server(settings, registry).await
}
