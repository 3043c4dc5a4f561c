//! Config command - View and manage configuration
//!
//! Provides commands for inspecting jobmatch configuration:
//! - Show the effective configuration
//! - Get a single value by dotted key
//! - Show configuration file paths
//! - Write a default configuration file

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use jobmatch_config::{ConfigLoader, JobmatchConfig};
use serde::Serialize;

use crate::GlobalOptions;

/// Config management commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration (global, local, then CLI overrides)
    Show(ShowArgs),

    /// Get a specific configuration value
    Get(GetArgs),

    /// Show configuration file paths
    Path(PathArgs),

    /// Write a configuration file with default values
    Init(InitArgs),
}

/// Arguments for the show command
#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Arguments for the get command
#[derive(clap::Args, Debug)]
pub struct GetArgs {
    /// Configuration key (e.g., "store.qdrant.url")
    key: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Arguments for the path command
#[derive(clap::Args, Debug)]
pub struct PathArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Arguments for the init command
#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Write the global config (~/.jobmatch/config.toml) instead of local
    #[arg(long)]
    global: bool,
}

/// Configuration paths
#[derive(Debug, Clone, Serialize)]
pub struct ConfigPaths {
    /// Global config file path
    pub global: Option<PathBuf>,
    /// Local config file path
    pub local: PathBuf,
    /// Whether global config exists
    pub global_exists: bool,
    /// Whether local config exists
    pub local_exists: bool,
}

/// Execute the config command
pub async fn execute(cmd: ConfigCommand, global: GlobalOptions) -> Result<()> {
    match cmd {
        ConfigCommand::Show(args) => execute_show(args, global),
        ConfigCommand::Get(args) => execute_get(args, global),
        ConfigCommand::Path(args) => execute_path(args),
        ConfigCommand::Init(args) => execute_init(args),
    }
}

fn effective_config(global: &GlobalOptions) -> Result<JobmatchConfig> {
    super::load_config(global)
}

fn execute_show(args: ShowArgs, global: GlobalOptions) -> Result<()> {
    let config = effective_config(&global)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        let toml = toml::to_string_pretty(&config).context("Failed to serialize config")?;
        print!("{}", toml);
    }

    Ok(())
}

fn execute_get(args: GetArgs, global: GlobalOptions) -> Result<()> {
    let config = effective_config(&global)?;

    let value = get_config_value(&config, &args.key)
        .ok_or_else(|| anyhow::anyhow!("Unknown configuration key: {}", args.key))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        match value {
            serde_json::Value::String(s) => println!("{}", s),
            serde_json::Value::Bool(b) => println!("{}", b),
            serde_json::Value::Number(n) => println!("{}", n),
            serde_json::Value::Null => println!("null"),
            other => println!("{}", serde_json::to_string_pretty(&other)?),
        }
    }

    Ok(())
}

fn execute_path(args: PathArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let loader = ConfigLoader::new();

    let global_path = loader.global_config_path();
    let local_path = loader.local_config_path(&cwd);

    let paths = ConfigPaths {
        global_exists: global_path.as_ref().map(|p| p.exists()).unwrap_or(false),
        local_exists: local_path.exists(),
        global: global_path,
        local: local_path,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&paths)?);
    } else {
        println!("Configuration Paths");
        println!("===================\n");

        if let Some(ref gp) = paths.global {
            let status = if paths.global_exists {
                "exists"
            } else {
                "not found"
            };
            println!("Global: {} ({})", gp.display(), status);
        } else {
            println!("Global: not available (no home directory)");
        }

        let status = if paths.local_exists {
            "exists"
        } else {
            "not found"
        };
        println!("Local:  {} ({})", paths.local.display(), status);
    }

    Ok(())
}

fn execute_init(args: InitArgs) -> Result<()> {
    let loader = ConfigLoader::new();
    let path = if args.global {
        loader
            .init_global()
            .context("Failed to write global config")?
    } else {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        loader
            .init_local(&cwd)
            .context("Failed to write local config")?
    };

    println!("Config file: {}", path.display());
    Ok(())
}

/// Get a configuration value by key path
fn get_config_value(config: &JobmatchConfig, key: &str) -> Option<serde_json::Value> {
    let json = serde_json::to_value(config).ok()?;

    let mut current = &json;
    for part in key.split('.') {
        current = current.get(part)?;
    }

    Some(current.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_nested_value() {
        let config = JobmatchConfig::default();
        assert_eq!(
            get_config_value(&config, "search.default_query"),
            Some(serde_json::json!("Developer|Boston|Full-Time"))
        );
        assert_eq!(
            get_config_value(&config, "store.backend"),
            Some(serde_json::json!("memory"))
        );
    }

    #[test]
    fn test_get_unknown_key() {
        let config = JobmatchConfig::default();
        assert!(get_config_value(&config, "store.nope").is_none());
        assert!(get_config_value(&config, "search.default_query.deeper").is_none());
    }
}
