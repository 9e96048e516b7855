use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use cueboard_core::{
    config::{AvatarConfig, Config, StreamingConfig, WarnLevel},
    types::Namespace,
};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective configuration
    Show,

    /// Validate the config for common mistakes
    Validate,

    /// Configure and enable a plugin
    Enable {
        #[command(subcommand)]
        plugin: EnableSubcommand,
    },

    /// Disable a plugin; its names stop resolving
    Disable { namespace: Namespace },
}

#[derive(Subcommand)]
pub enum EnableSubcommand {
    /// Streaming tool connection
    Streaming {
        #[arg(long, default_value = "127.0.0.1")]
        addr: String,
        #[arg(long, default_value = "4455")]
        port: u16,
        #[arg(long)]
        password: Option<String>,
    },
    /// Avatar tool connection
    Avatar {
        #[arg(long, default_value = "ws://127.0.0.1:8001")]
        addr: String,
        /// Where the authorization token is kept
        #[arg(long, default_value = ".cueboard/avatar-token")]
        token_file: String,
    },
    /// Local commands (delay, run-command)
    Local,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(root, json),
        ConfigSubcommand::Validate => validate(root, json),
        ConfigSubcommand::Enable { plugin } => enable(root, plugin),
        ConfigSubcommand::Disable { namespace } => disable(root, namespace),
    }
}

// ---------------------------------------------------------------------------
// show / validate
// ---------------------------------------------------------------------------

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    if json {
        return print_json(&config);
    }
    println!("Project:   {}", config.project.name);
    println!("Store:     {}", config.store_path(root).display());
    println!("Catalog:   {}", config.catalog_path(root).display());
    println!("Advisory:  after {} ms", config.resolver.advisory_after_ms);
    for ns in Namespace::all() {
        let state = if config.plugins.is_enabled(*ns) {
            "enabled"
        } else {
            "disabled"
        };
        println!("{:<10} {state}", format!("{ns}:"));
    }
    Ok(())
}

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// enable / disable
// ---------------------------------------------------------------------------

fn enable(root: &Path, plugin: EnableSubcommand) -> anyhow::Result<()> {
    let mut config = Config::load(root).context("failed to load config")?;
    let namespace = match plugin {
        EnableSubcommand::Streaming {
            addr,
            port,
            password,
        } => {
            config.plugins.streaming = Some(StreamingConfig {
                addr,
                port,
                password,
            });
            Namespace::Streaming
        }
        EnableSubcommand::Avatar { addr, token_file } => {
            config.plugins.avatar = Some(AvatarConfig { addr, token_file });
            Namespace::Avatar
        }
        EnableSubcommand::Local => {
            config.plugins.local = true;
            Namespace::Local
        }
    };
    config.save(root).context("failed to save config")?;
    println!("{namespace} enabled.");
    Ok(())
}

fn disable(root: &Path, namespace: Namespace) -> anyhow::Result<()> {
    let mut config = Config::load(root).context("failed to load config")?;
    match namespace {
        Namespace::Streaming => config.plugins.streaming = None,
        Namespace::Avatar => config.plugins.avatar = None,
        Namespace::Local => config.plugins.local = false,
    }
    config.save(root).context("failed to save config")?;
    println!("{namespace} disabled.");
    Ok(())
}
