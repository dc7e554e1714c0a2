use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::config::{ConfigLoader, ENV_OVERRIDES, OpenStreamConfig};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (merged, secrets redacted)
    Show,
    /// Show configuration file paths and environment overrides
    Path,
}

pub fn run(args: ConfigArgs, config: &OpenStreamConfig, explicit: Option<&Path>) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(config),
        ConfigCommands::Path => show_paths(explicit),
    }
}

fn show_config(config: &OpenStreamConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(&config.redacted())?;
    println!("{}", toml_str);
    Ok(())
}

fn show_paths(explicit: Option<&Path>) -> Result<()> {
    println!("User config:     {:?}", ConfigLoader::user_config_path());
    println!("Explicit config: {:?}", explicit);
    println!("Environment:     {}", ENV_OVERRIDES.join(", "));
    Ok(())
}
