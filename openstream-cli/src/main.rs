use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod logging;

use config::ConfigLoader;

#[derive(Parser)]
#[command(name = "openstream")]
#[command(about = "Partitioned event streams with consumer groups over Redis")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file layered over the user config
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve(commands::serve::ServeArgs),
    /// Mint a bearer token with the configured secret
    Token(commands::token::TokenArgs),
    /// Inspect configuration
    Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::load(cli.config.as_deref())?;
    logging::init(config.logging.format, cli.verbose);

    match cli.command {
        Commands::Serve(args) => commands::serve::run(args, config).await,
        Commands::Token(args) => commands::token::run(args, &config),
        Commands::Config(args) => commands::config::run(args, &config, cli.config.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["openstream", "serve", "--config", "/tmp/c.toml", "-v"])
            .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(cli.command, Commands::Serve(_)));
    }

    #[test]
    fn test_token_requires_sub_and_role() {
        assert!(Cli::try_parse_from(["openstream", "token", "--sub", "svc"]).is_err());
        assert!(
            Cli::try_parse_from(["openstream", "token", "--sub", "svc", "--role", "root"]).is_err()
        );
        assert!(
            Cli::try_parse_from(["openstream", "token", "--sub", "svc", "--role", "consumer"])
                .is_ok()
        );
    }
}
