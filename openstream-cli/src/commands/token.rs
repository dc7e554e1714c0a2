//! Mint a token locally with the configured signing secret

use anyhow::Result;
use clap::Args;
use openstream_core::{Role, TokenService};

use crate::config::OpenStreamConfig;

#[derive(Debug, Args)]
pub struct TokenArgs {
    /// Subject recorded in the token
    #[arg(long)]
    pub sub: String,

    /// Role granted to the subject (producer, consumer, admin)
    #[arg(long)]
    pub role: Role,
}

pub fn run(args: TokenArgs, config: &OpenStreamConfig) -> Result<()> {
    println!("{}", issue(&args, config)?);
    Ok(())
}

fn issue(args: &TokenArgs, config: &OpenStreamConfig) -> Result<String> {
    let tokens = TokenService::new(config.auth.clone());
    Ok(tokens.issue(&args.sub, args.role)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_token_validates_with_same_config() {
        let config = OpenStreamConfig::default();
        let args = TokenArgs {
            sub: "billing-worker".to_string(),
            role: Role::Consumer,
        };

        let token = issue(&args, &config).unwrap();
        let principal = TokenService::new(config.auth.clone())
            .validate(&token)
            .unwrap();

        assert_eq!(principal.sub, "billing-worker");
        assert_eq!(principal.role, Role::Consumer);
    }

    #[test]
    fn test_token_rejected_under_other_secret() {
        let config = OpenStreamConfig::default();
        let args = TokenArgs {
            sub: "svc".to_string(),
            role: Role::Admin,
        };
        let token = issue(&args, &config).unwrap();

        let other = TokenService::new(config.auth.clone().with_secret("rotated"));
        assert!(other.validate(&token).is_err());
    }
}
