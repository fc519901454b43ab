use anyhow::Result;
use auth::CredentialManager;
use clap::Args;

use super::GlobalArgs;
use crate::output;
use crate::settings::{load_config, load_key};

#[derive(Args)]
pub struct TokenArgs {
    #[arg(long, help = "Also print the renewal deadline")]
    pub verbose: bool
}

pub async fn run(global: &GlobalArgs, args: TokenArgs) -> Result<()> {
    let config = load_config(global)?;
    let key = load_key(&config)?;

    let credentials = CredentialManager::with_token_url(key, &config.endpoints.iam_token_url)?;
    let token = credentials.get_token().await?;

    if args.verbose {
        if let Some(expires_at) = credentials.expires_at().await {
            output::info(&format!(
                "Key {}, renew after {}",
                credentials.key_id(),
                expires_at.to_rfc3339()
            ));
        }
    }

    println!("{}", token);
    Ok(())
}
