use anyhow::Result;
use clap::Args;
use colored::Colorize;
use ::context::ContextManager;
use std::sync::Arc;
use storage::RedisCache;
use yc_core::{ContextStore, MessageContext, Role};

use super::{GlobalArgs, parse_session};
use crate::output;
use crate::settings::load_config;

#[derive(Args)]
pub struct ContextArgs {
    #[arg(long, short, help = "Session to inspect")]
    pub session: String,

    #[arg(long, help = "Output as JSON")]
    pub json: bool
}

pub async fn run(global: &GlobalArgs, args: ContextArgs) -> Result<()> {
    let session = parse_session(&args.session)?;
    let config = load_config(global)?;

    let cache = RedisCache::new(&config.redis.url).await?;
    let manager = ContextManager::from_config(Arc::new(cache), &config.context);
    let context = manager.get_context(&session).await?.unwrap_or_default();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&context)?);
        return Ok(());
    }

    if context.is_empty() {
        output::hint(&format!("No context stored for session {}", session));
        return Ok(());
    }

    output::header(&format!("Session {}", session));
    for entry in &context {
        print_entry(entry);
    }
    println!();
    println!(
        "{} entries, {} of {} tokens",
        context.len(),
        total_tokens(&context),
        config.context.max_tokens
    );
    Ok(())
}

fn print_entry(entry: &MessageContext) {
    let role = match entry.role {
        Role::User => "user".green(),
        Role::Assistant => "assistant".blue(),
        Role::System => "system".yellow()
    };
    println!("{:>9} [{:>4}] {}", role.bold(), entry.tokens, entry.text);
}

fn total_tokens(context: &[MessageContext]) -> u64 {
    context.iter().map(|m| u64::from(m.tokens)).sum()
}
