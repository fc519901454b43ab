pub mod ask;
pub mod context;
pub mod token;

use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use yc_core::SessionId;

#[derive(Parser)]
#[command(
    name = "yagpt",
    author,
    version,
    about = "YandexGPT client with per-session conversation context",
    long_about = "Ask YandexGPT questions within a session. Each session keeps a bounded \
                  history in Redis so follow-up questions see the previous turns.\n\nSettings \
                  come from an optional config file and YAGPT_* environment variables."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands
}

#[derive(Args)]
pub struct GlobalArgs {
    #[arg(long, global = true, env = "YAGPT_CONFIG", help = "Config file (.toml, .yaml)")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Service account authorized key (JSON)")]
    pub key_file: Option<PathBuf>
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Ask a question within a session")]
    Ask(ask::AskArgs),

    #[command(about = "Print an IAM token for the service account")]
    Token(token::TokenArgs),

    #[command(about = "Show the stored context of a session")]
    Context(context::ContextArgs)
}

pub(crate) fn parse_session(id: &str) -> Result<SessionId> {
    SessionId::new(id).ok_or_else(|| anyhow!("Session id must not be empty"))
}
