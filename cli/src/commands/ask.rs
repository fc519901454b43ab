use anyhow::Result;
use clap::Args;
use gpt::GptManager;

use super::{GlobalArgs, parse_session};
use crate::settings::{load_config, load_key};

#[derive(Args)]
pub struct AskArgs {
    #[arg(long, short, help = "Session whose context the question joins")]
    pub session: String,

    #[arg(long = "async", help = "Use the asynchronous completion API")]
    pub async_mode: bool,

    #[arg(required = true, help = "Question text")]
    pub prompt: Vec<String>
}

pub async fn run(global: &GlobalArgs, args: AskArgs) -> Result<()> {
    let session = parse_session(&args.session)?;
    let mut config = load_config(global)?;
    if args.async_mode {
        config.gpt.async_mode = true;
    }
    let key = load_key(&config)?;

    let manager = GptManager::new(config, key).await?;
    let answer = manager.get_answer(&args.prompt.join(" "), &session).await?;

    println!("{}", answer);
    Ok(())
}
