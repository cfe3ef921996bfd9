use std::sync::Arc;

use anyhow::Context;
use turn_duel::{ChatCompletionsClient, ConsoleOperator, FileTranscript, SessionConfig, TurnEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "session.json".to_string());
    let config = SessionConfig::load(&path).with_context(|| format!("loading {path}"))?;

    let api_key = config.resolve_api_key();
    if api_key.is_none() {
        log::warn!("No API key configured; requests are sent unauthenticated");
    }
    let llm = ChatCompletionsClient::new(config.service.clone(), api_key);
    let transcript = FileTranscript::new(&config.log_dir)?;
    let operator = ConsoleOperator::new(config.phase_entry.label.clone());

    let mut engine = TurnEngine::new(&config, Arc::new(llm), operator, Arc::new(transcript))?;

    println!("=== {} simulation ===", config.game);
    println!("Type 'end' at any prompt to stop the game.");

    let summary = engine.run().await?;
    log::info!(
        "{} cycles, {} turns completed, {} was active",
        summary.cycles,
        summary.turns_completed,
        summary.active_party
    );
    Ok(())
}
