//! `patchchat chat` — Run one prompt in-process, without the server.
//!
//! Streams the turn through the same patch pipeline the WebSocket uses,
//! reassembles it into a transcript, and prints the bot turn.

use std::sync::Arc;

use patchchat_config::AppConfig;
use patchchat_core::tree::Transcript;
use patchchat_turn::{TurnOptions, TurnRunner};
use serde_json::Value;
use tokio::sync::mpsc;

pub async fn run(message: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    PATCHCHAT_API_KEY");
        eprintln!("    GEMINI_API_KEY");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let gateway = patchchat_providers::build_from_config(&config)?;
    let tools = Arc::new(patchchat_tools::default_registry(
        &config.gateway.downloads_dir,
    ));
    let runner = TurnRunner::new(gateway, tools)
        .with_options(TurnOptions::from_config(&config.turn));

    let mut transcript = Transcript::new();
    transcript.push_user(&message);

    let (tx, mut rx) = mpsc::channel(64);
    let handle = tokio::spawn(async move { runner.run(&message, tx).await });

    while let Some(patch) = rx.recv().await {
        transcript.apply(&patch);
    }
    // A gateway failure still lands in the transcript as an
    // informational message, so render before propagating.
    let outcome = handle.await?;

    match transcript.last_bot_content() {
        Some(Value::Array(parts)) => {
            for part in parts {
                print_part(part);
            }
        }
        Some(other) => println!("{}", serde_json::to_string_pretty(other)?),
        None => println!("(no response)"),
    }

    outcome?;
    Ok(())
}

fn print_part(part: &Value) {
    let output = part.get("output").cloned().unwrap_or(Value::Null);
    match part.get("tool").and_then(Value::as_str) {
        Some(tool) => {
            println!("[{tool}]");
            match serde_json::to_string_pretty(&output) {
                Ok(rendered) => println!("{rendered}"),
                Err(_) => println!("{output}"),
            }
        }
        None => {
            if let Some(message) = output.get("message").and_then(Value::as_str) {
                println!("{message}");
            }
        }
    }
}
