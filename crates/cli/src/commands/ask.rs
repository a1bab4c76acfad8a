//! `faithloop ask` — One-shot question answering.

use std::path::Path;
use std::sync::Arc;

use faithloop_agent::Pipeline;
use faithloop_config::AppConfig;
use faithloop_core::{Transcript, Turn};
use faithloop_providers::OllamaClient;
use tracing::debug;

use super::read_image_base64;

pub async fn run(
    question: &str,
    image: Option<String>,
    logs: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let image_b64 = match &image {
        Some(path) => Some(read_image_base64(Path::new(path))?),
        None => None,
    };

    let client = Arc::new(OllamaClient::new(&config.ollama_url));
    let pipeline = Pipeline::from_config(client, config);

    let mut transcript = Transcript::new();
    transcript.push(Turn::user(question));

    debug!(has_image = image_b64.is_some(), "Processing one-shot question");

    eprint!("  Thinking...");
    let answer = pipeline
        .process(question, image_b64.as_deref(), &transcript)
        .await;
    eprint!("\r              \r");

    println!("{}", answer.text);

    if logs {
        eprintln!();
        for entry in &answer.logs {
            eprintln!("  {entry}");
        }
    }

    Ok(())
}
