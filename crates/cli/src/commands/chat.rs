//! `faithloop chat` — Interactive chat with the routing pipeline.

use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use faithloop_agent::Pipeline;
use faithloop_config::AppConfig;
use faithloop_core::{CompletionClient, Transcript, Turn};
use faithloop_providers::OllamaClient;
use tracing::{debug, info};

use super::read_image_base64;

pub async fn run(
    image: Option<String>,
    deep_check: bool,
    beautify: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if deep_check {
        config.deep_check = true;
    }
    if beautify {
        config.beautify_logic = true;
    }

    let client = Arc::new(OllamaClient::new(&config.ollama_url));

    // Check the completion service early — give a clear error
    if !matches!(client.health_check().await, Ok(true)) {
        eprintln!();
        eprintln!("  ERROR: Cannot reach Ollama at {}", config.ollama_url);
        eprintln!();
        eprintln!("  Start it with:  ollama serve");
        eprintln!("  Then pull the models this agent uses:");
        eprintln!("    ollama pull {}", config.fast_model);
        eprintln!("    ollama pull {}", config.vision_model);
        eprintln!();
        return Err("Completion service unreachable. See above for setup instructions.".into());
    }

    let mut pending_image = match &image {
        Some(path) => Some(read_image_base64(Path::new(path))?),
        None => None,
    };

    info!(
        fast_model = %config.fast_model,
        vision_model = %config.vision_model,
        deep_check = config.deep_check,
        "Chat session starting"
    );
    banner(&config, pending_image.is_some());

    let pipeline = Pipeline::from_config(client, config);
    let mut transcript = Transcript::new();

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;
        let input = line.trim();

        if input.is_empty() {
            continue;
        }
        if input == "exit" || input == "quit" {
            break;
        }
        if input == "/clear" {
            transcript.clear();
            println!("  History cleared.");
            println!();
            continue;
        }
        if input == "/logs" {
            match transcript.last_logs() {
                Some(logs) => {
                    println!();
                    for entry in logs {
                        println!("  {entry}");
                    }
                    println!();
                }
                None => {
                    println!("  No answer yet.");
                    println!();
                }
            }
            continue;
        }
        if let Some(path) = input.strip_prefix("/image ") {
            match read_image_base64(Path::new(path.trim())) {
                Ok(b64) => {
                    pending_image = Some(b64);
                    println!("  Image attached to the next message.");
                }
                Err(e) => eprintln!("  [Error] {e}"),
            }
            println!();
            continue;
        }

        // The context window covers the current question, so the user
        // turn goes in before processing.
        transcript.push(Turn::user(input));
        let image_b64 = pending_image.take();

        eprint!("  ...");
        let answer = pipeline.process(input, image_b64.as_deref(), &transcript).await;
        eprint!("\r     \r");
        debug!(phases = answer.logs.len(), "Answer produced");

        println!();
        for line in answer.text.lines() {
            println!("  FaithLoop > {line}");
        }
        println!();

        transcript.push(Turn::assistant_with_logs(&answer.text, answer.logs));
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}

fn banner(config: &AppConfig, has_image: bool) {
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        FaithLoop — Interactive Mode          ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Fast model:    {}", config.fast_model);
    println!("  Vision model:  {}", config.vision_model);
    println!(
        "  Deep check:    {}",
        if config.deep_check { "on" } else { "off (turbo)" }
    );
    println!(
        "  Beautifier:    {}",
        if config.beautify_logic { "on" } else { "off" }
    );
    if has_image {
        println!("  Image:         attached to the next message");
    }
    println!();
    println!("  /image <path> attaches an image, /logs shows the last phase log,");
    println!("  /clear resets history, 'exit' or 'quit' leaves.");
    println!();
}
