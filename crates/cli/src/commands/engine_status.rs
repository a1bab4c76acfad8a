//! `faithloop engine-status` — Probe the numeric engine.

use std::io::Write;

use faithloop_config::AppConfig;
use faithloop_tools::NumericEngine;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("FaithLoop Numeric Engine");
    println!("========================");
    println!(
        "  Command:  {} {}",
        config.engine.command,
        config.engine.args.join(" ")
    );
    println!("  Fence:    ```{}", config.engine.fence_tag);

    let engine = NumericEngine::new(config.engine.clone());
    println!("  State:    {}", engine.status().await);

    // An empty script still round-trips the sync marker, so this starts
    // the engine and proves the protocol works end to end.
    print!("  Probing...");
    std::io::stdout().flush()?;
    let probe = engine.execute("").await;
    print!("\r            \r");
    std::io::stdout().flush()?;

    match probe {
        Ok(_) => println!("  ✅ Probe answered"),
        Err(e) => println!("  ❌ Probe failed: {e}"),
    }
    println!("  State:    {}", engine.status().await);

    Ok(())
}
