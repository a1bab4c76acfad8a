//! The routing pipeline: vision read, route, execute, deep check.
//!
//! One call to [`Pipeline::process`] drives a user query through every
//! phase and always produces an answer plus the phase log. Failures are
//! data here: component errors are flattened into fixed user-visible
//! strings at this boundary and flow onward like normal answers, so the
//! chat surface never sees an `Err`.

use std::sync::Arc;

use faithloop_config::AppConfig;
use faithloop_core::codeblock;
use faithloop_core::{
    classify, CompletionClient, CompletionRequest, EngineError, Intent, RouteConfidence, Transcript,
};
use faithloop_tools::{EvidenceFetcher, EvidenceSource, NumericEngine, ScriptRunner};
use tracing::{debug, info, warn};

use crate::{context, prompts};

/// Shown when the numeric engine is unavailable, now or ever.
const ENGINE_NOT_RUNNING: &str = "Error: Numeric engine is not running.";

/// Shown when the model reply carried no extractable numeric code.
const INVALID_NUMERIC_CODE: &str = "Error: Invalid numeric code.";

/// Shown when the model reply carried no extractable logic script.
const NO_LOGIC_CODE: &str = "Could not generate logic.";

/// Header prefixed to successful numeric-engine output.
const NUMERIC_HEADER: &str = "**Numeric Solution:**";

/// Prefix of the refusal produced when search evidence is unusable.
const SEARCH_REFUSAL: &str = "I could not retrieve reliable evidence.";

/// A finished pipeline run: the final text plus the phase log.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub logs: Vec<String>,
}

/// Drives one query at a time through the phase state machine.
pub struct Pipeline {
    client: Arc<dyn CompletionClient>,
    evidence: Arc<dyn EvidenceSource>,
    engine: NumericEngine,
    runner: ScriptRunner,
    config: AppConfig,
}

impl Pipeline {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        evidence: Arc<dyn EvidenceSource>,
        engine: NumericEngine,
        runner: ScriptRunner,
        config: AppConfig,
    ) -> Self {
        Self {
            client,
            evidence,
            engine,
            runner,
            config,
        }
    }

    /// Build a pipeline with the real fetcher, engine, and runner wired
    /// from configuration.
    pub fn from_config(client: Arc<dyn CompletionClient>, config: AppConfig) -> Self {
        let evidence = Arc::new(EvidenceFetcher::new(config.search.clone()));
        let engine = NumericEngine::new(config.engine.clone());
        let runner = ScriptRunner::new(config.script.clone());
        Self::new(client, evidence, engine, runner, config)
    }

    /// Process one user query and produce the final answer plus phase log.
    ///
    /// `image_b64` is a base64-encoded image attachment, if any. The
    /// transcript is expected to already contain the user's turn, so the
    /// context window covers it.
    pub async fn process(
        &self,
        query: &str,
        image_b64: Option<&str>,
        transcript: &Transcript,
    ) -> Answer {
        let mut logs = Vec::new();

        info!(
            query_chars = query.len(),
            has_image = image_b64.is_some(),
            "Processing query"
        );

        // ── Phase 1: vision read ──
        let visual_context = match image_b64 {
            Some(image) => {
                logs.push("Phase 1: Vision Model Reading...".to_string());
                let request = CompletionRequest::prompt_with_image(
                    &self.config.vision_model,
                    prompts::vision_read(query),
                    image,
                );
                let seen = match self.client.complete(request).await {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(error = %e, "Vision read failed");
                        format!("Error: {e}")
                    }
                };
                logs.push(format!("   Vision saw: {}...", truncate_chars(&seen, 100)));
                seen
            }
            None => String::new(),
        };

        // ── Phase 2: route ──
        let combined = prompts::combined_input(
            &context::assemble(transcript),
            query,
            &visual_context,
        );
        logs.push("Phase 2: Router deciding tool...".to_string());

        let request =
            CompletionRequest::prompt(&self.config.fast_model, prompts::router(&combined));
        let decision = match self.client.complete(request).await {
            Ok(reply) => classify(&reply),
            Err(e) => {
                warn!(error = %e, "Router call failed");
                logs.push("Process Complete.".to_string());
                return Answer {
                    text: format!("Error: {e}"),
                    logs,
                };
            }
        };

        logs.push(format!("   Intent: {}", decision.raw));
        match decision.confidence {
            RouteConfidence::Exact => {}
            RouteConfidence::Fuzzy => {
                logs.push(format!("   Routed to {} (fuzzy match)", decision.intent));
            }
            RouteConfidence::Defaulted => {
                logs.push(format!("   Routed to {} (defaulted)", decision.intent));
            }
        }
        debug!(intent = %decision.intent, confidence = ?decision.confidence, "Route decided");

        // ── Phase 3: execute ──
        let initial = match decision.intent {
            Intent::Numeric => self.run_numeric(&combined, &mut logs).await,
            Intent::Logic => self.run_logic(query, &combined, &mut logs).await,
            Intent::Search => self.run_search(query, &combined, &mut logs).await,
            Intent::Chat => self.run_chat(&combined, &visual_context).await,
        };

        // ── Phase 4/5: deep check ──
        let text = match image_b64 {
            Some(image)
                if self.config.deep_check
                    && matches!(decision.intent, Intent::Logic | Intent::Chat) =>
            {
                self.volcano(query, image, initial, &mut logs).await
            }
            _ => {
                if !self.config.deep_check {
                    logs.push("   Deep Check Skipped (Turbo Mode).".to_string());
                }
                initial
            }
        };

        logs.push("Process Complete.".to_string());
        Answer { text, logs }
    }

    async fn run_numeric(&self, combined: &str, logs: &mut Vec<String>) -> String {
        logs.push("Phase 3: Running Numeric Engine...".to_string());

        let tag = &self.config.engine.fence_tag;
        let request = CompletionRequest::prompt(
            &self.config.fast_model,
            prompts::numeric_code(combined, tag),
        );
        let reply = match self.client.complete(request).await {
            Ok(reply) => reply,
            Err(e) => return format!("Error: {e}"),
        };

        let Some(code) = codeblock::extract(&reply, tag) else {
            return INVALID_NUMERIC_CODE.to_string();
        };

        match self.engine.execute(&code).await {
            Ok(output) => format!("{NUMERIC_HEADER}\n{output}"),
            Err(EngineError::Unavailable { .. }) => ENGINE_NOT_RUNNING.to_string(),
            Err(e) => format!("Execution Error: {e}"),
        }
    }

    async fn run_logic(&self, query: &str, combined: &str, logs: &mut Vec<String>) -> String {
        logs.push("Phase 3: Logic Engine...".to_string());

        let tag = &self.config.script.fence_tag;
        let request = CompletionRequest::prompt(
            &self.config.fast_model,
            prompts::logic_code(combined, tag),
        );
        let reply = match self.client.complete(request).await {
            Ok(reply) => reply,
            Err(e) => return format!("Error: {e}"),
        };

        let Some(code) = codeblock::extract(&reply, tag) else {
            return NO_LOGIC_CODE.to_string();
        };

        match self.runner.run(&code).await {
            Ok(raw) => {
                if !self.config.beautify_logic {
                    return raw;
                }
                let request = CompletionRequest::prompt(
                    &self.config.fast_model,
                    prompts::beautify(query, &raw),
                );
                match self.client.complete(request).await {
                    Ok(sentence) => sentence,
                    Err(e) => {
                        warn!(error = %e, "Beautifier call failed, keeping raw result");
                        raw
                    }
                }
            }
            Err(e) => format!("Logic Error: {e}"),
        }
    }

    async fn run_search(&self, query: &str, combined: &str, logs: &mut Vec<String>) -> String {
        logs.push("Phase 3: Web Search...".to_string());

        let request = CompletionRequest::prompt(
            &self.config.fast_model,
            prompts::search_rewrite(combined),
        );
        let search_query = match self.client.complete(request).await {
            Ok(reply) => reply.trim().to_string(),
            Err(e) => return format!("Error: {e}"),
        };
        debug!(search_query = %search_query, "Search query rewritten");

        let evidence = match self.evidence.fetch(&search_query).await {
            Ok(text) => text,
            Err(e) => format!("Error: {e}"),
        };

        // Unusable evidence becomes a refusal carrying the literal text,
        // never a fabricated answer.
        if evidence.contains("Error") || evidence.contains("No results") {
            return format!("{SEARCH_REFUSAL} {evidence}");
        }

        let request = CompletionRequest::prompt(
            &self.config.fast_model,
            prompts::synthesis(query, &evidence),
        );
        match self.client.complete(request).await {
            Ok(answer) => answer,
            Err(e) => format!("Error: {e}"),
        }
    }

    /// CHAT branch. With visual context, the vision read is the answer;
    /// text-only queries get one conversational completion call.
    async fn run_chat(&self, combined: &str, visual_context: &str) -> String {
        if !visual_context.is_empty() {
            return visual_context.to_string();
        }

        let request =
            CompletionRequest::prompt(&self.config.fast_model, prompts::chat(combined));
        match self.client.complete(request).await {
            Ok(reply) => reply,
            Err(e) => format!("Error: {e}"),
        }
    }

    /// Critique the answer against the image; revise unless it passes.
    async fn volcano(
        &self,
        query: &str,
        image_b64: &str,
        initial: String,
        logs: &mut Vec<String>,
    ) -> String {
        logs.push("Phase 4: Deep Check (VOLCANO Protocol)...".to_string());

        let request = CompletionRequest::prompt_with_image(
            &self.config.vision_model,
            prompts::critique(query, &initial),
            image_b64,
        );
        let critique = match self.client.complete(request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Critique call failed");
                format!("Error: {e}")
            }
        };
        logs.push(format!("   Critique: {critique}"));

        if critique.to_uppercase().contains("PASS") {
            return initial;
        }

        logs.push("Phase 5: Final Revision...".to_string());
        let request = CompletionRequest::prompt(
            &self.config.fast_model,
            prompts::revision(&initial, &critique),
        );
        match self.client.complete(request).await {
            Ok(revised) => {
                logs.push("   Answer Revised.".to_string());
                revised
            }
            Err(e) => {
                warn!(error = %e, "Revision call failed, keeping initial answer");
                initial
            }
        }
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
