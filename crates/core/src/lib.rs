//! # FaithLoop Core
//!
//! Domain types, traits, and error definitions for the FaithLoop agent.
//! This crate has **zero framework dependencies** — it defines the domain
//! model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The completion-service seam is a trait here; implementations live in
//! their own crate. This enables:
//! - Swapping backends via configuration
//! - Testing the routing pipeline with scripted mock clients
//! - Clean dependency graph (all crates depend inward on core)

pub mod codeblock;
pub mod completion;
pub mod error;
pub mod intent;
pub mod turn;

// Re-export key types at crate root for ergonomics
pub use completion::{ChatMessage, CompletionClient, CompletionRequest};
pub use error::{CompletionError, EngineError, Error, Result, ToolError};
pub use intent::{Intent, RouteConfidence, RouteDecision, classify};
pub use turn::{Role, Transcript, Turn};
