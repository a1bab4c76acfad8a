//! faithloop-agent — the routing pipeline.
//!
//! This crate turns one user query into one answer. [`Pipeline::process`]
//! runs the phases in order: an optional vision read, a router decision,
//! the selected tool branch, and an optional image-grounded deep check.
//! Prompt templates live in [`prompts`], the sliding context window in
//! [`context`].

pub mod context;
pub mod pipeline;
pub mod prompts;

pub use pipeline::{Answer, Pipeline};
