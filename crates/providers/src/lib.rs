//! Model provider implementations for FaithLoop.
//!
//! All providers implement the `faithloop_core::CompletionClient` trait.
//! The pipeline holds one client and addresses the fast and vision models
//! by name on each request.

pub mod ollama;

pub use ollama::OllamaClient;
