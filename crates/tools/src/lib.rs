//! Tool implementations for FaithLoop.
//!
//! Three tools back the routing pipeline's execute phase: the web evidence
//! fetcher, the persistent numeric engine, and the per-run script runner.
//! Each converts its failures into typed errors; the pipeline is the only
//! place those are flattened into user-visible strings.

pub mod engine;
pub mod script;
pub mod search;

pub use engine::{EngineStatus, NumericEngine};
pub use script::ScriptRunner;
pub use search::{EvidenceFetcher, EvidenceSource};
