//! Tool intent classification.
//!
//! The router model is asked for exactly one word out of
//! {SEARCH, NUMERIC, LOGIC, CHAT}, but small models rarely comply, so the
//! reply is upper-cased and matched by substring containment against the
//! known labels in a fixed priority order: a numeric marker (`NUMERIC`, or
//! the legacy `MATLAB` label) wins over `LOGIC`, which wins over `SEARCH`;
//! anything else falls through to CHAT. The looseness is intentional and
//! load-bearing. Each decision carries a confidence marker so the phase log
//! can say whether the reply was clean, fuzzy, or defaulted.

use serde::{Deserialize, Serialize};

/// The tool branch selected for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Intent {
    Search,
    Numeric,
    Logic,
    Chat,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Search => "SEARCH",
            Intent::Numeric => "NUMERIC",
            Intent::Logic => "LOGIC",
            Intent::Chat => "CHAT",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How cleanly the router reply matched a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteConfidence {
    /// The reply was exactly one known label.
    Exact,
    /// A label appeared as a substring inside a longer reply.
    Fuzzy,
    /// No label appeared; the default branch was taken.
    Defaulted,
}

/// The outcome of classifying one router reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision {
    pub intent: Intent,
    pub confidence: RouteConfidence,
    /// The reply after trimming and upper-casing, as shown in the phase log.
    pub raw: String,
}

/// Classify a raw router reply into a tool branch.
pub fn classify(reply: &str) -> RouteDecision {
    let raw = reply.trim().to_uppercase();

    let exact = match raw.as_str() {
        "SEARCH" => Some(Intent::Search),
        "NUMERIC" | "MATLAB" => Some(Intent::Numeric),
        "LOGIC" => Some(Intent::Logic),
        "CHAT" => Some(Intent::Chat),
        _ => None,
    };

    let (intent, confidence) = if let Some(intent) = exact {
        (intent, RouteConfidence::Exact)
    } else if raw.contains("NUMERIC") || raw.contains("MATLAB") {
        (Intent::Numeric, RouteConfidence::Fuzzy)
    } else if raw.contains("LOGIC") {
        (Intent::Logic, RouteConfidence::Fuzzy)
    } else if raw.contains("SEARCH") {
        (Intent::Search, RouteConfidence::Fuzzy)
    } else if raw.contains("CHAT") {
        (Intent::Chat, RouteConfidence::Fuzzy)
    } else {
        (Intent::Chat, RouteConfidence::Defaulted)
    };

    RouteDecision {
        intent,
        confidence,
        raw,
    }
}
