//! Fenced code-block extraction.
//!
//! Model replies wrap generated scripts in markdown fences. `extract` pulls
//! the first block opened with the given tag and closed with a bare fence,
//! matching non-greedily across lines, and returns the interior trimmed.

use regex::Regex;

/// Extract the first ```tag … ``` block from `text`.
///
/// Returns `None` if no such block exists. The interior is trimmed, so
/// extraction is idempotent: re-extracting from a returned value finds
/// nothing (the interior cannot contain a closing fence).
pub fn extract(text: &str, tag: &str) -> Option<String> {
    let pattern = format!(r"(?s)```{}(.*?)```", regex::escape(tag));
    let re = Regex::new(&pattern).ok()?;
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}
