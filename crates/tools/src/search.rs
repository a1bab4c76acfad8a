//! Web evidence fetcher backed by the DuckDuckGo HTML endpoint.
//!
//! One POST per query with spoofed desktop-browser headers, then the result
//! page is scraped for title/snippet pairs and reduced to a compact evidence
//! block. The selectors are coupled to DuckDuckGo's markup; if that changes,
//! queries start coming back as "No results." rather than failing loudly.

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};

use faithloop_config::SearchConfig;
use faithloop_core::ToolError;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/115.0";
const REFERER: &str = "https://www.google.com/";

/// The evidence-gathering seam the pipeline calls through.
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    /// Run a search and return formatted evidence text.
    async fn fetch(&self, query: &str) -> Result<String, ToolError>;
}

/// Fetches search evidence for the synthesis prompt.
pub struct EvidenceFetcher {
    config: SearchConfig,
    client: reqwest::Client,
}

impl EvidenceFetcher {
    pub fn new(config: SearchConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }
}

#[async_trait]
impl EvidenceSource for EvidenceFetcher {
    /// Run a search and return SOURCE/FACT evidence lines.
    ///
    /// A page with no matching result blocks yields `"No results."`.
    /// Transport faults and non-200 statuses surface as errors.
    async fn fetch(&self, query: &str) -> Result<String, ToolError> {
        debug!(query = %query, "Fetching search evidence");

        let response = self
            .client
            .post(&self.config.url)
            .header("User-Agent", USER_AGENT)
            .header("Referer", REFERER)
            .form(&[("q", query)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ToolError::Timeout {
                        tool_name: "search".into(),
                        timeout_secs: self.config.timeout_secs,
                    }
                } else {
                    ToolError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            warn!(status = status, "Search endpoint refused the request");
            return Err(ToolError::Blocked {
                status_code: status,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ToolError::Network(e.to_string()))?;

        let evidence = extract_evidence(&body, self.config.max_results);
        debug!(chars = evidence.len(), "Evidence extracted");

        Ok(evidence)
    }
}

/// Reduce a result page to SOURCE/FACT pairs, at most `max_results` of them.
///
/// A block missing either its title link or its snippet link is skipped.
fn extract_evidence(html: &str, max_results: usize) -> String {
    let document = Html::parse_document(html);

    let result_sel = Selector::parse("div.result__body").expect("static selector must parse");
    let title_sel = Selector::parse("a.result__a").expect("static selector must parse");
    let snippet_sel = Selector::parse("a.result__snippet").expect("static selector must parse");

    let mut facts = Vec::new();

    for block in document.select(&result_sel).take(max_results) {
        let title = block
            .select(&title_sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string());
        let snippet = block
            .select(&snippet_sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string());

        if let (Some(title), Some(snippet)) = (title, snippet) {
            facts.push(format!("SOURCE: {title}\nFACT: {snippet}"));
        }
    }

    if facts.is_empty() {
        "No results.".to_string()
    } else {
        facts.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_block(title: &str, snippet: &str) -> String {
        format!(
            r#"<div class="result__body">
                <a class="result__a" href="https://example.com">{title}</a>
                <a class="result__snippet" href="https://example.com">{snippet}</a>
            </div>"#
        )
    }

    #[test]
    fn extracts_source_fact_pairs() {
        let html = format!(
            "<html><body>{}{}</body></html>",
            result_block("Paris", "Paris is the capital of France."),
            result_block("France", "France is a country in Europe.")
        );

        let evidence = extract_evidence(&html, 3);
        assert_eq!(
            evidence,
            "SOURCE: Paris\nFACT: Paris is the capital of France.\n\n\
             SOURCE: France\nFACT: France is a country in Europe."
        );
    }

    #[test]
    fn respects_max_results() {
        let html = format!(
            "<html><body>{}{}{}{}</body></html>",
            result_block("One", "first"),
            result_block("Two", "second"),
            result_block("Three", "third"),
            result_block("Four", "fourth")
        );

        let evidence = extract_evidence(&html, 3);
        assert!(evidence.contains("SOURCE: Three"));
        assert!(!evidence.contains("SOURCE: Four"));
    }

    #[test]
    fn empty_page_yields_no_results() {
        let evidence = extract_evidence("<html><body><p>nothing here</p></body></html>", 3);
        assert_eq!(evidence, "No results.");
    }

    #[test]
    fn block_missing_snippet_is_skipped() {
        let html = r##"<html><body>
            <div class="result__body">
                <a class="result__a" href="#">Title only</a>
            </div>
        </body></html>"##;

        assert_eq!(extract_evidence(html, 3), "No results.");
    }

    #[test]
    fn block_missing_title_is_skipped() {
        let html = format!(
            r##"<html><body>
            <div class="result__body">
                <a class="result__snippet" href="#">Snippet only</a>
            </div>
            {}
        </body></html>"##,
            result_block("Kept", "This block is complete.")
        );

        let evidence = extract_evidence(&html, 3);
        assert_eq!(evidence, "SOURCE: Kept\nFACT: This block is complete.");
    }

    #[test]
    fn nested_markup_inside_links_is_flattened() {
        let html = r##"<html><body>
            <div class="result__body">
                <a class="result__a" href="#">The <b>Eiffel</b> Tower</a>
                <a class="result__snippet" href="#">Built in <em>1889</em>.</a>
            </div>
        </body></html>"##;

        let evidence = extract_evidence(html, 3);
        assert_eq!(evidence, "SOURCE: The Eiffel Tower\nFACT: Built in 1889.");
    }

    #[test]
    fn fetcher_construction() {
        let fetcher = EvidenceFetcher::new(SearchConfig::default());
        assert_eq!(fetcher.config.max_results, 3);
    }
}
