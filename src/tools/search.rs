use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::time::Duration;

use crate::agent::Failure;
use crate::model::{Problem, Solution};
use crate::tools::http::http_post_json;

/// A ranked web-search service.
pub trait Search: Send + Sync {
    fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, Failure>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub text: String,
    pub num_results: usize,
    pub include_domains: Vec<String>,
    pub use_autoprompt: bool,
    pub timeout: Duration,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            num_results: 10,
            include_domains: Vec::new(),
            use_autoprompt: false,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn num_results(mut self, n: usize) -> Self {
        self.num_results = n;
        self
    }

    pub fn include_domain(mut self, domain: impl Into<String>) -> Self {
        self.include_domains.push(domain.into());
        self
    }

    pub fn autoprompt(mut self, on: bool) -> Self {
        self.use_autoprompt = on;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Expired pre-2000 patents in `category`, restricted to Google Patents.
    pub fn patents(category: &str, n: usize) -> Self {
        Self::new(format!(
            "type:patent before:2000 status:patent expired historical {category}"
        ))
        .num_results(n)
        .include_domain("https://patents.google.com/")
        .autoprompt(true)
    }

    /// Background reading on a problem and one proposed solution.
    pub fn research(problem: &Problem, solution: &Solution) -> Self {
        Self::new(format!(
            "Give me more information about problem: {problem} and solution: {solution}"
        ))
        .num_results(5)
        .autoprompt(true)
    }
}

/// One ranked result. Fields the service sends beyond the common ones are
/// kept in `metadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl SearchHit {
    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().unwrap_or("No title")
    }
}

/// Blocking client for the Exa search API.
#[derive(Clone)]
pub struct ExaClient {
    api_key: String,
    endpoint: String,
}

impl ExaClient {
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.exa.ai/search";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl std::fmt::Debug for ExaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExaClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct ExaResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

impl Search for ExaClient {
    fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, Failure> {
        let raw = http_post_json(
            &self.endpoint,
            &[("x-api-key", self.api_key.as_str())],
            &request_body(query),
            query.timeout,
        )?;
        let parsed: ExaResponse = serde_json::from_str(&raw)
            .map_err(|e| Failure::malformed(format!("unexpected search payload: {e}")))?;
        tracing::debug!(query = %query.text, hits = parsed.results.len(), "search finished");
        Ok(parsed.results)
    }
}

fn request_body(query: &SearchQuery) -> Value {
    let mut body = json!({
        "query": query.text,
        "numResults": query.num_results,
        "useAutoprompt": query.use_autoprompt,
        "contents": { "text": true },
    });
    if !query.include_domains.is_empty() {
        body["includeDomains"] = json!(query.include_domains);
    }
    body
}

/// A patent hit reduced to what a reader needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatentSummary {
    pub title: String,
    pub url: String,
    pub score: f64,
    pub summary: String,
}

/// Search expired patents in `category`. An empty result is not an error.
pub fn search_patents(
    search: &dyn Search,
    category: &str,
    n: usize,
) -> Result<Vec<PatentSummary>, Failure> {
    let hits = search.search(&SearchQuery::patents(category, n))?;
    Ok(hits
        .into_iter()
        .map(|hit| PatentSummary {
            title: hit.title_or_default().to_string(),
            summary: extract_summary(hit.text.as_deref().unwrap_or_default(), 200),
            score: hit.score.unwrap_or(0.0),
            url: hit.url,
        })
        .collect())
}

/// First sentence longer than 30 characters, capped at `max_len` chars.
///
/// Falls back to the head of the text when no such sentence exists.
pub fn extract_summary(text: &str, max_len: usize) -> String {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return "No description available".to_string();
    }

    let candidate = text
        .split('.')
        .map(str::trim)
        .find(|s| s.chars().count() > 30)
        .map(|s| format!("{s}."))
        .unwrap_or(text);

    truncate(&candidate, max_len)
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let keep = max_len.saturating_sub(3);
    let head: String = s.chars().take(keep).collect();
    format!("{head}...")
}
