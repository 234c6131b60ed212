use serde::Deserialize;

use super::{log_retrieval_failure, BoxFuture, ConnectorRuntime, PolicySource, SourceConnector};
use crate::circuit_breaker::CircuitState;
use crate::fetcher::ResilientFetcher;
use crate::http_client::HttpRequest;
use crate::source_policy::SourcePolicy;
use crate::{CalendarDate, CountryCode, PolicyDocument, SourceId, SourceStatus};

pub const DEFAULT_BASE_URL: &str = "https://www.federalregister.gov/api/v1";
const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;

/// Terms that mark a publication as tariff-relevant when found in its title
/// or abstract.
pub const DEFAULT_RELEVANCE_KEYWORDS: [&str; 8] = [
    "tariff",
    "duty",
    "duties",
    "trade",
    "import",
    "export",
    "section 301",
    "section 232",
];

/// Trade-policy documents from the Federal Register full-text search.
#[derive(Clone)]
pub struct FederalRegisterConnector {
    runtime: ConnectorRuntime,
    base_url: String,
    page_size: u32,
    keywords: Vec<String>,
}

impl FederalRegisterConnector {
    pub fn new(fetcher: ResilientFetcher) -> Self {
        Self {
            runtime: ConnectorRuntime::new(SourcePolicy::federal_register_default(), fetcher),
            base_url: String::from(DEFAULT_BASE_URL),
            page_size: DEFAULT_PAGE_SIZE,
            keywords: DEFAULT_RELEVANCE_KEYWORDS.iter().map(|k| (*k).to_owned()).collect(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Page size is clamped to `1..=100`.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords
            .into_iter()
            .map(|keyword| keyword.into().trim().to_lowercase())
            .filter(|keyword| !keyword.is_empty())
            .collect();
        self
    }

    pub fn with_policy(mut self, policy: SourcePolicy) -> Self {
        self.runtime = self.runtime.with_policy(policy);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.runtime = self.runtime.with_enabled(enabled);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.runtime.is_enabled()
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.runtime.circuit_state()
    }

    fn search_request(&self, term: &str, per_page: u32) -> HttpRequest {
        HttpRequest::get(format!("{}/documents.json", self.base_url))
            .with_query("conditions[term]", term)
            .with_query("per_page", &per_page.to_string())
            .with_query("order", "newest")
    }

    fn is_relevant(&self, title: &str, summary: Option<&str>) -> bool {
        let haystack = format!("{} {}", title, summary.unwrap_or_default()).to_lowercase();
        self.keywords.iter().any(|keyword| haystack.contains(keyword.as_str()))
    }

    fn normalize(&self, payload: DocumentPayload) -> Option<PolicyDocument> {
        let title = payload.title.map(|title| title.trim().to_owned())?;
        if title.is_empty() {
            return None;
        }

        let tariff_relevant = self.is_relevant(&title, payload.summary.as_deref());
        Some(PolicyDocument {
            published_on: payload
                .publication_date
                .as_deref()
                .and_then(|date| CalendarDate::parse(date).ok()),
            category: payload
                .document_type
                .filter(|kind| !kind.trim().is_empty())
                .unwrap_or_else(|| String::from("Unknown")),
            url: payload.html_url.filter(|url| !url.trim().is_empty()),
            tariff_relevant,
            title,
        })
    }
}

impl SourceConnector for FederalRegisterConnector {
    fn id(&self) -> SourceId {
        SourceId::FederalRegister
    }

    fn check_status<'a>(&'a self) -> BoxFuture<'a, SourceStatus> {
        Box::pin(async move { self.runtime.probe(self.search_request("tariff", 1)).await })
    }
}

impl PolicySource for FederalRegisterConnector {
    fn policy_documents<'a>(&'a self, country: &'a CountryCode) -> BoxFuture<'a, Vec<PolicyDocument>> {
        Box::pin(async move {
            let term = format!("{} tariff", search_name(country));
            let request = self.search_request(&term, self.page_size);

            match self.runtime.fetch_json::<DocumentsPayload>(request).await {
                Ok(payload) => payload
                    .results
                    .into_iter()
                    .filter_map(|document| self.normalize(document))
                    .collect(),
                Err(error) => {
                    log_retrieval_failure("policy_documents", Some(country), &error);
                    Vec::new()
                }
            }
        })
    }
}

/// Free-text search works far better with a country name than with its code.
fn search_name(country: &CountryCode) -> &str {
    match country.as_str() {
        "USA" => "United States",
        "CHN" => "China",
        "DEU" => "Germany",
        "JPN" => "Japan",
        "GBR" => "United Kingdom",
        "IND" => "India",
        "FRA" => "France",
        "BRA" => "Brazil",
        "CAN" => "Canada",
        "MEX" => "Mexico",
        "KOR" => "Korea",
        "VNM" => "Vietnam",
        "ITA" => "Italy",
        "RUS" => "Russia",
        other => other,
    }
}

#[derive(Debug, Deserialize)]
struct DocumentsPayload {
    #[serde(default)]
    results: Vec<DocumentPayload>,
}

#[derive(Debug, Deserialize)]
struct DocumentPayload {
    title: Option<String>,
    publication_date: Option<String>,
    #[serde(rename = "type")]
    document_type: Option<String>,
    #[serde(rename = "abstract")]
    summary: Option<String>,
    html_url: Option<String>,
}
