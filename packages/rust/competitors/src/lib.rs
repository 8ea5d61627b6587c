//! Competitor lookup through a site-restricted web search.
//!
//! One query per drug name, one results page, anchors filtered by a path
//! marker. No pagination; retries only as far as the configured policy allows.

mod extract;

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{info, instrument};
use url::Url;

use brandplanner_shared::{PlannerError, Result, Retryable, ScraperConfig, call_with_retry};

pub use extract::{Competitor, competitor_label, extract_competitors, slugify};

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("BrandPlanner/", env!("CARGO_PKG_VERSION"));

/// Why a single search request failed.
#[derive(Debug, thiserror::Error)]
enum SearchError {
    #[error("HTTP {0}")]
    Status(StatusCode),
    #[error("transport: {0}")]
    Transport(String),
}

impl Retryable for SearchError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Status(status) => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            Self::Transport(_) => true,
        }
    }
}

/// Site-restricted competitor search.
pub struct CompetitorSearch {
    config: ScraperConfig,
    client: Client,
}

impl CompetitorSearch {
    /// Create a search client with the given configuration.
    pub fn new(config: ScraperConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PlannerError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// The query sent for `drug`.
    pub fn query_for(&self, drug: &str) -> String {
        format!("site:{} {} vs", self.config.target_site, drug.trim())
    }

    /// Search for competitors of `drug`.
    ///
    /// Any transport or parse failure is a single [`PlannerError::ScrapeFailed`];
    /// no partial results are returned.
    #[instrument(skip(self), fields(site = %self.config.target_site))]
    pub async fn find(&self, drug: &str) -> Result<Vec<Competitor>> {
        if drug.trim().is_empty() {
            return Err(PlannerError::invalid_selection(
                "enter a drug name to search for competitors",
            ));
        }

        let query = self.query_for(drug);
        let url = Url::parse_with_params(&self.config.search_url, &[("q", query.as_str())])
            .map_err(|e| {
                PlannerError::ScrapeFailed(format!(
                    "invalid search URL '{}': {e}",
                    self.config.search_url
                ))
            })?;

        let body = call_with_retry(self.config.retry_policy(), |attempt| {
            let url = url.clone();
            async move {
                tracing::debug!(attempt, %url, "fetching search results");
                self.fetch(url).await
            }
        })
        .await
        .map_err(|e| PlannerError::ScrapeFailed(format!("{query}: {e}")))?;

        let competitors = extract_competitors(
            &body,
            &url,
            drug,
            &self.config.path_marker,
            self.config.max_results,
        );

        info!(found = competitors.len(), "competitor search complete");
        Ok(competitors)
    }

    async fn fetch(&self, url: Url) -> std::result::Result<String, SearchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status));
        }

        response
            .text()
            .await
            .map_err(|e| SearchError::Transport(format!("body read failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RESULTS_PAGE: &str = r#"<html><body>
        <div class="result"><a class="result__a"
           href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.drugs.com%2Fcompare%2Fozempic-vs-trulicity">Ozempic vs Trulicity</a></div>
        <div class="result"><a class="result__a"
           href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.drugs.com%2Fozempic.html">Ozempic</a></div>
        <div class="result"><a class="result__a"
           href="https://www.drugs.com/compare/mounjaro-vs-ozempic">Mounjaro vs Ozempic</a></div>
    </body></html>"#;

    fn config_for(server: &MockServer) -> ScraperConfig {
        ScraperConfig {
            search_url: format!("{}/html/", server.uri()),
            retry_delay_ms: 0,
            ..ScraperConfig::default()
        }
    }

    #[tokio::test]
    async fn finds_competitors_on_results_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/html/"))
            .and(query_param("q", "site:drugs.com Ozempic vs"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
            .mount(&server)
            .await;

        let search = CompetitorSearch::new(config_for(&server)).unwrap();
        let found = search.find("Ozempic").await.unwrap();
        let names: Vec<_> = found.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Trulicity", "Mounjaro"]);
        assert_eq!(found[0].url, "https://www.drugs.com/compare/ozempic-vs-trulicity");
    }

    #[tokio::test]
    async fn http_failure_is_scrape_failed_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let search = CompetitorSearch::new(config_for(&server)).unwrap();
        let err = search.find("Ozempic").await.unwrap_err();
        assert!(matches!(err, PlannerError::ScrapeFailed(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn configured_retry_recovers_from_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
            .mount(&server)
            .await;

        let config = ScraperConfig {
            max_attempts: 2,
            ..config_for(&server)
        };
        let search = CompetitorSearch::new(config).unwrap();
        assert_eq!(search.find("Ozempic").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn blank_drug_name_is_rejected_before_any_request() {
        let search = CompetitorSearch::new(ScraperConfig::default()).unwrap();
        let err = search.find("   ").await.unwrap_err();
        assert!(matches!(err, PlannerError::InvalidSelection { .. }));
    }

    #[test]
    fn query_is_site_restricted() {
        let search = CompetitorSearch::new(ScraperConfig::default()).unwrap();
        assert_eq!(search.query_for(" Humira "), "site:drugs.com Humira vs");
    }
}
