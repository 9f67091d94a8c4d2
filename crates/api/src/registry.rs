use gleaner_client::{RequestClient, RequestOptions};
use gleaner_core::{IsEmpty, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// NIH RePORTER search API v2.
///
/// <https://api.reporter.nih.gov/>
const DEFAULT_BASE: &str = "https://api.reporter.nih.gov/v2";

/// Max page size the service allows.
const PAGE_SIZE: usize = 500;

/// Hard cap on pages fetched per search.
const PAGE_CAP: usize = 10;

/// Searchable record collections.
#[derive(Debug, Clone, Copy)]
pub enum RegistryEndpoint {
    Projects,
    Publications,
}

impl RegistryEndpoint {
    fn as_str(self) -> &'static str {
        match self {
            RegistryEndpoint::Projects => "projects",
            RegistryEndpoint::Publications => "publications",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchMeta {
    pub total: Option<usize>,
}

/// All pages of one search, merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults<R> {
    pub meta: SearchMeta,
    pub results: Vec<R>,
}

impl<R> IsEmpty for SearchResults<R> {
    fn is_empty_value(&self) -> bool {
        self.results.is_empty()
    }
}

#[derive(Serialize)]
struct SearchBody<'a, C: Serialize> {
    criteria: &'a C,
    offset: usize,
    limit: usize,
}

/// Grants-registry search client.
pub struct Registry {
    client: RequestClient,
    base: String,
}

impl Registry {
    pub fn new(client: RequestClient) -> Self {
        Self::with_base(client, DEFAULT_BASE)
    }

    pub fn with_base(client: RequestClient, base: impl Into<String>) -> Self {
        Self {
            client,
            base: base.into(),
        }
    }

    /// Run a search, walking offset windows until the reported total (or the
    /// page cap) is reached. `meta` comes from the first page; `results`
    /// concatenate across pages.
    pub async fn search<C, R>(
        &self,
        endpoint: RegistryEndpoint,
        criteria: &C,
    ) -> Result<SearchResults<R>>
    where
        C: Serialize,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}/search", self.base, endpoint.as_str());

        let mut merged = SearchResults {
            meta: SearchMeta::default(),
            results: Vec::new(),
        };

        let mut offset = 0;
        while offset <= PAGE_CAP * PAGE_SIZE {
            let body = serde_json::to_value(SearchBody {
                criteria,
                offset,
                limit: PAGE_SIZE,
            })
            .map_err(|e| gleaner_core::Error::json("Failed to serialize search body", e))?;

            let page: SearchResults<R> = self
                .client
                .request_json(&url, RequestOptions::post(body))
                .await?;

            if offset == 0 {
                merged.meta = page.meta.clone();
            }
            merged.results.extend(page.results);

            let total = page.meta.total.unwrap_or(0);
            if offset + PAGE_SIZE >= total {
                break;
            }
            offset += PAGE_SIZE;
        }

        tracing::debug!(
            endpoint = endpoint.as_str(),
            results = merged.results.len(),
            "registry search complete"
        );
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize)]
    struct Project {
        project_num: String,
    }

    #[tokio::test]
    async fn merges_pages_up_to_the_reported_total() {
        let server = MockServer::start().await;

        // first window reports a total that spans two pages
        let first: Vec<serde_json::Value> = (0..500)
            .map(|i| json!({"project_num": format!("P{i}")}))
            .collect();
        Mock::given(method("POST"))
            .and(path("/projects/search"))
            .and(body_partial_json(json!({"offset": 0, "limit": 500})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"meta": {"total": 502}, "results": first})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/projects/search"))
            .and(body_partial_json(json!({"offset": 500, "limit": 500})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "meta": {"total": 502},
                "results": [{"project_num": "P500"}, {"project_num": "P501"}],
            })))
            .mount(&server)
            .await;

        let registry = Registry::with_base(RequestClient::new(), server.uri());
        let results: SearchResults<Project> = registry
            .search(RegistryEndpoint::Projects, &json!({"opportunity_numbers": ["RFA-1"]}))
            .await
            .unwrap();

        assert_eq!(results.meta.total, Some(502));
        assert_eq!(results.results.len(), 502);
        assert_eq!(results.results[501].project_num, "P501");
    }

    #[tokio::test]
    async fn single_page_stops_after_one_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/publications/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "meta": {"total": 1},
                "results": [{"project_num": "P1"}],
            })))
            .mount(&server)
            .await;

        let registry = Registry::with_base(RequestClient::new(), server.uri());
        let results: SearchResults<Project> = registry
            .search(RegistryEndpoint::Publications, &json!({}))
            .await
            .unwrap();

        assert_eq!(results.results.len(), 1);
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}
