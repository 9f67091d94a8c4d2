use gleaner_client::{Params, RequestClient, RequestOptions};
use gleaner_core::{IsEmpty, Result};
use serde::{Deserialize, Serialize};

/// NIH iCite citation-metrics API.
///
/// <https://icite.od.nih.gov/api>
const DEFAULT_BASE: &str = "https://icite.od.nih.gov/api";

/// Max number of IDs the service accepts per request.
const CHUNK_SIZE: usize = 1000;

/// Citation metrics for one publication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationRecord {
    pub pmid: u64,
    pub title: Option<String>,
    pub journal: Option<String>,
    pub year: Option<i32>,
    pub citation_count: Option<u64>,
    pub relative_citation_ratio: Option<f64>,
    pub doi: Option<String>,
}

/// All chunks of one lookup, concatenated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CitationResults {
    pub meta: serde_json::Value,
    pub data: Vec<CitationRecord>,
}

impl IsEmpty for CitationResults {
    fn is_empty_value(&self) -> bool {
        self.data.is_empty()
    }
}

/// Citation-metrics client.
pub struct Citations {
    client: RequestClient,
    base: String,
}

impl Citations {
    pub fn new(client: RequestClient) -> Self {
        Self::with_base(client, DEFAULT_BASE)
    }

    pub fn with_base(client: RequestClient, base: impl Into<String>) -> Self {
        Self {
            client,
            base: base.into(),
        }
    }

    /// Look up citation metrics for a list of publication IDs.
    ///
    /// The ID list is broken into chunks of the service maximum; chunk pages
    /// concatenate, with `meta` taken from the first non-empty one.
    pub async fn lookup(&self, pmids: &[u64]) -> Result<CitationResults> {
        let url = format!("{}/pubs", self.base);
        let mut merged = CitationResults::default();

        for chunk in pmids.chunks(CHUNK_SIZE) {
            let joined = chunk
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            let page: CitationResults = self
                .client
                .request_json(
                    &url,
                    RequestOptions::get().with_params(Params::new().set("pmids", joined)),
                )
                .await?;

            if merged.meta.is_empty_value() {
                merged.meta = page.meta;
            }
            merged.data.extend(page.data);
        }

        tracing::debug!(records = merged.data.len(), "citation lookup complete");
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn chunks_long_id_lists() {
        let server = MockServer::start().await;

        let first_chunk: Vec<String> = (0..1000u64).map(|i| i.to_string()).collect();
        Mock::given(method("GET"))
            .and(path("/pubs"))
            .and(query_param("pmids", first_chunk.join(",")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "meta": {"limit": 1000},
                "data": [{"pmid": 0}],
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pubs"))
            .and(query_param("pmids", "1000,1001"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "meta": {"limit": 1000},
                "data": [{"pmid": 1000}, {"pmid": 1001}],
            })))
            .mount(&server)
            .await;

        let citations = Citations::with_base(RequestClient::new(), server.uri());
        let ids: Vec<u64> = (0..1002).collect();
        let results = citations.lookup(&ids).await.unwrap();

        assert_eq!(results.data.len(), 3);
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn decodes_metric_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pubs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "meta": {},
                "data": [{
                    "pmid": 31959,
                    "title": "A study",
                    "journal": "Nature",
                    "year": 2021,
                    "citation_count": 42,
                    "relative_citation_ratio": 1.7,
                    "doi": "10.1000/xyz",
                }],
            })))
            .mount(&server)
            .await;

        let citations = Citations::with_base(RequestClient::new(), server.uri());
        let results = citations.lookup(&[31959]).await.unwrap();

        let record = &results.data[0];
        assert_eq!(record.journal.as_deref(), Some("Nature"));
        assert_eq!(record.citation_count, Some(42));
    }
}
