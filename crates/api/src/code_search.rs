use gleaner_client::{Params, RequestClient, RequestOptions};
use gleaner_core::Result;
use indexmap::IndexMap;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};

/// GitHub REST API.
///
/// <https://docs.github.com/en/rest>
const DEFAULT_BASE: &str = "https://api.github.com";

/// One repository record, as returned by search and detail endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repo {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub stargazers_count: Option<u64>,
    pub forks_count: Option<u64>,
    pub open_issues_count: Option<u64>,
    pub topics: Option<Vec<String>>,
    pub language: Option<String>,
    pub created_at: Option<String>,
    pub pushed_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoSearchPage {
    pub total_count: u64,
    pub items: Vec<Repo>,
}

/// Code-hosting search client.
///
/// Anonymous requests are allowed but rate-limited aggressively; provide a
/// token when possible.
pub struct CodeSearch {
    client: RequestClient,
    base: String,
    token: Option<String>,
}

impl CodeSearch {
    pub fn new(client: RequestClient, token: Option<String>) -> Self {
        Self::with_base(client, token, DEFAULT_BASE)
    }

    pub fn with_base(
        client: RequestClient,
        token: Option<String>,
        base: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base: base.into(),
            token,
        }
    }

    /// Search repositories tagged with a core-project identifier.
    pub async fn search_repos(&self, tag: &str) -> Result<Vec<Repo>> {
        let url = format!("{}/search/repositories", self.base);
        let query = format!("{tag} in:readme,description,topics");
        let page: RepoSearchPage = self
            .client
            .request_json(
                &url,
                RequestOptions::get()
                    .with_headers(self.headers())
                    .with_params(Params::new().set("q", query).set("per_page", 100)),
            )
            .await?;
        Ok(page.items)
    }

    /// Full details for one repository.
    pub async fn repo(&self, owner: &str, name: &str) -> Result<Repo> {
        let url = format!("{}/repos/{owner}/{name}", self.base);
        self.client
            .request_json(&url, RequestOptions::get().with_headers(self.headers()))
            .await
    }

    /// Bytes of code per language.
    pub async fn languages(&self, owner: &str, name: &str) -> Result<IndexMap<String, u64>> {
        let url = format!("{}/repos/{owner}/{name}/languages", self.base);
        self.client
            .request_json(&url, RequestOptions::get().with_headers(self.headers()))
            .await
    }

    /// Contributor logins, first page only (enough for a count and top list).
    pub async fn contributors(&self, owner: &str, name: &str) -> Result<Vec<Contributor>> {
        let url = format!("{}/repos/{owner}/{name}/contributors", self.base);
        self.client
            .request_json(
                &url,
                RequestOptions::get()
                    .with_headers(self.headers())
                    .with_params(Params::new().set("per_page", 100)),
            )
            .await
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        if let Some(token) = &self.token {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contributor {
    pub login: String,
    pub contributions: u64,
}
