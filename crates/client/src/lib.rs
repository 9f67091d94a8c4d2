//! Rate-limit-aware HTTP request wrapper.
//!
//! Every per-service API wrapper composes on [`RequestClient`]: it owns the
//! uniform parameter/body encoding, response-ok checking, typed payload
//! parsing, and automatic bounded retry on upstream throttling. It holds no
//! state beyond the inner connection pool and its retry configuration.

mod params;

use std::time::Duration;

use gleaner_core::{Error, Result, DEFAULT_RETRIES};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;

pub use params::Params;

/// Fixed safety margin added on top of the server-supplied retry delay.
const RETRY_MARGIN: Duration = Duration::from_secs(1);

/// Fallback delay when a 429 carries no usable `Retry-After` header.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Per-request options: method, headers, query parameters, JSON body.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Option<Method>,
    pub headers: HeaderMap,
    pub params: Params,
    pub body: Option<serde_json::Value>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: serde_json::Value) -> Self {
        Self {
            method: Some(Method::POST),
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

/// HTTP client wrapper that transparently retries throttled requests.
#[derive(Debug, Clone)]
pub struct RequestClient {
    http: reqwest::Client,
    retries: u32,
    retry_margin: Duration,
}

impl RequestClient {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("gleaner/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            retries: DEFAULT_RETRIES,
            retry_margin: RETRY_MARGIN,
        }
    }

    /// Override the 429 retry budget.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Override the safety margin added to server-supplied retry delays.
    pub fn with_retry_margin(mut self, margin: Duration) -> Self {
        self.retry_margin = margin;
        self
    }

    /// Make a request and decode the response body as JSON.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let response = self.send(url, options).await?;
        response
            .json()
            .await
            .map_err(|_| Error::parse_failed(url, "json"))
    }

    /// Make a request and return the raw response text.
    pub async fn request_text(&self, url: &str, options: RequestOptions) -> Result<String> {
        let response = self.send(url, options).await?;
        response
            .text()
            .await
            .map_err(|_| Error::parse_failed(url, "text"))
    }

    /// Send the request, resubmitting on throttling up to the retry budget.
    async fn send(&self, url: &str, options: RequestOptions) -> Result<Response> {
        let mut target = url::Url::parse(url)
            .map_err(|e| Error::configuration(format!("invalid url '{url}': {e}")))?;
        for (key, value) in options.params.pairs() {
            target.query_pairs_mut().append_pair(key, value);
        }
        let method = options.method.unwrap_or(Method::GET);

        let mut attempt: u32 = 0;
        loop {
            // fresh request each attempt; a builder can't be reused after send
            let mut request = self
                .http
                .request(method.clone(), target.clone())
                .headers(options.headers.clone());
            if let Some(body) = &options.body {
                request = request.json(body);
            }

            let response = request
                .send()
                .await
                .map_err(|e| Error::network(target.as_str(), e.to_string()))?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt >= self.retries {
                    return Err(Error::throttled(target.as_str(), self.retries));
                }
                let delay = retry_after(&response).unwrap_or(DEFAULT_RETRY_AFTER);
                attempt += 1;
                tracing::warn!(
                    url = %target,
                    delay_secs = delay.as_secs(),
                    attempt,
                    "throttled, retrying after server-requested delay"
                );
                tokio::time::sleep(delay + self.retry_margin).await;
                continue;
            }
            if !status.is_success() {
                return Err(Error::request_failed(status.as_u16(), target.as_str()));
            }
            return Ok(response);
        }
    }
}

impl Default for RequestClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a server-supplied retry delay in seconds.
fn retry_after(response: &Response) -> Option<Duration> {
    let value = response.headers().get(RETRY_AFTER)?.to_str().ok()?;
    // HTTP-date form is not used by the services this pipeline talks to
    value.parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_builders() {
        let options = RequestOptions::post(serde_json::json!({"a": 1}))
            .with_params(Params::new().set("limit", 10));
        assert_eq!(options.method, Some(Method::POST));
        assert!(options.body.is_some());
        assert!(!options.params.is_empty());
    }
}
