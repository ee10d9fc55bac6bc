//! GitHub REST Client
//!
//! Minimal reqwest client producing [`UpstreamResponse`]s for the middleware.

use std::time::Duration;

use anyhow::{bail, Context};
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde_json::Value;

use crate::cache::normalize_endpoint;
use crate::upstream::{ConditionalHeaders, UpstreamResponse};

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const CLIENT_USER_AGENT: &str = concat!("github-cache/", env!("CARGO_PKG_VERSION"));

// == GitHub Client ==
/// Issues GET requests against the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
}

impl GitHubClient {
    /// Creates a client for `base_url` (e.g. `https://api.github.com`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    // == Request ==
    /// GETs `endpoint` with `params` as the query string.
    ///
    /// 304 comes back as a bodiless response; any other non-success status
    /// is an error carrying GitHub's `message`.
    pub async fn request(
        &self,
        endpoint: &str,
        params: &[(String, String)],
        token: Option<&str>,
        conditional: &ConditionalHeaders,
    ) -> anyhow::Result<UpstreamResponse> {
        let url = format!("{}/{}", self.base_url, normalize_endpoint(endpoint));

        let mut request = self
            .http
            .get(&url)
            .query(params)
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, CLIENT_USER_AGENT);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        for (name, value) in conditional.to_pairs() {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_ascii_lowercase(), value.to_string()))
            })
            .collect();

        if status == StatusCode::NOT_MODIFIED {
            return Ok(UpstreamResponse {
                status: status.as_u16(),
                data: None,
                headers,
            });
        }

        let body = response
            .bytes()
            .await
            .with_context(|| format!("reading body of GET {url}"))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<Value>(&body)
                .ok()
                .and_then(|json| json.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| String::from_utf8_lossy(&body).into_owned());
            bail!("GitHub API returned {status} for {endpoint}: {message}");
        }

        let data = if body.is_empty() {
            None
        } else {
            Some(serde_json::from_slice(&body).with_context(|| format!("invalid JSON from {url}"))?)
        };

        Ok(UpstreamResponse {
            status: status.as_u16(),
            data,
            headers,
        })
    }
}
