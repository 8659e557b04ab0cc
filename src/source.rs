use std::{collections::HashMap, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;

use crate::config::PipelineConfig;

/// Raw answer from a feature-collection endpoint.
#[derive(Debug, Clone)]
pub struct SourceResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Bytes,
}

impl SourceResponse {
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self { status: 200, status_text: "OK".into(), body: body.into() }
    }

    pub fn error(status: u16, status_text: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self { status, status_text: status_text.into(), body: body.into() }
    }

    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }
}

/// Read-only access to feature collections by absolute URL.
/// An `Err` means no response was received at all; HTTP error statuses are
/// returned as a `SourceResponse`.
#[async_trait]
pub trait FeatureSource: Send + Sync {
    async fn get(&self, url: &str) -> Result<SourceResponse>;
}

/// Feature source backed by a shared reqwest client.
#[derive(Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("build http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeatureSource for HttpSource {
    async fn get(&self, url: &str) -> Result<SourceResponse> {
        let resp = self.client.get(url).send().await
            .with_context(|| format!("GET {url}"))?;
        let status = resp.status();
        let body = resp.bytes().await
            .with_context(|| format!("read body of {url}"))?;
        Ok(SourceResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            body,
        })
    }
}

/// Simple in-memory source with canned responses.
/// Unknown URLs answer 404.
#[derive(Default, Clone)]
pub struct MemSource {
    responses: HashMap<String, SourceResponse>,
}

impl MemSource {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, url: impl Into<String>, response: SourceResponse) -> Self {
        self.responses.insert(url.into(), response);
        self
    }

    pub fn with_json(self, url: impl Into<String>, body: &serde_json::Value) -> Self {
        self.with(url, SourceResponse::ok(body.to_string()))
    }

    pub fn into_shared(self) -> Arc<dyn FeatureSource> { Arc::new(self) }
}

#[async_trait]
impl FeatureSource for MemSource {
    async fn get(&self, url: &str) -> Result<SourceResponse> {
        Ok(self.responses.get(url).cloned()
            .unwrap_or_else(|| SourceResponse::error(404, "Not Found", Bytes::new())))
    }
}

/// Joins a level URL onto `domain` unless it is already absolute.
pub fn resolve_url(domain: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    match (domain.ends_with('/'), url.starts_with('/')) {
        (true, true) => format!("{domain}{}", &url[1..]),
        (false, false) if !domain.is_empty() => format!("{domain}/{url}"),
        _ => format!("{domain}{url}"),
    }
}
