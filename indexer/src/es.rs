use anyhow::{anyhow, bail, Context, Result};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use suggest_core::config::{PAGE_SIZE, SCROLL_LEASE};
use suggest_core::{BulkSink, Document, DocumentSource};

const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Thin HTTP client for the document and suggestion stores.
#[derive(Clone)]
pub struct EsClient {
    http: Client,
    base: String,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(rename = "_scroll_id")]
    scroll_id: Option<String>,
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
    #[serde(default)]
    hits: Vec<Document>,
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<Value>,
}

impl EsClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { http, base: base_url.trim_end_matches('/').to_string() })
    }

    pub fn base_url(&self) -> &str { &self.base }

    /// Scroll over every document in `index`.
    pub fn scroll(&self, index: &str) -> ScrollSource<'_> {
        ScrollSource { client: self, index: index.to_string(), scroll_id: None }
    }

    /// Bulk sink posting to `/_bulk`.
    pub fn bulk(&self) -> EsBulk<'_> {
        EsBulk { client: self, requests: 0 }
    }

    pub async fn post_bulk(&self, body: String) -> Result<()> {
        let url = format!("{}/_bulk", self.base);
        let resp = self
            .http
            .post(&url)
            .header(header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await
            .with_context(|| format!("POST {url}"))?
            .error_for_status()
            .with_context(|| format!("POST {url}"))?;
        let report: BulkResponse = resp.json().await.context("decoding bulk response")?;
        if report.errors {
            let reason = report
                .items
                .iter()
                .filter_map(|item| item.as_object()?.values().next()?.get("error").cloned())
                .next()
                .unwrap_or(Value::Null);
            bail!("bulk request rejected: {reason}");
        }
        Ok(())
    }

    /// Create `index` with `mapping` unless it already exists. Returns whether it was created.
    pub async fn ensure_index(&self, index: &str, mapping: &Value) -> Result<bool> {
        let url = format!("{}/{}", self.base, index);
        let head = self.http.head(&url).send().await.with_context(|| format!("HEAD {url}"))?;
        match head.status() {
            s if s.is_success() => Ok(false),
            StatusCode::NOT_FOUND => {
                self.http
                    .put(&url)
                    .json(mapping)
                    .send()
                    .await
                    .with_context(|| format!("PUT {url}"))?
                    .error_for_status()
                    .with_context(|| format!("creating index {index}"))?;
                tracing::info!(index, "created suggestion index");
                Ok(true)
            }
            s => Err(anyhow!("HEAD {url} returned {s}")),
        }
    }

    async fn search_page(&self, index: &str) -> Result<SearchPage> {
        let url = format!("{}/{}/_search", self.base, index);
        let size = PAGE_SIZE.to_string();
        let resp = self
            .http
            .get(&url)
            .query(&[("q", "*:*"), ("scroll", SCROLL_LEASE), ("size", size.as_str())])
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url}"))?;
        resp.json().await.context("decoding search page")
    }

    async fn scroll_page(&self, scroll_id: &str) -> Result<SearchPage> {
        let url = format!("{}/_search/scroll", self.base);
        let resp = self
            .http
            .post(&url)
            .json(&json!({ "scroll": SCROLL_LEASE, "scroll_id": scroll_id }))
            .send()
            .await
            .with_context(|| format!("POST {url}"))?
            .error_for_status()
            .with_context(|| format!("POST {url}"))?;
        resp.json().await.context("decoding scroll page")
    }

    async fn clear_scroll(&self, scroll_id: &str) -> Result<()> {
        let url = format!("{}/_search/scroll", self.base);
        self.http
            .delete(&url)
            .json(&json!({ "scroll_id": [scroll_id] }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Scroll session over one source index.
pub struct ScrollSource<'a> {
    client: &'a EsClient,
    index: String,
    scroll_id: Option<String>,
}

impl DocumentSource for ScrollSource<'_> {
    async fn next_page(&mut self) -> Result<Vec<Document>> {
        let page = match &self.scroll_id {
            None => self.client.search_page(&self.index).await?,
            Some(id) => self.client.scroll_page(id).await?,
        };
        match page.scroll_id {
            Some(id) => self.scroll_id = Some(id),
            // Without a cursor the next call would restart from the first page.
            None if !page.hits.hits.is_empty() => {
                bail!("search response for {} carried no _scroll_id", self.index)
            }
            None => {}
        }
        Ok(page.hits.hits)
    }

    async fn release(&mut self) -> Result<()> {
        match self.scroll_id.take() {
            Some(id) => self.client.clear_scroll(&id).await,
            None => Ok(()),
        }
    }
}

pub struct EsBulk<'a> {
    client: &'a EsClient,
    pub requests: usize,
}

impl BulkSink for EsBulk<'_> {
    async fn send_bulk(&mut self, body: String) -> Result<()> {
        self.client.post_bulk(body).await?;
        self.requests += 1;
        Ok(())
    }
}
