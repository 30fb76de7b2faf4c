//! Minimal reqwest client for the gateway endpoints.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

use offer_search::SEARCH_STATUS_HEADER;

#[derive(Debug, Deserialize)]
pub struct HealthBody {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ReadyComponents {
    pub http: String,
    pub vectordb: String,
    pub embedding: String,
    pub embedder_mode: String,
}

#[derive(Debug, Deserialize)]
pub struct ReadyBody {
    pub status: String,
    pub components: ReadyComponents,
}

impl ReadyBody {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct ResultRow {
    pub offer: String,
    pub score: f64,
}

#[derive(Debug, Deserialize)]
pub struct SearchBody {
    pub status: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub results: Vec<ResultRow>,
    pub error: Option<String>,
    pub code: Option<u16>,
}

#[derive(Debug)]
pub struct SearchReply {
    pub http_status: StatusCode,
    pub search_status: String,
    pub body: SearchBody,
}

pub struct TestClient {
    base_url: String,
    client: reqwest::Client,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("client builds");
        Self { base_url, client }
    }

    pub async fn health(&self) -> reqwest::Result<HealthBody> {
        self.client
            .get(format!("{}/healthz", self.base_url))
            .send()
            .await?
            .json()
            .await
    }

    pub async fn ready(&self) -> reqwest::Result<ReadyBody> {
        self.client
            .get(format!("{}/ready", self.base_url))
            .send()
            .await?
            .json()
            .await
    }

    pub async fn search(&self, query: &str) -> reqwest::Result<SearchReply> {
        self.search_raw(serde_json::json!({ "query": query }).to_string())
            .await
    }

    pub async fn search_raw(&self, body: String) -> reqwest::Result<SearchReply> {
        let response = self
            .client
            .post(format!("{}/v1/search", self.base_url))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        let http_status = response.status();
        let search_status = response
            .headers()
            .get(SEARCH_STATUS_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.json().await?;

        Ok(SearchReply {
            http_status,
            search_status,
            body,
        })
    }
}
