//! Elasticsearch document sink.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;

use iconmine_core::{DocumentSink, MineError, TimingDocument};

/// Connection settings for the monitoring cluster.
#[derive(Debug, Clone)]
pub struct ElasticConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    pub index: String,
    pub timeout: Duration,
}

pub struct ElasticSink {
    client: Client,
    endpoint: String,
    config: ElasticConfig,
}

impl ElasticSink {
    pub fn new(config: ElasticConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let endpoint = format!("{}/{}/_doc", config.url.trim_end_matches('/'), config.index);
        Ok(Self {
            client,
            endpoint,
            config,
        })
    }
}

impl DocumentSink for ElasticSink {
    fn index(&mut self, document: &TimingDocument) -> iconmine_core::Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .json(document)
            .send()
            .map_err(|e| MineError::Sink(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().unwrap_or_default();
        if status == StatusCode::BAD_REQUEST {
            Err(MineError::BadRequest(body))
        } else {
            Err(MineError::Sink(format!("{}: {}", status, body)))
        }
    }
}
