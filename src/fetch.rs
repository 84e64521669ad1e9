use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use serde_json::Value;

const RETRY_BACKOFF_MS: u64 = 300;

static CLIENT: OnceCell<Client> = OnceCell::new();

fn http_client(timeout_secs: u64) -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build http client")
    })
}

/// Fetch capability consumed by the pipeline: one URL in, one parsed JSON
/// document out. Network and HTTP-status failures are retried within the
/// configured budget; a body that is not valid JSON fails immediately.
pub trait Fetch {
    fn fetch_json(&self, url: &str) -> Result<Value>;
}

pub struct HttpFetcher {
    client: &'static Client,
    retry_attempts: u32,
    retry_backoff: Duration,
}

impl HttpFetcher {
    pub fn new(timeout_secs: u64, retry_attempts: u32) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            retry_attempts: retry_attempts.max(1),
            retry_backoff: Duration::from_millis(RETRY_BACKOFF_MS),
        })
    }

    fn fetch_body(&self, url: &str) -> Result<String> {
        let mut last_err = None;
        for attempt in 0..self.retry_attempts {
            if attempt > 0 {
                thread::sleep(self.retry_backoff);
            }
            match self.try_fetch_body(url) {
                Ok(body) => return Ok(body),
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow!("request failed: {url}")))
    }

    fn try_fetch_body(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("request failed: {url}"))?;
        let status = resp.status();
        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(anyhow!("http {status}: {url}"));
        }
        Ok(body)
    }
}

impl Fetch for HttpFetcher {
    fn fetch_json(&self, url: &str) -> Result<Value> {
        let body = self.fetch_body(url)?;
        serde_json::from_str(body.trim()).with_context(|| format!("invalid json from {url}"))
    }
}
