use crate::error::{BrowserError, Result};
use async_trait::async_trait;
use tracing::debug;

/// Retrieves a document by URL. All network access goes through this seam.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_text(&self, url: &str) -> Result<String>;
}

/// `reqwest`-backed transport. One client is shared by every task of every
/// cycle; gzip and deflate bodies are decoded transparently.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("repobrowser/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .deflate(true)
            .build()
            .map_err(|source| BrowserError::Http {
                url: String::new(),
                source,
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_text(&self, url: &str) -> Result<String> {
        debug!(url, "GET");
        let http_err = |source| BrowserError::Http {
            url: url.to_string(),
            source,
        };

        let resp = self.client.get(url).send().await.map_err(http_err)?;
        if !resp.status().is_success() {
            return Err(BrowserError::Status {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }
        resp.text().await.map_err(http_err)
    }
}
