use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{ListError, Result};

/// Network collaborator that downloads raw filter-list bytes.
///
/// Fetching is the only point where a refresh suspends.
#[async_trait]
pub trait ListFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// `ListFetcher` over HTTP(S). Non-2xx responses are failures.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(ListError::Client)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ListFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ListError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| fetch_error(url, e))?;
        log::debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }
}

fn fetch_error(url: &str, err: reqwest::Error) -> ListError {
    let message = if err.is_timeout() {
        "request timed out".to_string()
    } else {
        err.to_string()
    };
    ListError::Fetch {
        url: url.to_string(),
        message,
    }
}
