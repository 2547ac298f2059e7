use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::pagination::PageSource;
use super::retry::{retry_with, RetryPolicy};
use crate::shared::config::SiengeConfig;

/// Ошибка одного HTTP-запроса к Sienge
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP {status} from {url}: {body}{hint}")]
    Status {
        status: u16,
        url: String,
        body: String,
        hint: &'static str,
    },

    #[error("network error calling {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl UpstreamError {
    /// Повторять имеет смысл только сетевые сбои, 429 и 5xx.
    pub fn is_retryable(&self) -> bool {
        match self {
            UpstreamError::Status { status, .. } => *status == 429 || *status >= 500,
            UpstreamError::Transport { source, .. } => source.is_timeout() || source.is_connect(),
            UpstreamError::Decode { .. } => false,
        }
    }
}

/// HTTP-клиент для REST API Sienge (Basic Auth)
pub struct SiengeApiClient {
    client: reqwest::Client,
    username: String,
    password: String,
    retry: RetryPolicy,
}

impl SiengeApiClient {
    pub fn new(config: &SiengeConfig, retry: RetryPolicy) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            username: config.username.clone(),
            password: config.password.clone(),
            retry,
        })
    }

    /// Один GET без повторов.
    async fn get_once(&self, url: &str, query: &[(String, String)]) -> Result<Value, UpstreamError> {
        tracing::debug!("Sienge API: GET {} {:?}", url, query);

        let password_opt: Option<&str> = if self.password.is_empty() {
            None
        } else {
            Some(&self.password)
        };

        let response = self
            .client
            .get(url)
            .basic_auth(&self.username, password_opt)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(|source| UpstreamError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(200).collect();
            let hint = if status.as_u16() == 401 || status.as_u16() == 403 {
                " (check SIENGE_USER / SIENGE_PASSWORD and the API user's permissions)"
            } else {
                ""
            };
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                url: url.to_string(),
                body,
                hint,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|source| UpstreamError::Decode {
                url: url.to_string(),
                source,
            })
    }
}

#[async_trait]
impl PageSource for SiengeApiClient {
    async fn fetch_page(&self, url: &str, query: &[(String, String)]) -> anyhow::Result<Value> {
        let body = retry_with(&self.retry, UpstreamError::is_retryable, |_| {
            self.get_once(url, query)
        })
        .await?;
        Ok(body)
    }
}
