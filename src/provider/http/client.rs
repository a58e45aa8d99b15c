//! JSON-RPC over HTTP (`HttpTransport`).
//!
//! Posts one JSON-RPC 2.0 request per call and unwraps the `result` /
//! `error` envelope. Read methods are retried per [`RetryPolicy`]; a
//! transaction submission is sent exactly once.

use crate::error::ProviderError;
use crate::provider::http::retry::{RetryConfig, RetryPolicy};
use crate::provider::RpcTransport;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing;

/// HTTP JSON-RPC endpoint (a node URL, not a wallet).
pub struct HttpTransport {
    url: String,
    client: Client,
    next_id: Arc<AtomicU64>,
    /// Replaces the built-in config for retryable methods.
    retry_override: Option<RetryConfig>,
}

impl HttpTransport {
    pub fn new(url: &str) -> Result<Self, ProviderError> {
        let mut builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        {
            builder = builder
                .timeout(Duration::from_secs(30))
                .pool_max_idle_per_host(10);
        }

        let client = builder.build().map_err(|e| ProviderError::Transport {
            message: format!("Failed to build HTTP client: {}", e),
            retryable: false,
        })?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            client,
            next_id: Arc::new(AtomicU64::new(1)),
            retry_override: None,
        })
    }

    /// Use `config` instead of the default backoff for read methods.
    pub fn with_retry(mut self, config: RetryConfig) -> Self {
        self.retry_override = Some(config);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn policy_for(&self, method: &str) -> RetryPolicy {
        match (RetryPolicy::for_method(method), &self.retry_override) {
            (RetryPolicy::None, _) => RetryPolicy::None,
            (_, Some(config)) => RetryPolicy::Custom(config.clone()),
            (policy, None) => policy,
        }
    }

    async fn request_with_retry(
        &self,
        method: &str,
        params: &Value,
        retry: RetryPolicy,
    ) -> Result<Value, ProviderError> {
        let config = match &retry {
            RetryPolicy::None => {
                return self.do_request(method, params).await;
            }
            RetryPolicy::Idempotent => RetryConfig::idempotent(),
            RetryPolicy::Custom(c) => c.clone(),
        };

        let mut last_error = None;

        for attempt in 0..=config.max_retries {
            match self.do_request(method, params).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if config.should_retry(&e) && attempt < config.max_retries {
                        let delay = config.delay_for_attempt(attempt);
                        tracing::debug!(
                            attempt = attempt + 1,
                            max = config.max_retries,
                            delay_ms = delay.as_millis() as u64,
                            "Retrying {} against {}",
                            method,
                            self.url
                        );
                        futures_timer::Delay::new(delay).await;
                        last_error = Some(e);
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        Err(ProviderError::MaxRetriesExceeded {
            attempts: config.max_retries + 1,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    async fn do_request(&self, method: &str, params: &Value) -> Result<Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        let status = resp.status();

        if status.is_success() {
            let parsed = resp.json::<RpcResponse>().await.map_err(|e| {
                ProviderError::Malformed(format!("{} response: {}", method, e))
            })?;
            return parsed.into_result();
        }

        let status_code = status.as_u16();
        let body_text = resp.text().await.unwrap_or_default();

        match status_code {
            429 => Err(ProviderError::RateLimited),
            _ => Err(ProviderError::ServerError {
                status: status_code,
                body: body_text,
            }),
        }
    }
}

#[async_trait(?Send)]
impl RpcTransport for HttpTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let policy = self.policy_for(method);
        self.request_with_retry(method, &params, policy).await
    }
}

impl Clone for HttpTransport {
    fn clone(&self) -> Self {
        Self {
            url: self.url.clone(),
            client: self.client.clone(),
            next_id: self.next_id.clone(),
            retry_override: self.retry_override.clone(),
        }
    }
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    #[cfg(not(target_arch = "wasm32"))]
    let retryable = e.is_connect() || e.is_timeout() || e.is_request();
    #[cfg(target_arch = "wasm32")]
    let retryable = e.is_timeout() || e.is_request();
    ProviderError::Transport {
        message: e.to_string(),
        retryable,
    }
}

// ─── Wire envelope ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl RpcResponse {
    fn into_result(self) -> Result<Value, ProviderError> {
        match self.error {
            Some(err) => Err(ProviderError::Rpc {
                code: err.code,
                message: err.message,
                data: err.data,
            }),
            // A missing or null result is meaningful (e.g. a pending receipt).
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}
