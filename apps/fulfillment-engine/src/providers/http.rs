//! Thin HTTP client shared by the external carrier adapters.
//!
//! Maps transport and status failures onto [`ProviderError`]; retries are
//! the retry driver's job, not this client's.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::ProviderError;

/// Default per-request timeout. The fee aggregator budgets 6 s for three
/// attempts, so a single request must stay under 2 s.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// JSON-over-HTTP client for one carrier.
#[derive(Debug, Clone)]
pub struct CarrierHttpClient {
    client: Client,
    base_url: String,
}

impl CarrierHttpClient {
    /// Build a client for a carrier base URL.
    ///
    /// # Errors
    ///
    /// Returns `Network` when the underlying client cannot be constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// GET a path, with optional header pairs.
    pub async fn get(
        &self,
        path: &str,
        headers: &[(&str, &str)],
    ) -> Result<Value, ProviderError> {
        let mut request = self.client.get(format!("{}{}", self.base_url, path));
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        Self::handle(request.send().await).await
    }

    /// POST a JSON body to a path, with optional header pairs.
    pub async fn post<B: Serialize + Sync>(
        &self,
        path: &str,
        headers: &[(&str, &str)],
        body: &B,
    ) -> Result<Value, ProviderError> {
        let mut request = self.client.post(format!("{}{}", self.base_url, path));
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        Self::handle(request.json(body).send().await).await
    }

    async fn handle(
        result: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<Value, ProviderError> {
        let response = result.map_err(|e| ProviderError::Network(e.to_string()))?;
        let status = response.status();

        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }
}
