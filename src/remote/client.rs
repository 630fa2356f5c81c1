use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::config::normalize_endpoint;
use crate::error::Result;
use crate::remote::{AdminApi, ApiResponse};

/// Admin API client over `reqwest`.
#[derive(Clone, Debug)]
pub struct AdminClient {
    pub(crate) client: reqwest::Client,
    endpoint: String,
}

impl AdminClient {
    /// `endpoint` may omit the scheme; `http://` is assumed.
    pub fn new(endpoint: &str) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(client: reqwest::Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: normalize_endpoint(endpoint),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    async fn decode(response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        Ok(ApiResponse::new(status, body))
    }
}

#[async_trait]
impl AdminApi for AdminClient {
    async fn fetch(&self, path: &str) -> Result<ApiResponse> {
        let url = self.url(path);
        log::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        Self::decode(response).await
    }

    async fn submit(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        let url = self.url(path);
        log::debug!("POST {}", url);
        let response = self.client.post(url).json(body).send().await?;
        Self::decode(response).await
    }
}
