//! Xendit REST client.

use std::time::Duration;

use gateway_types::{HttpMethod, PaymentProcessor, ProcessorError, ProcessorRequest};
use reqwest::{Client, Method};
use serde_json::Value;

/// Processor client authenticating with the secret API key over HTTP Basic.
pub struct XenditClient {
    base_url: String,
    api_key: String,
    timeout: Duration,
    http: Client,
}

impl XenditClient {
    /// Creates a new client; `timeout` bounds each request end to end.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProcessorError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProcessorError::Transport(Box::new(e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_send_error(&self, err: reqwest::Error) -> ProcessorError {
        if err.is_timeout() {
            ProcessorError::Timeout(self.timeout)
        } else {
            ProcessorError::Transport(Box::new(err))
        }
    }

    async fn handle_response(&self, resp: reqwest::Response) -> Result<Value, ProcessorError> {
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            return Err(ProcessorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| ProcessorError::InvalidBody(e.to_string()))
    }
}

#[async_trait::async_trait]
impl PaymentProcessor for XenditClient {
    #[tracing::instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn send(&self, request: ProcessorRequest) -> Result<Value, ProcessorError> {
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Patch => Method::PATCH,
        };

        let mut req = self
            .http
            .request(method, format!("{}{}", self.base_url, request.path))
            .basic_auth(&self.api_key, Some(""));

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(|e| self.map_send_error(e))?;
        let result = self.handle_response(resp).await;

        if let Err(e) = &result {
            tracing::warn!(error = %e, "Processor call failed");
        }
        result
    }
}
