#![doc = "HTTP transport: executes core request descriptors against a GitLab server with reqwest."]
//
//! # Transport Integration (CLI <-> Core)
//!
//! This module wires the [`Transport`] trait from `gitlab-files-core` to a real HTTP client.
//! The core decides method, URL, headers and body; this module only sends them and decodes
//! the answer.
//!
//! - Non-2xx responses become errors carrying status and response text.
//! - JSON bodies are decoded, other text is returned as a JSON string, empty bodies as null.
//! - The request timeout is set once on the client.

use std::time::Duration;

use async_trait::async_trait;
use gitlab_files_core::contract::{Transport, TransportError};
use gitlab_files_core::request::{Method, RequestDescriptor};
use serde_json::Value;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        tracing::info!(timeout_secs = timeout.as_secs(), "Initialized HTTP transport");
        Ok(Self { client })
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn decode_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: RequestDescriptor) -> Result<Value, TransportError> {
        let method = request.method.as_str();
        tracing::info!(method, url = %request.url, "Sending request");

        let mut builder = self.client.request(to_reqwest(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(error = ?e, method, url = %request.url, "Request could not be sent");
            e
        })?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                method,
                url = %request.url,
                status = status.as_u16(),
                body = %text,
                "Server rejected request"
            );
            return Err(format!("{method} {} returned {status}: {text}", request.url).into());
        }

        tracing::debug!(status = status.as_u16(), "Request succeeded");
        Ok(decode_body(text))
    }
}
