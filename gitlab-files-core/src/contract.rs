#![allow(unused)]

//! # contract: seam between the core and the outside world
//!
//! The core never performs network I/O. It hands a [`RequestDescriptor`] to a [`Transport`]
//! and reads back the decoded response body.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`, so tests drive the upload/remove flows against a
//!   `MockTransport` with canned responses and assert on the exact requests issued.
//!
//! ## Implementing a Transport
//! - Non-2xx responses must be returned as errors.
//! - JSON bodies are returned decoded; other text bodies as `Value::String`; empty bodies as
//!   `Value::Null`.
//! - Timeouts are the transport's responsibility.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use mockall::{automock, predicate::*};

use crate::request::RequestDescriptor;

/// Error type for Transport (boxed, as the core only logs and reports it)
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Executes request descriptors built by [`crate::request`].
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the request and return the decoded response body.
    async fn execute(&self, request: RequestDescriptor) -> Result<Value, TransportError>;
}

/// A user-facing message produced by an operation, for the host to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}
