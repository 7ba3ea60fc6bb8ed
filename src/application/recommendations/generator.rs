//! Port to the external text-generation service.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::prompt::Prompt;
use crate::domain::DomainError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServiceUnavailable {
    #[error("text generation is not configured (no API key)")]
    NotConfigured,

    #[error("network error: {0}")]
    Network(String),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ServiceUnavailable {
    /// Network blips, timeouts, throttling and server errors may clear up
    /// on a second attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            ServiceUnavailable::Network(_) | ServiceUnavailable::Timeout(_) => true,
            ServiceUnavailable::Status { status, .. } => *status == 429 || *status >= 500,
            ServiceUnavailable::NotConfigured | ServiceUnavailable::Malformed(_) => false,
        }
    }
}

impl From<ServiceUnavailable> for DomainError {
    fn from(e: ServiceUnavailable) -> Self {
        DomainError::ExternalServiceUnavailable(e.to_string())
    }
}

/// Generates free-form text for a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Whether a credential is present; unconfigured generators are never called.
    fn is_configured(&self) -> bool;

    async fn generate(&self, prompt: &Prompt, model: &str) -> Result<String, ServiceUnavailable>;
}
