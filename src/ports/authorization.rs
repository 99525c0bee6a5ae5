use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::PaymentDetails;

/// Verdict returned by the authorization authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub approved: bool,
    #[serde(default)]
    pub reason_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl Decision {
    pub fn approved() -> Self {
        Self {
            approved: true,
            reason_code: None,
            message: None,
        }
    }

    pub fn declined(reason_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            approved: false,
            reason_code: Some(reason_code.into()),
            message: Some(message.into()),
        }
    }
}

/// Classified authorization failure. Callers branch on the variant, not the message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("authorization service unreachable: {0}")]
    Unreachable(String),
    #[error("payment denied: {message}")]
    Denied {
        reason_code: Option<String>,
        message: String,
    },
    #[error("credential rejected: {0}")]
    Unauthorized(String),
}

#[async_trait]
pub trait AuthorizationPort: Send + Sync {
    /// Asks the remote authority whether `details` may proceed for `credential`.
    /// Implementations must not touch local state.
    async fn authorize(
        &self,
        credential: &str,
        details: &PaymentDetails,
    ) -> Result<Decision, AuthFailure>;
}
