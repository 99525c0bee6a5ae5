use async_trait::async_trait;
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::domain::PaymentDetails;
use crate::ports::{AuthFailure, AuthorizationPort, Decision};

const AUTHORIZE_PATH: &str = "/v1/authorize";

type AuthCircuitBreaker =
    StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>;

/// Error body returned by the authorization service on non-2xx responses.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    message: Option<String>,
    reason_code: Option<String>,
}

/// HTTP client for the remote authorization service.
///
/// Only `Unreachable` outcomes count towards the circuit breaker; a denial is a
/// healthy answer from a healthy service.
#[derive(Clone)]
pub struct HttpAuthorizationClient {
    client: Client,
    base_url: String,
    circuit_breaker: AuthCircuitBreaker,
}

impl HttpAuthorizationClient {
    /// Creates a client with a 10s request timeout and a 3-failure circuit breaker.
    pub fn new(base_url: String) -> Self {
        Self::with_settings(base_url, Duration::from_secs(10), 3, 60)
    }

    /// `reset_timeout_secs` is clamped to at least one second.
    pub fn with_settings(
        base_url: String,
        timeout: Duration,
        failure_threshold: u32,
        reset_timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        let reset_timeout_secs = reset_timeout_secs.max(1);
        let backoff = backoff::equal_jittered(
            Duration::from_secs(reset_timeout_secs),
            Duration::from_secs(reset_timeout_secs.saturating_mul(2)),
        );
        let policy = failure_policy::consecutive_failures(failure_threshold, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        HttpAuthorizationClient {
            client,
            base_url,
            circuit_breaker,
        }
    }

    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::with_settings(
            config.auth_service_url.clone(),
            config.auth_timeout(),
            config.auth_circuit_failure_threshold,
            config.auth_circuit_reset_secs,
        )
    }

    /// Returns the current state of the circuit breaker
    pub fn circuit_state(&self) -> &'static str {
        if self.circuit_breaker.is_call_permitted() {
            "closed"
        } else {
            "open"
        }
    }

    fn authorize_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), AUTHORIZE_PATH)
    }
}

#[async_trait]
impl AuthorizationPort for HttpAuthorizationClient {
    async fn authorize(
        &self,
        credential: &str,
        details: &PaymentDetails,
    ) -> Result<Decision, AuthFailure> {
        if credential.trim().is_empty() {
            return Err(AuthFailure::Unauthorized("missing credential".to_string()));
        }

        let request = self
            .client
            .post(self.authorize_url())
            .bearer_auth(credential)
            .json(details);

        let result = self
            .circuit_breaker
            .call_with(is_unreachable, async move {
                let response = request.send().await.map_err(|e| {
                    tracing::warn!(error = %e, "authorization service request failed");
                    AuthFailure::Unreachable(e.to_string())
                })?;
                decision_from_response(response).await
            })
            .await;

        match result {
            Ok(decision) => Ok(decision),
            Err(FailsafeError::Rejected) => Err(AuthFailure::Unreachable(
                "authorization circuit breaker is open".to_string(),
            )),
            Err(FailsafeError::Inner(failure)) => Err(failure),
        }
    }
}

fn is_unreachable(failure: &AuthFailure) -> bool {
    matches!(failure, AuthFailure::Unreachable(_))
}

async fn decision_from_response(response: Response) -> Result<Decision, AuthFailure> {
    let status = response.status();

    if status.is_success() {
        return response.json::<Decision>().await.map_err(|e| {
            AuthFailure::Unreachable(format!("invalid authorization response: {}", e))
        });
    }

    let body = response.json::<ErrorBody>().await.unwrap_or_default();
    let message = body
        .message
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| format!("status {}", status.as_u16()));

    tracing::debug!(status = status.as_u16(), %message, "authorization service refused payment");

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthFailure::Unauthorized(message)),
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            Err(AuthFailure::Unreachable(message))
        }
        _ => Err(AuthFailure::Denied {
            reason_code: body.reason_code,
            message,
        }),
    }
}
