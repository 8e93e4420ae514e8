use std::sync::Arc;
use std::time::Duration;

use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::error::{message_from_payload, ApiError};
use crate::auth::store::{CredentialStore, TOKEN_KEY};
use crate::utils::sanitize::sanitize_json;

type Breaker = StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>;

/// HTTP client for the CRM backend.
///
/// Every request carries the stored bearer credential, if there is one.
#[derive(Clone)]
pub struct CrmClient {
    client: Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
    circuit_breaker: Breaker,
}

impl CrmClient {
    /// Creates a client with a 30s timeout and a 3-failure circuit breaker.
    pub fn new(base_url: &str, store: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        Self::with_settings(base_url, store, Duration::from_secs(30), 3, 60)
    }

    pub fn with_settings(
        base_url: &str,
        store: Arc<dyn CredentialStore>,
        timeout: Duration,
        failure_threshold: u32,
        reset_timeout_secs: u64,
    ) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url)?;
        if parsed.cannot_be_a_base() {
            return Err(ApiError::InvalidResponse(format!(
                "'{}' cannot be used as a base URL",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        let backoff = backoff::equal_jittered(
            Duration::from_secs(reset_timeout_secs),
            Duration::from_secs(reset_timeout_secs * 2),
        );
        let policy = failure_policy::consecutive_failures(failure_threshold, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        Ok(CrmClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
            circuit_breaker,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the current state of the circuit breaker
    pub fn circuit_state(&self) -> String {
        if self.circuit_breaker.is_call_permitted() {
            "closed".to_string()
        } else {
            "open".to_string()
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(Method::POST, path, Some(to_body(body)?)).await
    }

    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(Method::PATCH, path, Some(to_body(body)?)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(Method::DELETE, path, None).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path);
        let token = match self.store.get(TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Sending {} {} without credential: {}", method, url, e);
                None
            }
        };

        match &body {
            Some(body) => tracing::debug!("{} {} body={}", method, url, sanitize_json(body)),
            None => tracing::debug!("{} {}", method, url),
        }

        let mut request = self.client.request(method, &url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let result = self
            .circuit_breaker
            .call_with(ApiError::trips_circuit, async move {
                let response = request.send().await?;
                let status = response.status();
                let text = response.text().await?;
                let payload: Value = if text.trim().is_empty() {
                    Value::Null
                } else {
                    serde_json::from_str(&text).unwrap_or(Value::String(text))
                };

                if !status.is_success() {
                    return Err(ApiError::Backend {
                        status: status.as_u16(),
                        message: message_from_payload(&payload),
                    });
                }

                Ok::<Value, ApiError>(payload)
            })
            .await;

        let payload = match result {
            Ok(payload) => payload,
            Err(FailsafeError::Rejected) => {
                return Err(ApiError::CircuitOpen(
                    "CRM backend circuit breaker is open".to_string(),
                ))
            }
            Err(FailsafeError::Inner(e)) => return Err(e),
        };

        serde_json::from_value(payload).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

fn to_body<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

/// Pull `key` out of a response envelope such as `{"property": {...}}`.
pub fn take_field<T: DeserializeOwned>(mut envelope: Value, key: &str) -> Result<T, ApiError> {
    let value = envelope
        .get_mut(key)
        .map(Value::take)
        .ok_or_else(|| ApiError::InvalidResponse(format!("missing '{}' in response", key)))?;
    serde_json::from_value(value).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}
