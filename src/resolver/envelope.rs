//! Logical request description, independent of any candidate.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde_json::Value;

use crate::resolver::validate::{Envelope, EnvelopeValidator};

/// Everything needed to issue one logical call against any candidate.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    /// Operation name for logs and metrics.
    pub operation: &'static str,
    pub method: Method,
    /// Path suffix appended to the candidate base URL, e.g. `/ai/chat`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Deadline for each individual attempt.
    pub timeout: Duration,
    pub validator: Arc<dyn EnvelopeValidator>,
}

impl RequestEnvelope {
    pub fn new(operation: &'static str, method: Method, path: impl Into<String>) -> Self {
        Self {
            operation,
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            timeout: Duration::from_secs(10),
            validator: Arc::new(Envelope::new()),
        }
    }

    pub fn get(operation: &'static str, path: impl Into<String>) -> Self {
        Self::new(operation, Method::GET, path)
    }

    pub fn post(operation: &'static str, path: impl Into<String>) -> Self {
        Self::new(operation, Method::POST, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validator(mut self, validator: impl EnvelopeValidator + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::validate::{Liveness, Validation};
    use serde_json::json;

    #[test]
    fn test_builder() {
        let envelope = RequestEnvelope::get("policies", "/policies")
            .query("limit", 10)
            .timeout(Duration::from_secs(3));
        assert_eq!(envelope.method, Method::GET);
        assert_eq!(envelope.query, vec![("limit".to_string(), "10".to_string())]);
        assert_eq!(envelope.timeout, Duration::from_secs(3));
        assert!(envelope.body.is_none());
    }

    #[test]
    fn test_default_validator_is_envelope() {
        let envelope = RequestEnvelope::post("chat", "/ai/chat").json(json!({"message": "hi"}));
        assert!(matches!(
            envelope.validator.validate(json!({"ok": true})),
            Validation::Invalid(_)
        ));

        let envelope = envelope.validator(Liveness);
        assert!(matches!(
            envelope.validator.validate(json!({"ok": true})),
            Validation::Valid(_)
        ));
    }
}
