//! Logical backend operations and how each maps onto HTTP.

use std::time::Duration;

use serde_json::Value;

use crate::api::types::{
    ChatReply, Policy, PolicyCount, PolicyList, PolicyMatchResult, RefreshReport,
    SimpleMatchResult,
};
use crate::config::TimeoutConfig;
use crate::resolver::{Envelope, Liveness, RequestEnvelope};

/// Default page size for the basic policy list.
pub const DEFAULT_POLICY_LIMIT: u32 = 10;

/// Every call the front end makes against the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Health,
    Chat,
    PolicyMatch,
    Policies { limit: u32 },
    PoliciesEnhanced,
    PolicyCount,
    PolicyDetail(String),
    MatchSimple,
    CrawlerRefresh,
}

impl Operation {
    /// Stable name used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Health => "health",
            Operation::Chat => "chat",
            Operation::PolicyMatch => "policy_match",
            Operation::Policies { .. } => "policies",
            Operation::PoliciesEnhanced => "policies_enhanced",
            Operation::PolicyCount => "policy_count",
            Operation::PolicyDetail(_) => "policy_detail",
            Operation::MatchSimple => "match_simple",
            Operation::CrawlerRefresh => "crawler_refresh",
        }
    }

    pub fn path(&self) -> String {
        match self {
            Operation::Health => "/health".to_string(),
            Operation::Chat => "/ai/chat".to_string(),
            Operation::PolicyMatch => "/policies/match".to_string(),
            Operation::Policies { .. } => "/policies".to_string(),
            Operation::PoliciesEnhanced => "/policies/enhanced".to_string(),
            Operation::PolicyCount => "/policies/count".to_string(),
            Operation::PolicyDetail(id) => format!("/policies/{}", encode_segment(id)),
            Operation::MatchSimple => "/match/simple".to_string(),
            Operation::CrawlerRefresh => "/crawler/refresh".to_string(),
        }
    }

    pub fn is_post(&self) -> bool {
        matches!(
            self,
            Operation::Chat
                | Operation::PolicyMatch
                | Operation::MatchSimple
                | Operation::CrawlerRefresh
        )
    }

    /// Per-attempt timeout, by operation criticality.
    pub fn timeout(&self, timeouts: &TimeoutConfig) -> Duration {
        let secs = match self {
            Operation::Health | Operation::PolicyCount => timeouts.health_secs,
            Operation::Chat => timeouts.chat_secs,
            Operation::Policies { .. }
            | Operation::PoliciesEnhanced
            | Operation::PolicyDetail(_) => timeouts.query_secs,
            Operation::PolicyMatch | Operation::MatchSimple => timeouts.match_secs,
            Operation::CrawlerRefresh => timeouts.refresh_secs,
        };
        Duration::from_secs(secs)
    }

    /// Build the request envelope for this operation.
    pub fn envelope(&self, payload: Option<Value>, timeouts: &TimeoutConfig) -> RequestEnvelope {
        let name = self.name();
        let mut envelope = if self.is_post() {
            RequestEnvelope::post(name, self.path())
        } else {
            RequestEnvelope::get(name, self.path())
        }
        .timeout(self.timeout(timeouts));

        if let Operation::Policies { limit } = self {
            envelope = envelope.query("limit", limit);
        }
        if let Some(body) = payload {
            envelope = envelope.json(body);
        }

        match self {
            Operation::Health => envelope.validator(Liveness),
            Operation::Chat => envelope.validator(
                Envelope::new()
                    .require(&["response"])
                    .decodes_as::<ChatReply>(),
            ),
            Operation::PolicyMatch => envelope.validator(
                Envelope::new()
                    .require(&["matched_policies"])
                    .decodes_as::<PolicyMatchResult>(),
            ),
            Operation::Policies { .. } | Operation::PoliciesEnhanced => envelope.validator(
                Envelope::new()
                    .require(&["policies"])
                    .decodes_as::<PolicyList>(),
            ),
            Operation::PolicyCount => envelope.validator(Envelope::new().decodes_as::<PolicyCount>()),
            Operation::PolicyDetail(_) => envelope.validator(Envelope::new().decodes_as::<Policy>()),
            Operation::MatchSimple => envelope.validator(
                Envelope::new()
                    .require(&["matches"])
                    .decodes_as::<SimpleMatchResult>(),
            ),
            Operation::CrawlerRefresh => {
                envelope.validator(Envelope::new().decodes_as::<RefreshReport>())
            }
        }
    }
}

/// Percent-encode a single path segment.
fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use serde_json::json;

    use crate::resolver::Validation;

    #[test]
    fn test_paths_and_methods() {
        let timeouts = TimeoutConfig::default();

        let chat = Operation::Chat.envelope(Some(json!({"message": "hi"})), &timeouts);
        assert_eq!(chat.method, Method::POST);
        assert_eq!(chat.path, "/ai/chat");
        assert_eq!(chat.timeout, Duration::from_secs(25));
        assert!(chat.body.is_some());

        let list = Operation::Policies { limit: 10 }.envelope(None, &timeouts);
        assert_eq!(list.method, Method::GET);
        assert_eq!(list.query, vec![("limit".to_string(), "10".to_string())]);

        let health = Operation::Health.envelope(None, &timeouts);
        assert_eq!(health.timeout, Duration::from_secs(8));
    }

    #[test]
    fn test_detail_path_is_encoded() {
        assert_eq!(
            Operation::PolicyDetail("XH 2024/001".into()).path(),
            "/policies/XH%202024%2F001"
        );
    }

    #[test]
    fn test_chat_validator_requires_response() {
        let envelope = Operation::Chat.envelope(None, &TimeoutConfig::default());
        assert!(matches!(
            envelope
                .validator
                .validate(json!({"success": true, "data": {"tokens_used": 1}})),
            Validation::Invalid(_)
        ));
        assert!(matches!(
            envelope
                .validator
                .validate(json!({"success": true, "data": {"response": "hello"}})),
            Validation::Valid(_)
        ));
    }

    #[test]
    fn test_health_accepts_bare_body() {
        let envelope = Operation::Health.envelope(None, &TimeoutConfig::default());
        assert!(matches!(
            envelope.validator.validate(json!({"status": "healthy"})),
            Validation::Valid(_)
        ));
    }
}
