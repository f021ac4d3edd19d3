//! Request and response payloads for the PolicyPilot backend.
//!
//! Response types are lenient: backends in different deployments return
//! slightly different field sets, so unknown fields are kept in `extra`
//! where callers may want them.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Number of history messages forwarded with a chat request.
pub const CHAT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: None,
        }
    }
}

/// Policy being discussed in a consultation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyContext {
    pub policy_name: String,
    pub region: String,
    pub support_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    pub industry_tags: Vec<String>,
    pub requirements: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<String>,
}

impl From<&Policy> for PolicyContext {
    fn from(policy: &Policy) -> Self {
        Self {
            policy_name: policy.policy_name.clone(),
            region: policy.region.clone(),
            support_type: policy.support_type.clone(),
            max_amount: policy.max_amount,
            deadline: policy.deadline.clone(),
            industry_tags: policy.industry_tags.clone(),
            requirements: policy.requirements.clone(),
            application_period: policy.application_period.clone(),
            publish_date: policy.publish_date.clone(),
        }
    }
}

/// Body of `POST /ai/chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub messages: Vec<ChatMessage>,
    pub policy_context: Option<PolicyContext>,
    pub stream: bool,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            messages: Vec::new(),
            policy_context: None,
            stream: false,
        }
    }

    /// Attach conversation history, keeping only the most recent messages.
    pub fn with_history(mut self, history: &[ChatMessage]) -> Self {
        let start = history.len().saturating_sub(CHAT_HISTORY_LIMIT);
        self.messages = history[start..].to_vec();
        self
    }

    pub fn with_policy(mut self, policy: PolicyContext) -> Self {
        self.policy_context = Some(policy);
        self
    }
}

/// `data` of a chat response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub tokens_used: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// A policy as listed or matched by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "string_or_number"
    )]
    pub policy_id: Option<String>,
    pub policy_name: String,
    pub region: String,
    pub support_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    pub industry_tags: Vec<String>,
    pub requirements: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Accept ids that some deployments send as integers.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// `data` of `GET /policies` and `GET /policies/enhanced`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyList {
    pub policies: Vec<Policy>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// `data` of `GET /policies/count`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyCount {
    pub total_policies: u64,
    pub active_policies: u64,
    pub by_region: BTreeMap<String, u64>,
    pub by_type: BTreeMap<String, u64>,
}

/// Company profile submitted for matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub company_name: String,
    #[serde(default = "default_location")]
    pub registration_location: String,
    pub industry_match: String,
    #[serde(default = "default_operating_status")]
    pub operating_status: String,
    #[serde(default = "default_credit_status")]
    pub credit_status: String,
    #[serde(default)]
    pub patents: u32,
    pub company_scale: String,
    pub rd_investment: String,
    #[serde(default)]
    pub enterprise_certification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
}

fn default_location() -> String {
    "徐汇区".to_string()
}

fn default_operating_status() -> String {
    "正常经营".to_string()
}

fn default_credit_status() -> String {
    "信用良好".to_string()
}

/// `data` of `POST /policies/match`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyMatchResult {
    pub matched_policies: Vec<Policy>,
    #[serde(default)]
    pub total_policies: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `data` of `POST /match/simple`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleMatchResult {
    pub matches: Vec<Policy>,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub total_checked: Option<u64>,
    #[serde(default)]
    pub avg_match_score: Option<f64>,
}

/// `data` of `POST /crawler/refresh`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefreshReport {
    #[serde(default)]
    pub total_policies: Option<u64>,
    #[serde(default)]
    pub refresh_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
