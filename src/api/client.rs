//! Typed PolicyPilot client over the fallback resolver.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::api::operation::{Operation, DEFAULT_POLICY_LIMIT};
use crate::api::types::{
    ChatReply, ChatRequest, CompanyProfile, Policy, PolicyCount, PolicyList, PolicyMatchResult,
    RefreshReport, SimpleMatchResult,
};
use crate::config::{ClientConfig, TimeoutConfig};
use crate::fallback;
use crate::resolver::{BuildError, ExhaustedError, Preferred, Resolved, Resolver};

/// Errors surfaced by the typed client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Exhausted(#[from] ExhaustedError),

    #[error("failed to encode {operation} request: {source}")]
    Encode {
        operation: &'static str,
        source: serde_json::Error,
    },

    #[error("failed to decode {operation} response: {source}")]
    Decode {
        operation: &'static str,
        source: serde_json::Error,
    },
}

pub type ClientResult<T> = Result<Resolved<T>, ClientError>;

/// Where a chat answer came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerSource {
    Backend { base_url: String },
    Fallback,
}

/// A chat answer that is always available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatAnswer {
    pub text: String,
    pub tokens_used: Option<u64>,
    pub source: AnswerSource,
}

/// Where a policy listing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicySource {
    Matched,
    Enhanced,
    Basic,
    Catalogue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolicyListing {
    pub policies: Vec<Policy>,
    pub source: PolicySource,
}

/// High-level client: one method per backend operation.
#[derive(Debug, Clone)]
pub struct PolicyPilotClient {
    resolver: Resolver,
    timeouts: TimeoutConfig,
}

impl PolicyPilotClient {
    pub fn new(resolver: Resolver, timeouts: TimeoutConfig) -> Self {
        Self { resolver, timeouts }
    }

    /// Build from configuration, selecting candidates for `host`.
    pub fn from_config(config: &ClientConfig, host: &str) -> Result<Self, BuildError> {
        let resolver = Resolver::from_config(config, host)?;
        Ok(Self::new(resolver, config.timeouts.clone()))
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Send any operation and return the validated `data` payload.
    pub async fn send(
        &self,
        operation: &Operation,
        payload: Option<Value>,
        preferred: Option<&Preferred>,
    ) -> Result<Resolved<Value>, ExhaustedError> {
        let envelope = operation.envelope(payload, &self.timeouts);
        self.resolver.resolve_and_send_with(&envelope, preferred).await
    }

    async fn call<B, T>(&self, operation: Operation, body: Option<&B>) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let name = operation.name();
        let payload = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(|source| ClientError::Encode {
                operation: name,
                source,
            })?;

        let resolved = self.send(&operation, payload, None).await?;
        resolved.try_map(|value| {
            serde_json::from_value(value).map_err(|source| ClientError::Decode {
                operation: name,
                source,
            })
        })
    }

    /// `GET /health`. Any 2xx body counts as alive.
    pub async fn health(&self) -> ClientResult<Value> {
        self.call::<(), _>(Operation::Health, None).await
    }

    /// `POST /ai/chat`.
    pub async fn chat(&self, request: &ChatRequest) -> ClientResult<ChatReply> {
        self.call(Operation::Chat, Some(request)).await
    }

    /// `POST /policies/match`.
    pub async fn match_policies(&self, profile: &CompanyProfile) -> ClientResult<PolicyMatchResult> {
        self.call(Operation::PolicyMatch, Some(profile)).await
    }

    /// `GET /policies?limit=N`.
    pub async fn policies(&self, limit: u32) -> ClientResult<PolicyList> {
        self.call::<(), _>(Operation::Policies { limit }, None).await
    }

    /// `GET /policies/enhanced`.
    pub async fn enhanced_policies(&self) -> ClientResult<PolicyList> {
        self.call::<(), _>(Operation::PoliciesEnhanced, None).await
    }

    /// `GET /policies/count`.
    pub async fn policy_count(&self) -> ClientResult<PolicyCount> {
        self.call::<(), _>(Operation::PolicyCount, None).await
    }

    /// `GET /policies/{id}`.
    pub async fn policy(&self, id: &str) -> ClientResult<Policy> {
        self.call::<(), _>(Operation::PolicyDetail(id.to_string()), None)
            .await
    }

    /// `POST /match/simple`.
    pub async fn match_simple(&self, profile: &CompanyProfile) -> ClientResult<SimpleMatchResult> {
        self.call(Operation::MatchSimple, Some(profile)).await
    }

    /// `POST /crawler/refresh`.
    pub async fn refresh_crawler(&self) -> ClientResult<RefreshReport> {
        self.call::<(), _>(Operation::CrawlerRefresh, None).await
    }

    /// Ask the AI backend, answering from canned content if none responds.
    pub async fn chat_or_fallback(&self, request: &ChatRequest) -> ChatAnswer {
        match self.chat(request).await {
            Ok(resolved) => ChatAnswer {
                source: AnswerSource::Backend {
                    base_url: resolved.candidate.as_str().to_string(),
                },
                text: resolved.value.response,
                tokens_used: resolved.value.tokens_used,
            },
            Err(e) => {
                tracing::warn!(error = %e, "AI backends unavailable, using canned reply");
                ChatAnswer {
                    text: fallback::chat::reply(&request.message, request.policy_context.as_ref()),
                    tokens_used: None,
                    source: AnswerSource::Fallback,
                }
            }
        }
    }

    /// Load policies the way the dashboard does: matched when a profile is
    /// known, otherwise enhanced, then basic, then the built-in catalogue.
    pub async fn policies_or_fallback(&self, profile: Option<&CompanyProfile>) -> PolicyListing {
        if let Some(profile) = profile {
            match self.match_policies(profile).await {
                Ok(resolved) => {
                    return PolicyListing {
                        policies: resolved.value.matched_policies,
                        source: PolicySource::Matched,
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Policy matching unavailable, using catalogue");
                    return catalogue_listing();
                }
            }
        }

        match self.enhanced_policies().await {
            Ok(resolved) => {
                return PolicyListing {
                    policies: with_default_scores(resolved.value.policies),
                    source: PolicySource::Enhanced,
                }
            }
            Err(e) => tracing::warn!(error = %e, "Enhanced policy list unavailable"),
        }

        match self.policies(DEFAULT_POLICY_LIMIT).await {
            Ok(resolved) => PolicyListing {
                policies: resolved.value.policies,
                source: PolicySource::Basic,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Policy list unavailable, using catalogue");
                catalogue_listing()
            }
        }
    }
}

fn catalogue_listing() -> PolicyListing {
    PolicyListing {
        policies: fallback::catalogue::policies(),
        source: PolicySource::Catalogue,
    }
}

const DEFAULT_MATCH_SCORE: f64 = 0.6;
const DEFAULT_RECOMMENDATION: &str = "请完善企业信息以获得更精准的匹配度评估。";

/// Enhanced listings carry base scores only; fill in what the dashboard shows.
fn with_default_scores(policies: Vec<Policy>) -> Vec<Policy> {
    policies
        .into_iter()
        .map(|mut p| {
            if p.match_score.is_none() {
                p.match_score = Some(p.base_score.unwrap_or(DEFAULT_MATCH_SCORE));
            }
            if p.recommendation.is_none() {
                p.recommendation = Some(DEFAULT_RECOMMENDATION.to_string());
            }
            p
        })
        .collect()
}
