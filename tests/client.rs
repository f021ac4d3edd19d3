//! Typed client operations and their local fallbacks.

use std::time::Duration;

use serde_json::{json, Value};

use policy_pilot_client::api::types::{ChatMessage, ChatRequest, CompanyProfile, PolicyContext, Role};
use policy_pilot_client::api::{AnswerSource, ClientError, PolicySource};
use policy_pilot_client::config::TimeoutConfig;
use policy_pilot_client::fallback;
use policy_pilot_client::resolver::Strategy;

mod common;
use common::{client, client_with, dead_url, policy_json, start_backend, start_fixed_backend, Reply};

fn profile() -> CompanyProfile {
    serde_json::from_value(json!({
        "company_name": "示例科技有限公司",
        "industry_match": "人工智能",
        "company_scale": "中型企业",
        "rd_investment": "5%-10%",
        "patents": 3
    }))
    .unwrap()
}

#[tokio::test]
async fn test_chat_uses_first_answering_backend() {
    let dead = dead_url().await;
    let ai = start_backend(|seen| {
        assert_eq!(seen.method, "POST");
        assert_eq!(seen.target, "/api/v1/ai/chat");
        Reply::ok(json!({ "response": "您好，这是AI回复", "tokens_used": 12 }))
    })
    .await;

    let client = client(&[dead, ai.base_url()]);
    let answer = client.chat_or_fallback(&ChatRequest::new("你好")).await;

    assert_eq!(answer.text, "您好，这是AI回复");
    assert_eq!(answer.tokens_used, Some(12));
    assert_eq!(
        answer.source,
        AnswerSource::Backend {
            base_url: ai.base_url()
        }
    );
}

#[tokio::test]
async fn test_chat_request_body_shape() {
    let ai = start_fixed_backend(Reply::ok(json!({ "response": "ok" }))).await;
    let client = client(&[ai.base_url()]);

    let history: Vec<ChatMessage> = (0..15)
        .map(|i| ChatMessage::new(Role::User, format!("m{}", i)))
        .collect();
    let request = ChatRequest::new("最新问题").with_history(&history);
    client.chat(&request).await.unwrap();

    let body: Value = serde_json::from_str(&ai.seen()[0].body).unwrap();
    assert_eq!(body["message"], "最新问题");
    assert_eq!(body["stream"], false);
    assert!(body["policy_context"].is_null());
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 10);
    assert_eq!(messages[0]["content"], "m5");
    assert_eq!(messages[0]["role"], "user");
}

#[tokio::test]
async fn test_chat_with_empty_response_falls_through() {
    let empty = start_fixed_backend(Reply::ok(json!({ "response": "" }))).await;
    let good = start_fixed_backend(Reply::ok(json!({ "response": "第二个后端" }))).await;

    let resolved = client(&[empty.base_url(), good.base_url()])
        .chat(&ChatRequest::new("hi"))
        .await
        .unwrap();

    assert_eq!(resolved.value.response, "第二个后端");
    assert_eq!(resolved.index, 1);
}

#[tokio::test]
async fn test_chat_falls_back_to_canned_reply() {
    let a = start_fixed_backend(Reply::raw(503, "down")).await;
    let dead = dead_url().await;

    let client = client(&[a.base_url(), dead]);
    let policy = PolicyContext {
        policy_name: "徐汇区人工智能产业扶持".to_string(),
        region: "徐汇区".to_string(),
        support_type: "资金补贴".to_string(),
        max_amount: Some(5_000_000.0),
        ..PolicyContext::default()
    };
    let request = ChatRequest::new("这个政策的申请条件是什么？").with_policy(policy.clone());
    let answer = client.chat_or_fallback(&request).await;

    assert_eq!(answer.source, AnswerSource::Fallback);
    assert_eq!(answer.tokens_used, None);
    assert_eq!(answer.text, fallback::chat::reply(&request.message, Some(&policy)));
    assert!(answer.text.contains("徐汇区人工智能产业扶持"));
}

#[tokio::test]
async fn test_chat_with_no_candidates_answers_locally() {
    let answer = client(&[]).chat_or_fallback(&ChatRequest::new("高新技术企业认定")).await;
    assert_eq!(answer.source, AnswerSource::Fallback);
    assert!(!answer.text.is_empty());
}

#[tokio::test]
async fn test_policies_query_and_decode() {
    let backend = start_backend(|seen| {
        assert_eq!(seen.target, "/api/v1/policies?limit=3");
        Reply::ok(json!({
            "policies": [policy_json("A1", "政策一"), policy_json("A2", "政策二")],
            "total": 2
        }))
    })
    .await;

    let resolved = client(&[backend.base_url()]).policies(3).await.unwrap();
    assert_eq!(resolved.value.policies.len(), 2);
    assert_eq!(resolved.value.policies[0].policy_id.as_deref(), Some("A1"));
    assert_eq!(resolved.value.total, Some(2));
}

#[tokio::test]
async fn test_schema_mismatch_falls_through() {
    // `policies` present but not a list of policies.
    let wrong = start_fixed_backend(Reply::ok(json!({ "policies": "not a list" }))).await;
    let right = start_fixed_backend(Reply::ok(json!({ "policies": [policy_json("B1", "政策")] }))).await;

    let resolved = client(&[wrong.base_url(), right.base_url()])
        .enhanced_policies()
        .await
        .unwrap();
    assert_eq!(resolved.index, 1);
    assert_eq!(resolved.value.policies[0].policy_name, "政策");
}

#[tokio::test]
async fn test_policy_detail_escapes_id() {
    let backend = start_backend(|seen| {
        assert_eq!(seen.target, "/api/v1/policies/XH%202024%2F01");
        Reply::ok(policy_json("XH 2024/01", "带空格的政策"))
    })
    .await;

    let resolved = client(&[backend.base_url()]).policy("XH 2024/01").await.unwrap();
    assert_eq!(resolved.value.policy_name, "带空格的政策");
}

#[tokio::test]
async fn test_match_and_simple_match() {
    let backend = start_backend(|seen| {
        let body: Value = serde_json::from_str(&seen.body).unwrap();
        assert_eq!(body["company_name"], "示例科技有限公司");
        assert_eq!(body["registration_location"], "徐汇区");
        match seen.target.as_str() {
            "/api/v1/policies/match" => Reply::ok(json!({
                "matched_policies": [policy_json("M1", "匹配政策")],
                "total_policies": 1
            })),
            "/api/v1/match/simple" => Reply::ok(json!({
                "matches": [policy_json("S1", "简单匹配")],
                "count": 1,
                "avg_match_score": 0.72
            })),
            _ => Reply::raw(404, "not found"),
        }
    })
    .await;
    let client = client(&[backend.base_url()]);

    let matched = client.match_policies(&profile()).await.unwrap();
    assert_eq!(matched.value.matched_policies[0].policy_id.as_deref(), Some("M1"));

    let simple = client.match_simple(&profile()).await.unwrap();
    assert_eq!(simple.value.count, 1);
    assert_eq!(simple.value.avg_match_score, Some(0.72));
}

#[tokio::test]
async fn test_count_and_refresh() {
    let backend = start_backend(|seen| match seen.target.as_str() {
        "/api/v1/policies/count" => Reply::ok(json!({
            "total_policies": 12,
            "active_policies": 10,
            "by_region": { "xuhui": 8 },
            "by_type": { "grant": 4 }
        })),
        "/api/v1/crawler/refresh" => Reply::ok(json!({
            "total_policies": 12,
            "refresh_time": "2024-01-01T00:00:00"
        })),
        _ => Reply::raw(404, "not found"),
    })
    .await;
    let client = client(&[backend.base_url()]);

    let count = client.policy_count().await.unwrap();
    assert_eq!(count.value.total_policies, 12);
    assert_eq!(count.value.by_region.get("xuhui"), Some(&8));

    let refresh = client.refresh_crawler().await.unwrap();
    assert_eq!(refresh.value.total_policies, Some(12));
    assert_eq!(refresh.value.refresh_time.as_deref(), Some("2024-01-01T00:00:00"));
}

#[tokio::test]
async fn test_health_accepts_any_body() {
    let backend = start_fixed_backend(Reply::json(200, json!({ "status": "healthy" }))).await;
    let resolved = client(&[backend.base_url()]).health().await.unwrap();
    assert_eq!(resolved.value["status"], "healthy");
}

#[tokio::test]
async fn test_exhaustion_surfaces_as_client_error() {
    let dead = dead_url().await;
    let err = client(&[dead]).policy_count().await.unwrap_err();
    match err {
        ClientError::Exhausted(e) => {
            assert_eq!(e.operation, "policy_count");
            assert_eq!(e.failures.len(), 1);
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
}

#[tokio::test]
async fn test_listing_prefers_matched_policies() {
    let backend = start_fixed_backend(Reply::ok(json!({
        "matched_policies": [policy_json("M1", "匹配政策")]
    })))
    .await;

    let listing = client(&[backend.base_url()])
        .policies_or_fallback(Some(&profile()))
        .await;
    assert_eq!(listing.source, PolicySource::Matched);
    assert_eq!(listing.policies.len(), 1);
}

#[tokio::test]
async fn test_listing_match_failure_uses_catalogue() {
    let a = start_fixed_backend(Reply::raw(500, "boom")).await;
    let listing = client(&[a.base_url()]).policies_or_fallback(Some(&profile())).await;

    assert_eq!(listing.source, PolicySource::Catalogue);
    assert_eq!(listing.policies, fallback::catalogue::policies());
}

#[tokio::test]
async fn test_listing_enhanced_gets_default_scores() {
    let backend = start_backend(|seen| match seen.target.as_str() {
        "/api/v1/policies/enhanced" => Reply::ok(json!({
            "policies": [policy_json("E1", "增强政策")]
        })),
        _ => Reply::raw(404, "not found"),
    })
    .await;

    let listing = client(&[backend.base_url()]).policies_or_fallback(None).await;
    assert_eq!(listing.source, PolicySource::Enhanced);
    assert!(listing.policies[0].match_score.is_some());
    assert!(listing.policies[0].recommendation.is_some());
}

#[tokio::test]
async fn test_listing_falls_back_to_basic_list() {
    let backend = start_backend(|seen| {
        if seen.target.starts_with("/api/v1/policies?limit=") {
            Reply::ok(json!({ "policies": [policy_json("P1", "基础政策")] }))
        } else {
            Reply::raw(500, "enhanced offline")
        }
    })
    .await;

    let listing = client(&[backend.base_url()]).policies_or_fallback(None).await;
    assert_eq!(listing.source, PolicySource::Basic);
    assert_eq!(listing.policies[0].policy_id.as_deref(), Some("P1"));
    assert_eq!(backend.hits(), 2);
}

#[tokio::test]
async fn test_listing_with_nothing_reachable_uses_catalogue() {
    let dead = dead_url().await;
    let listing = client(&[dead]).policies_or_fallback(None).await;
    assert_eq!(listing.source, PolicySource::Catalogue);
    assert!(!listing.policies.is_empty());
}

#[tokio::test]
async fn test_race_client_matches_sequential_answer() {
    let slow = start_fixed_backend(
        Reply::ok(json!({ "response": "主后端" })).after(Duration::from_millis(200)),
    )
    .await;
    let fast = start_fixed_backend(Reply::ok(json!({ "response": "备用后端" }))).await;
    let urls = [slow.base_url(), fast.base_url()];

    let raced = client_with(&urls, Strategy::Race, TimeoutConfig::default())
        .chat(&ChatRequest::new("hi"))
        .await
        .unwrap();
    assert_eq!(raced.value.response, "主后端");
    assert_eq!(raced.index, 0);
}

#[tokio::test]
async fn test_timed_out_chat_answered_by_next_backend() {
    let slow = start_fixed_backend(
        Reply::ok(json!({ "response": "too late" })).after(Duration::from_secs(4)),
    )
    .await;
    let fast = start_fixed_backend(Reply::ok(json!({ "response": "hello" }))).await;

    let timeouts = TimeoutConfig {
        chat_secs: 1,
        ..TimeoutConfig::default()
    };
    let resolved = client_with(&[slow.base_url(), fast.base_url()], Strategy::Sequential, timeouts)
        .chat(&ChatRequest::new("hi"))
        .await
        .unwrap();

    assert_eq!(resolved.value.response, "hello");
    assert!(resolved.elapsed >= Duration::from_secs(1));
    assert!(resolved.elapsed < Duration::from_secs(4));
}
