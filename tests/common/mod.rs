//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::{json, Value};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use policy_pilot_client::config::TimeoutConfig;
use policy_pilot_client::resolver::{CandidateList, Resolver, Strategy};
use policy_pilot_client::PolicyPilotClient;

/// What a mock backend sends back.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl Reply {
    /// `200` with a `{success: true, data}` envelope.
    pub fn ok(data: Value) -> Self {
        Self::json(200, json!({ "success": true, "data": data }))
    }

    pub fn json(status: u16, body: Value) -> Self {
        Self::raw(status, body.to_string())
    }

    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// One request as the mock backend saw it.
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: String,
    /// Path and query, relative to the server root.
    pub target: String,
    pub request_id: Option<String>,
    pub body: String,
}

struct Inner {
    reply: Box<dyn Fn(&Seen) -> Reply + Send + Sync>,
    hits: AtomicU32,
    seen: Mutex<Vec<Seen>>,
}

/// A programmable HTTP backend on an ephemeral loopback port.
#[derive(Clone)]
pub struct MockBackend {
    pub addr: SocketAddr,
    inner: Arc<Inner>,
}

impl MockBackend {
    /// Base URL in the deployed `/api/v1` layout.
    pub fn base_url(&self) -> String {
        format!("http://{}/api/v1", self.addr)
    }

    pub fn hits(&self) -> u32 {
        self.inner.hits.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.inner.seen.lock().unwrap().clone()
    }
}

async fn handle(
    State(inner): State<Arc<Inner>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let seen = Seen {
        method: method.to_string(),
        target: uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string()),
        request_id: headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    };

    inner.hits.fetch_add(1, Ordering::SeqCst);
    let reply = (inner.reply)(&seen);
    inner.seen.lock().unwrap().push(seen);

    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "application/json")], reply.body).into_response()
}

/// Start a backend whose reply is computed per request.
pub async fn start_backend<F>(reply: F) -> MockBackend
where
    F: Fn(&Seen) -> Reply + Send + Sync + 'static,
{
    let inner = Arc::new(Inner {
        reply: Box::new(reply),
        hits: AtomicU32::new(0),
        seen: Mutex::new(Vec::new()),
    });

    let app = Router::new().fallback(handle).with_state(inner.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockBackend { addr, inner }
}

/// Start a backend that always sends the same reply.
pub async fn start_fixed_backend(reply: Reply) -> MockBackend {
    start_backend(move |_| reply.clone()).await
}

/// A loopback URL with nothing listening behind it.
pub async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api/v1", addr)
}

/// A backend that reads one request and never answers.
///
/// `arrived` fires once the request is read; `closed` fires when the client
/// drops the connection.
pub struct StalledBackend {
    pub base_url: String,
    pub arrived: oneshot::Receiver<()>,
    pub closed: oneshot::Receiver<()>,
}

pub async fn start_stalled_backend() -> StalledBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (arrived_tx, arrived) = oneshot::channel();
    let (closed_tx, closed) = oneshot::channel();

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        let _ = arrived_tx.send(());

        loop {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }
        let _ = closed_tx.send(());
    });

    StalledBackend {
        base_url: format!("http://{}/api/v1", addr),
        arrived,
        closed,
    }
}

pub fn resolver(urls: &[String], strategy: Strategy) -> Resolver {
    let http = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap();
    Resolver::with_client(CandidateList::new(urls).unwrap(), http).strategy(strategy)
}

pub fn client(urls: &[String]) -> PolicyPilotClient {
    client_with(urls, Strategy::Sequential, TimeoutConfig::default())
}

pub fn client_with(urls: &[String], strategy: Strategy, timeouts: TimeoutConfig) -> PolicyPilotClient {
    PolicyPilotClient::new(resolver(urls, strategy), timeouts)
}

/// A policy as the backend lists it.
pub fn policy_json(id: &str, name: &str) -> Value {
    json!({
        "policy_id": id,
        "policy_name": name,
        "region": "徐汇区",
        "support_type": "资金补贴",
        "max_amount": 500000,
        "industry_tags": ["人工智能"],
        "requirements": ["注册地在徐汇区"]
    })
}
