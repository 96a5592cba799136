#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use swarm_gate::errors::{GateError, GateResult};
use swarm_gate::workload::Workload;

/// Canned response for one mock endpoint.
#[derive(Clone)]
pub struct Canned {
    pub status: StatusCode,
    pub body: Value,
}

impl Canned {
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn error(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }
}

/// One request as seen by the mock server.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub org_key: Option<String>,
    pub device_id: Option<String>,
}

pub struct MockMachineId {
    register: Canned,
    validate: Canned,
    pub register_calls: AtomicUsize,
    pub validate_calls: AtomicUsize,
    pub seen: Mutex<Vec<SeenRequest>>,
}

impl MockMachineId {
    pub fn register_count(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub fn validate_count(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    fn record(&self, headers: &HeaderMap, body: &Value) {
        self.seen.lock().unwrap().push(SeenRequest {
            org_key: headers
                .get("x-org-key")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            device_id: body
                .get("deviceId")
                .and_then(|v| v.as_str())
                .map(str::to_string),
        });
    }
}

async fn register_handler(
    State(mock): State<Arc<MockMachineId>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    mock.register_calls.fetch_add(1, Ordering::SeqCst);
    mock.record(&headers, &body);
    (mock.register.status, Json(mock.register.body.clone()))
}

async fn validate_handler(
    State(mock): State<Arc<MockMachineId>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    mock.validate_calls.fetch_add(1, Ordering::SeqCst);
    mock.record(&headers, &body);
    (mock.validate.status, Json(mock.validate.body.clone()))
}

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("failed to bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .await
            .expect("server failed");
    });

    format!("http://{}", addr)
}

/// Spin up a mock MachineID server on an ephemeral port.
pub async fn spawn_machineid(register: Canned, validate: Canned) -> (String, Arc<MockMachineId>) {
    let mock = Arc::new(MockMachineId {
        register,
        validate,
        register_calls: AtomicUsize::new(0),
        validate_calls: AtomicUsize::new(0),
        seen: Mutex::new(Vec::new()),
    });

    let router = Router::new()
        .route("/api/v1/devices/register", post(register_handler))
        .route("/api/v1/devices/validate", post(validate_handler))
        .with_state(mock.clone());

    (serve(router).await, mock)
}

pub fn register_status(status: &str) -> Canned {
    Canned::ok(json!({ "status": status }))
}

/// Spin up a mock chat-completions backend that answers with `content`.
pub async fn spawn_chat_backend(content: &'static str) -> String {
    let router = Router::new().route(
        "/v1/chat/completions",
        post(move |headers: HeaderMap, Json(body): Json<Value>| async move {
            let authorized = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(|v| v == "Bearer sk_test")
                .unwrap_or(false);
            if !authorized {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": { "message": "bad api key" } })),
                );
            }

            let system = body["messages"][0]["role"].as_str().unwrap_or_default();
            assert_eq!(system, "system");

            (
                StatusCode::OK,
                Json(json!({
                    "choices": [
                        { "message": { "role": "assistant", "content": content } }
                    ]
                })),
            )
        }),
    );

    format!("{}/v1", serve(router).await)
}

/// A server that accepts connections and closes them without answering.
/// The returned counter tracks accepted connections.
pub async fn spawn_hangup_server() -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("failed to bind");
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));

    let counter = accepted.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            drop(socket);
        }
    });

    (format!("http://{}", addr), accepted)
}

/// A base URL nothing is listening on.
pub async fn dead_base_url() -> String {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("failed to bind");
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Workload stub that counts invocations.
#[derive(Default)]
pub struct CountingWorkload {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl CountingWorkload {
    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Workload for CountingWorkload {
    async fn run(&self) -> GateResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(GateError::InvalidResponse("agent backend hiccup".into()));
        }
        Ok("1. assign deviceId 2. register 3. validate".to_string())
    }
}
