// crates/allot-server/src/llm/test_server.rs
// Local stand-in for vendor endpoints in adapter tests

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// One request as the fake vendor saw it
#[derive(Debug, Clone)]
pub struct Captured {
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Value,
}

struct VendorState {
    status: StatusCode,
    response: String,
    captured: Mutex<Vec<Captured>>,
}

pub struct FakeVendor {
    pub base_url: String,
    state: Arc<VendorState>,
}

impl FakeVendor {
    pub fn requests(&self) -> Vec<Captured> {
        self.state.captured.lock().unwrap().clone()
    }
}

async fn handle(
    State(state): State<Arc<VendorState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
    state.captured.lock().unwrap().push(Captured {
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    });
    (state.status, state.response.clone())
}

/// Serve `response` with `status` for every request on 127.0.0.1:0
pub async fn spawn_vendor(status: StatusCode, response: impl Into<String>) -> FakeVendor {
    let state = Arc::new(VendorState {
        status,
        response: response.into(),
        captured: Mutex::new(Vec::new()),
    });
    let app = Router::new().fallback(handle).with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    FakeVendor {
        base_url: format!("http://{addr}"),
        state,
    }
}

/// Model text carrying one recommendation for the synthetic input
pub fn sample_model_text() -> String {
    serde_json::json!({
        "allocations": [{
            "student_id": 1,
            "supervisor_id": 1,
            "project_id": 1,
            "match_score": 92.0,
            "reasoning": "AI specialization match"
        }],
        "summary": {"total_allocations": 1},
        "recommendations": ["Balanced"]
    })
    .to_string()
}
