//! In-process stand-ins for the sheet endpoint and the competition API.

use std::sync::atomic::{AtomicU16, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[derive(Clone, Default)]
struct SheetState {
    batches: Arc<Mutex<Vec<Vec<Value>>>>,
    status: Arc<AtomicU16>,
    delay_ms: Arc<AtomicU64>,
}

impl SheetState {
    fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status.load(Ordering::SeqCst))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

async fn receive_batch(State(state): State<SheetState>, Json(body): Json<Value>) -> StatusCode {
    let delay = state.delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    let status = state.status();
    if status.is_success() {
        let rows = body["data"].as_array().cloned().unwrap_or_default();
        state.batches.lock().unwrap().push(rows);
    }
    status
}

async fn connection_check(State(state): State<SheetState>) -> StatusCode {
    state.status()
}

/// Fake sheet endpoint recording every acknowledged batch.
#[derive(Clone)]
pub struct FakeSheet {
    base_url: String,
    state: SheetState,
}

impl FakeSheet {
    pub async fn start() -> Self {
        let state = SheetState::default();
        state.status.store(200, Ordering::SeqCst);
        let app = Router::new()
            .route("/sheet", get(connection_check).post(receive_batch))
            .with_state(state.clone());
        let base_url = serve(app).await;
        Self { base_url, state }
    }

    pub fn url(&self) -> String {
        format!("{}/sheet", self.base_url)
    }

    pub fn respond_with(&self, status: u16) {
        self.state.status.store(status, Ordering::SeqCst);
    }

    pub fn delay(&self, delay: Duration) {
        self.state
            .delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Acknowledged batches, oldest first.
    pub fn batches(&self) -> Vec<Vec<Value>> {
        self.state.batches.lock().unwrap().clone()
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.contains_key(crate::lookup::TBA_AUTH_HEADER)
}

async fn events(headers: HeaderMap, Path(year): Path<i32>) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) || year != 2025 {
        return (StatusCode::NOT_FOUND, Json(json!({ "Errors": ["not found"] })));
    }
    (
        StatusCode::OK,
        Json(json!([
            {
                "key": "2025casj", "name": "Silicon Valley Regional", "event_code": "casj",
                "year": 2025, "start_date": "2025-03-26", "end_date": "2025-03-29"
            },
            {
                "key": "2025txhou", "name": "FIRST in Texas Houston", "event_code": "txhou",
                "year": 2025, "start_date": "2025-04-16", "end_date": "2025-04-19"
            }
        ])),
    )
}

async fn event_matches(Path(event_key): Path<String>) -> (StatusCode, Json<Value>) {
    if event_key != "2025casj" {
        return (StatusCode::NOT_FOUND, Json(json!({ "Errors": ["not found"] })));
    }
    (
        StatusCode::OK,
        Json(json!([
            {
                "key": "2025casj_qm2", "comp_level": "qm", "set_number": 1, "match_number": 2,
                "alliances": {
                    "red": { "team_keys": ["frc971", "frc649", "frc8"], "score": -1 },
                    "blue": { "team_keys": ["frc1678", "frc254", "frc5700"], "score": -1 }
                },
                "winning_alliance": ""
            },
            {
                "key": "2025casj_sf1m1", "comp_level": "sf", "set_number": 1, "match_number": 1,
                "alliances": {
                    "red": { "team_keys": ["frc254", "frc1678", "frc604"], "score": 120 },
                    "blue": { "team_keys": ["frc971", "frc649", "frc8"], "score": 100 }
                },
                "winning_alliance": "red"
            },
            {
                "key": "2025casj_qm1", "comp_level": "qm", "set_number": 1, "match_number": 1,
                "alliances": {
                    "red": { "team_keys": ["frc254", "frc1678", "frc604"], "score": 98 },
                    "blue": { "team_keys": ["frc971", "frc649", "frc8"], "score": 77 }
                },
                "winning_alliance": "red"
            }
        ])),
    )
}

async fn team_status(Path((team_key, event_key)): Path<(String, String)>) -> (StatusCode, Json<Value>) {
    if event_key != "2025casj" {
        return (StatusCode::NOT_FOUND, Json(json!({ "Errors": ["not found"] })));
    }
    let body = match team_key.as_str() {
        "frc254" => json!({
            "qual": { "ranking": { "rank": 1, "record": { "wins": 9, "losses": 1, "ties": 0 } } }
        }),
        "frc971" => json!({
            "qual": { "ranking": { "rank": 4, "record": { "wins": 7, "losses": 3, "ties": 0 } } }
        }),
        _ => json!({ "qual": null }),
    };
    (StatusCode::OK, Json(body))
}

async fn rankings(Path(event_key): Path<String>) -> (StatusCode, Json<Value>) {
    if event_key != "2025casj" {
        return (StatusCode::OK, Json(Value::Null));
    }
    (
        StatusCode::OK,
        Json(json!({
            "rankings": [
                { "rank": 1, "team_key": "frc254" },
                { "rank": 4, "team_key": "frc971" }
            ]
        })),
    )
}

/// Fake competition API serving one 2025 event (`2025casj`).
pub struct FakeTba {
    base_url: String,
}

impl FakeTba {
    pub async fn start() -> Self {
        let app = Router::new()
            .route("/events/{year}", get(events))
            .route("/event/{event_key}/matches", get(event_matches))
            .route("/event/{event_key}/rankings", get(rankings))
            .route("/team/{team_key}/event/{event_key}/status", get(team_status));
        let base_url = serve(app).await;
        Self { base_url }
    }

    pub fn url(&self) -> String {
        self.base_url.clone()
    }
}
