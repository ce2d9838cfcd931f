//! Integration tests for the scouting backend.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::Config;
use crate::db::{init_database, LocalStore};
use crate::test_support::{FakeSheet, FakeTba};
use crate::{create_router, AppState};

const ADMIN: &str = "admin6560";

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    sheet: FakeSheet,
    _tba: FakeTba,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_online(true).await
    }

    async fn with_online(start_online: bool) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        let sheet = FakeSheet::start().await;
        let tba = FakeTba::start().await;

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let store = Arc::new(LocalStore::new(pool));

        // Create config
        let config = Config {
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            sync_endpoint: Some(sheet.url()),
            tba_base_url: tba.url(),
            tba_auth_key: "test-key".to_string(),
            admin_username: ADMIN.to_string(),
            start_online,
            sync_reset_delay: Duration::from_millis(150),
            auto_sync_delay: Duration::from_millis(20),
        };

        let state = AppState::new(store, config).expect("Failed to build state");
        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            sheet,
            _tba: tba,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn send(&self, method: reqwest::Method, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .request(method, self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        self.send(reqwest::Method::POST, path, body).await
    }

    async fn put(&self, path: &str, body: Value) -> (u16, Value) {
        self.send(reqwest::Method::PUT, path, body).await
    }

    async fn login(&self, username: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/session/login",
                json!({ "username": username, "assignedAlliance": "blue", "assignedPosition": 2 }),
            )
            .await;
        assert_eq!(status, 200, "login failed: {}", body);
        body
    }

    async fn submit(&self, match_number: u32, team_number: u32) -> Value {
        let (status, body) = self
            .post(
                "/api/entries",
                json!({
                    "matchNumber": match_number,
                    "teamNumber": team_number,
                    "scouterUsername": "casey",
                    "l1Count": 1,
                    "l2Count": 2,
                    "l3Count": 0,
                    "l4Count": 3,
                    "climbStatus": "deep-climb",
                    "notes": "  fast cycles  "
                }),
            )
            .await;
        assert_eq!(status, 200, "submit failed: {}", body);
        body
    }

    async fn unsynced_count(&self) -> u64 {
        let (_, body) = self.get("/api/sync/status").await;
        body["data"]["unsyncedCount"].as_u64().unwrap()
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_datastore_starts_empty() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get("/api/datastore").await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert!(body["data"]["schemaVersion"].is_number());
    assert!(body["data"]["user"].is_null());
    assert_eq!(body["data"]["scoutingData"], json!([]));
    assert_eq!(body["data"]["adminScouters"], json!([]));
    assert!(body["data"]["selectedEvent"].is_null());
    assert!(body["revisionId"].is_number());

    let (status, body) = fixture.get("/api/datastore/revision").await;
    assert_eq!(status, 200);
    assert!(body["data"]["revisionId"].is_number());
}

#[tokio::test]
async fn test_login_as_scout_and_admin() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get("/api/session").await;
    assert_eq!(status, 401);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let body = fixture.login("Casey").await;
    assert_eq!(body["data"]["isAdmin"], false);
    assert_eq!(body["data"]["user"]["assignedAlliance"], "blue");
    assert_eq!(body["data"]["user"]["assignedPosition"], 2);

    let (status, body) = fixture.get("/api/session").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["user"]["username"], "Casey");

    let body = fixture.login(ADMIN).await;
    assert_eq!(body["data"]["isAdmin"], true);

    let (status, body) = fixture
        .post("/api/session/login", json!({ "username": "   " }))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_admin_routes_are_gated() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get("/api/admin/scouters").await;
    assert_eq!(status, 401);
    assert_eq!(body["success"], false);

    fixture.login("Casey").await;
    let (status, body) = fixture.get("/api/admin/scouters").await;
    assert_eq!(status, 403);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    fixture.login(ADMIN).await;
    let (status, body) = fixture.get("/api/admin/scouters").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_roster_assignment_applies_at_login() {
    let fixture = TestFixture::new().await;
    fixture.login(ADMIN).await;

    let (status, body) = fixture
        .post(
            "/api/admin/scouters",
            json!({ "name": "Morgan", "assignedAlliance": "red", "assignedPosition": 3, "status": "remote" }),
        )
        .await;
    assert_eq!(status, 200);
    let scouter_id = body["data"]["id"].as_str().unwrap().to_string();
    let revision_after_create = body["revisionId"].as_i64().unwrap();

    let (_, body) = fixture.get("/api/session/assignment/morgan").await;
    assert_eq!(body["data"]["isAdmin"], false);
    assert_eq!(body["data"]["assignment"]["id"], scouter_id.as_str());

    let (status, body) = fixture
        .put(
            &format!("/api/admin/scouters/{}", scouter_id),
            json!({ "assignedAlliance": "blue" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["assignedAlliance"], "blue");
    assert_eq!(body["data"]["assignedPosition"], 3);
    assert!(body["revisionId"].as_i64().unwrap() > revision_after_create);

    // Roster seat overrides what the scout picked
    let body = fixture.login("MORGAN").await;
    assert_eq!(body["data"]["fromRoster"], true);
    assert_eq!(body["data"]["user"]["assignedAlliance"], "blue");
    assert_eq!(body["data"]["user"]["assignedPosition"], 3);
}

#[tokio::test]
async fn test_scouter_crud() {
    let fixture = TestFixture::new().await;
    fixture.login(ADMIN).await;

    let (status, body) = fixture
        .post(
            "/api/admin/scouters",
            json!({ "name": "Riley", "assignedAlliance": "blue", "assignedPosition": 4 }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = fixture
        .post(
            "/api/admin/scouters",
            json!({ "name": "Riley", "assignedAlliance": "blue", "assignedPosition": 1 }),
        )
        .await;
    assert_eq!(status, 200);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/admin/scouters/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/admin/scouters/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let (status, body) = fixture
        .put(
            "/api/admin/scouters",
            json!([
                { "id": "a", "name": "Avery", "assignedAlliance": "red", "assignedPosition": 1, "status": "in-person" },
                { "id": "b", "name": "Blake", "assignedAlliance": "blue", "assignedPosition": 2, "status": "not-scouting" }
            ]),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = fixture.get("/api/admin/scouters").await;
    assert_eq!(body["data"][1]["status"], "not-scouting");
}

#[tokio::test]
async fn test_schedule_defaults_to_demo_matches() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get("/api/matches").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (status, _) = fixture.get("/api/matches/mine").await;
    assert_eq!(status, 401);

    fixture.login("Casey").await;
    fixture.submit(1, 254).await;

    let (status, body) = fixture.get("/api/matches/mine").await;
    assert_eq!(status, 200);
    let mine = body["data"].as_array().unwrap();
    assert_eq!(mine[0]["scouted"], true);
    assert_eq!(mine[1]["scouted"], false);
    assert!(mine[0]["teamToScout"].is_number());
}

#[tokio::test]
async fn test_submit_entry_auto_syncs() {
    let fixture = TestFixture::new().await;
    fixture.login("Casey").await;

    let body = fixture.submit(12, 6560).await;
    let entry = &body["data"];
    assert!(entry["id"].as_str().unwrap().starts_with("12-6560-"));
    assert_eq!(entry["synced"], false);
    assert_eq!(entry["notes"], "fast cycles");

    tokio::time::sleep(Duration::from_millis(300)).await;

    let batches = fixture.sheet.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0][0]["teamNumber"], 6560);
    assert_eq!(fixture.unsynced_count().await, 0);

    let (_, body) = fixture.get("/api/entries").await;
    assert_eq!(body["data"][0]["synced"], true);
}

#[tokio::test]
async fn test_offline_entries_sync_when_back_online() {
    let fixture = TestFixture::with_online(false).await;
    fixture.login("Casey").await;

    fixture.submit(1, 254).await;
    fixture.submit(2, 971).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(fixture.sheet.batches().is_empty());

    let (status, body) = fixture.post("/api/sync", json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["outcome"]["kind"], "offline");
    assert_eq!(body["data"]["status"], "idle");
    assert_eq!(body["data"]["unsyncedCount"], 2);

    let (_, body) = fixture
        .put("/api/connectivity", json!({ "online": true }))
        .await;
    assert_eq!(body["data"]["online"], true);

    let (_, body) = fixture.post("/api/sync", json!({})).await;
    assert_eq!(body["data"]["outcome"]["kind"], "pushed");
    assert_eq!(body["data"]["outcome"]["sent"], 2);
    assert_eq!(body["data"]["outcome"]["marked"], 2);
    assert_eq!(body["data"]["status"], "success");
    assert_eq!(body["data"]["unsyncedCount"], 0);
    assert_eq!(fixture.sheet.batches()[0].len(), 2);

    // Status falls back to idle after the reset delay
    tokio::time::sleep(Duration::from_millis(400)).await;
    let (_, body) = fixture.get("/api/sync/status").await;
    assert_eq!(body["data"]["status"], "idle");

    // A second sync has nothing left to send
    let (_, body) = fixture.post("/api/sync", json!({})).await;
    assert_eq!(body["data"]["outcome"]["kind"], "nothingToSync");
    assert_eq!(fixture.sheet.batches().len(), 1);
}

#[tokio::test]
async fn test_rejected_sync_keeps_entries_unsynced() {
    let fixture = TestFixture::with_online(false).await;
    fixture.login("Casey").await;
    fixture.submit(3, 1678).await;

    fixture.sheet.respond_with(500);
    fixture
        .put("/api/connectivity", json!({ "online": true }))
        .await;

    let (_, body) = fixture.post("/api/sync", json!({})).await;
    assert_eq!(body["data"]["outcome"]["kind"], "failed");
    assert_eq!(body["data"]["status"], "error");
    assert_eq!(body["data"]["unsyncedCount"], 1);

    let (_, body) = fixture.get("/api/entries/unsynced").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = fixture.get("/api/sync/test").await;
    assert_eq!(body["data"]["endpointConfigured"], true);
    assert_eq!(body["data"]["reachable"], false);
}

#[tokio::test]
async fn test_patch_entry() {
    let fixture = TestFixture::with_online(false).await;
    fixture.login("Casey").await;
    let body = fixture.submit(4, 254).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = fixture
        .send(
            reqwest::Method::PATCH,
            &format!("/api/entries/{}", id),
            json!({ "l4Count": 7, "climbStatus": "low-climb" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"][0]["l4Count"], 7);
    assert_eq!(body["data"][0]["climbStatus"], "low-climb");
    assert_eq!(body["data"][0]["synced"], false);

    // Unknown ids leave the collection unchanged
    let (status, body) = fixture
        .send(
            reqwest::Method::PATCH,
            "/api/entries/missing",
            json!({ "l1Count": 9 }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"][0]["l1Count"], 1);
}

#[tokio::test]
async fn test_entry_validation() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post(
            "/api/entries",
            json!({
                "matchNumber": 0,
                "teamNumber": 254,
                "scouterUsername": "casey",
                "l1Count": 0, "l2Count": 0, "l3Count": 0, "l4Count": 0,
                "climbStatus": "no-climb"
            }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["revisionId"].is_number());
}

#[tokio::test]
async fn test_event_search_and_import() {
    let fixture = TestFixture::new().await;
    fixture.login(ADMIN).await;

    let (status, body) = fixture
        .get("/api/admin/events/search?q=silicon&year=2025")
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"][0]["key"], "2025casj");

    let (status, _) = fixture.get("/api/admin/events/search?year=2025").await;
    assert_eq!(status, 400);

    let (status, body) = fixture
        .post("/api/admin/events/2025casj/import", json!({}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = fixture.get("/api/event").await;
    assert_eq!(body["data"]["eventKey"], "2025casj");

    let (_, body) = fixture.get("/api/matches").await;
    assert_eq!(body["data"][0]["blueAllianceKey"], "2025casj_qm1");

    let (status, body) = fixture
        .post("/api/admin/events/2025none/import", json!({}))
        .await;
    assert_eq!(status, 502);
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");

    // Encoded slashes must not reach the upstream path
    let (status, body) = fixture
        .post("/api/admin/events/x%2F..%2F2025casj/import", json!({}))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = fixture
        .put("/api/admin/event", json!({ "eventKey": "2025casj/rankings" }))
        .await;
    assert_eq!(status, 400);

    let (_, body) = fixture.get("/api/admin/events/2025casj/teams/254").await;
    assert_eq!(body["data"]["rank"], 1);
    assert_eq!(body["data"]["record"]["wins"], 9);

    let (_, body) = fixture.get("/api/admin/events/2025casj/rankings").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_team_stats_for_selected_event() {
    let fixture = TestFixture::with_online(false).await;
    fixture.login(ADMIN).await;

    // Recorded before any event is selected
    fixture.submit(1, 8).await;

    let (status, _) = fixture
        .put("/api/admin/event", json!({ "eventKey": "2025casj" }))
        .await;
    assert_eq!(status, 200);

    fixture.submit(1, 254).await;
    fixture.submit(2, 254).await;
    fixture.submit(1, 971).await;

    let (status, body) = fixture.get("/api/admin/stats?sortBy=rank&order=asc").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["eventKey"], "2025casj");
    assert_eq!(body["data"]["teamCount"], 2);
    let teams = body["data"]["teams"].as_array().unwrap();
    assert_eq!(teams[0]["teamNumber"], 254);
    assert_eq!(teams[0]["matchCount"], 2);
    assert_eq!(teams[0]["rank"], 1);
    assert_eq!(teams[0]["totalScore"], 6.0);
    assert_eq!(teams[0]["climbStats"]["deep-climb"], 2);
    assert_eq!(teams[1]["rank"], 4);

    let (_, body) = fixture
        .get("/api/admin/stats?climb=no-climb&ranks=false")
        .await;
    assert_eq!(body["data"]["teamCount"], 0);

    let (status, _) = fixture
        .put("/api/admin/event", json!({ "eventKey": "  " }))
        .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_logout_clears_everything() {
    let fixture = TestFixture::with_online(false).await;
    fixture.login(ADMIN).await;
    fixture
        .put("/api/admin/event", json!({ "eventKey": "2025casj" }))
        .await;
    fixture.submit(1, 254).await;

    let (status, body) = fixture.post("/api/session/logout", json!({})).await;
    assert_eq!(status, 200);
    let revision_after_logout = body["revisionId"].as_i64().unwrap();

    let (_, body) = fixture.get("/api/datastore").await;
    assert!(body["data"]["user"].is_null());
    assert_eq!(body["data"]["scoutingData"], json!([]));
    assert_eq!(body["data"]["matches"], json!([]));
    assert!(body["data"]["selectedEvent"].is_null());
    assert_eq!(body["revisionId"].as_i64().unwrap(), revision_after_logout);

    let (status, _) = fixture.get("/api/session").await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn test_legacy_import_and_store_issues() {
    let fixture = TestFixture::with_online(false).await;
    fixture.login(ADMIN).await;

    let legacy_entries = json!([{
        "id": "5-254-1700000000000",
        "matchNumber": 5,
        "teamNumber": 254,
        "scouterUsername": "casey",
        "timestamp": 1700000000000i64,
        "l1Count": 1, "l2Count": 0, "l3Count": 0, "l4Count": 2,
        "climbStatus": "low-climb"
    }]);
    let (status, _) = fixture
        .post(
            "/api/admin/store/import",
            json!({ "key": "frc_scouting_data", "value": legacy_entries.to_string() }),
        )
        .await;
    assert_eq!(status, 200);

    let (_, body) = fixture.get("/api/entries").await;
    assert_eq!(body["data"][0]["synced"], false);
    assert_eq!(fixture.unsynced_count().await, 1);

    let (status, _) = fixture
        .post(
            "/api/admin/store/import",
            json!({ "key": "frc_scouting_matches", "value": "{not json" }),
        )
        .await;
    assert_eq!(status, 200);

    // Corrupt record reads as empty and is reported
    let (status, body) = fixture.get("/api/datastore").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["matches"], json!([]));

    let (_, body) = fixture.get("/api/store/issues").await;
    let issues = body["data"].as_array().unwrap();
    assert!(issues
        .iter()
        .any(|issue| issue["key"] == "frc_scouting_matches"));

    let (status, _) = fixture
        .post(
            "/api/admin/store/import",
            json!({ "key": "unknown_key", "value": "[]" }),
        )
        .await;
    assert_eq!(status, 400);
}
