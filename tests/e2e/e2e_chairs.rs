use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header::CONTENT_TYPE};
use axum::routing::{get, post};
use chair_ping::cli::{Commands, run_with};
use chair_ping::{ChairUpdate, RestErrorKind, Runner, RunnerConfig};
use tokio::net::TcpListener;
use tokio::time::sleep;

const STORED_STATE: &str = r#"{"chairs":{"chair-1":{"is_occupied":true}}}"#;

#[derive(Clone, Debug)]
struct Captured {
    content_type: Option<String>,
    api_key: Option<String>,
    body: Bytes,
}

#[derive(Clone)]
struct AppState {
    status: StatusCode,
    reply: &'static str,
    captured: Arc<Mutex<Vec<Captured>>>,
}

#[tokio::test]
async fn e2e_ok_response_is_printed_verbatim() {
    let server = FakeChairServer::start(StatusCode::OK, "OK").await;
    let runner = Runner::new(RunnerConfig::new(server.url("/api/chairs")));

    let mut out = Vec::new();
    run_with(&runner, None, &mut out).await.expect("run against fake server");

    assert_eq!(String::from_utf8(out).unwrap(), "Status Code: 200\nResponse Body: OK\n");

    let captured = server.captured();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(captured[0].api_key, None);
    let update: ChairUpdate = sonic_rs::from_slice(&captured[0].body).expect("server saw json");
    assert_eq!(update, ChairUpdate::new("chair-1", true));
}

#[tokio::test]
async fn e2e_not_found_is_passed_through() {
    let server = FakeChairServer::start(StatusCode::NOT_FOUND, "Not Found").await;
    let runner = Runner::new(RunnerConfig::new(server.url("/api/chairs")));

    let mut out = Vec::new();
    run_with(&runner, None, &mut out).await.expect("404 is not an error");

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Status Code: 404\nResponse Body: Not Found\n"
    );
}

#[tokio::test]
async fn e2e_api_key_header_reaches_server() {
    let server = FakeChairServer::start(StatusCode::OK, "{}").await;
    let runner = Runner::new(RunnerConfig::new(server.url("/api/chairs")).with_api_key("shh"));

    runner
        .update(&ChairUpdate::new("chair-3", false))
        .await
        .expect("update should reach server");

    let captured = server.captured();
    assert_eq!(captured[0].api_key.as_deref(), Some("shh"));
}

#[tokio::test]
async fn e2e_health_uses_server_origin() {
    let server = FakeChairServer::start(StatusCode::OK, "OK").await;
    let runner = Runner::new(RunnerConfig::new(server.url("/api/chairs")));

    let mut out = Vec::new();
    run_with(&runner, Some(Commands::Health), &mut out).await.expect("health");

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Status Code: 200\nResponse Body: {\"status\":\"ok\"}\n"
    );
    assert!(server.captured().is_empty());
}

#[tokio::test]
async fn e2e_state_gets_stored_chairs() {
    let server = FakeChairServer::start(StatusCode::OK, "OK").await;
    let runner = Runner::new(RunnerConfig::new(server.url("/api/chairs")));

    let mut out = Vec::new();
    run_with(&runner, Some(Commands::State), &mut out).await.expect("state");

    assert_eq!(
        String::from_utf8(out).unwrap(),
        format!("Status Code: 200\nResponse Body: {STORED_STATE}\n")
    );
    assert!(server.captured().is_empty());
}

#[tokio::test]
async fn e2e_unreachable_server_fails_without_report() {
    // Bind then drop to get a local port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind probe");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let runner = Runner::new(RunnerConfig::new(format!("http://{addr}/api/chairs")));
    let mut out = Vec::new();
    let err = run_with(&runner, None, &mut out)
        .await
        .expect_err("nothing is listening");

    let rest_err = err
        .downcast_ref::<chair_ping::RestError>()
        .expect("root cause is a rest error");
    assert_eq!(rest_err.kind(), RestErrorKind::Connect);
    assert!(out.is_empty());
}

#[tokio::test]
async fn e2e_configured_timeout_triggers() {
    let server = FakeChairServer::start(StatusCode::OK, "OK").await;
    let runner = Runner::new(
        RunnerConfig::new(server.url("/slow")).with_timeout(Duration::from_millis(200)),
    );

    let err = runner
        .update(&ChairUpdate::default())
        .await
        .expect_err("timeout should trigger");
    assert_eq!(err.kind(), RestErrorKind::Timeout);
}

struct FakeChairServer {
    base_url: String,
    captured: Arc<Mutex<Vec<Captured>>>,
    task: tokio::task::JoinHandle<()>,
}

impl FakeChairServer {
    async fn start(status: StatusCode, reply: &'static str) -> Self {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let state = AppState {
            status,
            reply,
            captured: captured.clone(),
        };
        let app = Router::new()
            .route("/api/chairs", post(chairs_handler).get(state_handler))
            .route("/health", get(health_handler))
            .route("/slow", post(slow_handler))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let base_url = format!("http://{}", addr);

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url,
            captured,
            task,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn captured(&self) -> Vec<Captured> {
        self.captured.lock().expect("captured mutex").clone()
    }
}

impl Drop for FakeChairServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn chairs_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    state.captured.lock().expect("captured mutex").push(Captured {
        content_type: header(CONTENT_TYPE.as_str()),
        api_key: header("x-api-key"),
        body,
    });
    (state.status, state.reply)
}

async fn state_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, STORED_STATE)
}

async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, r#"{"status":"ok"}"#)
}

async fn slow_handler() -> (StatusCode, &'static str) {
    sleep(Duration::from_millis(2000)).await;
    (StatusCode::OK, "too late")
}
