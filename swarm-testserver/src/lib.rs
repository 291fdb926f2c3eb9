//! A stub of the lesson API a swarm run walks, with knobs for injecting faults.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::{Duration, sleep};

pub const PATH_CATALOG: &str = "/api/lessons";
pub const PATH_DETAIL: &str = "/api/lessons/{id}";
pub const PATH_VOCABULARY: &str = "/api/lessons/{id}/vocabulary";
pub const PATH_QUIZ: &str = "/api/lessons/{id}/quiz";

pub const PAGE_ROUTES: &[&str] = &[
    "/",
    "/login",
    "/dashboard",
    "/lessons",
    "/vocabulary",
    "/practice",
    "/progress",
    "/profile",
];
pub const AUX_ENDPOINTS: &[&str] = &["/api/vocabulary", "/api/progress", "/api/achievements"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubResource {
    Vocabulary,
    Quiz,
}

/// Shape of the catalog body when the catalog answers 2xx.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogBody {
    #[default]
    Items,
    Empty,
    NotArray,
}

#[derive(Debug, Clone)]
pub struct TestServerConfig {
    pub catalog_size: u64,
    pub catalog_status: u16,
    pub catalog_body: CatalogBody,
    /// Answers 500 for this sub-resource of every item.
    pub failing_sub_resource: Option<SubResource>,
    /// Items whose detail endpoint answers 500.
    pub failing_items: Vec<u64>,
    /// Added to every response.
    pub latency: Duration,
}

impl Default for TestServerConfig {
    fn default() -> Self {
        Self {
            catalog_size: 10,
            catalog_status: 200,
            catalog_body: CatalogBody::Items,
            failing_sub_resource: None,
            failing_items: Vec::new(),
            latency: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TestServerStats {
    requests_total: Arc<AtomicU64>,
    in_flight: Arc<AtomicU64>,
    max_in_flight: Arc<AtomicU64>,
    hits: Arc<Mutex<BTreeMap<String, u64>>>,
}

/// Holds one in-flight slot; released on drop, including when the request future is cancelled.
struct InFlight(Arc<AtomicU64>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl TestServerStats {
    fn begin(&self, path: &str) -> InFlight {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Ok(mut hits) = self.hits.lock() {
            *hits.entry(path.to_string()).or_insert(0) += 1;
        }
        InFlight(self.in_flight.clone())
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of requests the server was handling at once.
    pub fn max_in_flight(&self) -> u64 {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Requests seen for an exact path (`/api/lessons/3/quiz`).
    pub fn hits(&self, path: &str) -> u64 {
        self.hits
            .lock()
            .map(|h| h.get(path).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Requests seen for every path starting with `prefix`.
    pub fn hits_with_prefix(&self, prefix: &str) -> u64 {
        self.hits
            .lock()
            .map(|h| {
                h.iter()
                    .filter(|(k, _)| k.starts_with(prefix))
                    .map(|(_, v)| *v)
                    .sum()
            })
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
struct AppState {
    config: Arc<TestServerConfig>,
    stats: TestServerStats,
}

#[derive(Debug, Serialize)]
struct Lesson {
    id: u64,
    title: String,
    level: &'static str,
}

impl Lesson {
    fn new(id: u64) -> Self {
        let level = match id % 3 {
            0 => "advanced",
            1 => "beginner",
            _ => "intermediate",
        };
        Self {
            id,
            title: format!("Lesson {id}"),
            level,
        }
    }
}

async fn track(State(app): State<AppState>, req: Request, next: Next) -> Response {
    let _slot = app.stats.begin(req.uri().path());
    if !app.config.latency.is_zero() {
        sleep(app.config.latency).await;
    }
    next.run(req).await
}

async fn handle_page() -> Html<&'static str> {
    Html("<!doctype html><html><body>ok</body></html>")
}

async fn handle_catalog(State(app): State<AppState>) -> Response {
    let cfg = &app.config;
    let status =
        StatusCode::from_u16(cfg.catalog_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if !status.is_success() {
        return (status, "catalog unavailable").into_response();
    }

    match cfg.catalog_body {
        CatalogBody::Items => {
            let lessons: Vec<Lesson> = (1..=cfg.catalog_size).map(Lesson::new).collect();
            (status, Json(lessons)).into_response()
        }
        CatalogBody::Empty => (status, Json(Vec::<Lesson>::new())).into_response(),
        CatalogBody::NotArray => {
            (status, Json(serde_json::json!({ "lessons": "unavailable" }))).into_response()
        }
    }
}

fn known_item(cfg: &TestServerConfig, id: u64) -> bool {
    (1..=cfg.catalog_size).contains(&id)
}

async fn handle_detail(State(app): State<AppState>, Path(id): Path<u64>) -> Response {
    if !known_item(&app.config, id) {
        return StatusCode::NOT_FOUND.into_response();
    }
    if app.config.failing_items.contains(&id) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "detail failed").into_response();
    }
    Json(Lesson::new(id)).into_response()
}

fn sub_resource(app: &AppState, id: u64, kind: SubResource) -> Response {
    if !known_item(&app.config, id) {
        return StatusCode::NOT_FOUND.into_response();
    }
    if app.config.failing_sub_resource == Some(kind) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "sub-resource failed").into_response();
    }
    let body = match kind {
        SubResource::Vocabulary => serde_json::json!([{ "word": "hola", "lesson": id }]),
        SubResource::Quiz => serde_json::json!({ "lesson": id, "questions": 5 }),
    };
    Json(body).into_response()
}

async fn handle_vocabulary(State(app): State<AppState>, Path(id): Path<u64>) -> Response {
    sub_resource(&app, id, SubResource::Vocabulary)
}

async fn handle_quiz(State(app): State<AppState>, Path(id): Path<u64>) -> Response {
    sub_resource(&app, id, SubResource::Quiz)
}

async fn handle_aux() -> Json<serde_json::Value> {
    Json(serde_json::json!([]))
}

pub fn router(config: TestServerConfig, stats: TestServerStats) -> Router {
    let state = AppState {
        config: Arc::new(config),
        stats,
    };

    let mut app = Router::new()
        .route(PATH_CATALOG, get(handle_catalog))
        .route(PATH_DETAIL, get(handle_detail))
        .route(PATH_VOCABULARY, get(handle_vocabulary))
        .route(PATH_QUIZ, get(handle_quiz));
    for page in PAGE_ROUTES {
        app = app.route(page, get(handle_page));
    }
    for endpoint in AUX_ENDPOINTS {
        app = app.route(endpoint, get(handle_aux));
    }

    app.layer(middleware::from_fn_with_state(state.clone(), track))
        .with_state(state)
}

pub struct TestServer {
    base_url: String,
    stats: TestServerStats,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> std::io::Result<Self> {
        Self::start_with(TestServerConfig::default()).await
    }

    pub async fn start_with(config: TestServerConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let stats = TestServerStats::default();
        let app = router(config, stats.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = serve.await;
        });

        Ok(Self {
            base_url: format!("http://{addr}"),
            stats,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn stats(&self) -> &TestServerStats {
        &self.stats
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if self.shutdown_tx.is_some()
            && let Some(task) = self.task.take()
        {
            task.abort();
        }
    }
}
