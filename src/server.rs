use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use crate::categories::{fetch_or_empty, CategoryProvider, CategorySet};
use crate::error::TaskError;
use crate::filter::TaskFilter;
use crate::form::TaskForm;
use crate::store::{TaskCounts, TaskStore};
use crate::task::{Task, TaskId};
use crate::theme::{Palette, ThemeMode, ThemeStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<TaskStore>>,
    pub theme: ThemeStore,
    pub categories: Arc<dyn CategoryProvider>,
}

impl AppState {
    pub fn new(store: TaskStore, theme: ThemeStore, categories: Arc<dyn CategoryProvider>) -> Self {
        Self { store: Arc::new(Mutex::new(store)), theme, categories }
    }

    fn store(&self) -> MutexGuard<'_, TaskStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Serialize)]
struct TaskListResponse {
    tasks: Vec<Task>,
    counts: TaskCounts,
}

#[derive(Serialize)]
struct CategoriesResponse {
    categories: CategorySet,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<&'static str>,
}

#[derive(Serialize)]
struct ThemeResponse {
    mode: ThemeMode,
    palette: &'static Palette,
}

type ApiResult = Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)>;

fn error_response(e: TaskError) -> (StatusCode, Json<serde_json::Value>) {
    let code = if e.is_validation() { StatusCode::BAD_REQUEST } else { StatusCode::INTERNAL_SERVER_ERROR };
    log::warn!("request failed: {}", e);
    (code, Json(serde_json::json!({"status": "error", "message": e.user_message()})))
}

fn tasks_response(tasks: &[Task]) -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "success", "tasks": tasks}))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(add_task))
        .route("/api/tasks/{id}", get(get_task).delete(delete_task))
        .route("/api/tasks/{id}/toggle", post(toggle_task))
        .route("/api/categories", get(list_categories))
        .route("/api/theme", get(get_theme))
        .route("/api/theme/toggle", post(toggle_theme))
        .fallback_service(ServeDir::new("ui"))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(port: u16, state: AppState) -> anyhow::Result<()> {
    let app = router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("listening on {}", addr);
    println!("🌐 Todo Board is running at: http://localhost:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn list_tasks(State(state): State<AppState>, Query(filter): Query<TaskFilter>) -> Json<TaskListResponse> {
    let store = state.store();
    Json(TaskListResponse { tasks: filter.apply(store.tasks()), counts: store.counts() })
}

async fn get_task(State(state): State<AppState>, Path(id): Path<TaskId>) -> Result<Json<Task>, StatusCode> {
    let store = state.store();
    store.get(id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn add_task(State(state): State<AppState>, Json(form): Json<TaskForm>) -> ApiResult {
    let (categories, _) = fetch_categories(&state).await;
    let mut store = state.store();
    form.submit(&mut store, &categories).map(tasks_response).map_err(error_response)
}

async fn toggle_task(State(state): State<AppState>, Path(id): Path<TaskId>) -> ApiResult {
    let mut store = state.store();
    store.toggle_status(id).map(tasks_response).map_err(error_response)
}

async fn delete_task(State(state): State<AppState>, Path(id): Path<TaskId>) -> ApiResult {
    let mut store = state.store();
    store.delete(id).map(tasks_response).map_err(error_response)
}

async fn list_categories(State(state): State<AppState>) -> Json<CategoriesResponse> {
    let (categories, err) = fetch_categories(&state).await;
    Json(CategoriesResponse { categories, warning: err.map(|e| e.user_message()) })
}

async fn get_theme(State(state): State<AppState>) -> Json<ThemeResponse> {
    state.theme.refresh_from_host();
    let mode = state.theme.current();
    Json(ThemeResponse { mode, palette: mode.palette() })
}

async fn toggle_theme(State(state): State<AppState>) -> Json<ThemeResponse> {
    let mode = state.theme.toggle();
    Json(ThemeResponse { mode, palette: mode.palette() })
}

async fn fetch_categories(state: &AppState) -> (CategorySet, Option<TaskError>) {
    let provider = state.categories.clone();
    match tokio::task::spawn_blocking(move || fetch_or_empty(provider.as_ref())).await {
        Ok(result) => result,
        Err(e) => {
            log::error!("category fetch task failed: {}", e);
            (CategorySet::default(), Some(TaskError::RemoteFetch(e.to_string())))
        }
    }
}
