use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use daytrack_core::{ServiceError, TaskService, TaskUpdate};
use daytrack_store::{Section, Task};

type AppState = Arc<TaskService>;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let status = match &err {
            ServiceError::TaskNotFound(_) | ServiceError::DayNotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::InvalidText | ServiceError::InvalidDate(_) => StatusCode::BAD_REQUEST,
            ServiceError::Store(e) => {
                tracing::error!(error = %e, "storage failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = json!({ "success": false, "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

fn default_section() -> Section {
    Section::Backlog
}

#[derive(Debug, Deserialize)]
pub struct AddTaskRequest {
    pub text: String,
    #[serde(default = "default_section")]
    pub status: Section,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub task_id: String,
    pub status: Option<Section>,
    pub new_index: Option<usize>,
    pub text: Option<String>,
    pub flagged: Option<bool>,
    pub done: Option<bool>,
}

impl UpdateTaskRequest {
    fn into_update(self) -> (String, TaskUpdate) {
        let update = TaskUpdate {
            status: self.status,
            new_index: self.new_index,
            text: self.text,
            flagged: self.flagged,
            done: self.done,
        };
        (self.task_id, update)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskIdParams {
    pub task_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AddWeeklyRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub date: Option<String>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(service: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route(
            "/api/tasks",
            get(list_tasks)
                .post(add_task)
                .put(update_task)
                .delete(delete_task),
        )
        .route(
            "/api/today",
            get(today)
                .post(add_task)
                .put(update_task)
                .delete(delete_task),
        )
        .route(
            "/api/weekly",
            get(weekly)
                .post(add_weekly)
                .put(toggle_weekly)
                .delete(delete_weekly),
        )
        .route("/api/history", get(history))
        .layer(CorsLayer::permissive())
        .with_state(service)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(service: AppState, bind: &str, port: u16) -> Result<()> {
    let app = build_router(service);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("daytrack serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("daytrack serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}

// ---------------------------------------------------------------------------
// Handlers: day board
// ---------------------------------------------------------------------------

async fn index(State(service): State<AppState>) -> Result<Response, AppError> {
    let view = service.today().await?;

    let columns: String = Section::ALL
        .iter()
        .map(|&section| {
            let items: String = view
                .tasks
                .section(section)
                .iter()
                .map(|t| format!("<li>{}</li>", render_item(t)))
                .collect();
            format!(
                "<td><h2>{header}</h2><ul>{items}</ul></td>",
                header = escape_html(section.header().trim_start_matches("## ")),
            )
        })
        .collect();

    let html = format!(
        "<!DOCTYPE html>\
<html><head><meta charset=\"utf-8\"><title>daytrack {date}</title></head><body>\
<h1>{date}</h1>\
<p><a href=\"/api/today\">/api/today</a> | <a href=\"/api/weekly\">/api/weekly</a> | <a href=\"/api/history\">/api/history</a></p>\
<table><tr>{columns}</tr></table>\
</body></html>",
        date = view.date,
    );

    Ok(Html(html).into_response())
}

fn render_item(task: &Task) -> String {
    let check = if task.done { "&#9745;" } else { "&#9744;" };
    let flag = if task.flagged { " &#9873;" } else { "" };
    format!("{check} {}{flag}", escape_html(&task.text))
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

async fn list_tasks(State(service): State<AppState>) -> Result<Response, AppError> {
    let board = service.list().await?;
    Ok(Json(board).into_response())
}

async fn today(State(service): State<AppState>) -> Result<Response, AppError> {
    let view = service.today().await?;
    Ok(Json(view).into_response())
}

async fn add_task(
    State(service): State<AppState>,
    body: Result<Json<AddTaskRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = body?;
    let task = service.add(&req.text, req.status).await?;
    Ok(Json(json!({ "success": true, "task": task })).into_response())
}

async fn update_task(
    State(service): State<AppState>,
    body: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = body?;
    let (id, update) = req.into_update();
    service.update(&id, update).await?;
    Ok(Json(json!({ "success": true })).into_response())
}

async fn delete_task(
    State(service): State<AppState>,
    params: Result<Query<TaskIdParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(params) = params?;
    service.delete(&params.task_id).await?;
    Ok(Json(json!({ "success": true })).into_response())
}

// ---------------------------------------------------------------------------
// Handlers: weekly plan
// ---------------------------------------------------------------------------

async fn weekly(State(service): State<AppState>) -> Result<Response, AppError> {
    let plan = service.weekly().await?;
    Ok(Json(plan).into_response())
}

async fn add_weekly(
    State(service): State<AppState>,
    body: Result<Json<AddWeeklyRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = body?;
    let task = service.add_weekly(&req.text).await?;
    Ok(Json(json!({ "success": true, "task": task })).into_response())
}

async fn toggle_weekly(
    State(service): State<AppState>,
    body: Result<Json<TaskIdParams>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = body?;
    let task = service.toggle_weekly(&req.task_id).await?;
    Ok(Json(json!({ "success": true, "task": task })).into_response())
}

async fn delete_weekly(
    State(service): State<AppState>,
    params: Result<Query<TaskIdParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(params) = params?;
    service.delete_weekly(&params.task_id).await?;
    Ok(Json(json!({ "success": true })).into_response())
}

// ---------------------------------------------------------------------------
// Handlers: history
// ---------------------------------------------------------------------------

async fn history(
    State(service): State<AppState>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(params) = params?;
    match params.date {
        Some(date) => {
            let day = service.history_day(&date).await?;
            Ok(Json(day).into_response())
        }
        None => {
            let dates = service.history_dates().await?;
            Ok(Json(json!({ "dates": dates })).into_response())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use daytrack_test_utils::{TestWorkspace, test_date};

    const SEEDED: &str = "\
# 2026-10-15 任务追踪

## 📋 Backlog

- [ ] [#t1] Buy milk
- [ ] [#t2] Walk the dog

## 🚀 In Progress

## ✅ Done

## 💤 睡眠后台任务
";

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    async fn send(
        ws: &TestWorkspace,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let app = super::build_router(ws.service.clone());
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.oneshot(request).await.unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // -----------------------------------------------------------------------
    // /api/tasks
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_list_empty_board() {
        let ws = TestWorkspace::new();

        let resp = send(&ws, Method::GET, "/api/tasks", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["backlog"], json!([]));
        assert_eq!(json["inProgress"], json!([]));
        assert_eq!(json["done"], json!([]));
    }

    #[tokio::test]
    async fn test_add_then_list() {
        let ws = TestWorkspace::new();

        let resp = send(
            &ws,
            Method::POST,
            "/api/tasks",
            Some(json!({ "text": "Buy milk", "status": "backlog" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["task"]["text"], "Buy milk");
        assert_eq!(json["task"]["done"], false);

        let resp = send(&ws, Method::GET, "/api/tasks", None).await;
        let json = body_json(resp).await;
        let backlog = json["backlog"].as_array().expect("backlog should be an array");
        assert_eq!(backlog.len(), 1);
        assert_eq!(backlog[0]["text"], "Buy milk");
        assert_eq!(backlog[0]["done"], false);
    }

    #[tokio::test]
    async fn test_add_into_in_progress() {
        let ws = TestWorkspace::new();

        let resp = send(
            &ws,
            Method::POST,
            "/api/tasks",
            Some(json!({ "text": "Draft", "status": "inProgress" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let board = ws.service.list().await.unwrap();
        assert_eq!(board.in_progress.len(), 1);
    }

    #[tokio::test]
    async fn test_snake_case_status_is_accepted() {
        let ws = TestWorkspace::new();
        ws.write_day(test_date(), SEEDED);

        let resp = send(
            &ws,
            Method::POST,
            "/api/tasks",
            Some(json!({ "text": "Draft", "status": "in_progress" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = send(
            &ws,
            Method::PUT,
            "/api/tasks",
            Some(json!({ "taskId": "t1", "status": "in-progress" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let board = ws.service.list().await.unwrap();
        assert_eq!(board.in_progress.len(), 2);
        assert_eq!(board.in_progress[1].id, "t1");
    }

    #[tokio::test]
    async fn test_add_with_bad_status_is_bad_request() {
        let ws = TestWorkspace::new();

        let resp = send(
            &ws,
            Method::POST,
            "/api/tasks",
            Some(json!({ "text": "x", "status": "someday" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_add_blank_text_is_bad_request() {
        let ws = TestWorkspace::new();

        let resp = send(
            &ws,
            Method::POST,
            "/api/tasks",
            Some(json!({ "text": "   ", "status": "backlog" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_move_task() {
        let ws = TestWorkspace::new();
        ws.write_day(test_date(), SEEDED);

        let resp = send(
            &ws,
            Method::PUT,
            "/api/tasks",
            Some(json!({ "taskId": "t1", "status": "done" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({ "success": true }));

        let resp = send(&ws, Method::GET, "/api/tasks", None).await;
        let json = body_json(resp).await;
        assert_eq!(json["backlog"].as_array().unwrap().len(), 1);
        assert_eq!(json["done"][0]["id"], "t1");
        assert_eq!(json["done"][0]["done"], true);
    }

    #[tokio::test]
    async fn test_move_missing_task_is_not_found() {
        let ws = TestWorkspace::new();
        ws.write_day(test_date(), SEEDED);

        let resp = send(
            &ws,
            Method::PUT,
            "/api/tasks",
            Some(json!({ "taskId": "ghost", "status": "done" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(resp).await,
            json!({ "success": false, "error": "Task not found" })
        );
        assert_eq!(ws.read_day(test_date()), SEEDED);
    }

    #[tokio::test]
    async fn test_update_without_task_id_is_bad_request() {
        let ws = TestWorkspace::new();

        let resp = send(
            &ws,
            Method::PUT,
            "/api/tasks",
            Some(json!({ "status": "done" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_reorder_edit_and_flag() {
        let ws = TestWorkspace::new();
        ws.write_day(test_date(), SEEDED);

        let resp = send(
            &ws,
            Method::PUT,
            "/api/today",
            Some(json!({ "taskId": "t2", "status": "backlog", "newIndex": 0 })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = send(
            &ws,
            Method::PUT,
            "/api/today",
            Some(json!({ "taskId": "t1", "text": "Buy oat milk", "flagged": true })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let board = ws.service.list().await.unwrap();
        assert_eq!(board.backlog[0].id, "t2");
        assert_eq!(board.backlog[1].text, "Buy oat milk");
        assert!(board.backlog[1].flagged);
    }

    #[tokio::test]
    async fn test_delete_task() {
        let ws = TestWorkspace::new();
        ws.write_day(test_date(), SEEDED);

        let resp = send(&ws, Method::DELETE, "/api/tasks?taskId=t1", None).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let board = ws.service.list().await.unwrap();
        assert_eq!(board.backlog.len(), 1);
        assert_eq!(board.backlog[0].id, "t2");
    }

    #[tokio::test]
    async fn test_delete_missing_task_is_not_found() {
        let ws = TestWorkspace::new();

        let resp = send(&ws, Method::DELETE, "/api/tasks?taskId=ghost", None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "Task not found");
    }

    #[tokio::test]
    async fn test_delete_without_query_is_bad_request() {
        let ws = TestWorkspace::new();

        let resp = send(&ws, Method::DELETE, "/api/tasks", None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    // -----------------------------------------------------------------------
    // /api/today, /api/weekly, /api/history, /
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_today_view() {
        let ws = TestWorkspace::new();
        ws.write_day(
            test_date(),
            &format!("{SEEDED}\n- [ ] [#n1] Nightly backup\n"),
        );

        let resp = send(&ws, Method::GET, "/api/today", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["date"], "2026-10-15");
        assert_eq!(json["tasks"]["backlog"].as_array().unwrap().len(), 2);
        assert_eq!(json["botTasks"][0]["id"], "n1");
    }

    #[tokio::test]
    async fn test_weekly_roundtrip() {
        let ws = TestWorkspace::new();

        let resp = send(
            &ws,
            Method::POST,
            "/api/weekly",
            Some(json!({ "text": "Gym three times" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let id = body_json(resp).await["task"]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let resp = send(
            &ws,
            Method::PUT,
            "/api/weekly",
            Some(json!({ "taskId": id })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["task"]["done"], true);

        let resp = send(&ws, Method::GET, "/api/weekly", None).await;
        let json = body_json(resp).await;
        assert_eq!(json["week"], "2026-W42");
        assert_eq!(json["tasks"][0]["done"], true);

        let resp = send(&ws, Method::DELETE, &format!("/api/weekly?taskId={id}"), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = send(&ws, Method::GET, "/api/weekly", None).await;
        assert_eq!(body_json(resp).await["tasks"], json!([]));
    }

    #[tokio::test]
    async fn test_history_dates_and_day() {
        let ws = TestWorkspace::new();
        let yesterday = test_date().pred_opt().unwrap();
        ws.write_day(yesterday, "## ✅ Done\n\n- [x] [#y1] Yesterday's win\n");

        let resp = send(&ws, Method::GET, "/api/history", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({ "dates": ["2026-10-14"] }));

        let resp = send(&ws, Method::GET, "/api/history?date=2026-10-14", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["date"], "2026-10-14");
        assert_eq!(json["tasks"]["done"][0]["text"], "Yesterday's win");
    }

    #[tokio::test]
    async fn test_history_errors() {
        let ws = TestWorkspace::new();

        let resp = send(&ws, Method::GET, "/api/history?date=2020-01-01", None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(&ws, Method::GET, "/api/history?date=bogus", None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_index_returns_html() {
        let ws = TestWorkspace::new();
        ws.service
            .add("<script>alert(1)</script>", daytrack_store::Section::Backlog)
            .await
            .unwrap();

        let resp = send(&ws, Method::GET, "/", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp
            .headers()
            .get("content-type")
            .expect("should have content-type header")
            .to_str()
            .unwrap()
            .to_string();
        assert!(
            content_type.contains("text/html"),
            "content-type should contain text/html, got: {content_type}"
        );
        let bytes = axum::body::to_bytes(resp.into_body(), 1_048_576)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
