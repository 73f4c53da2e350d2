#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{Json, Router};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use freeblog_client::Client;
use serde_json::{Value, json};
use tokio::task::JoinHandle;

/// A file part as received by the test server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedFile {
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
struct TestState {
    uploads: Arc<Mutex<Vec<ReceivedFile>>>,
    upload_fields: Arc<Mutex<Vec<(String, String)>>>,
}

/// A freeblog-like API server on a random local port
pub struct TestServer {
    base_url: String,
    state: TestState,
    task: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let state = TestState::default();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("No local addr");
        let router = router(state.clone());

        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Test server failed");
        });

        Self {
            base_url: format!("http://{addr}/"),
            state,
            task,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A client with an empty cookie jar (independent session)
    pub fn client(&self) -> Client {
        Client::builder()
            .base_url(self.base_url.clone())
            .build()
            .expect("Failed to build client")
    }

    pub fn uploads(&self) -> Vec<ReceivedFile> {
        self.state.uploads.lock().expect("locking failed").clone()
    }

    pub fn upload_fields(&self) -> Vec<(String, String)> {
        self.state.upload_fields.lock().expect("locking failed").clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// An address nothing listens on
pub async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    listener.local_addr().expect("No local addr")
}

fn router(state: TestState) -> Router {
    Router::new()
        .route(
            "/api/entry/",
            get(entry_get).post(entry_create).put(entry_replace),
        )
        .route("/api/entries/", get(entries_get))
        .route("/api/files/", get(files_get))
        .route("/api/uploadfiles/", post(upload_files))
        .route("/api/item/{id}", delete(item_delete))
        .route("/api/exec", post(exec_ok))
        .route("/api/exec-fail", post(exec_fail))
        .route("/text", get(|| async { "plain text body" }))
        .route("/garbage", get(|| async { "this is not json" }))
        .route("/boom", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }))
        .route("/login", post(login))
        .with_state(state)
}

fn entry(entryid: i64, title: &str, username: &str) -> Value {
    json!({
        "entryid": entryid,
        "title": title,
        "body": format!("Body of {title}"),
        "createdt": "2024-03-01T10:00:00Z",
        "userid": 1,
        "username": username,
    })
}

async fn entry_get(Query(q): Query<HashMap<String, String>>) -> Response {
    match q.get("id").map(String::as_str) {
        Some("1") => Json(entry(1, "First", "rob")).into_response(),
        Some("500") => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        _ => (StatusCode::NOT_FOUND, "Not found.").into_response(),
    }
}

async fn entry_create(Json(mut e): Json<Value>) -> Response {
    e["entryid"] = json!(42);
    e["createdt"] = json!("2024-03-02T12:00:00Z");
    Json(e).into_response()
}

async fn entry_replace(Json(e): Json<Value>) -> Response {
    if e["entryid"].as_i64().unwrap_or_default() == 0 {
        return (StatusCode::BAD_REQUEST, "missing entryid").into_response();
    }
    Json(e).into_response()
}

async fn entries_get(Query(q): Query<HashMap<String, String>>) -> Response {
    let all = [entry(3, "Third", "ann"), entry(2, "Second", "rob"), entry(1, "First", "rob")];
    let limit = q
        .get("limit")
        .and_then(|l| l.parse::<usize>().ok())
        .unwrap_or(usize::MAX);
    let offset = q
        .get("offset")
        .and_then(|o| o.parse::<usize>().ok())
        .unwrap_or(0);
    let entries: Vec<Value> = all
        .into_iter()
        .filter(|e| q.get("username").is_none_or(|u| e["username"] == u.as_str()))
        .skip(offset)
        .take(limit)
        .collect();
    Json(entries).into_response()
}

async fn files_get(Query(q): Query<HashMap<String, String>>) -> Response {
    let filename = q.get("filename").cloned().unwrap_or_default();
    let files: Vec<Value> = ["notes.txt", "photo.png"]
        .into_iter()
        .filter(|f| f.contains(filename.as_str()))
        .enumerate()
        .map(|(i, f)| {
            json!({
                "fileid": i + 1,
                "filename": f,
                "url": format!("/file/?filename={f}"),
                "createdt": "2024-03-01T10:00:00Z",
                "userid": 1,
                "username": "rob",
            })
        })
        .collect();
    Json(files).into_response()
}

async fn upload_files(State(state): State<TestState>, mut multipart: Multipart) -> Response {
    let mut files = vec![];
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_owned();
        let file_name = field.file_name().map(ToOwned::to_owned);
        match file_name {
            Some(file_name) => {
                let Ok(bytes) = field.bytes().await else {
                    return (StatusCode::BAD_REQUEST, "bad part").into_response();
                };
                files.push(ReceivedFile {
                    field: name,
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            None => {
                let value = field.text().await.unwrap_or_default();
                state
                    .upload_fields
                    .lock()
                    .expect("locking failed")
                    .push((name, value));
            }
        }
    }
    if files.is_empty() {
        return (StatusCode::BAD_REQUEST, "no files").into_response();
    }
    state
        .uploads
        .lock()
        .expect("locking failed")
        .extend(files);
    StatusCode::OK.into_response()
}

async fn item_delete(Path(id): Path<String>) -> Response {
    match id.as_str() {
        "1" => StatusCode::NO_CONTENT.into_response(),
        "locked" => (StatusCode::FORBIDDEN, "item is locked").into_response(),
        _ => (StatusCode::NOT_FOUND, "Not found.").into_response(),
    }
}

async fn exec_ok(Json(_): Json<Value>) -> Response {
    (StatusCode::CREATED, Json(json!({"ignored": true}))).into_response()
}

async fn exec_fail(Json(_): Json<Value>) -> Response {
    (StatusCode::BAD_REQUEST, "bad item").into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    let userid = body["userid"].as_i64().unwrap_or_default();
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, format!("useridtok={userid}|s3cret; Path=/"))],
    )
        .into_response()
}
