//! Shared stub backend for client integration tests.
//!
//! A real axum server on an ephemeral port emulating the gateway's proxy
//! surface, with a scriptable status sequence per status check and counters
//! for asserting call behaviour (sequencing, cancellation, exactly-once
//! list refresh).

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, RawQuery, State};
use axum::http::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use flowbase_core::auth::AuthRequest;
use flowbase_core::job::JobStatus;

/// Fixed CSV payload served by the download endpoint.
pub const DOWNLOAD_BODY: &[u8] = b"email,name\na@b.com,Ana\n";

/// One scripted reply for `GET /jobs/{id}`.
#[derive(Debug, Clone, Copy)]
pub enum ScriptedStatus {
    /// Answer with a job snapshot in this status.
    Ok(JobStatus),
    /// Answer 500 with a non-JSON body.
    Fail,
}

/// Observable state of the stub backend.
#[derive(Default)]
pub struct StubState {
    /// Replies for status checks, consumed front-to-back; the last entry
    /// repeats once the script is exhausted.
    pub status_script: Mutex<VecDeque<ScriptedStatus>>,
    /// Status-check count per job id.
    pub get_calls: Mutex<HashMap<String, usize>>,
    /// `GET /jobs` call count.
    pub list_calls: AtomicUsize,
    /// Raw query string of the most recent `GET /jobs`.
    pub last_list_query: Mutex<Option<String>>,
    /// `Authorization` header of the most recent request, if any.
    pub last_authorization: Mutex<Option<String>>,
    /// Uploads accepted so far (job ids are `job-<n>`).
    pub uploads: AtomicUsize,
    /// Field name, file name, and bytes of the most recent upload.
    pub last_upload: Mutex<Option<(String, String, Vec<u8>)>>,
}

impl StubState {
    pub fn script(&self, entries: impl IntoIterator<Item = ScriptedStatus>) {
        *self.status_script.lock().unwrap() = entries.into_iter().collect();
    }

    pub fn get_calls_for(&self, job_id: &str) -> usize {
        self.get_calls.lock().unwrap().get(job_id).copied().unwrap_or(0)
    }

    pub fn total_get_calls(&self) -> usize {
        self.get_calls.lock().unwrap().values().sum()
    }

    fn record_auth(&self, headers: &HeaderMap) {
        *self.last_authorization.lock().unwrap() = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
    }

    fn next_status(&self) -> ScriptedStatus {
        let mut script = self.status_script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().copied().unwrap_or(ScriptedStatus::Ok(JobStatus::Queued))
        }
    }
}

fn job_json(id: &str, status: JobStatus) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "status": status.as_str(),
        "filename_original": "test.csv",
        "created_at": "2025-08-01T12:00:00",
        "error_message": if status == JobStatus::Failed { Some("conversion failed") } else { None },
    })
}

async fn login(
    State(stub): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<AuthRequest>,
) -> Response {
    stub.record_auth(&headers);
    if body.password == "wrong" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "detail": "invalid credentials" })),
        )
            .into_response();
    }
    Json(serde_json::json!({
        "access_token": "tok-login",
        "token_type": "bearer",
        "user_id": "u1",
    }))
    .into_response()
}

async fn register(
    State(stub): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(_body): Json<AuthRequest>,
) -> Response {
    stub.record_auth(&headers);
    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "access_token": "tok-register",
            "token_type": "bearer",
            "user_id": "u2",
        })),
    )
        .into_response()
}

async fn list_jobs(
    State(stub): State<Arc<StubState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    stub.record_auth(&headers);
    stub.list_calls.fetch_add(1, Ordering::SeqCst);
    *stub.last_list_query.lock().unwrap() = query;
    Json(serde_json::json!({
        "total": 1,
        "limit": 20,
        "offset": 0,
        "jobs": [job_json("job-1", JobStatus::Done)],
    }))
    .into_response()
}

async fn upload(
    State(stub): State<Arc<StubState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    stub.record_auth(&headers);

    let field = match multipart.next_field().await {
        Ok(Some(field)) => field,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "detail": "Nome do arquivo é obrigatório" })),
            )
                .into_response();
        }
    };
    let name = field.name().unwrap_or_default().to_string();
    let file_name = field.file_name().unwrap_or_default().to_string();
    let bytes = field.bytes().await.unwrap_or_default().to_vec();
    *stub.last_upload.lock().unwrap() = Some((name, file_name, bytes));

    let n = stub.uploads.fetch_add(1, Ordering::SeqCst) + 1;
    (
        StatusCode::CREATED,
        Json(job_json(&format!("job-{n}"), JobStatus::Queued)),
    )
        .into_response()
}

async fn get_job(
    State(stub): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    stub.record_auth(&headers);
    *stub.get_calls.lock().unwrap().entry(id.clone()).or_insert(0) += 1;

    match stub.next_status() {
        ScriptedStatus::Ok(status) => Json(job_json(&id, status)).into_response(),
        ScriptedStatus::Fail => {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal meltdown").into_response()
        }
    }
}

async fn preview(State(stub): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    stub.record_auth(&headers);
    Json(serde_json::json!([{ "email": "a@b.com", "name": "Ana" }])).into_response()
}

async fn report(State(stub): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    stub.record_auth(&headers);
    Json(serde_json::json!({ "rows_in": 10, "rows_out": 9 })).into_response()
}

async fn download(State(stub): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    stub.record_auth(&headers);
    (
        [
            (CONTENT_TYPE, "text/csv"),
            (CONTENT_DISPOSITION, "attachment; filename=\"out.csv\""),
        ],
        DOWNLOAD_BODY.to_vec(),
    )
        .into_response()
}

async fn retry(
    State(stub): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    stub.record_auth(&headers);
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "id": id,
            "status": "queued",
            "message": "Job enfileirado para reprocessamento",
        })),
    )
        .into_response()
}

/// Start the stub backend; returns its base URL and shared state.
pub async fn spawn_stub() -> (String, Arc<StubState>) {
    let stub = Arc::new(StubState::default());

    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/jobs", get(list_jobs).post(upload))
        .route("/jobs/{id}", get(get_job))
        .route("/jobs/{id}/preview", get(preview))
        .route("/jobs/{id}/report", get(report))
        .route("/jobs/{id}/download", get(download))
        .route("/jobs/{id}/retry", post(retry))
        .with_state(Arc::clone(&stub));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub backend");
    let addr = listener.local_addr().expect("stub backend addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub backend");
    });

    (format!("http://{addr}"), stub)
}
