//! HTTP route handlers for the UI API.

use std::io;
use std::path::Path as FsPath;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use explorer::core::artifact::{ArtifactKind, ArtifactStatus, ArtifactTarget};
use explorer::core::level::Level;
use explorer::core::resolver::{AggregateArtifact, ArtifactQuery, RunArtifact};
use explorer::core::selection::OptionSet;
use explorer::explorer::{LevelOptions, RootStatus, SelectionRequest};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::state::AppState;

/// Build the API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(get_status))
        .route("/subjects", get(get_subjects))
        .route("/options/{level}", get(get_options))
        .route("/artifacts", get(get_artifact))
        .route("/gallery", get(get_gallery))
        .route("/image", get(get_image))
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    error: String,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            error: message.into(),
        }),
    )
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    root: RootStatus,
    results_dir: String,
}

/// GET /api/status - whether the results root exists yet.
async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        root: state.explorer.root_status(),
        results_dir: state.results_dir().display().to_string(),
    })
}

#[derive(Debug, Serialize)]
pub struct SubjectsResponse {
    root: RootStatus,
    subjects: OptionSet,
}

/// GET /api/subjects - subjects under the results root.
async fn get_subjects(State(state): State<AppState>) -> Json<SubjectsResponse> {
    Json(SubjectsResponse {
        root: state.explorer.root_status(),
        subjects: state.explorer.get_subjects(),
    })
}

/// GET /api/options/:level - options for a level below the given selection.
///
/// The returned selection is the request revalidated against the live tree;
/// values that vanished are dropped with everything deeper.
async fn get_options(
    State(state): State<AppState>,
    Path(level): Path<Level>,
    Query(request): Query<SelectionRequest>,
) -> ApiResult<Json<LevelOptions>> {
    state
        .explorer
        .get_options(level, &request)
        .map(Json)
        .map_err(|err| bad_request(err.to_string()))
}

/// Query string naming one artifact below a contrast.
#[derive(Debug, Deserialize)]
pub struct ArtifactParams {
    subject: String,
    method: String,
    contrast: String,
    kind: Option<ArtifactKind>,
    run: Option<String>,
}

impl ArtifactParams {
    fn query(self) -> ApiResult<ArtifactQuery> {
        let target = match (self.kind, self.run) {
            (Some(kind), None) => ArtifactTarget::Aggregate(kind),
            (None, Some(run)) => ArtifactTarget::Run(run),
            _ => return Err(bad_request("exactly one of kind or run is required")),
        };
        Ok(ArtifactQuery {
            subject: self.subject,
            method: self.method,
            contrast: self.contrast,
            target,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ArtifactResponse {
    query: ArtifactQuery,
    artifact: ArtifactStatus,
}

/// GET /api/artifacts - resolve one artifact to ready, missing or pending.
async fn get_artifact(
    State(state): State<AppState>,
    Query(params): Query<ArtifactParams>,
) -> ApiResult<Json<ArtifactResponse>> {
    let query = params.query()?;
    let artifact = state
        .explorer
        .resolve_query(&query)
        .map_err(|err| bad_request(err.to_string()))?;
    Ok(Json(ArtifactResponse { query, artifact }))
}

#[derive(Debug, Deserialize)]
pub struct ContrastParams {
    subject: String,
    method: String,
    contrast: String,
}

#[derive(Debug, Serialize)]
pub struct GalleryResponse {
    aggregate: Vec<AggregateArtifact>,
    runs: Vec<RunArtifact>,
}

/// GET /api/gallery - every aggregate map and every run of a contrast.
async fn get_gallery(
    State(state): State<AppState>,
    Query(params): Query<ContrastParams>,
) -> ApiResult<Json<GalleryResponse>> {
    let path = [
        params.subject.as_str(),
        params.method.as_str(),
        params.contrast.as_str(),
    ];
    let aggregate = state
        .explorer
        .aggregate_gallery_at(path)
        .map_err(|err| bad_request(err.to_string()))?;
    let runs = state
        .explorer
        .run_gallery_at(path)
        .map_err(|err| bad_request(err.to_string()))?;
    Ok(Json(GalleryResponse { aggregate, runs }))
}

/// GET /api/image - raw bytes of a ready artifact.
///
/// Missing answers `404`, pending answers `202` so a viewer can keep polling.
/// A query that could never become ready answers `400`.
async fn get_image(
    State(state): State<AppState>,
    Query(params): Query<ArtifactParams>,
) -> ApiResult<Response> {
    let query = params.query()?;
    let status = state
        .explorer
        .resolve_query(&query)
        .map_err(|err| bad_request(err.to_string()))?;
    let locator = match &status {
        ArtifactStatus::Ready { locator } => locator,
        ArtifactStatus::Missing => {
            return Ok(status_response(StatusCode::NOT_FOUND, query, ArtifactStatus::Missing));
        }
        ArtifactStatus::Pending => {
            return Ok(status_response(StatusCode::ACCEPTED, query, ArtifactStatus::Pending));
        }
    };

    match tokio::fs::read(locator).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, content_type(locator))], bytes).into_response()),
        // Removed between resolution and read.
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %locator.display(), "artifact vanished before read");
            Ok(status_response(StatusCode::NOT_FOUND, query, ArtifactStatus::Missing))
        }
        Err(err) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError {
                error: format!("read {}: {err}", locator.display()),
            }),
        )),
    }
}

fn status_response(code: StatusCode, query: ArtifactQuery, artifact: ArtifactStatus) -> Response {
    (code, Json(ArtifactResponse { query, artifact })).into_response()
}

fn content_type(path: &FsPath) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
