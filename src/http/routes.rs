use axum::body::Bytes;
use axum::error_handling::HandleErrorLayer;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::{BoxError, Router};
use serde::Serialize;
use tower::ServiceBuilder;
use uuid::Uuid;

use crate::audio::wav;
use crate::error::{log_pipeline_error, ErrorCode, PipelineError, PipelineStage};
use crate::plot;

use super::pages;
use super::state::AppState;

/// Response header carrying the id of a freshly uploaded clip
pub const CLIP_ID_HEADER: HeaderName = HeaderName::from_static("x-clip-id");

/// HTTP error variants mapped to JSON responses.
#[derive(Debug)]
pub enum HttpServerError {
    Pipeline(PipelineError),
    ClipNotFound(Uuid),
    MissingFile,
    BadRequest(String),
    PayloadTooLarge,
    Internal(String),
}

impl HttpServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Pipeline(err) => match err.stage() {
                PipelineStage::Decode => StatusCode::UNPROCESSABLE_ENTITY,
                PipelineStage::Extraction | PipelineStage::Prediction => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::ClipNotFound(_) => StatusCode::NOT_FOUND,
            Self::MissingFile | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Pipeline(err) => serde_json::json!({
                "error": err.message(),
                "code": err.code(),
                "stage": err.stage(),
            }),
            Self::ClipNotFound(id) => serde_json::json!({ "error": format!("unknown clip {}", id) }),
            Self::MissingFile => serde_json::json!({ "error": "missing multipart field 'file'" }),
            Self::BadRequest(msg) => serde_json::json!({ "error": msg }),
            Self::PayloadTooLarge => serde_json::json!({ "error": "upload too large" }),
            Self::Internal(msg) => serde_json::json!({ "error": msg }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<PipelineError> for HttpServerError {
    fn from(err: PipelineError) -> Self {
        log_pipeline_error(&err, "http");
        Self::Pipeline(err)
    }
}

impl From<MultipartError> for HttpServerError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::BadRequest(err.body_text())
        }
    }
}

impl From<tokio::task::JoinError> for HttpServerError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("worker task failed: {}", err))
    }
}

/// Health endpoint response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_kind: &'static str,
    pub pending_clips: usize,
}

/// One-shot prediction payload.
#[derive(Debug, Serialize)]
pub struct ApiPrediction {
    pub label: String,
    pub header: String,
    pub features_len: usize,
    pub sample_rate: u32,
    pub duration_secs: f32,
}

/// Build the Axum router with all handlers.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes();
    let timeout = state.request_timeout;
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/upload", post(upload))
        .route("/clips/:id/audio", get(clip_audio))
        .route("/clips/:id/predict", post(predict_clip))
        .route("/api/predict", post(api_predict))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout))
                .timeout(timeout),
        )
        .with_state(state)
}

async fn handle_timeout(err: BoxError) -> Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(serde_json::json!({ "error": "request timed out" })),
        )
            .into_response()
    } else {
        HttpServerError::Internal(err.to_string()).into_response()
    }
}

/// First multipart field named `file`, as (client file name, bytes)
async fn read_upload(mut multipart: Multipart) -> Result<(Option<String>, Bytes), HttpServerError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;
        if bytes.is_empty() {
            return Err(HttpServerError::BadRequest("uploaded file is empty".into()));
        }
        return Ok((file_name, bytes));
    }
    Err(HttpServerError::MissingFile)
}

pub async fn index() -> Html<String> {
    Html(pages::index_page())
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model_kind: state.pipeline.classifier().kind(),
        pending_clips: state.clips.len(),
    })
}

pub async fn upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, HttpServerError> {
    let (file_name, bytes) = read_upload(multipart).await?;

    let ingestor = state.ingestor.clone();
    let name = file_name.clone();
    let clip = tokio::task::spawn_blocking(move || {
        ingestor
            .ingest_bytes(bytes.to_vec(), name.as_deref())
            .map_err(PipelineError::from)
    })
    .await??;

    let duration = clip.duration_secs();
    let id = state.clips.insert(clip);
    tracing::info!(clip = %id, file = ?file_name, "clip uploaded");

    let page = pages::uploaded_page(id, file_name.as_deref(), duration);
    let header_value = HeaderValue::from_str(&id.to_string())
        .map_err(|err| HttpServerError::Internal(err.to_string()))?;
    Ok(([(CLIP_ID_HEADER, header_value)], Html(page)).into_response())
}

pub async fn clip_audio(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, HttpServerError> {
    let clip = state.clips.get(id).ok_or(HttpServerError::ClipNotFound(id))?;
    let bytes = tokio::task::spawn_blocking(move || clip.read_bytes())
        .await?
        .map_err(|err| HttpServerError::Internal(err.to_string()))?;
    Ok(([(CONTENT_TYPE, "audio/wav")], bytes).into_response())
}

pub async fn predict_clip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, HttpServerError> {
    // Taken out of the store so its file is deleted once this request finishes
    let clip = state.clips.take(id).ok_or(HttpServerError::ClipNotFound(id))?;

    let pipeline = state.pipeline.clone();
    let plot_config = state.plot.clone();
    let page = tokio::task::spawn_blocking(move || {
        let wave = wav::read_wav(clip.path()).map_err(PipelineError::from)?;
        let report = pipeline.predict_waveform(&wave)?;
        let svg = plot::render_waveform_svg(&wave, &plot_config)
            .map_err(|err| HttpServerError::Internal(format!("{:#}", err)))?;
        let audio = clip
            .read_bytes()
            .map_err(|err| HttpServerError::Internal(err.to_string()))?;
        tracing::info!(clip = %clip.id(), label = %report.label, "prediction complete");
        Ok::<_, HttpServerError>(pages::result_page(&report.header(), &svg, &audio))
    })
    .await??;

    Ok(Html(page))
}

pub async fn api_predict(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ApiPrediction>, HttpServerError> {
    let (file_name, bytes) = read_upload(multipart).await?;

    let pipeline = state.pipeline.clone();
    let ingestor = state.ingestor.clone();
    let report = tokio::task::spawn_blocking(move || {
        pipeline.predict_upload(&ingestor, bytes.to_vec(), file_name.as_deref())
    })
    .await??;

    Ok(Json(ApiPrediction {
        label: report.label.to_string(),
        header: report.header(),
        features_len: report.features.len(),
        sample_rate: report.sample_rate,
        duration_secs: report.duration_secs,
    }))
}
