//! Route handlers.

use std::io::{ErrorKind, SeekFrom};
use std::str::FromStr;
use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::multipart::Field;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use reelvault_protocol::{
    ChunkQuery, CompressionStatus, CompressionStatusQuery, MergeRequest, MergeResponse,
    StatusMessage, UploadConfig,
};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::error::ApiError;
use crate::media::content_type_for;
use crate::range::parse_range;
use crate::state::AppState;

const FIELD_IDENTIFIER: &str = "resumableIdentifier";
const FIELD_CHUNK_NUMBER: &str = "resumableChunkNumber";
const FIELD_TOTAL_SIZE: &str = "resumableTotalSize";
const FIELD_FILE: &str = "file";

const VIDEO_NOT_FOUND: &str = "Video not found";

// ---------------------------------------------------------------------------
// Chunks
// ---------------------------------------------------------------------------

/// `POST /upload`: stores one chunk from a multipart body.
///
/// The identifier and chunk number parts must precede the file part so the
/// chunk can be streamed straight to disk.
pub async fn upload_chunk(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<StatusMessage>, ApiError> {
    let mut upload_id: Option<String> = None;
    let mut index: Option<u32> = None;
    let mut declared_total: Option<u64> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FIELD_IDENTIFIER => upload_id = Some(text_field(field, &name).await?),
            FIELD_CHUNK_NUMBER => index = Some(parse_field(field, &name).await?),
            FIELD_TOTAL_SIZE => declared_total = Some(parse_field(field, &name).await?),
            FIELD_FILE => {
                let (Some(upload_id), Some(index)) = (upload_id.as_deref(), index) else {
                    return Err(ApiError::BadRequest(format!(
                        "{FIELD_IDENTIFIER} and {FIELD_CHUNK_NUMBER} must precede the file part"
                    )));
                };
                let existed = state.store.exists(upload_id, index).await;
                let bytes = state
                    .store
                    .put_stream(upload_id, index, declared_total, field)
                    .await?;
                tracing::debug!(upload_id, index, bytes, existed, "chunk received");

                let message = if existed {
                    "Chunk already exists"
                } else {
                    "Chunk uploaded successfully!"
                };
                return Ok(Json(StatusMessage::new(message)));
            }
            _ => {}
        }
    }

    Err(ApiError::BadRequest(format!("missing {FIELD_FILE} part")))
}

async fn text_field(field: Field<'_>, name: &str) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("unreadable {name}: {e}")))
}

async fn parse_field<T: FromStr>(field: Field<'_>, name: &str) -> Result<T, ApiError> {
    let text = text_field(field, name).await?;
    text.trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid {name}: {text}")))
}

/// `GET /upload`: 200 if the chunk is stored, 204 otherwise.
pub async fn probe_chunk(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChunkQuery>,
) -> Response {
    if state
        .store
        .exists(&query.resumable_identifier, query.resumable_chunk_number)
        .await
    {
        (StatusCode::OK, "Chunk exists").into_response()
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

// ---------------------------------------------------------------------------
// Merge and catalog
// ---------------------------------------------------------------------------

/// `POST /merge`: assembles an upload into a named artifact.
pub async fn merge(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MergeRequest>,
) -> Result<Json<MergeResponse>, ApiError> {
    let artifact = state
        .pipeline
        .merge(&req.filename, &req.identifier, req.total_chunks)
        .await
        .map_err(|e| ApiError::from(e).context("Error during file merge"))?;

    Ok(Json(MergeResponse {
        message: "File merged successfully!".into(),
        file_path: artifact.path.display().to_string(),
    }))
}

/// `GET /config`
pub async fn upload_config(State(state): State<Arc<AppState>>) -> Json<UploadConfig> {
    Json(state.upload_config.clone())
}

/// `GET /videos`: every catalogued artifact name.
pub async fn list_artifacts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, ApiError> {
    state
        .catalog
        .list_all()
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("Error reading file list", e))
}

/// `GET /compression-status?filename=`
pub async fn compression_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CompressionStatusQuery>,
) -> Result<Json<CompressionStatus>, ApiError> {
    match state.catalog.compression_status(&query.filename).await {
        Ok(Some(status)) => Ok(Json(status)),
        Ok(None) => Err(ApiError::NotFound("File not found")),
        Err(e) => Err(ApiError::internal("Error reading file list", e)),
    }
}

// ---------------------------------------------------------------------------
// Streaming
// ---------------------------------------------------------------------------

/// `GET /videos/:filename`: the artifact body, honoring a single `Range`.
pub async fn stream_artifact(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let path = state
        .assembler
        .artifact_path(&filename)
        .map_err(|_| ApiError::NotFound(VIDEO_NOT_FOUND))?;

    let mut file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(ApiError::NotFound(VIDEO_NOT_FOUND)),
        Err(e) => return Err(ApiError::internal("Error reading video", e)),
    };
    let meta = file
        .metadata()
        .await
        .map_err(|e| ApiError::internal("Error reading video", e))?;
    if !meta.is_file() {
        return Err(ApiError::NotFound(VIDEO_NOT_FOUND));
    }
    let size = meta.len();

    let range = match headers.get(header::RANGE) {
        None => None,
        Some(value) => {
            let value = value
                .to_str()
                .map_err(|_| ApiError::RangeNotSatisfiable { size })?;
            Some(parse_range(value, size).map_err(|_| ApiError::RangeNotSatisfiable { size })?)
        }
    };

    let builder = Response::builder()
        .header(header::CONTENT_TYPE, content_type_for(&filename))
        .header(header::ACCEPT_RANGES, "bytes");

    let (builder, length) = match range {
        Some(range) => {
            file.seek(SeekFrom::Start(range.start))
                .await
                .map_err(|e| ApiError::internal("Error reading video", e))?;
            tracing::debug!(artifact = %filename, start = range.start, end = range.end, size, "partial stream");
            let builder = builder
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_RANGE, range.content_range(size));
            (builder, range.len())
        }
        None => (builder.status(StatusCode::OK), size),
    };

    let body = Body::from_stream(ReaderStream::new(file.take(length)));
    builder
        .header(header::CONTENT_LENGTH, length)
        .body(body)
        .map_err(|e| ApiError::internal("Error streaming video", e))
}
