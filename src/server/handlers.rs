use crate::config::Config;
use crate::core::{FileInfo, FileStore, SampleCache, SampleMethod};
use crate::error::{AppError, Result};
use axum::{
    extract::{Extension, Multipart, Path},
    response::IntoResponse,
    Json,
};
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Process-wide context, built once at startup and passed into every
/// handler and session. Not a global.
pub struct AppState {
    pub config: Config,
    pub store: Arc<FileStore>,
    pub cache: Arc<SampleCache>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    file_id: String,
    filename: String,
    size: usize,
}

pub async fn upload_file(
    Extension(state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let filename = field.file_name().unwrap_or("unknown").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let file_id = state.store.save_file(&data, &filename).await?;

        return Ok(Json(UploadResponse {
            file_id,
            filename,
            size: data.len(),
        }));
    }

    Err(AppError::BadRequest("No file provided".to_string()))
}

pub async fn get_file_info(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<FileInfo>> {
    let info = state.store.file_info(&id).await?;
    Ok(Json(info))
}

pub async fn delete_file(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    state.store.delete_file(&id).await?;
    Ok(Json(json!({
        "message": "File deleted successfully"
    })))
}

#[derive(Debug, Deserialize)]
pub struct SampleRequestBody {
    sample_size: usize,
    method: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SampleResponse {
    data: String,
    size: usize,
}

/// Synchronous sampling endpoint. Shares the cache with the streaming
/// path, so either surface warms the other.
pub async fn sample_file(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<SampleRequestBody>,
) -> Result<Json<SampleResponse>> {
    if !state.config.sample_size_in_bounds(request.sample_size) {
        return Err(AppError::InvalidSampleSize(request.sample_size));
    }

    let method = match request.method.as_deref() {
        Some(name) => SampleMethod::from_name(name).ok_or_else(|| {
            AppError::BadRequest(format!("unknown sampling method: {}", name))
        })?,
        None => SampleMethod::Uniform,
    };

    let cache_key = SampleCache::make_key(&id, request.sample_size);

    let data = if let Some(cached) = state.cache.get(cache_key) {
        cached
    } else {
        let view = state.store.map_file(&id)?;
        let sample_size = request.sample_size;
        let result = tokio::task::spawn_blocking(move || method.sample(&view[..], sample_size))
            .await
            .map_err(|e| AppError::Internal(e.into()))??;

        let data = Bytes::from(result.data);
        state.cache.put(cache_key, data.clone());
        data
    };

    Ok(Json(SampleResponse {
        data: base64::engine::general_purpose::STANDARD.encode(&data),
        size: data.len(),
    }))
}

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

pub async fn get_metrics(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let cache_stats = state.cache.stats();

    Json(json!({
        "cache_usage": {
            "entries": cache_stats.entries,
            "total_size": cache_stats.total_size,
            "capacity": cache_stats.capacity,
        }
    }))
}
