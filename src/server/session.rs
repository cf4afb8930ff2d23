use crate::core::{SampleCache, SampleMethod};
use crate::error::{AppError, Result};
use crate::protocol::{codec, ControlCommand, ErrorDetail, Frame, FrameKind, SampleParams};
use crate::server::handlers::AppState;
use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        Extension, Path,
    },
    response::Response,
};
use bytes::Bytes;
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Outbound queue slots per session. A slow consumer fills these and then
/// blocks its own session's reader, never anyone else's.
const OUTBOUND_QUEUE_SLOTS: usize = 64;

/// Fixed pause between data chunks, the only send-rate limiting there is.
const INTER_CHUNK_DELAY: Duration = Duration::from_millis(10);

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Extension(state): Extension<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Response {
    ws.on_upgrade(move |socket| run_session(socket, state, file_id))
}

/// One session per accepted socket, two duties: a writer draining the
/// bounded outbound queue onto the wire, and a reader decoding inbound
/// frames and serving `sample` commands. Whichever duty ends first takes
/// the whole session down with it.
async fn run_session(socket: WebSocket, state: Arc<AppState>, file_id: String) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(OUTBOUND_QUEUE_SLOTS);

    let mut writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(WsMessage::Binary(frame)).await.is_err() {
                break;
            }
        }
    });

    let reader_state = state.clone();
    let reader_tx = tx.clone();
    let reader_file = file_id.clone();
    let mut reader = tokio::spawn(async move {
        while let Some(msg) = stream.next().await {
            match msg {
                Ok(WsMessage::Binary(data)) => {
                    if let Err(e) =
                        handle_frame(&reader_state, &reader_file, &data, &reader_tx).await
                    {
                        error!(file_id = %reader_file, error = %e, "session error");
                        // One error frame, then fast-fail.
                        let _ = send_error(&reader_tx, &e).await;
                        break;
                    }
                }
                Ok(WsMessage::Close(_)) => break,
                Err(e) => {
                    error!(file_id = %reader_file, error = %e, "websocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut writer => {
            reader.abort();
        }
        _ = &mut reader => {
            // Close the queue so the writer flushes what is already
            // enqueued (an error frame, usually) and then exits.
            drop(tx);
            let _ = (&mut writer).await;
        }
    }

    info!(%file_id, "session closed");
}

async fn handle_frame(
    state: &Arc<AppState>,
    file_id: &str,
    data: &[u8],
    tx: &mpsc::Sender<Vec<u8>>,
) -> Result<()> {
    let frame: Frame = codec::decode(data)?;

    match frame.kind {
        FrameKind::Control => {
            let control: ControlCommand = codec::decode(&frame.payload)?;

            match control.command.as_str() {
                "sample" => {
                    let params = control
                        .params
                        .ok_or_else(|| AppError::BadRequest("missing sample parameters".into()))?;
                    let params: SampleParams = serde_json::from_value(params)
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;

                    let method = match params.method.as_deref() {
                        Some(name) => SampleMethod::from_name(name).ok_or_else(|| {
                            AppError::BadRequest(format!("unknown sampling method: {}", name))
                        })?,
                        None => SampleMethod::Uniform,
                    };

                    let sample =
                        fetch_or_sample(state, file_id, params.sample_size, method).await?;
                    stream_sample(tx, sample).await?;
                }
                // Unknown commands are a protocol violation, not a no-op.
                _ => return Err(AppError::InvalidMessage),
            }
        }
        _ => return Err(AppError::InvalidMessage),
    }

    Ok(())
}

/// Cache-or-compute. Sampling runs outside the cache lock, so a slow
/// extraction never blocks other sessions' cache traffic.
async fn fetch_or_sample(
    state: &Arc<AppState>,
    file_id: &str,
    sample_size: usize,
    method: SampleMethod,
) -> Result<Bytes> {
    if !state.config.sample_size_in_bounds(sample_size) {
        return Err(AppError::InvalidSampleSize(sample_size));
    }

    let key = SampleCache::make_key(file_id, sample_size);
    if let Some(cached) = state.cache.get(key) {
        info!(%file_id, sample_size, "cache hit");
        return Ok(cached);
    }

    let view = state.store.map_file(file_id)?;
    // Window extraction is rayon-parallel CPU work over a view whose page
    // faults can touch gigabytes; keep it off the reactor threads.
    let result = tokio::task::spawn_blocking(move || method.sample(&view[..], sample_size))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;
    info!(
        %file_id,
        sample_size = result.metadata.sample_size,
        method = %result.metadata.method,
        "sampled"
    );

    let data = Bytes::from(result.data);
    state.cache.put(key, data.clone());

    Ok(data)
}

async fn stream_sample(tx: &mpsc::Sender<Vec<u8>>, sample: Bytes) -> Result<()> {
    for chunk in codec::data_chunks(&sample) {
        let payload = codec::encode(&chunk)?;
        let frame = codec::encode_frame(FrameKind::Data, payload)?;

        tx.send(frame).await.map_err(|_| AppError::ConnectionClosed)?;

        tokio::time::sleep(INTER_CHUNK_DELAY).await;
    }

    Ok(())
}

async fn send_error(tx: &mpsc::Sender<Vec<u8>>, error: &AppError) -> Result<()> {
    let detail = ErrorDetail {
        code: error.status().as_u16(),
        message: error.to_string(),
        details: None,
    };

    let frame = codec::encode_frame(FrameKind::Error, codec::encode(&detail)?)?;

    tx.send(frame).await.map_err(|_| AppError::ConnectionClosed)?;

    Ok(())
}
