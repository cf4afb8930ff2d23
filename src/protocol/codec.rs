use crate::error::{AppError, Result};
use crate::protocol::frames::{DataChunk, Frame, FrameKind};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// Hard ceiling on the payload of one data chunk.
pub const MAX_CHUNK_SIZE: usize = 256 * 1024;

/// MessagePack with named fields (struct-map), at both envelope and
/// payload level, so a plain-object client decoder reads it directly.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    value
        .serialize(&mut rmp_serde::Serializer::new(&mut buf).with_struct_map())
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(buf)
}

/// Decode either level of the protocol; any malformed input is an
/// `InvalidMessage`, whatever the underlying serde failure was.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    rmp_serde::from_slice(bytes).map_err(|_| AppError::InvalidMessage)
}

/// Wrap an already-encoded payload in a fresh envelope.
pub fn encode_frame(kind: FrameKind, payload: Vec<u8>) -> Result<Vec<u8>> {
    let frame = Frame {
        kind,
        id: Uuid::new_v4().to_string(),
        timestamp: chrono::Utc::now().timestamp_millis() as u64,
        payload,
    };
    encode(&frame)
}

/// Cut a sample into ordered data chunks of at most [`MAX_CHUNK_SIZE`]
/// bytes. Lazy: one chunk is materialized per step, so a multi-hundred-MB
/// sample is never duplicated wholesale.
pub fn data_chunks(sample: &[u8]) -> impl Iterator<Item = DataChunk> + '_ {
    let total = sample.len();
    sample.chunks(MAX_CHUNK_SIZE).enumerate().map(move |(i, chunk)| DataChunk {
        offset: i * MAX_CHUNK_SIZE,
        total,
        chunk: chunk.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frames::{ControlCommand, ErrorDetail};

    #[test]
    fn frame_survives_encode_decode() {
        let encoded = encode_frame(FrameKind::Data, vec![1, 2, 3]).unwrap();
        let frame: Frame = decode(&encoded).unwrap();

        assert_eq!(frame.kind, FrameKind::Data);
        assert_eq!(frame.payload, vec![1, 2, 3]);
        assert!(!frame.id.is_empty());
    }

    #[test]
    fn payload_is_decoded_independently_of_envelope() {
        let detail = ErrorDetail {
            code: 400,
            message: "bad".into(),
            details: None,
        };
        let envelope = encode_frame(FrameKind::Error, encode(&detail).unwrap()).unwrap();

        let frame: Frame = decode(&envelope).unwrap();
        let decoded: ErrorDetail = decode(&frame.payload).unwrap();

        assert_eq!(decoded.code, 400);
        assert_eq!(decoded.message, "bad");
    }

    #[test]
    fn client_style_control_frame_decodes() {
        // What a map-based client encoder would produce.
        let control = ControlCommand {
            command: "sample".into(),
            params: Some(serde_json::json!({"sample_size": 2048, "method": "uniform"})),
        };
        let bytes = encode(&control).unwrap();

        let decoded: ControlCommand = decode(&bytes).unwrap();
        assert_eq!(decoded.command, "sample");
    }

    #[test]
    fn garbage_bytes_are_invalid_message() {
        let result: Result<Frame> = decode(&[0xFF, 0x00, 0xAB]);
        assert!(matches!(result, Err(AppError::InvalidMessage)));
    }

    #[test]
    fn unknown_frame_type_is_invalid_message() {
        // Hand-build an envelope whose type tag is not data/control/error.
        let bytes = encode(&serde_json::json!({
            "type": "ping",
            "id": "x",
            "timestamp": 0,
            "payload": [],
        }))
        .unwrap();

        let result: Result<Frame> = decode(&bytes);
        assert!(matches!(result, Err(AppError::InvalidMessage)));
    }

    #[test]
    fn chunks_reassemble_by_offset() {
        let sample: Vec<u8> = (0..MAX_CHUNK_SIZE * 2 + 100).map(|i| (i % 255) as u8).collect();

        let mut rebuilt = vec![0u8; sample.len()];
        let mut count = 0;
        for chunk in data_chunks(&sample) {
            assert!(chunk.chunk.len() <= MAX_CHUNK_SIZE);
            assert_eq!(chunk.total, sample.len());
            rebuilt[chunk.offset..chunk.offset + chunk.chunk.len()].copy_from_slice(&chunk.chunk);
            count += 1;
        }

        assert_eq!(count, 3);
        assert_eq!(rebuilt, sample);
    }

    #[test]
    fn empty_sample_produces_no_chunks() {
        assert_eq!(data_chunks(&[]).count(), 0);
    }
}
