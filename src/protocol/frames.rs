use serde::{Deserialize, Serialize};

/// Outer envelope of every streamed message. The payload is a second,
/// independently encoded structure picked by `kind`; it is only decoded
/// once the kind is known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    #[serde(rename = "type")]
    pub kind: FrameKind,
    pub id: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    Data,
    Control,
    Error,
}

/// One bounded slice of a sample. Consumers reassemble by `offset`; the
/// wire order of chunks carries no meaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataChunk {
    pub offset: usize,
    pub total: usize,
    #[serde(with = "serde_bytes")]
    pub chunk: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlCommand {
    pub command: String,
    pub params: Option<serde_json::Value>,
}

/// Parameters of the `sample` control command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleParams {
    pub sample_size: usize,
    pub method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: u16,
    pub message: String,
    pub details: Option<serde_json::Value>,
}
