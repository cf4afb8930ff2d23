pub mod codec;
pub mod frames;

pub use codec::MAX_CHUNK_SIZE;
pub use frames::{ControlCommand, DataChunk, ErrorDetail, Frame, FrameKind, SampleParams};
