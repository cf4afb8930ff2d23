pub mod cache;
pub mod sampler;
pub mod store;

pub use cache::SampleCache;
pub use sampler::SampleMethod;
pub use store::{FileInfo, FileStore};
