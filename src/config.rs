use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
    #[serde(default = "default_min_sample_size")]
    pub min_sample_size: usize,
    #[serde(default = "default_max_sample_size")]
    pub max_sample_size: usize,
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

fn default_port() -> u16 {
    3000
}
fn default_upload_dir() -> PathBuf {
    PathBuf::from("./uploads")
}
fn default_max_file_size() -> usize {
    10 * 1024 * 1024 * 1024 // 10GB
}
fn default_min_sample_size() -> usize {
    1024 * 1024 // 1MB
}
fn default_max_sample_size() -> usize {
    128 * 1024 * 1024 // 128MB
}
fn default_cache_size() -> usize {
    512 * 1024 * 1024 // 512MB
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let config = Self {
            port: env_parse("PORT").unwrap_or_else(default_port),
            upload_dir: std::env::var("UPLOAD_DIR")
                .ok()
                .map(PathBuf::from)
                .unwrap_or_else(default_upload_dir),
            max_file_size: env_parse("MAX_FILE_SIZE").unwrap_or_else(default_max_file_size),
            min_sample_size: env_parse("MIN_SAMPLE_SIZE").unwrap_or_else(default_min_sample_size),
            max_sample_size: env_parse("MAX_SAMPLE_SIZE").unwrap_or_else(default_max_sample_size),
            cache_size: env_parse("CACHE_SIZE").unwrap_or_else(default_cache_size),
        };

        Ok(config)
    }

    /// Inclusive bounds check applied on both the HTTP and streaming paths.
    pub fn sample_size_in_bounds(&self, size: usize) -> bool {
        size >= self.min_sample_size && size <= self.max_sample_size
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            upload_dir: default_upload_dir(),
            max_file_size: default_max_file_size(),
            min_sample_size: default_min_sample_size(),
            max_sample_size: default_max_sample_size(),
            cache_size: default_cache_size(),
        }
    }
}
