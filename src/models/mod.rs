pub mod config;

pub use config::{AppConfig, DEFAULT_MAX_UPLOAD_BYTES};
