use panel_encode::ResizeFilter;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

/// Default upload body limit (20 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Application configuration loaded from config.yaml
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Directory receiving image.bin, image.h, stats.json and preview.png
    pub output_dir: PathBuf,

    /// Maximum accepted request body for uploads
    pub max_upload_bytes: usize,

    /// Resampling filter used to fit uploads onto the canvas
    #[serde(deserialize_with = "deserialize_filter")]
    pub resize_filter: ResizeFilter,

    /// Also write the dithered preview as preview.png
    pub save_preview: bool,

    /// External command replacing the built-in canvas normalizer
    pub normalize_command: Option<Vec<String>>,

    /// External command replacing the built-in quantizer
    pub quantize_command: Option<Vec<String>>,
}

fn deserialize_filter<'de, D>(deserializer: D) -> Result<ResizeFilter, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    name.parse().map_err(serde::de::Error::custom)
}

impl AppConfig {
    /// Load configuration from a YAML file, falling back to defaults
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            tracing::debug!("No config file configured, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(content) => match Self::parse(&content) {
                Ok(config) => {
                    tracing::info!(
                        path = %path.display(),
                        output_dir = %config.output_dir.display(),
                        filter = %config.resize_filter,
                        "Loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    tracing::warn!(%e, path = %path.display(), "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(%e, path = %path.display(), "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    /// Load from `CONFIG_FILE`, then apply the `OUTPUT_DIR` override
    pub fn from_env() -> Self {
        let config_file = std::env::var("CONFIG_FILE").ok().map(PathBuf::from);
        let mut config = Self::load(config_file.as_deref());
        if let Ok(dir) = std::env::var("OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        config
    }

    /// Parse a YAML document
    pub fn parse(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            resize_filter: ResizeFilter::default(),
            save_preview: false,
            normalize_command: None,
            quantize_command: None,
        }
    }
}
