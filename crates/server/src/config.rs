use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Environment variable naming the TOML config file.
pub const CONFIG_ENV: &str = "CENTIMO_CONFIG";

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Cap on the uploaded file itself; the request-body layer allows a
    /// little extra for the multipart envelope.
    pub max_upload_bytes: usize,
    /// Optional TOML keyword catalog replacing the built-in rules.
    pub rules_path: Option<PathBuf>,
    pub ocr: OcrConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8710)),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            rules_path: None,
            ocr: OcrConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// "mock" or "tesseract".
    pub backend: String,
    /// Tesseract language spec, e.g. "spa+eng".
    pub lang: String,
    /// Tessdata directory; None lets Tesseract use its compiled-in path.
    pub data_path: Option<String>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            backend: "mock".to_string(),
            lang: "spa+eng".to_string(),
            data_path: None,
        }
    }
}

impl ServerConfig {
    /// Reads the file named by `CENTIMO_CONFIG`, or falls back to defaults
    /// when the variable is unset.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(Path::new(&path)),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = toml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }
}
