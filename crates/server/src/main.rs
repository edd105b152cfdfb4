use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use centimo_import::{DocumentParser, KeywordCatalog};
use centimo_ocr::{MockRecognizer, OcrBackend};

mod config;
mod error;
mod routes;

use config::{OcrConfig, ServerConfig};
use routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "centimo=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::load()?;
    let catalog = load_catalog(&config)?;
    let backend = build_backend(&config.ocr)?;
    info!(backend = backend.name(), "OCR backend ready");

    let addr = config.listen_addr;
    let state = Arc::new(AppState {
        parser: DocumentParser::new(backend),
        catalog,
        config,
    });
    let app = routes::app(state);

    info!("centimo import service listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("centimo import service stopped");
    Ok(())
}

fn load_catalog(config: &ServerConfig) -> anyhow::Result<KeywordCatalog> {
    match &config.rules_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading keyword rules {}", path.display()))?;
            let catalog = KeywordCatalog::from_toml(&raw)
                .with_context(|| format!("parsing keyword rules {}", path.display()))?;
            info!(rules = %path.display(), "keyword catalog loaded");
            Ok(catalog)
        }
        None => Ok(KeywordCatalog::default()),
    }
}

fn build_backend(config: &OcrConfig) -> anyhow::Result<Box<dyn OcrBackend>> {
    match config.backend.as_str() {
        "mock" => Ok(Box::new(MockRecognizer::new(""))),
        "tesseract" => {
            #[cfg(feature = "tesseract")]
            {
                Ok(Box::new(centimo_ocr::TesseractRecognizer::new(
                    config.data_path.clone(),
                    &config.lang,
                )))
            }
            #[cfg(not(feature = "tesseract"))]
            {
                anyhow::bail!("OCR backend \"tesseract\" requires building with --features tesseract")
            }
        }
        other => anyhow::bail!("Unknown OCR backend {other:?} (expected \"mock\" or \"tesseract\")"),
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(error) => {
            warn!(%error, "could not install the shutdown handler; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_backend_is_always_available() {
        let backend = build_backend(&OcrConfig::default()).unwrap();
        assert_eq!(backend.name(), "mock");
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let config = OcrConfig {
            backend: "azure".into(),
            ..OcrConfig::default()
        };
        assert!(build_backend(&config).is_err());
    }

    #[cfg(not(feature = "tesseract"))]
    #[test]
    fn tesseract_backend_requires_the_feature() {
        let config = OcrConfig {
            backend: "tesseract".into(),
            ..OcrConfig::default()
        };
        let err = build_backend(&config).err().unwrap();
        assert!(err.to_string().contains("tesseract"));
    }
}
