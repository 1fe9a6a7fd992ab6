//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::ocr::{EngineFactory, EngineHandle, PaddleWorkerFactory, WorkerConfig};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    engine: EngineHandle,
}

impl AppState {
    /// Create state backed by the PaddleOCR worker.
    ///
    /// The worker is not started here; see [`EngineHandle::get`].
    pub fn new(config: Config) -> Self {
        let factory = Arc::new(PaddleWorkerFactory::new(WorkerConfig::from(&config.ocr)));
        Self::with_factory(config, factory)
    }

    /// Create state with a custom engine factory
    pub fn with_factory(config: Config, factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                engine: EngineHandle::new(factory),
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the OCR engine handle
    pub fn engine(&self) -> &EngineHandle {
        &self.inner.engine
    }
}
