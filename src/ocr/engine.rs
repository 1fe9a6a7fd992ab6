//! OCR Engine
//!
//! The recognition model is an opaque dependency behind [`OcrEngine`]. The
//! production engine is a long-lived PaddleOCR worker process spoken to over
//! JSON lines on stdin/stdout; it is created lazily by [`EngineHandle`] on the
//! first request that needs it.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;

use super::types::OcrError;
use crate::config::OcrConfig;

/// A ready-to-use recognition engine
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Engine name for logging
    fn name(&self) -> &str;

    /// Run recognition on the file at `path`, returning the engine's raw pages
    async fn recognize(&self, path: &Path) -> Result<Value, OcrError>;
}

/// Creates engines; called at most once at a time by [`EngineHandle`]
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn initialize(&self) -> Result<Arc<dyn OcrEngine>, OcrError>;
}

enum EngineState {
    Uninitialized,
    Ready(Arc<dyn OcrEngine>),
}

/// Process-wide, lazily initialized engine.
///
/// The first caller initializes the engine while holding the state lock, so
/// concurrent first requests wait for a single attempt. A failed attempt leaves
/// the handle uninitialized and the next caller tries again.
pub struct EngineHandle {
    factory: Arc<dyn EngineFactory>,
    state: Mutex<EngineState>,
}

impl EngineHandle {
    pub fn new(factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            factory,
            state: Mutex::new(EngineState::Uninitialized),
        }
    }

    /// Get the engine, initializing it if needed
    pub async fn get(&self) -> Result<Arc<dyn OcrEngine>, OcrError> {
        let mut state = self.state.lock().await;

        if let EngineState::Ready(engine) = &*state {
            return Ok(Arc::clone(engine));
        }

        tracing::info!("Initializing OCR engine...");
        let engine = self.factory.initialize().await.map_err(|e| {
            tracing::error!("Failed to initialize OCR engine: {}", e);
            match e {
                OcrError::EngineInit(_) => e,
                other => OcrError::EngineInit(other.to_string()),
            }
        })?;

        tracing::info!(engine = engine.name(), "OCR engine initialized successfully");
        *state = EngineState::Ready(Arc::clone(&engine));
        Ok(engine)
    }

    /// Whether an engine is currently loaded
    pub async fn is_ready(&self) -> bool {
        matches!(&*self.state.lock().await, EngineState::Ready(_))
    }

    /// Drop `engine` if it is still the current one, forcing re-initialization
    pub async fn invalidate(&self, engine: &Arc<dyn OcrEngine>) {
        let mut state = self.state.lock().await;
        if let EngineState::Ready(current) = &*state {
            if Arc::ptr_eq(current, engine) {
                tracing::warn!(engine = engine.name(), "Discarding OCR engine");
                *state = EngineState::Uninitialized;
            }
        }
    }
}

/// Settings for spawning the worker process
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub program: String,
    pub args: Vec<String>,
    pub lang: String,
    pub request_timeout: Duration,
    pub init_timeout: Duration,
}

impl From<&OcrConfig> for WorkerConfig {
    fn from(config: &OcrConfig) -> Self {
        Self {
            program: config.engine_program.clone(),
            args: config.engine_args.clone(),
            lang: config.lang.clone(),
            request_timeout: Duration::from_secs(config.engine_timeout_secs),
            init_timeout: Duration::from_secs(config.engine_init_timeout_secs),
        }
    }
}

/// Spawns PaddleOCR worker processes
pub struct PaddleWorkerFactory {
    config: WorkerConfig,
}

impl PaddleWorkerFactory {
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }
}

#[derive(Debug, Deserialize)]
struct ReadyMessage {
    ready: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    ok: bool,
    #[serde(default)]
    pages: Value,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl EngineFactory for PaddleWorkerFactory {
    async fn initialize(&self) -> Result<Arc<dyn OcrEngine>, OcrError> {
        let config = &self.config;

        tracing::debug!(
            program = %config.program,
            args = ?config.args,
            lang = %config.lang,
            "Spawning OCR worker"
        );

        let mut child = Command::new(&config.program)
            .args(&config.args)
            .arg("--lang")
            .arg(&config.lang)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                OcrError::EngineInit(format!("Failed to start '{}': {}", config.program, e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| OcrError::EngineInit("Worker stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| OcrError::EngineInit("Worker stdout unavailable".to_string()))?;

        let mut io = WorkerIo {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            broken: false,
        };

        let ready: ReadyMessage = match timeout(config.init_timeout, io.read_message::<ReadyMessage>()).await {
            Ok(Ok(message)) => message,
            Ok(Err(e)) => return Err(OcrError::EngineInit(e.to_string())),
            Err(_) => {
                return Err(OcrError::EngineInit(format!(
                    "Worker not ready after {} seconds",
                    config.init_timeout.as_secs()
                )))
            }
        };

        if !ready.ready {
            return Err(OcrError::EngineInit(
                ready.error.unwrap_or_else(|| "Worker reported not ready".to_string()),
            ));
        }

        Ok(Arc::new(PaddleWorkerEngine {
            io: Mutex::new(io),
            request_timeout: config.request_timeout,
        }))
    }
}

struct WorkerIo {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    /// Set once the request/response stream can no longer be trusted
    broken: bool,
}

impl WorkerIo {
    /// Read the next protocol message, skipping any non-protocol output
    async fn read_message<T: DeserializeOwned>(&mut self) -> Result<T, OcrError> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await
                .map_err(|e| OcrError::WorkerExited(e.to_string()))?;

            let Some(line) = line else {
                let status = self
                    .child
                    .try_wait()
                    .ok()
                    .flatten()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "stdout closed".to_string());
                return Err(OcrError::WorkerExited(status));
            };

            match serde_json::from_str(&line) {
                Ok(message) => return Ok(message),
                Err(_) => tracing::debug!("Ignoring worker output: {}", line),
            }
        }
    }

    async fn request(&mut self, path: &Path) -> Result<Value, OcrError> {
        let mut request = serde_json::json!({ "path": path.to_string_lossy() }).to_string();
        request.push('\n');

        self.stdin
            .write_all(request.as_bytes())
            .await
            .map_err(|e| OcrError::WorkerExited(e.to_string()))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| OcrError::WorkerExited(e.to_string()))?;

        let response = self.read_message::<ResponseMessage>().await?;
        if response.ok {
            Ok(response.pages)
        } else {
            Err(OcrError::Processing(
                response.error.unwrap_or_else(|| "Unknown worker error".to_string()),
            ))
        }
    }
}

/// PaddleOCR running in a worker process; requests are served one at a time
pub struct PaddleWorkerEngine {
    io: Mutex<WorkerIo>,
    request_timeout: Duration,
}

#[async_trait]
impl OcrEngine for PaddleWorkerEngine {
    fn name(&self) -> &str {
        "paddleocr"
    }

    async fn recognize(&self, path: &Path) -> Result<Value, OcrError> {
        let mut io = self.io.lock().await;

        if io.broken {
            return Err(OcrError::WorkerExited("worker is no longer usable".to_string()));
        }

        // Stays set if this future is dropped between the write and the
        // reply, so a late answer is never read by the next caller.
        io.broken = true;

        let result = match timeout(self.request_timeout, io.request(path)).await {
            Ok(result) => result,
            Err(_) => Err(OcrError::Timeout(self.request_timeout.as_secs())),
        };

        io.broken = matches!(&result, Err(e) if e.is_fatal_to_engine());

        result
    }
}
