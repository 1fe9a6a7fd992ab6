//! OCR Types
//!
//! Defines the values flowing through the recognition pipeline and the
//! errors raised by the OCR engine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sortable position of a detection, approximating its top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Anchor {
    pub y: f64,
    pub x: f64,
}

impl Anchor {
    pub fn new(y: f64, x: f64) -> Self {
        Self { y, x }
    }
}

/// One accepted detection, ready for ordering
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLine {
    /// Recognized text, trimmed and never empty
    pub text: String,
    /// Engine-reported confidence (normally 0-1)
    pub confidence: f64,
    pub anchor: Anchor,
    /// Zero-based index of the page the detection came from
    pub page: usize,
}

/// Why a raw detection was not turned into a line
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Skip {
    #[error("unexpected detection format: {0}")]
    UnknownShape(String),

    #[error("unexpected text info format: {0}")]
    UnknownTextInfo(String),

    #[error("invalid confidence value: {0}")]
    InvalidConfidence(String),

    #[error("empty text")]
    EmptyText,
}

/// How lines from different pages are ordered relative to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadingOrder {
    /// Sort every line by position alone; pages may interleave
    #[default]
    Global,
    /// Keep pages contiguous, sorting by position within each page
    PerPage,
}

impl FromStr for ReadingOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(Self::Global),
            "per-page" | "per_page" | "page" => Ok(Self::PerPage),
            other => Err(format!("unknown reading order '{}'", other)),
        }
    }
}

/// Final pipeline output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OcrResult {
    /// Lines joined with newlines, in reading order
    pub text: String,
    /// Mean confidence as a percentage, rounded to 2 decimals
    #[serde(rename = "confidence")]
    pub confidence_percent: f64,
    #[serde(skip)]
    pub line_count: usize,
    #[serde(skip)]
    pub page_count: usize,
}

/// OCR engine error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("Failed to initialize OCR engine: {0}")]
    EngineInit(String),

    #[error("OCR processing failed: {0}")]
    Processing(String),

    #[error("OCR engine timed out after {0} seconds")]
    Timeout(u64),

    #[error("OCR worker exited: {0}")]
    WorkerExited(String),
}

impl OcrError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        axum::http::StatusCode::INTERNAL_SERVER_ERROR
    }

    /// Whether the engine behind this error can no longer serve requests
    pub fn is_fatal_to_engine(&self) -> bool {
        matches!(self, Self::WorkerExited(_) | Self::Timeout(_))
    }
}
