//! OCR Module
//!
//! Turns the raw, loosely shaped output of an OCR engine into one ordered
//! block of text with an aggregate confidence score.
//!
//! Pipeline: raw pages -> [`detection::normalize`] per detection ->
//! [`geometry::extract_anchor`] -> [`reading_order`] sort ->
//! [`confidence::aggregate_confidence`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use eam_ocr_server::ocr::{process, ReadingOrder};
//!
//! let raw = engine.recognize(path).await?;
//! let result = process(&raw, ReadingOrder::Global);
//! println!("{} ({}%)", result.text, result.confidence_percent);
//! ```

pub mod confidence;
pub mod detection;
pub mod engine;
pub mod geometry;
pub mod pipeline;
pub mod reading_order;
mod types;

pub use engine::{EngineFactory, EngineHandle, OcrEngine, PaddleWorkerFactory, WorkerConfig};
pub use pipeline::process;
pub use types::{Anchor, NormalizedLine, OcrError, OcrResult, ReadingOrder, Skip};
