//! EAM OCR Server Library
//!
//! Text recognition over images and PDFs behind a small HTTP API. The OCR
//! model runs in a PaddleOCR worker; this crate normalizes its loosely shaped
//! output into one ordered block of text with an aggregate confidence.
//!
//! # Modules
//!
//! - `ocr`: result normalization, reading order, confidence and the engine
//! - `routes`: HTTP endpoints
//! - `config`: environment-driven configuration

pub mod config;
pub mod error;
pub mod ocr;
pub mod routes;
pub mod state;

pub use routes::app;
