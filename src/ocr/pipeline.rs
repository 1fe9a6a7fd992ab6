//! Raw engine output to final text

use serde_json::Value;

use super::confidence::aggregate_confidence;
use super::reading_order::{collect_lines, sort_lines};
use super::types::{OcrResult, ReadingOrder};

const TEXT_PREVIEW_CHARS: usize = 200;

/// Turn untrusted raw pages into one ordered text block and a confidence score.
pub fn process(raw_pages: &Value, order: ReadingOrder) -> OcrResult {
    let page_count = raw_pages.as_array().map_or(0, Vec::len);

    let mut lines = collect_lines(raw_pages);
    let confidence_percent = aggregate_confidence(&lines);
    sort_lines(&mut lines, order);

    let line_count = lines.len();
    let text = lines
        .into_iter()
        .map(|line| line.text)
        .collect::<Vec<_>>()
        .join("\n");

    tracing::info!(
        pages = page_count,
        "OCR complete. Extracted {} text segments, avg confidence: {:.2}%",
        line_count,
        confidence_percent
    );

    if text.is_empty() {
        tracing::warn!("No text extracted from image");
    } else {
        let preview: String = text
            .chars()
            .take(TEXT_PREVIEW_CHARS)
            .map(|c| if c == '\n' { ' ' } else { c })
            .collect();
        tracing::debug!("Text preview: {}...", preview);
    }

    OcrResult {
        text,
        confidence_percent,
        line_count,
        page_count,
    }
}
