//! Resume file validation and plain-text extraction.

use bytes::Bytes;
use tracing::debug;

use crate::errors::AppError;

pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;

pub const TEXT_PLAIN: &str = "text/plain";
pub const PDF: &str = "application/pdf";
pub const MSWORD: &str = "application/msword";
pub const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const ALLOWED_TYPES: [&str; 4] = [TEXT_PLAIN, PDF, MSWORD, DOCX];

/// Picks the declared content type when it is one we accept, otherwise
/// guesses from the file extension (browsers often send octet-stream).
pub fn resolve_content_type(declared: Option<&str>, file_name: &str) -> Option<&'static str> {
    if let Some(declared) = declared {
        let essence = declared.split(';').next().unwrap_or_default().trim();
        if let Some(known) = ALLOWED_TYPES
            .iter()
            .copied()
            .find(|t| t.eq_ignore_ascii_case(essence))
        {
            return Some(known);
        }
    }
    let extension = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match extension.as_str() {
        "txt" => Some(TEXT_PLAIN),
        "pdf" => Some(PDF),
        "doc" => Some(MSWORD),
        "docx" => Some(DOCX),
        _ => None,
    }
}

pub fn validate_file(size: usize, content_type: Option<&str>) -> Result<&'static str, AppError> {
    if size > MAX_RESUME_BYTES {
        return Err(AppError::Validation(
            "File size must be less than 5MB".to_string(),
        ));
    }
    content_type
        .and_then(|ct| ALLOWED_TYPES.iter().copied().find(|t| *t == ct))
        .ok_or_else(|| {
            AppError::Validation("File type must be .txt, .pdf, .doc, or .docx".to_string())
        })
}

/// Extracts readable text. PDF parsing is CPU-bound and runs on the blocking pool.
pub async fn extract_text(content_type: &str, data: Bytes) -> Result<String, AppError> {
    let text = match content_type {
        TEXT_PLAIN => String::from_utf8(data.to_vec()).map_err(|_| {
            AppError::UnprocessableEntity("Resume text is not valid UTF-8".to_string())
        })?,
        PDF => tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
            .await
            .map_err(|e| AppError::Internal(e.into()))?
            .map_err(|e| AppError::UnprocessableEntity(format!("Could not read PDF: {e}")))?,
        _ => {
            return Err(AppError::UnprocessableEntity(
                "Word documents cannot be read yet; upload a PDF or plain text resume".to_string(),
            ))
        }
    };

    let text = collapse_blank_lines(&text);
    if text.is_empty() {
        return Err(AppError::Validation("Resume text is empty".to_string()));
    }
    debug!("Extracted {} characters from {content_type} resume", text.chars().count());
    Ok(text)
}

fn collapse_blank_lines(text: &str) -> String {
    let mut out = Vec::new();
    let mut previous_blank = true;
    for line in text.lines().map(str::trim_end) {
        let blank = line.trim().is_empty();
        if !(blank && previous_blank) {
            out.push(line);
        }
        previous_blank = blank;
    }
    out.join("\n").trim().to_string()
}

/// Human-readable size: `0 Bytes`, `1.5 KB`, `2 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut exponent = 0;
    let mut threshold: u64 = 1024;
    while exponent < UNITS.len() - 1 && bytes >= threshold {
        exponent += 1;
        threshold = threshold.saturating_mul(1024);
    }
    let value = bytes as f64 / 1024_f64.powi(exponent as i32);

    let formatted = format!("{value:.2}");
    let formatted = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{formatted} {}", UNITS[exponent])
}
