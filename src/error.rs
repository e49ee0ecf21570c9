use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::ParseError;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] ParseError),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Browser session unavailable: {0}")]
    Session(String),

    #[error("Element not found: {0}")]
    NotFound(String),

    #[error("Interaction failed: {0}")]
    Interaction(String),

    #[error("Extraction produced no output: {0}")]
    Extraction(String),

    #[error("Render failed: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CaptureError {
    pub fn session(message: impl Into<String>) -> Self {
        CaptureError::Session(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        CaptureError::NotFound(message.into())
    }

    pub fn interaction(message: impl Into<String>) -> Self {
        CaptureError::Interaction(message.into())
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        CaptureError::Extraction(message.into())
    }

    pub fn render(message: impl Into<String>) -> Self {
        CaptureError::Render(message.into())
    }

    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            CaptureError::Io(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Check file paths/permissions for the output directory.",
            ),
            CaptureError::InvalidUrl(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Verify URL/format (e.g., https://example.com).",
            ),
            CaptureError::Image(e) => ErrorPayload::new(
                ErrorCategory::Render,
                e.to_string(),
                "The captured image bytes could not be decoded; retry the target.",
            ),
            CaptureError::Serialization(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Check the targets file / JSON inputs; run with --verbose for details.",
            ),
            CaptureError::Session(msg) => {
                let lower = msg.to_ascii_lowercase();
                if lower.contains("no such file")
                    || lower.contains("not found")
                    || lower.contains("executable")
                {
                    ErrorPayload::new(
                        ErrorCategory::Session,
                        msg.to_string(),
                        "Install Chrome/Chromium or point --chrome at an existing executable.",
                    )
                } else {
                    ErrorPayload::new(
                        ErrorCategory::Session,
                        msg.to_string(),
                        "Verify a headless-capable Chromium is installed and can start on this machine.",
                    )
                }
            }
            CaptureError::NotFound(msg) => ErrorPayload::new(
                ErrorCategory::Locator,
                msg.to_string(),
                "Check the CSS selector / disclosure title against the live page; the element may be behind a different widget.",
            ),
            CaptureError::Interaction(msg) => ErrorPayload::new(
                ErrorCategory::Locator,
                msg.to_string(),
                "The element was found but would not activate; the page may intercept clicks or require scrolling.",
            ),
            CaptureError::Extraction(msg) => ErrorPayload::new(
                ErrorCategory::Extraction,
                msg.to_string(),
                "The target produced no markup; it may have been detached between discovery and extraction.",
            ),
            CaptureError::Render(msg) => {
                if msg.to_ascii_lowercase().contains("timeout") {
                    ErrorPayload::new(
                        ErrorCategory::Render,
                        msg.to_string(),
                        "Try increasing --nav-timeout/--element-timeout, and ensure the page loads without blocking.",
                    )
                } else {
                    ErrorPayload::new(
                        ErrorCategory::Render,
                        msg.to_string(),
                        "The preview document failed to load or its capture root never appeared.",
                    )
                }
            }
            CaptureError::Config(msg) => ErrorPayload::new(
                ErrorCategory::Config,
                msg.to_string(),
                "Check flags/paths (e.g., --viewport WIDTHxHEIGHT) and the config file.",
            ),
        }
    }
}

pub type Result<T> = std::result::Result<T, CaptureError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Session,
    Locator,
    Extraction,
    Render,
    Config,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorPayload {
    pub fn new(category: ErrorCategory, message: String, remediation: impl Into<String>) -> Self {
        Self {
            category,
            message,
            remediation: Some(remediation.into()),
        }
    }
}
