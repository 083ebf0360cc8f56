use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a watermark removal run.
///
/// Every variant is fatal for the clip: frames are never skipped and the
/// pipeline never retries on its own.
#[derive(Debug, Error)]
pub enum WatermarkError {
    #[error("failed to load watermark template from {path}: {reason}")]
    TemplateLoad { path: PathBuf, reason: String },

    #[error(
        "frame {frame_width}x{frame_height} cannot contain template {template_width}x{template_height}"
    )]
    InvalidFrameDimensions {
        frame_width: u32,
        frame_height: u32,
        template_width: u32,
        template_height: u32,
    },

    #[error("mask {mask_width}x{mask_height} does not match frame {frame_width}x{frame_height}")]
    MaskDimensions {
        frame_width: u32,
        frame_height: u32,
        mask_width: u32,
        mask_height: u32,
    },

    #[error("watermark not found: confidence {confidence:.3} is below threshold {threshold:.3}")]
    WatermarkNotFound { confidence: f64, threshold: f64 },

    #[error("failed to decode input video: {0}")]
    Decode(String),

    #[error("failed to encode output video: {0}")]
    Encode(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("processing cancelled")]
    Cancelled,

    #[error("pipeline already executed")]
    AlreadyExecuted,
}

impl WatermarkError {
    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }

    pub fn encode(err: impl std::fmt::Display) -> Self {
        Self::Encode(err.to_string())
    }
}
