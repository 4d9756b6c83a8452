//! Error types shared across the crate.
//!
//! Validation problems are not errors here: they are returned as
//! [`FieldFailure`](crate::validation::FieldFailure) data so the intake
//! boundary can show them next to the offending field. Everything in this
//! module propagates to the caller.

use std::fmt;

use thiserror::Error;

/// Failures of the asset codec.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset is empty")]
    Empty,

    #[error("unsupported image type `{0}` (expected image/jpeg or image/png)")]
    WrongType(String),

    #[error("asset is not a decodable image: {0}")]
    NotDecodable(String),

    #[error("image encode failed: {0}")]
    Encode(String),

    #[error("invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("failed to read asset: {0}")]
    Io(#[from] std::io::Error),
}

/// The renderer stage that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    /// Building the shared render model (decoding photo/logo).
    Model,
    Markup,
    RasterPhoto,
    RasterLogo,
    RasterEncode,
    DocumentImage,
    DocumentEncode,
    /// The three outputs disagree.
    Parity,
}

impl fmt::Display for RenderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RenderStage::Model => "model",
            RenderStage::Markup => "markup",
            RenderStage::RasterPhoto => "raster photo",
            RenderStage::RasterLogo => "raster logo",
            RenderStage::RasterEncode => "raster encode",
            RenderStage::DocumentImage => "document image",
            RenderStage::DocumentEncode => "document encode",
            RenderStage::Parity => "parity",
        };
        f.write_str(name)
    }
}

/// A render either returns a complete artifact or this.
#[derive(Debug, Error)]
#[error("render failed at {stage} stage: {reason}")]
pub struct RenderError {
    pub stage: RenderStage,
    pub reason: String,
}

impl RenderError {
    pub fn new(stage: RenderStage, reason: impl fmt::Display) -> Self {
        Self {
            stage,
            reason: reason.to_string(),
        }
    }
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("no finalized record is held")]
    NoRecord,

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_error_names_stage() {
        let err = RenderError::new(RenderStage::DocumentImage, "corrupt PNG");
        assert_eq!(
            err.to_string(),
            "render failed at document image stage: corrupt PNG"
        );
    }
}
