//! Error types for the pixlab crate.

use std::path::PathBuf;

/// Errors that can occur during image transform operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source file is missing, has an unsupported extension, or does not
    /// decode into a pixel matrix.
    #[error("invalid image {}: {reason}", path.display())]
    InvalidImage {
        /// Path of the offending file.
        path: PathBuf,
        /// What went wrong (missing, bad extension, decode failure).
        reason: String,
    },

    /// A convolution filter name was not recognized.
    #[error("unsupported convolution filter: {0:?}")]
    UnknownFilter(String),

    /// A watermark extraction / equalization / segmentation / frequency-filter
    /// method name was not recognized.
    #[error("unsupported method: {0:?}")]
    UnknownMethod(String),

    /// A blend direction or curve name was not recognized.
    #[error("unsupported blend mode: {0:?}")]
    UnknownBlendMode(String),

    /// The image format is not supported for writing.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error occurred inside the image codec (decode, encode).
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let invalid = Error::InvalidImage {
            path: PathBuf::from("/tmp/missing.png"),
            reason: "file does not exist".to_string(),
        };
        let msg = invalid.to_string();
        assert!(msg.contains("missing.png"));
        assert!(msg.contains("does not exist"));

        let filter = Error::UnknownFilter("gausian".to_string());
        assert!(filter.to_string().contains("gausian"));

        let io_err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io_err.to_string().contains("gone"));
    }
}
