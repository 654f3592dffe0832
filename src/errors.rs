use thiserror::Error;

/// Fatal failures of the codec core.
///
/// Only conditions that stop a pipeline outright live here. Per-frame
/// corruption, unrecoverable chunks and checksum mismatches are expected
/// during a lossy capture and are reported through the decode report instead.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Stream header missing, unparseable, or from an unknown version.
    /// Decoding cannot start without it.
    #[error("format error: {0}")]
    Format(String),

    /// The frame geometry cannot carry the requested payload.
    /// Encoding cannot start with such a configuration.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Propagated I/O error from the frame-file boundary.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame image could not be written or read back.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
