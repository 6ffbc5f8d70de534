use std::path::PathBuf;

use thiserror::Error;

/// Why a video session aborted.
///
/// Per-frame overlay problems never surface here; they are logged and the
/// frame is written without its overlay.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("failed to prepare output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot open source: {0}")]
    SourceOpen(String),
    #[error("cannot open video writer at {path}: {message}")]
    WriterOpen { path: PathBuf, message: String },
    #[error("failed to read frame: {0}")]
    Read(String),
    #[error("failed to write frame: {0}")]
    Write(String),
    #[error("frame {index} is {}x{}, session expects {}x{}", actual.0, actual.1, expected.0, expected.1)]
    FrameSizeMismatch {
        index: usize,
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("display failed: {0}")]
    Display(String),
}
