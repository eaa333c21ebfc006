//! Custom error types for the chm-reader crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum ChmError {
    /// The archive could not be loaded at all (unreadable container,
    /// missing mandatory `/#SYSTEM` stream, ...).
    #[error("Cannot load archive: {0}")]
    LoadFailed(String),

    /// A TOC, index or search stream is structurally invalid. Parsing stops
    /// at the first such error; no partial result is returned.
    #[error("Malformed {stream} stream: {detail}")]
    Parse {
        stream: &'static str,
        detail: String,
    },

    /// A TOC/index/search stream header carries a layout marker this crate
    /// does not know. Different help compilers emit different sub-layouts;
    /// an unknown marker means guessing, so it is a hard failure.
    #[error("Unknown layout marker {marker:#010x} in {stream} stream")]
    UnknownLayout {
        stream: &'static str,
        marker: u32,
    },

    /// The requested codepage is not in the supported encoding table.
    #[error("Unsupported codepage: {0}")]
    UnsupportedCodepage(u32),

    /// The URL does not resolve to any object inside the archive.
    #[error("No object at {0} in the archive")]
    NotFound(String),

    /// The archive does not carry the stream an operation needs
    /// (no TOC, no index table, no search table).
    #[error("Archive has no {0}")]
    Unavailable(&'static str),
}

/// A convenience `Result` type alias using the crate's `ChmError` type.
pub type Result<T> = std::result::Result<T, ChmError>;
