//! # chm-reader
//!
//! A reader for the content of compiled HTML help (.chm) archives: the
//! table-of-contents and index tree listings, the full-text word-location
//! search index, and codepage-aware page retrieval.
//!
//! The outer archive container is a black box behind the [`Container`]
//! trait; the crate ships an in-memory implementation and one over an
//! unpacked directory tree.
pub mod chm;

// Re-export the main types for convenience
pub use chm::{
    container::{Container, DirContainer, MemoryContainer},
    encoding::{self, EncodingRef},
    models::{BookIcon, EntryKind, ParsedEntry, SearchResult},
    ChmError, ChmFile, Result, DEFAULT_SEARCH_LIMIT,
};
