//! Core CHM archive content module.

pub mod container;
pub mod encoding;
pub mod error;
pub mod models;

mod content;
mod entries;
mod search;
mod system;
mod utils;

use log::info;

use container::Container;
use encoding::EncodingRef;
use models::{EntryKind, ParsedEntry, SearchResult};
use search::SearchIndex;

pub use error::{ChmError, Result};
pub use search::DEFAULT_SEARCH_LIMIT;

const SYSTEM_STREAM: &str = "/#SYSTEM";
const TOC_STREAM: &str = "/#TOCIDX";
const INDEX_STREAM: &str = "/#IDXHDR";
const SEARCH_STREAM: &str = "/$FIftiMain";

/// A loaded CHM archive.
///
/// Owns the container and every cached derived structure; dropping the
/// value releases everything. Loading a different archive means
/// constructing a new `ChmFile`, which is what guarantees no state leaks
/// from one archive into the next.
///
/// All operations are synchronous and single-threaded; the type holds no
/// locks and spawns nothing.
pub struct ChmFile<C: Container> {
    container: C,
    title: String,
    home_url: String,
    has_toc: bool,
    has_index: bool,
    has_search: bool,
    encoding: EncodingRef,
    /// Built on the first query, kept for the life of the archive.
    search_index: Option<SearchIndex>,
}

impl<C: Container> ChmFile<C> {
    /// Load an archive from a container.
    ///
    /// Parses the `/#SYSTEM` stream, autodetects the text encoding from the
    /// archive's language id (falling back to Windows-1252) and records
    /// which optional streams are present. Atomic: on any failure no
    /// archive value exists at all.
    ///
    /// # Errors
    /// Returns [`ChmError::LoadFailed`] if the container has no readable
    /// `/#SYSTEM` stream.
    pub fn load(container: C) -> Result<Self> {
        let raw = container
            .resolve(SYSTEM_STREAM)
            .ok_or_else(|| ChmError::LoadFailed("missing /#SYSTEM stream".to_string()))?;
        let info = system::parse(&raw)?;

        let encoding = info
            .lcid
            .and_then(encoding::for_lcid)
            .unwrap_or_else(encoding::default_encoding);

        let title = info
            .title
            .map(|bytes| content::decode_text(&bytes, encoding.encoding()))
            .unwrap_or_default();
        let home_url = info
            .home_url
            .map(|bytes| content::normalize_url(&content::decode_text(&bytes, encoding.encoding())))
            .unwrap_or_else(|| "/".to_string());

        let archive = Self {
            has_toc: container.exists(TOC_STREAM),
            has_index: container.exists(INDEX_STREAM),
            has_search: container.exists(SEARCH_STREAM),
            container,
            title,
            home_url,
            encoding,
            search_index: None,
        };
        info!(
            "Archive loaded: title={:?}, home={}, encoding={} (cp{}), toc={}, index={}, search={}",
            archive.title,
            archive.home_url,
            archive.encoding.name(),
            archive.encoding.codepage(),
            archive.has_toc,
            archive.has_index,
            archive.has_search
        );
        Ok(archive)
    }

    /// Close the archive, releasing the container and all caches.
    /// Equivalent to dropping the value.
    pub fn close(self) {}

    /// The archive title from the system stream; empty if none was recorded.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The default page, absolute with a leading `/`.
    pub fn home_url(&self) -> &str {
        &self.home_url
    }

    /// Whether the archive carries a table of contents.
    pub fn has_table_of_contents(&self) -> bool {
        self.has_toc
    }

    /// Whether the archive carries an index table.
    pub fn has_index_table(&self) -> bool {
        self.has_index
    }

    /// Whether the archive carries a full-text search index. Without it,
    /// [`search_query`](Self::search_query) is unavailable.
    pub fn has_search_table(&self) -> bool {
        self.has_search
    }

    /// The current text encoding (autodetected at load, or as overridden).
    pub fn current_encoding(&self) -> EncodingRef {
        self.encoding
    }

    /// Override the text encoding.
    ///
    /// Structures already parsed or cached (TOC, index, the search index)
    /// were decoded with the previous encoding and are NOT rebuilt; callers
    /// needing consistent text re-invoke the parse or search afterwards.
    pub fn set_current_encoding(&mut self, encoding: EncodingRef) {
        self.encoding = encoding;
    }

    /// Override the text encoding by Windows codepage number.
    ///
    /// # Errors
    /// [`ChmError::UnsupportedCodepage`] if the codepage is not in the
    /// supported table.
    pub fn set_current_encoding_by_codepage(&mut self, codepage: u32) -> Result<()> {
        self.encoding = encoding::for_codepage(codepage)
            .ok_or(ChmError::UnsupportedCodepage(codepage))?;
        Ok(())
    }

    /// Parse the table of contents into its ordered, indent-tagged entry
    /// sequence.
    ///
    /// # Errors
    /// [`ChmError::Unavailable`] if the archive has no TOC;
    /// [`ChmError::Parse`]/[`ChmError::UnknownLayout`] on a damaged stream
    /// (never a partial result).
    pub fn parse_table_of_contents(&self) -> Result<Vec<ParsedEntry>> {
        self.parse_entries(EntryKind::TableOfContents, TOC_STREAM)
    }

    /// Parse the index table. Same contract as
    /// [`parse_table_of_contents`](Self::parse_table_of_contents); index
    /// entries may carry several target URLs, or none.
    pub fn parse_index(&self) -> Result<Vec<ParsedEntry>> {
        self.parse_entries(EntryKind::Index, INDEX_STREAM)
    }

    fn parse_entries(&self, kind: EntryKind, stream_path: &str) -> Result<Vec<ParsedEntry>> {
        let raw = self
            .container
            .resolve(stream_path)
            .ok_or(ChmError::Unavailable(kind.stream_name()))?;
        entries::parse(&raw, kind, self.encoding.encoding())
    }

    /// Retrieve page content decoded with the current encoding. Do not use
    /// for binary payloads; see
    /// [`content_as_binary`](Self::content_as_binary).
    pub fn content_as_string(&self, url: &str) -> Result<String> {
        let bytes = self.content_as_binary(url)?;
        Ok(content::decode_text(&bytes, self.encoding.encoding()))
    }

    /// Retrieve raw, unencoded object content. `url` must be absolute.
    pub fn content_as_binary(&self, url: &str) -> Result<Vec<u8>> {
        let path = content::normalize_url(url);
        self.container
            .resolve(&path)
            .ok_or(ChmError::NotFound(path))
    }

    /// The `<title>` of the HTML page at `url`, from a bounded scan of the
    /// page head. `Ok(None)` when the page has no (or an empty) title.
    ///
    /// # Errors
    /// [`ChmError::NotFound`] if the url does not resolve.
    pub fn title_for_url(&self, url: &str) -> Result<Option<String>> {
        let bytes = self.content_as_binary(url)?;
        Ok(content::extract_title(&bytes, self.encoding.encoding()))
    }

    /// All object paths in the archive.
    pub fn enumerate_files(&self) -> Vec<String> {
        self.container.enumerate()
    }

    /// Run a search query with the default result limit
    /// ([`DEFAULT_SEARCH_LIMIT`]).
    pub fn search(&mut self, query: &str) -> Result<Vec<SearchResult>> {
        self.search_query(query, DEFAULT_SEARCH_LIMIT)
    }

    /// Run a search query.
    ///
    /// Bare words and `+word` terms are required, `-word` terms excluded,
    /// and quoted groups are phrases that must occur consecutively and in
    /// order. Matching pages come back in document order, truncated to
    /// `limit`, each resolved to its page title (the url itself when the
    /// page has none). A query with no usable terms returns an empty,
    /// non-error result.
    ///
    /// # Errors
    /// [`ChmError::Unavailable`] if the archive has no search index;
    /// [`ChmError::Parse`]/[`ChmError::UnknownLayout`] if the index stream
    /// is damaged.
    pub fn search_query(&mut self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let terms = search::parse_query(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        if self.search_index.is_none() {
            let raw = self
                .container
                .resolve(SEARCH_STREAM)
                .ok_or(ChmError::Unavailable("search table"))?;
            self.search_index = Some(SearchIndex::parse(&raw, self.encoding.encoding())?);
        }
        let Some(index) = self.search_index.as_ref() else {
            return Ok(Vec::new());
        };

        let mut results = Vec::new();
        for doc in index.query(&terms, limit) {
            let Some(url) = index.document_url(doc) else {
                continue;
            };
            let title = match self.title_for_url(url) {
                Ok(Some(title)) => title,
                _ => url.to_string(),
            };
            results.push(SearchResult {
                title,
                url: url.to_string(),
            });
        }
        Ok(results)
    }
}
