//! Full-text search over the archive's word-location index.
//!
//! The `/$FIftiMain` stream maps every indexed word to the ordered list of
//! (document, position) occurrences. On disk the words are grouped into
//! alphabetical buckets behind an offset table:
//!
//! ```text
//! marker:       u32  "1IFT"
//! doc_count:    u32
//! bucket_count: u32
//! buckets_off:  u32  start of the bucket region, from stream start
//! documents:    doc_count of (url_len: u16, url bytes)
//! buckets:      bucket_count of:
//!     word_count: u16
//!     per word: word_len u16, word bytes (case-folded, native encoding),
//!               occ_count u32, occ_count pairs of (doc u32, pos u32)
//! ```
//!
//! The loader decodes every bucket into one in-memory map on first use; the
//! result is cached on the archive, so the walk happens once per load.
//!
//! Queries are whitespace-separated terms. A bare term or `+term` must be
//! present in a page, `-term` must be absent, and a quoted group
//! (`"quick start"`, optionally prefixed) is a phrase whose words must
//! occur consecutively and in order within the page. Matching pages come
//! back in document order, not relevance order.

use std::collections::{BTreeSet, HashMap};

use encoding_rs::Encoding;
use log::{debug, info};

use super::error::{ChmError, Result};
use super::utils;

/// Result cap applied when the caller does not pass an explicit limit.
pub const DEFAULT_SEARCH_LIMIT: usize = 100;

const MARKER: u32 = u32::from_le_bytes(*b"1IFT");
const STREAM: &str = "search";

/// One word occurrence: which document, and the word's position in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Occurrence {
    doc: u32,
    pos: u32,
}

/// The decoded word-location index.
#[derive(Debug)]
pub(crate) struct SearchIndex {
    /// Document index -> page URL.
    documents: Vec<String>,
    /// Case-folded word -> occurrences in document order.
    words: HashMap<String, Vec<Occurrence>>,
}

impl SearchIndex {
    /// Decode the whole index stream.
    pub(crate) fn parse(data: &[u8], encoding: &'static Encoding) -> Result<SearchIndex> {
        info!("Loading search index ({} bytes)", data.len());

        let mut reader = data;
        let marker = utils::read_u32(&mut reader, STREAM)?;
        if marker != MARKER {
            return Err(ChmError::UnknownLayout {
                stream: STREAM,
                marker,
            });
        }
        let doc_count = utils::read_u32(&mut reader, STREAM)? as usize;
        let bucket_count = utils::read_u32(&mut reader, STREAM)? as usize;
        let buckets_off = utils::read_u32(&mut reader, STREAM)? as usize;

        if buckets_off > data.len() {
            return Err(ChmError::Parse {
                stream: STREAM,
                detail: format!(
                    "bucket region offset {} outside stream of {} bytes",
                    buckets_off,
                    data.len()
                ),
            });
        }

        let mut documents = Vec::with_capacity(doc_count);
        for _ in 0..doc_count {
            let url_len = utils::read_u16(&mut reader, STREAM)? as usize;
            let url_bytes = utils::take(&mut reader, url_len, STREAM)?;
            let (url, _, _) = encoding.decode(url_bytes);
            documents.push(url.into_owned());
        }

        let mut words: HashMap<String, Vec<Occurrence>> = HashMap::new();
        let mut buckets = &data[buckets_off..];
        let mut word_total = 0usize;
        for _ in 0..bucket_count {
            let word_count = utils::read_u16(&mut buckets, STREAM)? as usize;
            for _ in 0..word_count {
                let word_len = utils::read_u16(&mut buckets, STREAM)? as usize;
                let word_bytes = utils::take(&mut buckets, word_len, STREAM)?;
                let (word, _, _) = encoding.decode(word_bytes);
                // Fold again on load so a generator that did not fold still
                // matches folded query terms.
                let word = word.to_lowercase();

                let occ_count = utils::read_u32(&mut buckets, STREAM)? as usize;
                let list = words.entry(word).or_default();
                list.reserve(occ_count);
                for _ in 0..occ_count {
                    let doc = utils::read_u32(&mut buckets, STREAM)?;
                    let pos = utils::read_u32(&mut buckets, STREAM)?;
                    if doc as usize >= doc_count {
                        return Err(ChmError::Parse {
                            stream: STREAM,
                            detail: format!(
                                "occurrence references document {} of {}",
                                doc, doc_count
                            ),
                        });
                    }
                    list.push(Occurrence { doc, pos });
                }
                word_total += 1;
            }
        }

        info!(
            "Search index loaded: {} documents, {} words in {} buckets",
            documents.len(),
            word_total,
            bucket_count
        );
        Ok(SearchIndex { documents, words })
    }

    pub(crate) fn document_url(&self, doc: u32) -> Option<&str> {
        self.documents.get(doc as usize).map(String::as_str)
    }

    /// Evaluate a parsed query, returning qualifying document indices in
    /// ascending order, truncated to `limit`.
    pub(crate) fn query(&self, terms: &[Term], limit: usize) -> Vec<u32> {
        let mut matched: Option<BTreeSet<u32>> = None;
        let mut excluded = BTreeSet::new();

        for term in terms {
            let docs = if term.words.len() == 1 {
                self.docs_with_word(&term.words[0])
            } else {
                self.docs_with_phrase(&term.words)
            };
            match term.kind {
                TermKind::Required => {
                    matched = Some(match matched {
                        None => docs,
                        Some(prev) => prev.intersection(&docs).copied().collect(),
                    });
                }
                TermKind::Excluded => excluded.extend(docs),
            }
        }

        debug!(
            "query over {} terms: {} candidates, {} excluded",
            terms.len(),
            matched.as_ref().map_or(0, BTreeSet::len),
            excluded.len()
        );

        // A query with only excluded terms requires nothing, so nothing
        // qualifies.
        let Some(matched) = matched else {
            return Vec::new();
        };
        matched
            .into_iter()
            .filter(|doc| !excluded.contains(doc))
            .take(limit)
            .collect()
    }

    fn docs_with_word(&self, word: &str) -> BTreeSet<u32> {
        self.words
            .get(word)
            .map(|occurrences| occurrences.iter().map(|o| o.doc).collect())
            .unwrap_or_default()
    }

    /// Documents in which the phrase words occur at strictly consecutive
    /// positions, in order.
    fn docs_with_phrase(&self, phrase: &[String]) -> BTreeSet<u32> {
        let Some(first) = phrase.first() else {
            return BTreeSet::new();
        };
        let Some(starts) = self.words.get(first) else {
            return BTreeSet::new();
        };

        let mut matched = BTreeSet::new();
        'starts: for start in starts {
            if matched.contains(&start.doc) {
                continue;
            }
            for (step, word) in phrase.iter().enumerate().skip(1) {
                // A start position near u32::MAX cannot head a phrase; a
                // damaged stream must not wrap around into a false match.
                let Some(pos) = start.pos.checked_add(step as u32) else {
                    continue 'starts;
                };
                let here = Occurrence {
                    doc: start.doc,
                    pos,
                };
                let found = self
                    .words
                    .get(word)
                    .is_some_and(|occurrences| occurrences.contains(&here));
                if !found {
                    continue 'starts;
                }
            }
            matched.insert(start.doc);
        }
        matched
    }
}

/// Whether a term keeps or rejects matching pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TermKind {
    Required,
    Excluded,
}

/// One parsed query term: a single word or a phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Term {
    pub kind: TermKind,
    pub words: Vec<String>,
}

/// Split a query string into terms.
///
/// Words are case-folded here, matching the folding applied to index words
/// on load. Empty tokens (a bare `+`, an unclosed empty quote) are dropped;
/// an empty return means "nothing to search for", which callers report as
/// an empty, non-error result.
pub(crate) fn parse_query(query: &str) -> Vec<Term> {
    let mut terms = Vec::new();
    let mut rest = query.trim_start();

    while !rest.is_empty() {
        let mut kind = TermKind::Required;
        if let Some(stripped) = rest.strip_prefix('-') {
            kind = TermKind::Excluded;
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('+') {
            rest = stripped;
        }

        let words: Vec<String>;
        if let Some(stripped) = rest.strip_prefix('"') {
            // Phrase: everything up to the closing quote (or end of query).
            let (body, tail) = match stripped.find('"') {
                Some(end) => (&stripped[..end], &stripped[end + 1..]),
                None => (stripped, ""),
            };
            words = body.split_whitespace().map(str::to_lowercase).collect();
            rest = tail;
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            let word = &rest[..end];
            words = if word.is_empty() {
                Vec::new()
            } else {
                vec![word.to_lowercase()]
            };
            rest = &rest[end..];
        }

        if !words.is_empty() {
            terms.push(Term { kind, words });
        }
        rest = rest.trim_start();
    }
    terms
}
