//! TOC and index listing parser.
//!
//! Both `/#TOCIDX` and `/#IDXHDR` hold the same kind of flat binary
//! listing: a header, a run of variable-length entry records, and a string
//! table the records point into for their target URLs. Entry order is
//! meaningful - together with each record's indent level it encodes the
//! tree shape, so the output preserves it exactly.
//!
//! Stream layout:
//!
//! ```text
//! marker:      u32   layout tag, one of the four known generator variants
//! entry_count: u32
//! strings_off: u32   start of the URL string table, from stream start
//! records:     entry_count of:
//!     indent:    u16
//!     name_len:  u16, then name_len name bytes (native encoding)
//!     url_count: u16, then url_count offsets into the string table
//!                (u16 or u32 wide, depending on layout)
//!     image_id:  i32  (layouts with an image field only)
//! strings:     NUL-terminated byte strings, native encoding
//! ```
//!
//! Parsing is fail-fast: any length or offset reaching outside the stream
//! aborts with [`ChmError::Parse`] instead of continuing on inconsistent
//! state. Zero-url records are a soft anomaly and pass through as-is.

use encoding_rs::Encoding;
use log::{debug, info};

use super::error::{ChmError, Result};
use super::models::{EntryKind, ParsedEntry};
use super::utils;

const MARKER_V1: u32 = u32::from_le_bytes(*b"1TOC");
const MARKER_V2: u32 = u32::from_le_bytes(*b"2TOC");
const MARKER_V3: u32 = u32::from_le_bytes(*b"3TOC");
const MARKER_V4: u32 = u32::from_le_bytes(*b"4TOC");

const HEADER_LEN: usize = 12;

/// The four known record sub-layouts, differing in URL offset width and
/// whether records carry an image field. Detected from the stream marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    V1,
    V2,
    V3,
    V4,
}

impl Layout {
    fn from_marker(marker: u32, stream: &'static str) -> Result<Self> {
        match marker {
            MARKER_V1 => Ok(Layout::V1),
            MARKER_V2 => Ok(Layout::V2),
            MARKER_V3 => Ok(Layout::V3),
            MARKER_V4 => Ok(Layout::V4),
            _ => Err(ChmError::UnknownLayout { stream, marker }),
        }
    }

    /// Width (in bytes) of a URL offset in this layout.
    fn url_offset_width(self) -> usize {
        match self {
            Layout::V1 | Layout::V2 => 2,
            Layout::V3 | Layout::V4 => 4,
        }
    }

    fn has_image_field(self) -> bool {
        matches!(self, Layout::V2 | Layout::V4)
    }
}

/// Parse a TOC or index listing stream into its ordered entry sequence.
pub(crate) fn parse(
    data: &[u8],
    kind: EntryKind,
    encoding: &'static Encoding,
) -> Result<Vec<ParsedEntry>> {
    let stream = kind.stream_name();
    info!("Parsing {} listing ({} bytes)", stream, data.len());

    let mut header = data;
    let marker = utils::read_u32(&mut header, stream)?;
    let layout = Layout::from_marker(marker, stream)?;
    let entry_count = utils::read_u32(&mut header, stream)? as usize;
    let strings_off = utils::read_u32(&mut header, stream)? as usize;

    if strings_off < HEADER_LEN || strings_off > data.len() {
        return Err(ChmError::Parse {
            stream,
            detail: format!(
                "string table offset {} outside stream of {} bytes",
                strings_off,
                data.len()
            ),
        });
    }
    let strings = &data[strings_off..];
    let mut records = &data[HEADER_LEN..strings_off];

    debug!(
        "{} listing: layout {:?}, {} entries, string table at {}",
        stream, layout, entry_count, strings_off
    );

    let mut entries = Vec::with_capacity(entry_count);
    for _ in 0..entry_count {
        entries.push(parse_record(&mut records, layout, kind, strings, encoding)?);
    }

    info!("{} listing parsed: {} entries", stream, entries.len());
    Ok(entries)
}

fn parse_record(
    records: &mut &[u8],
    layout: Layout,
    kind: EntryKind,
    strings: &[u8],
    encoding: &'static Encoding,
) -> Result<ParsedEntry> {
    let stream = kind.stream_name();

    let indent = utils::read_u16(records, stream)? as u32;
    let name_len = utils::read_u16(records, stream)? as usize;
    let name_bytes = utils::take(records, name_len, stream)?;
    let (name, _, _) = encoding.decode(name_bytes);

    let url_count = utils::read_u16(records, stream)? as usize;
    let mut urls = Vec::with_capacity(url_count);
    for _ in 0..url_count {
        let offset = match layout.url_offset_width() {
            2 => utils::read_u16(records, stream)? as usize,
            _ => utils::read_u32(records, stream)? as usize,
        };
        urls.push(read_string_at(strings, offset, encoding, stream)?);
    }

    let image_id = if layout.has_image_field() {
        utils::read_i32(records, stream)?
    } else {
        kind.default_image_id()
    };

    Ok(ParsedEntry {
        name: name.into_owned(),
        urls,
        image_id,
        indent,
    })
}

/// Decode the NUL-terminated string at `offset` in the string table.
fn read_string_at(
    strings: &[u8],
    offset: usize,
    encoding: &'static Encoding,
    stream: &'static str,
) -> Result<String> {
    if offset >= strings.len() {
        return Err(ChmError::Parse {
            stream,
            detail: format!(
                "URL offset {} outside string table of {} bytes",
                offset,
                strings.len()
            ),
        });
    }
    let tail = &strings[offset..];
    let end = tail
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| ChmError::Parse {
            stream,
            detail: format!("unterminated string at table offset {offset}"),
        })?;
    let (text, _, _) = encoding.decode(&tail[..end]);
    Ok(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chm::models::{IMAGE_AUTO, IMAGE_INDEX};

    /// Builds listing streams for the tests, record by record.
    struct ListingBuilder {
        marker: u32,
        records: Vec<u8>,
        strings: Vec<u8>,
        entry_count: u32,
    }

    impl ListingBuilder {
        fn new(marker: u32) -> Self {
            Self {
                marker,
                records: Vec::new(),
                strings: Vec::new(),
                entry_count: 0,
            }
        }

        fn add_url(&mut self, url: &str) -> usize {
            let offset = self.strings.len();
            self.strings.extend_from_slice(url.as_bytes());
            self.strings.push(0);
            offset
        }

        fn entry(&mut self, indent: u16, name: &str, urls: &[&str], image: Option<i32>) {
            let wide = matches!(
                self.marker,
                m if m == MARKER_V3 || m == MARKER_V4
            );
            self.records.extend_from_slice(&indent.to_le_bytes());
            self.records
                .extend_from_slice(&(name.len() as u16).to_le_bytes());
            self.records.extend_from_slice(name.as_bytes());
            self.records
                .extend_from_slice(&(urls.len() as u16).to_le_bytes());
            for url in urls {
                let offset = self.add_url(url);
                if wide {
                    self.records.extend_from_slice(&(offset as u32).to_le_bytes());
                } else {
                    self.records.extend_from_slice(&(offset as u16).to_le_bytes());
                }
            }
            if let Some(id) = image {
                self.records.extend_from_slice(&id.to_le_bytes());
            }
            self.entry_count += 1;
        }

        fn build(&self) -> Vec<u8> {
            let strings_off = (HEADER_LEN + self.records.len()) as u32;
            let mut out = Vec::new();
            out.extend_from_slice(&self.marker.to_le_bytes());
            out.extend_from_slice(&self.entry_count.to_le_bytes());
            out.extend_from_slice(&strings_off.to_le_bytes());
            out.extend_from_slice(&self.records);
            out.extend_from_slice(&self.strings);
            out
        }
    }

    fn utf8() -> &'static Encoding {
        encoding_rs::UTF_8
    }

    #[test]
    fn v1_toc_preserves_order_and_indent() {
        let mut b = ListingBuilder::new(MARKER_V1);
        b.entry(0, "Introduction", &["/intro.html"], None);
        b.entry(1, "Setup", &["/setup.html"], None);
        b.entry(2, "Linux", &["/setup-linux.html"], None);
        b.entry(1, "Usage", &["/usage.html"], None);
        let entries = parse(&b.build(), EntryKind::TableOfContents, utf8()).unwrap();

        assert_eq!(entries.len(), 4);
        assert_eq!(
            entries.iter().map(|e| e.indent).collect::<Vec<_>>(),
            vec![0, 1, 2, 1]
        );
        assert_eq!(entries[0].name, "Introduction");
        assert_eq!(entries[2].urls, vec!["/setup-linux.html".to_string()]);
        // No image field in this layout: TOC entries default to AUTO.
        assert!(entries.iter().all(|e| e.image_id == IMAGE_AUTO));
    }

    #[test]
    fn v2_layout_carries_image_ids() {
        let mut b = ListingBuilder::new(MARKER_V2);
        b.entry(0, "Chapter", &["/ch.html"], Some(17));
        b.entry(1, "Page", &["/p.html"], Some(-1));
        let entries = parse(&b.build(), EntryKind::TableOfContents, utf8()).unwrap();
        assert_eq!(entries[0].image_id, 17);
        assert_eq!(entries[1].image_id, -1);
    }

    #[test]
    fn v4_layout_wide_offsets_and_images() {
        let mut b = ListingBuilder::new(MARKER_V4);
        b.entry(0, "Top", &["/a.html", "/b.html"], Some(3));
        let entries = parse(&b.build(), EntryKind::Index, utf8()).unwrap();
        assert_eq!(entries[0].urls, vec!["/a.html", "/b.html"]);
        assert_eq!(entries[0].image_id, 3);
    }

    #[test]
    fn index_entries_without_urls_are_preserved() {
        let mut b = ListingBuilder::new(MARKER_V3);
        b.entry(0, "orphan term", &[], None);
        b.entry(0, "linked term", &["/t.html"], None);
        let entries = parse(&b.build(), EntryKind::Index, utf8()).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].urls.is_empty());
        assert_eq!(entries[0].name, "orphan term");
        assert_eq!(entries[0].image_id, IMAGE_INDEX);
    }

    #[test]
    fn index_terms_may_share_a_name_with_multiple_targets() {
        let mut b = ListingBuilder::new(MARKER_V1);
        b.entry(0, "printing", &["/print1.html", "/print2.html"], None);
        let entries = parse(&b.build(), EntryKind::Index, utf8()).unwrap();
        assert_eq!(entries[0].urls.len(), 2);
    }

    #[test]
    fn names_decode_with_the_supplied_encoding() {
        let name: &[u8] = &[0xC3, 0xEB, 0xE0, 0xE2, 0xE0]; // "Глава" in cp1251
        let mut data = Vec::new();
        data.extend_from_slice(&MARKER_V1.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());
        let strings_off = (HEADER_LEN + 2 + 2 + name.len() + 2 + 2) as u32;
        data.extend_from_slice(&strings_off.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&(name.len() as u16).to_le_bytes());
        data.extend_from_slice(name);
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(b"/g.html\0");

        let entries = parse(&data, EntryKind::TableOfContents, encoding_rs::WINDOWS_1251).unwrap();
        assert_eq!(entries[0].name, "Глава");
    }

    #[test]
    fn unknown_marker_is_a_hard_failure() {
        let mut b = ListingBuilder::new(u32::from_le_bytes(*b"9TOC"));
        b.entry(0, "x", &["/x.html"], None);
        let err = parse(&b.build(), EntryKind::TableOfContents, utf8()).unwrap_err();
        assert!(matches!(err, ChmError::UnknownLayout { .. }));
    }

    #[test]
    fn truncated_record_region_fails_not_partial() {
        let mut b = ListingBuilder::new(MARKER_V1);
        b.entry(0, "one", &["/1.html"], None);
        b.entry(0, "two", &["/2.html"], None);
        let mut data = b.build();
        // Claim three entries while only two are present.
        data[4..8].copy_from_slice(&3u32.to_le_bytes());
        assert!(matches!(
            parse(&data, EntryKind::TableOfContents, utf8()),
            Err(ChmError::Parse { .. })
        ));
    }

    #[test]
    fn name_length_past_buffer_fails() {
        let mut b = ListingBuilder::new(MARKER_V1);
        b.entry(0, "ok", &["/ok.html"], None);
        let mut data = b.build();
        // Inflate the first record's name length field.
        data[HEADER_LEN + 2..HEADER_LEN + 4].copy_from_slice(&0xFFFFu16.to_le_bytes());
        assert!(matches!(
            parse(&data, EntryKind::TableOfContents, utf8()),
            Err(ChmError::Parse { .. })
        ));
    }

    #[test]
    fn url_offset_outside_string_table_fails() {
        let mut data = Vec::new();
        data.extend_from_slice(&MARKER_V1.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());
        let strings_off = (HEADER_LEN + 2 + 2 + 1 + 2 + 2) as u32;
        data.extend_from_slice(&strings_off.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.push(b'x');
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&500u16.to_le_bytes()); // way past the table
        data.extend_from_slice(b"/x.html\0");
        assert!(matches!(
            parse(&data, EntryKind::TableOfContents, utf8()),
            Err(ChmError::Parse { .. })
        ));
    }

    #[test]
    fn string_table_offset_outside_stream_fails() {
        let mut data = Vec::new();
        data.extend_from_slice(&MARKER_V1.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&9999u32.to_le_bytes());
        assert!(matches!(
            parse(&data, EntryKind::TableOfContents, utf8()),
            Err(ChmError::Parse { .. })
        ));
    }
}
