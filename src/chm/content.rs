//! Text decoding and HTML title extraction for page content.

use encoding_rs::Encoding;

/// How many leading bytes of a page the title scan is allowed to look at.
/// `<title>` lives in the document head, so a bounded window keeps the scan
/// cheap on huge pages.
const TITLE_SCAN_WINDOW: usize = 4096;

/// Decode raw page bytes with the archive's encoding. Lossy: undecodable
/// byte sequences become U+FFFD, the viewer-friendly behavior for dirty
/// archives.
pub(crate) fn decode_text(bytes: &[u8], encoding: &'static Encoding) -> String {
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

/// Extract the contents of the first `<title>` tag within the scan window.
///
/// Help page HTML is rarely well-formed, so this is a tolerant
/// case-insensitive scan rather than a strict markup parse. Returns `None`
/// when no title tag is found or the title is empty.
pub(crate) fn extract_title(bytes: &[u8], encoding: &'static Encoding) -> Option<String> {
    let window = &bytes[..bytes.len().min(TITLE_SCAN_WINDOW)];
    let text = decode_text(window, encoding);
    // ASCII-only folding keeps byte offsets identical to `text`; the tag
    // names being searched for are ASCII anyway.
    let folded: String = text.chars().map(|c| c.to_ascii_lowercase()).collect();

    let open = folded.find("<title")?;
    let content_start = open + folded[open..].find('>')? + 1;
    let content_end = content_start + folded[content_start..].find("</title")?;

    let title = text
        .get(content_start..content_end)?
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

/// Normalize a caller-supplied URL to an absolute in-archive path.
///
/// Strips the viewer's `ms-its:...::` wrapper if present and supplies the
/// leading `/`. Relative paths are a caller error; nothing beyond this is
/// validated.
pub(crate) fn normalize_url(url: &str) -> String {
    let url = match url.split_once("::") {
        Some((scheme, path)) if scheme.starts_with("ms-its:") => path,
        _ => url,
    };
    if url.starts_with('/') {
        url.to_string()
    } else {
        format!("/{url}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf8() -> &'static Encoding {
        encoding_rs::UTF_8
    }

    #[test]
    fn title_extraction_is_case_insensitive_and_collapses_whitespace() {
        let html = b"<html><head><TITLE>\n  Getting \t Started  </TITLE></head>";
        assert_eq!(
            extract_title(html, utf8()),
            Some("Getting Started".to_string())
        );
    }

    #[test]
    fn title_tag_with_attributes() {
        let html = br#"<title id="t">Reference</title>"#;
        assert_eq!(extract_title(html, utf8()), Some("Reference".to_string()));
    }

    #[test]
    fn missing_or_empty_title_yields_none() {
        assert_eq!(extract_title(b"<html><body>no head</body>", utf8()), None);
        assert_eq!(extract_title(b"<title>   </title>", utf8()), None);
        assert_eq!(extract_title(b"<title>never closed", utf8()), None);
    }

    #[test]
    fn title_outside_scan_window_is_not_found() {
        let mut html = vec![b' '; TITLE_SCAN_WINDOW];
        html.extend_from_slice(b"<title>Too far down</title>");
        assert_eq!(extract_title(&html, utf8()), None);
    }

    #[test]
    fn non_utf8_titles_decode_with_the_archive_encoding() {
        // "Справка" in windows-1251.
        let mut html = b"<title>".to_vec();
        html.extend_from_slice(&[0xD1, 0xEF, 0xF0, 0xE0, 0xE2, 0xEA, 0xE0]);
        html.extend_from_slice(b"</title>");
        assert_eq!(
            extract_title(&html, encoding_rs::WINDOWS_1251),
            Some("Справка".to_string())
        );
    }

    #[test]
    fn url_normalization() {
        assert_eq!(normalize_url("/page.html"), "/page.html");
        assert_eq!(normalize_url("page.html"), "/page.html");
        assert_eq!(
            normalize_url("ms-its:help.chm::/page.html"),
            "/page.html"
        );
    }
}
