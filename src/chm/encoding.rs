//! Codepage resolution for the archive's non-Unicode text streams.
//!
//! CHM text (entry names, page content, index words) is stored in the
//! codepage of the language the help was compiled for. The archive records
//! that language as a Windows LCID in its `/#SYSTEM` stream; this module
//! maps the LCID to a codepage and the codepage to an `encoding_rs` decoder.

use encoding_rs::Encoding;

/// An immutable descriptor of one supported text encoding.
///
/// Values only come out of the builtin table (via [`for_lcid`] /
/// [`for_codepage`] / [`all`]), so holding an `EncodingRef` guarantees the
/// codepage is decodable.
#[derive(Debug, Clone, Copy)]
pub struct EncodingRef {
    name: &'static str,
    codepage: u32,
    encoding: &'static Encoding,
}

impl EncodingRef {
    /// Human-readable language family name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Windows codepage number.
    pub fn codepage(&self) -> u32 {
        self.codepage
    }

    /// The decoder for this codepage.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }
}

impl PartialEq for EncodingRef {
    fn eq(&self, other: &Self) -> bool {
        self.codepage == other.codepage
    }
}

impl Eq for EncodingRef {}

/// Codepages CHM generators are known to emit. GBK archives decode as
/// GB18030, its superset, the usual normalization. The `*_INIT` statics are
/// referenced directly: the `&'static Encoding` shorthands cannot appear in
/// a static initializer.
static TABLE: &[EncodingRef] = &[
    EncodingRef { name: "Western", codepage: 1252, encoding: &encoding_rs::WINDOWS_1252_INIT },
    EncodingRef { name: "Central European", codepage: 1250, encoding: &encoding_rs::WINDOWS_1250_INIT },
    EncodingRef { name: "Cyrillic", codepage: 1251, encoding: &encoding_rs::WINDOWS_1251_INIT },
    EncodingRef { name: "Greek", codepage: 1253, encoding: &encoding_rs::WINDOWS_1253_INIT },
    EncodingRef { name: "Turkish", codepage: 1254, encoding: &encoding_rs::WINDOWS_1254_INIT },
    EncodingRef { name: "Hebrew", codepage: 1255, encoding: &encoding_rs::WINDOWS_1255_INIT },
    EncodingRef { name: "Arabic", codepage: 1256, encoding: &encoding_rs::WINDOWS_1256_INIT },
    EncodingRef { name: "Baltic", codepage: 1257, encoding: &encoding_rs::WINDOWS_1257_INIT },
    EncodingRef { name: "Vietnamese", codepage: 1258, encoding: &encoding_rs::WINDOWS_1258_INIT },
    EncodingRef { name: "Thai", codepage: 874, encoding: &encoding_rs::WINDOWS_874_INIT },
    EncodingRef { name: "Japanese", codepage: 932, encoding: &encoding_rs::SHIFT_JIS_INIT },
    EncodingRef { name: "Simplified Chinese", codepage: 936, encoding: &encoding_rs::GB18030_INIT },
    EncodingRef { name: "Korean", codepage: 949, encoding: &encoding_rs::EUC_KR_INIT },
    EncodingRef { name: "Traditional Chinese", codepage: 950, encoding: &encoding_rs::BIG5_INIT },
    EncodingRef { name: "Unicode (UTF-8)", codepage: 65001, encoding: &encoding_rs::UTF_8_INIT },
];

/// All supported encodings, for UI pickers.
pub fn all() -> &'static [EncodingRef] {
    TABLE
}

/// The fallback when the archive declares no language or an unknown one.
pub fn default_encoding() -> EncodingRef {
    TABLE[0]
}

/// Look an encoding up by Windows codepage number.
pub fn for_codepage(codepage: u32) -> Option<EncodingRef> {
    TABLE.iter().find(|e| e.codepage == codepage).copied()
}

/// Autodetect the encoding from the LCID in the archive's system stream.
///
/// Only the primary language part of the LCID picks the codepage, except
/// Chinese where the sublanguage distinguishes simplified from traditional.
pub fn for_lcid(lcid: u32) -> Option<EncodingRef> {
    let primary = lcid & 0x3ff;
    let sublang = (lcid >> 10) & 0x3f;
    let codepage = match primary {
        // Western European and friends
        0x06 | 0x07 | 0x09 | 0x0a | 0x0b | 0x0c | 0x10 | 0x13 | 0x14 | 0x16 | 0x1d => 1252,
        // Czech, Hungarian, Polish, Romanian, Croatian, Slovak, Slovenian, Albanian
        0x05 | 0x0e | 0x15 | 0x18 | 0x1a | 0x1b | 0x24 | 0x1c => 1250,
        // Bulgarian, Russian, Ukrainian, Belarusian, Macedonian, Kazakh
        0x02 | 0x19 | 0x22 | 0x23 | 0x2f | 0x3f => 1251,
        0x08 => 1253,
        0x1f => 1254,
        0x0d => 1255,
        // Arabic, Urdu, Farsi
        0x01 | 0x20 | 0x29 => 1256,
        // Estonian, Latvian, Lithuanian
        0x25 | 0x26 | 0x27 => 1257,
        0x2a => 1258,
        0x1e => 874,
        0x11 => 932,
        0x12 => 949,
        0x04 => match sublang {
            // Taiwan, Hong Kong, Macau
            0x01 | 0x03 | 0x05 => 950,
            _ => 936,
        },
        _ => return None,
    };
    for_codepage(codepage)
}
