//! Data structures representing CHM archive content.

/// Image id of a TOC entry without any icon.
pub const IMAGE_NONE: i32 = -1;
/// Image id meaning "let the viewer pick" (book vs page, by children).
pub const IMAGE_AUTO: i32 = -2;
/// Image id used for index entries, which never carry their own icon.
pub const IMAGE_INDEX: i32 = -3;
/// Number of builtin icons a help viewer ships; valid builtin ids are
/// `0..MAX_BUILTIN_ICONS`.
pub const MAX_BUILTIN_ICONS: i32 = 42;

/// A single TOC or index entry.
///
/// The parsed listing is flat; `indent` alone encodes the tree shape. An
/// entry at indent `d` is a child of the nearest preceding entry at
/// indent `d - 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntry {
    /// Entry name, decoded with the archive's current encoding.
    pub name: String,
    /// Target URLs. A TOC entry has exactly one; an index entry may have
    /// several (disambiguation targets for one term), or none at all.
    pub urls: Vec<String>,
    /// Associated image number. Resolve with [`BookIcon::from_id`].
    pub image_id: i32,
    /// Indentation level of this entry.
    pub indent: u32,
}

/// A single full-text search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Title of the page the hit was found in (the page URL when the page
    /// carries no title).
    pub title: String,
    /// URL of the page the hit was found in.
    pub url: String,
}

/// Which of the two entry listings to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    TableOfContents,
    Index,
}

impl EntryKind {
    /// Short stream label used in log statements and parse errors.
    pub(crate) fn stream_name(self) -> &'static str {
        match self {
            EntryKind::TableOfContents => "TOC",
            EntryKind::Index => "index",
        }
    }

    /// Image id for entries in listings whose layout has no image field.
    pub(crate) fn default_image_id(self) -> i32 {
        match self {
            EntryKind::TableOfContents => IMAGE_AUTO,
            EntryKind::Index => IMAGE_INDEX,
        }
    }
}

/// Resolved meaning of a [`ParsedEntry::image_id`].
///
/// Stands in for the original viewer's pixmap table: rendering is out of
/// scope here, so the lookup yields which of the 42 builtin images (or
/// which sentinel) an id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookIcon {
    /// No icon at all.
    None,
    /// Viewer picks book or page automatically.
    Auto,
    /// The generic index-entry icon.
    Index,
    /// One of the builtin images, `0..MAX_BUILTIN_ICONS`.
    Builtin(u8),
}

impl BookIcon {
    /// Map a raw image id to its icon, or `None` for ids outside the table.
    pub fn from_id(id: i32) -> Option<BookIcon> {
        match id {
            IMAGE_NONE => Some(BookIcon::None),
            IMAGE_AUTO => Some(BookIcon::Auto),
            IMAGE_INDEX => Some(BookIcon::Index),
            0..=41 => Some(BookIcon::Builtin(id as u8)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_lookup_covers_sentinels_and_builtins() {
        assert_eq!(BookIcon::from_id(IMAGE_NONE), Some(BookIcon::None));
        assert_eq!(BookIcon::from_id(IMAGE_AUTO), Some(BookIcon::Auto));
        assert_eq!(BookIcon::from_id(IMAGE_INDEX), Some(BookIcon::Index));
        assert_eq!(BookIcon::from_id(0), Some(BookIcon::Builtin(0)));
        assert_eq!(BookIcon::from_id(41), Some(BookIcon::Builtin(41)));
        assert_eq!(BookIcon::from_id(MAX_BUILTIN_ICONS), None);
        assert_eq!(BookIcon::from_id(-4), None);
    }
}
