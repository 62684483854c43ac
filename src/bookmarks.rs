//! PDF outline entries for the titled sections of a rendered report, written with `lopdf`.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::geometry::{PageGeometry, PageSections};

/// Errors that can occur while embedding bookmarks into a rendered PDF document.
#[derive(Debug)]
pub enum BookmarkError {
    /// The PDF bytes could not be parsed by `lopdf`.
    Parse(lopdf::Error),
    /// A required catalog entry was missing from the document trailer.
    MissingCatalog,
    /// The catalog object was not a dictionary, preventing outline injection.
    InvalidCatalog,
    /// A referenced page number did not exist in the rendered document.
    MissingPage {
        /// Title of the entry whose page reference is missing.
        title: String,
        /// The requested (1-indexed) page number that could not be resolved.
        page_number: usize,
    },
}

impl From<lopdf::Error> for BookmarkError {
    fn from(err: lopdf::Error) -> Self {
        Self::Parse(err)
    }
}

impl From<std::io::Error> for BookmarkError {
    fn from(err: std::io::Error) -> Self {
        Self::Parse(err.into())
    }
}

impl std::fmt::Display for BookmarkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "Failed to parse PDF bytes: {err}"),
            Self::MissingCatalog => write!(f, "PDF catalog entry is missing"),
            Self::InvalidCatalog => write!(f, "PDF catalog entry is not a dictionary"),
            Self::MissingPage { title, page_number } => write!(
                f,
                "Bookmark `{}` refers to missing page {}",
                title, page_number
            ),
        }
    }
}

impl std::error::Error for BookmarkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::MissingCatalog | Self::InvalidCatalog | Self::MissingPage { .. } => None,
        }
    }
}

/// One outline entry: a title jumping to a point on a page.
#[derive(Clone, Debug, PartialEq)]
pub struct BookmarkTarget {
    pub title: String,
    /// Value of the entry's `/NM` key.
    pub name: String,
    /// 1-indexed page number.
    pub page: usize,
    /// Destination in PDF user space (origin bottom-left), in points.
    pub left: f64,
    pub top: f64,
}

/// Builds one target per titled section, pointing at the section's top-left corner.
pub fn section_targets(
    sections: &PageSections,
    geometry: &PageGeometry,
    page: usize,
) -> Vec<BookmarkTarget> {
    sections
        .iter()
        .filter_map(|section| {
            let title = section.text.title.as_ref()?;
            Some(BookmarkTarget {
                title: title.clone(),
                name: section.id.key().to_owned(),
                page,
                left: section.x(),
                top: geometry.height - section.y(),
            })
        })
        .collect()
}

/// Writes a flat `/Outlines` tree with one `/XYZ` destination per target.
///
/// Bytes are returned unchanged when there are no targets.
pub fn apply_bookmarks(
    pdf_bytes: &[u8],
    targets: &[BookmarkTarget],
) -> Result<Vec<u8>, BookmarkError> {
    if targets.is_empty() {
        return Ok(pdf_bytes.to_vec());
    }
    let mut document = Document::load_mem(pdf_bytes)?;
    let pages = document.get_pages();
    let entries = collect_outline_entries(&mut document, targets, &pages)?;

    let outlines_id = document.new_object_id();
    link_outline_entries(outlines_id, &mut document, &entries);
    insert_outlines_root(outlines_id, &mut document, &entries)?;

    let mut buffer = Vec::new();
    document.save_to(&mut buffer)?;
    Ok(buffer)
}

struct OutlineEntry<'t> {
    object_id: ObjectId,
    page_ref: ObjectId,
    target: &'t BookmarkTarget,
}

fn collect_outline_entries<'t>(
    document: &mut Document,
    targets: &'t [BookmarkTarget],
    pages: &BTreeMap<u32, ObjectId>,
) -> Result<Vec<OutlineEntry<'t>>, BookmarkError> {
    targets
        .iter()
        .map(|target| {
            let page_ref = u32::try_from(target.page)
                .ok()
                .and_then(|page| pages.get(&page).copied())
                .ok_or_else(|| BookmarkError::MissingPage {
                    title: target.title.clone(),
                    page_number: target.page,
                })?;
            Ok(OutlineEntry {
                object_id: document.new_object_id(),
                page_ref,
                target,
            })
        })
        .collect()
}

fn link_outline_entries(
    outlines_id: ObjectId,
    document: &mut Document,
    entries: &[OutlineEntry<'_>],
) {
    for (index, entry) in entries.iter().enumerate() {
        let target = entry.target;
        let mut dictionary = Dictionary::new();
        dictionary.set("Title", Object::string_literal(target.title.as_str()));
        dictionary.set(
            "Dest",
            Object::Array(vec![
                Object::Reference(entry.page_ref),
                Object::Name("XYZ".into()),
                Object::Integer(target.left.round() as i64),
                Object::Integer(target.top.round() as i64),
                Object::Null,
            ]),
        );
        dictionary.set("Parent", Object::Reference(outlines_id));
        dictionary.set("NM", Object::string_literal(target.name.as_str()));

        if let Some(previous) = index.checked_sub(1).and_then(|i| entries.get(i)) {
            dictionary.set("Prev", Object::Reference(previous.object_id));
        }
        if let Some(next) = entries.get(index + 1) {
            dictionary.set("Next", Object::Reference(next.object_id));
        }

        document
            .objects
            .insert(entry.object_id, Object::Dictionary(dictionary));
    }
}

fn insert_outlines_root(
    outlines_id: ObjectId,
    document: &mut Document,
    entries: &[OutlineEntry<'_>],
) -> Result<(), BookmarkError> {
    let catalog_id = document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| BookmarkError::MissingCatalog)?;

    let mut dictionary = Dictionary::new();
    dictionary.set("Type", Object::Name("Outlines".into()));
    dictionary.set("Count", Object::Integer(entries.len() as i64));
    if let Some(first) = entries.first() {
        dictionary.set("First", Object::Reference(first.object_id));
    }
    if let Some(last) = entries.last() {
        dictionary.set("Last", Object::Reference(last.object_id));
    }
    document
        .objects
        .insert(outlines_id, Object::Dictionary(dictionary));

    document
        .objects
        .get_mut(&catalog_id)
        .ok_or(BookmarkError::MissingCatalog)?
        .as_dict_mut()
        .map_err(|_| BookmarkError::InvalidCatalog)?
        .set("Outlines", Object::Reference(outlines_id));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;

    #[test]
    fn targets_cover_titled_sections_only() {
        let config = ReportConfig::default();
        let geometry = PageGeometry::letter();
        let sections = PageSections::new(&geometry, &config.layout, &config.text);
        let targets = section_targets(&sections, &geometry, 1);
        let names: Vec<&str> = targets.iter().map(|target| target.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "timeInRanges",
                "glucoseMetrics",
                "ambulatoryGlucoseProfile",
                "dailyThumbnails"
            ]
        );
        assert_eq!(targets[0].left, 36.0);
        assert_eq!(targets[0].top, 792.0 - 54.0);
    }

    #[test]
    fn no_targets_leaves_bytes_untouched() {
        let bytes = b"not a pdf".to_vec();
        assert_eq!(apply_bookmarks(&bytes, &[]).unwrap(), bytes);
    }

    #[test]
    fn invalid_bytes_are_reported() {
        let target = BookmarkTarget {
            title: "Time in Ranges".into(),
            name: "timeInRanges".into(),
            page: 1,
            left: 0.0,
            top: 0.0,
        };
        assert!(matches!(
            apply_bookmarks(b"not a pdf", &[target]),
            Err(BookmarkError::Parse(_))
        ));
    }
}
