//! Export page selection
//!
//! The export contains the front matter in its declared order followed by
//! the generated pages in canonical order. Everything else is hidden for
//! the duration of the render only; nothing is deleted.

use crate::types::*;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExportSelection {
    /// Page titles to include, in export order
    pub included: Vec<String>,
    /// Document pages left out of the export, in document order
    pub excluded: Vec<String>,
}

impl ExportSelection {
    pub fn includes(&self, title: &str) -> bool {
        self.included.iter().any(|t| t == title)
    }
}

/// Compute the export selection for a document.
pub fn select_pages(
    front_matter: &[String],
    canonical: &[Identifier],
    document_pages: &[String],
) -> ExportSelection {
    let mut included: Vec<String> = Vec::with_capacity(front_matter.len() + canonical.len());
    let mut seen = HashSet::new();

    let titles = front_matter
        .iter()
        .map(String::as_str)
        .chain(canonical.iter().map(Identifier::as_str));
    for title in titles {
        if seen.insert(title) {
            included.push(title.to_string());
        }
    }

    for name in front_matter {
        if !document_pages.iter().any(|p| p == name) {
            log::warn!("Front-matter page {:?} not found in document", name);
        }
    }

    let excluded = document_pages
        .iter()
        .filter(|page| !seen.contains(page.as_str()))
        .cloned()
        .collect();

    ExportSelection { included, excluded }
}

/// A visibility change needed for the render, with the state to restore afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityChange {
    pub title: String,
    pub visible: bool,
    pub original: bool,
}

/// Changes that make exactly the selected pages visible.
///
/// `current` is every document page with its visibility before the render.
/// Pages already in the wanted state produce no change.
pub fn visibility_changes(
    selection: &ExportSelection,
    current: &[(String, bool)],
) -> Vec<VisibilityChange> {
    current
        .iter()
        .filter_map(|(title, visible)| {
            let wanted = selection.includes(title);
            (wanted != *visible).then(|| VisibilityChange {
                title: title.clone(),
                visible: wanted,
                original: *visible,
            })
        })
        .collect()
}
