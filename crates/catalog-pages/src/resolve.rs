//! Page conflict resolution
//!
//! Decides per identifier whether its page is created, recreated or left
//! alone, so that re-running against the same document converges on the
//! same set of generated pages. One policy applies to a whole run.

use crate::clone::{ClonedPage, clone_template};
use crate::options::{CatalogOptions, ConflictPolicy};
use crate::types::*;
use crate::workbook::Workbook;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageAction {
    /// No page with this title exists yet
    Create,
    /// Existing page is removed, then generated fresh
    Recreate,
    /// Existing page is kept as-is
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPage {
    pub identifier: Identifier,
    pub action: PageAction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionPlan {
    pub policy: ConflictPolicy,
    pub pages: Vec<PlannedPage>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ResolutionPlan {
    /// Unique identifiers in first-seen order
    pub fn canonical(&self) -> Vec<Identifier> {
        self.pages.iter().map(|p| p.identifier.clone()).collect()
    }
}

/// Plan one action per unique identifier.
///
/// Repeats keep their first position. Identifiers that would take over a
/// protected page (schedule, template, front matter) are dropped with an
/// error diagnostic.
pub fn plan_pages(
    identifiers: &[Identifier],
    existing: &[String],
    protected: &[String],
    policy: ConflictPolicy,
) -> ResolutionPlan {
    let existing: HashSet<&str> = existing.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let mut pages = Vec::new();
    let mut diagnostics = Vec::new();

    for identifier in identifiers {
        if !seen.insert(identifier.as_str()) {
            log::debug!("Identifier {} repeated in schedule, keeping first occurrence", identifier);
            continue;
        }

        if protected.iter().any(|p| p == identifier.as_str()) {
            log::error!("Identifier {} collides with a required page, skipping", identifier);
            diagnostics.push(Diagnostic::error(
                identifier.as_str(),
                "identifier matches a required page title",
            ));
            continue;
        }

        let action = match (existing.contains(identifier.as_str()), policy) {
            (false, _) => PageAction::Create,
            (true, ConflictPolicy::Recreate) => PageAction::Recreate,
            (true, ConflictPolicy::Skip) => PageAction::Skip,
        };

        pages.push(PlannedPage {
            identifier: identifier.clone(),
            action,
        });
    }

    ResolutionPlan {
        policy,
        pages,
        diagnostics,
    }
}

/// Carry out a planned action. Returns `None` for [`PageAction::Skip`].
///
/// If cloning fails part-way the half-built page is removed again, so a
/// failed identifier never leaves a page behind.
pub fn apply_action(
    book: &mut dyn Workbook,
    page: &PlannedPage,
    template: &str,
    asset_dir: &Path,
    options: &CatalogOptions,
) -> Result<Option<ClonedPage>> {
    let title = page.identifier.as_str();

    match page.action {
        PageAction::Skip => {
            log::info!("Sheet {} already exists, skipping", title);
            return Ok(None);
        }
        PageAction::Recreate => {
            log::info!("Sheet {} already exists, deleting and recreating", title);
            book.remove_sheet(title)?;
        }
        PageAction::Create => {
            log::info!("Creating sheet: {}", title);
        }
    }

    match clone_template(book, template, &page.identifier, asset_dir, options) {
        Ok(cloned) => Ok(Some(cloned)),
        Err(e) => {
            if book.has_sheet(title) {
                if let Err(cleanup) = book.remove_sheet(title) {
                    log::warn!("Could not remove partial sheet {}: {}", title, cleanup);
                }
            }
            Err(e)
        }
    }
}

/// Remove every page titled after one of `identifiers`, except protected titles.
/// Returns the removed titles.
pub fn remove_generated_pages(
    book: &mut dyn Workbook,
    identifiers: &[Identifier],
    protected: &[String],
) -> Result<Vec<String>> {
    let mut removed = Vec::new();
    for identifier in identifiers {
        let title = identifier.as_str();
        if protected.iter().any(|p| p == title) || removed.iter().any(|r| r == title) {
            continue;
        }
        if book.has_sheet(title) {
            book.remove_sheet(title)?;
            log::info!("Removed sheet: {}", title);
            removed.push(title.to_string());
        }
    }
    Ok(removed)
}
