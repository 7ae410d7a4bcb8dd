//! Template cloning
//!
//! Every generated page starts as a copy of the template page:
//! 1. Duplicate the template under the identifier's title
//! 2. Rewrite the first placeholder cell found in the scan window
//! 3. Bind the best available image, shrunk to fit the image box
//!
//! The template itself is only ever read.

mod assets;

pub use assets::{ResolvedAsset, fit_to_box, natural_size, resolve_asset};

use crate::options::CatalogOptions;
use crate::types::*;
use crate::workbook::Workbook;
use std::path::{Path, PathBuf};

/// Image attached to a generated page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundImage {
    pub path: PathBuf,
    pub natural: ImageSize,
    pub fitted: ImageSize,
    pub fallback: bool,
}

/// Outcome of cloning the template for one identifier
#[derive(Debug, Clone, PartialEq)]
pub struct ClonedPage {
    pub identifier: Identifier,
    /// Cell rewritten to the identifier, if a placeholder was found
    pub placeholder: Option<CellPos>,
    pub image: Option<BoundImage>,
    pub diagnostics: Vec<Diagnostic>,
}

/// First cell in `region` (row-major) whose text contains one of `markers`
pub fn find_placeholder(
    book: &dyn Workbook,
    sheet: &str,
    region: CellRegion,
    markers: &[String],
) -> Option<CellPos> {
    region.cells().find(|pos| {
        book.cell_text(sheet, *pos)
            .map(|text| {
                markers
                    .iter()
                    .any(|marker| !marker.is_empty() && text.contains(marker.as_str()))
            })
            .unwrap_or(false)
    })
}

/// Create the page for `identifier` from `template`.
///
/// Only a failure to create the page itself is an error. Missing or
/// unreadable images are reported in [`ClonedPage::diagnostics`].
pub fn clone_template(
    book: &mut dyn Workbook,
    template: &str,
    identifier: &Identifier,
    asset_dir: &Path,
    options: &CatalogOptions,
) -> Result<ClonedPage> {
    let title = identifier.as_str();

    book.duplicate_sheet(template, title)?;
    book.set_visible(title, true)?;

    let placeholder = find_placeholder(
        book,
        title,
        options.placeholder_region,
        &options.identifier_markers,
    );
    match placeholder {
        Some(pos) => {
            book.set_cell_text(title, pos, title)?;
            log::debug!("Set selection cell {} of {} to {}", pos, title, title);
        }
        None => log::warn!(
            "No placeholder found in {} of {} for {}",
            options.placeholder_region,
            template,
            identifier
        ),
    }

    let mut diagnostics = Vec::new();
    let image = bind_asset(book, identifier, asset_dir, options, &mut diagnostics);

    Ok(ClonedPage {
        identifier: identifier.clone(),
        placeholder,
        image,
        diagnostics,
    })
}

fn bind_asset(
    book: &mut dyn Workbook,
    identifier: &Identifier,
    asset_dir: &Path,
    options: &CatalogOptions,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<BoundImage> {
    let Some(asset) = resolve_asset(asset_dir, identifier, options) else {
        log::warn!("No suitable image found for {} in {}", identifier, asset_dir.display());
        diagnostics.push(Diagnostic::warning(
            identifier.as_str(),
            format!("no image found in {}", asset_dir.display()),
        ));
        return None;
    };

    let natural = match natural_size(&asset.path) {
        Ok(size) => size,
        Err(e) => {
            log::warn!("Cannot read image {}: {}", asset.path.display(), e);
            diagnostics.push(Diagnostic::warning(
                identifier.as_str(),
                format!("unreadable image {}: {}", asset.path.display(), e),
            ));
            return None;
        }
    };

    let fitted = fit_to_box(natural, options.image_box);
    if fitted != natural {
        log::debug!("Resized image for {} from {} to {}", identifier, natural, fitted);
    }

    if let Err(e) = book.bind_image(identifier.as_str(), options.image_anchor, &asset.path, fitted) {
        log::warn!("Failed to add image for {}: {}", identifier, e);
        diagnostics.push(Diagnostic::warning(identifier.as_str(), e.to_string()));
        return None;
    }

    log::info!("Added image for {}: {}", identifier, asset.path.display());
    Some(BoundImage {
        fallback: asset.is_fallback(),
        path: asset.path,
        natural,
        fitted,
    })
}
