//! Image asset lookup and sizing

use crate::options::CatalogOptions;
use crate::types::*;
use std::path::{Path, PathBuf};

/// An image file found for an identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub path: PathBuf,
    /// Position of the matching stem in the candidate list; 0 is the preferred asset
    pub rank: usize,
}

impl ResolvedAsset {
    pub fn is_fallback(&self) -> bool {
        self.rank > 0
    }
}

/// Find the first existing asset for `identifier`.
///
/// Stems are tried in priority order (`{id}_image`, `{id}_dimensions`,
/// `_no_image`, `_blank` by default), each with every configured extension.
pub fn resolve_asset(
    asset_dir: &Path,
    identifier: &Identifier,
    options: &CatalogOptions,
) -> Option<ResolvedAsset> {
    for (rank, stem) in options.asset_stems(identifier).iter().enumerate() {
        for ext in &options.asset_extensions {
            let path = asset_dir.join(format!("{}.{}", stem, ext));
            if path.is_file() {
                if rank > 0 {
                    log::info!("Using alternative image for {}: {}", identifier, path.display());
                }
                return Some(ResolvedAsset { path, rank });
            }
        }
    }
    None
}

/// Scale `natural` down to fit inside `bounds`, preserving aspect ratio.
///
/// Images already inside the box keep their natural size.
pub fn fit_to_box(natural: ImageSize, bounds: ImageSize) -> ImageSize {
    if natural.width == 0 || natural.height == 0 || bounds.width == 0 || bounds.height == 0 {
        return natural;
    }

    let width_ratio = bounds.width as f64 / natural.width as f64;
    let height_ratio = bounds.height as f64 / natural.height as f64;
    let scale = width_ratio.min(height_ratio);

    if scale >= 1.0 {
        return natural;
    }

    let width = ((natural.width as f64 * scale) as u32).clamp(1, bounds.width);
    let height = ((natural.height as f64 * scale) as u32).clamp(1, bounds.height);
    ImageSize { width, height }
}

/// Natural pixel size of an image file
pub fn natural_size(path: &Path) -> Result<ImageSize> {
    let (width, height) = image::image_dimensions(path)?;
    Ok(ImageSize { width, height })
}
