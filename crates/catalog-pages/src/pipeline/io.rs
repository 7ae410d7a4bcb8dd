//! Backup, persistence and artifact paths

use crate::options::PageFormat;
use crate::types::*;
use crate::workbook::Workbook;
use std::path::{Path, PathBuf};

/// Local time formatted as `YYYYMMDD_HHMMSS`
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// `<stem><suffix>.<ext>` next to `document`, keeping its extension
fn sibling(document: &Path, suffix: &str) -> PathBuf {
    let stem = document
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match document.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };
    document.with_file_name(name)
}

pub fn backup_path(document: &Path, timestamp: &str) -> PathBuf {
    sibling(document, &format!("_backup_{}", timestamp))
}

pub fn modified_path(document: &Path, timestamp: &str) -> PathBuf {
    sibling(document, &format!("_modified_{}", timestamp))
}

/// `<stem>_output.pdf` next to `document`
pub fn export_path(document: &Path, format: PageFormat) -> PathBuf {
    let stem = document
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    document.with_file_name(format!("{}_output.{}", stem, format.extension()))
}

/// Copy `document` to a timestamped backup beside it
pub fn create_backup(document: &Path) -> Result<PathBuf> {
    let backup = backup_path(document, &timestamp());
    std::fs::copy(document, &backup)?;
    log::info!("Created backup: {}", backup.display());
    Ok(backup)
}

/// Save over `document`; if that fails, save once to a timestamped
/// `_modified_` path instead. Returns the path actually written.
pub fn save_with_fallback(book: &dyn Workbook, document: &Path) -> Result<PathBuf> {
    match book.save(document) {
        Ok(()) => {
            log::info!("Workbook saved: {}", document.display());
            Ok(document.to_path_buf())
        }
        Err(e) => {
            let alternate = modified_path(document, &timestamp());
            log::warn!(
                "Could not save {} ({}), trying {}",
                document.display(),
                e,
                alternate.display()
            );
            book.save(&alternate)?;
            log::info!("Workbook saved as: {}", alternate.display());
            Ok(alternate)
        }
    }
}
