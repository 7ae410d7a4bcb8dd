//! Document access
//!
//! The pipeline only needs a handful of operations on the spreadsheet
//! container. They are collected in [`Workbook`] so the same code drives a
//! real `.xlsx` file ([`XlsxWorkbook`]) and an in-memory document
//! ([`MemoryWorkbook`]).

mod memory;
mod xlsx;

pub use memory::{MemorySheet, MemoryWorkbook};
pub use xlsx::XlsxWorkbook;

use crate::types::*;
use std::path::Path;

pub trait Workbook {
    /// Load a document from storage
    fn open(path: &Path) -> Result<Self>
    where
        Self: Sized;

    /// Persist the whole document to `path`
    fn save(&self, path: &Path) -> Result<()>;

    /// Page titles in document order
    fn sheet_names(&self) -> Vec<String>;

    fn has_sheet(&self, title: &str) -> bool {
        self.sheet_names().iter().any(|name| name == title)
    }

    /// Text of a cell, `None` when the sheet or cell does not exist
    fn cell_text(&self, sheet: &str, pos: CellPos) -> Option<String>;

    fn set_cell_text(&mut self, sheet: &str, pos: CellPos, text: &str) -> Result<()>;

    /// Highest used `(row, column)`, `None` when the sheet does not exist
    fn used_extent(&self, sheet: &str) -> Option<(u32, u32)>;

    /// Append a full copy of `source` titled `new_title`
    fn duplicate_sheet(&mut self, source: &str, new_title: &str) -> Result<()>;

    fn remove_sheet(&mut self, title: &str) -> Result<()>;

    fn is_visible(&self, title: &str) -> Option<bool>;

    fn set_visible(&mut self, title: &str, visible: bool) -> Result<()>;

    /// Place the image at `asset` on `sheet`, anchored at `anchor` and drawn at `size`
    fn bind_image(&mut self, sheet: &str, anchor: CellPos, asset: &Path, size: ImageSize)
    -> Result<()>;

    /// Resolve a workbook-level defined name
    fn named_range(&self, name: &str) -> Option<NamedRange>;
}

/// Whether a cell value counts as empty for extraction purposes
pub(crate) fn is_blank(value: Option<&str>) -> bool {
    value.map(|v| v.trim().is_empty()).unwrap_or(true)
}
