//! In-memory workbook persisted as a JSON snapshot

use super::Workbook;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySheet {
    pub title: String,
    pub visible: bool,
    pub cells: BTreeMap<CellPos, String>,
    pub images: Vec<ImageBinding>,
}

impl MemorySheet {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            visible: true,
            cells: BTreeMap::new(),
            images: Vec::new(),
        }
    }

    /// Set a cell by A1 reference
    pub fn set(&mut self, reference: &str, text: impl Into<String>) -> Result<&mut Self> {
        let pos: CellPos = reference.parse()?;
        self.cells.insert(pos, text.into());
        Ok(self)
    }

    pub fn get(&self, reference: &str) -> Option<&str> {
        let pos: CellPos = reference.parse().ok()?;
        self.cells.get(&pos).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryWorkbook {
    sheets: Vec<MemorySheet>,
    defined_names: BTreeMap<String, String>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an empty visible sheet and return it for filling
    pub fn add_sheet(&mut self, title: impl Into<String>) -> &mut MemorySheet {
        self.sheets.push(MemorySheet::new(title));
        let last = self.sheets.len() - 1;
        &mut self.sheets[last]
    }

    pub fn sheet(&self, title: &str) -> Option<&MemorySheet> {
        self.sheets.iter().find(|s| s.title == title)
    }

    pub fn sheet_mut(&mut self, title: &str) -> Option<&mut MemorySheet> {
        self.sheets.iter_mut().find(|s| s.title == title)
    }

    /// Register a defined name such as `list_ids` → `'Schedule'!$A$11:$A$47`
    pub fn define_name(&mut self, name: impl Into<String>, address: impl Into<String>) {
        self.defined_names.insert(name.into(), address.into());
    }

    fn require_mut(&mut self, title: &str) -> Result<&mut MemorySheet> {
        self.sheet_mut(title)
            .ok_or_else(|| CatalogError::MissingSheet(title.to_string()))
    }
}

impl Workbook for MemoryWorkbook {
    fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.title.clone()).collect()
    }

    fn cell_text(&self, sheet: &str, pos: CellPos) -> Option<String> {
        self.sheet(sheet)?.cells.get(&pos).cloned()
    }

    fn set_cell_text(&mut self, sheet: &str, pos: CellPos, text: &str) -> Result<()> {
        self.require_mut(sheet)?.cells.insert(pos, text.to_string());
        Ok(())
    }

    fn used_extent(&self, sheet: &str) -> Option<(u32, u32)> {
        let sheet = self.sheet(sheet)?;
        let rows = sheet.cells.keys().map(|p| p.row).max().unwrap_or(0);
        let cols = sheet.cells.keys().map(|p| p.col).max().unwrap_or(0);
        Some((rows, cols))
    }

    fn duplicate_sheet(&mut self, source: &str, new_title: &str) -> Result<()> {
        if !is_valid_title(new_title) {
            return Err(CatalogError::Workbook(format!(
                "{:?} is not a valid sheet title",
                new_title
            )));
        }
        if self.has_sheet(new_title) {
            return Err(CatalogError::Workbook(format!(
                "Sheet {:?} already exists",
                new_title
            )));
        }

        let mut copy = self
            .sheet(source)
            .cloned()
            .ok_or_else(|| CatalogError::MissingSheet(source.to_string()))?;
        copy.title = new_title.to_string();
        self.sheets.push(copy);
        Ok(())
    }

    fn remove_sheet(&mut self, title: &str) -> Result<()> {
        let index = self
            .sheets
            .iter()
            .position(|s| s.title == title)
            .ok_or_else(|| CatalogError::MissingSheet(title.to_string()))?;
        self.sheets.remove(index);
        Ok(())
    }

    fn is_visible(&self, title: &str) -> Option<bool> {
        self.sheet(title).map(|s| s.visible)
    }

    fn set_visible(&mut self, title: &str, visible: bool) -> Result<()> {
        self.require_mut(title)?.visible = visible;
        Ok(())
    }

    fn bind_image(
        &mut self,
        sheet: &str,
        anchor: CellPos,
        asset: &Path,
        size: ImageSize,
    ) -> Result<()> {
        self.require_mut(sheet)?.images.push(ImageBinding {
            anchor,
            path: asset.to_path_buf(),
            size,
        });
        Ok(())
    }

    fn named_range(&self, name: &str) -> Option<NamedRange> {
        let address = self.defined_names.get(name)?;
        NamedRange::parse(address).ok()
    }
}
