//! `.xlsx` / `.xlsm` documents through umya-spreadsheet

use super::Workbook;
use crate::types::*;
use std::path::Path;
use umya_spreadsheet::structs::Image;
use umya_spreadsheet::structs::drawing::spreadsheet::MarkerType;
use umya_spreadsheet::{Spreadsheet, Worksheet, reader, writer};

pub struct XlsxWorkbook {
    book: Spreadsheet,
}

impl XlsxWorkbook {
    pub fn from_spreadsheet(book: Spreadsheet) -> Self {
        Self { book }
    }

    fn sheet(&self, title: &str) -> Result<&Worksheet> {
        self.book
            .get_sheet_by_name(title)
            .ok_or_else(|| CatalogError::MissingSheet(title.to_string()))
    }

    fn sheet_mut(&mut self, title: &str) -> Result<&mut Worksheet> {
        self.book
            .get_sheet_by_name_mut(title)
            .ok_or_else(|| CatalogError::MissingSheet(title.to_string()))
    }
}

impl Workbook for XlsxWorkbook {
    fn open(path: &Path) -> Result<Self> {
        let book = reader::xlsx::read(path).map_err(|e| {
            CatalogError::Workbook(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(Self { book })
    }

    fn save(&self, path: &Path) -> Result<()> {
        writer::xlsx::write(&self.book, path).map_err(|e| {
            CatalogError::Workbook(format!("Failed to write {}: {}", path.display(), e))
        })
    }

    fn sheet_names(&self) -> Vec<String> {
        self.book
            .get_sheet_collection()
            .iter()
            .map(|sheet| sheet.get_name().to_string())
            .collect()
    }

    fn has_sheet(&self, title: &str) -> bool {
        self.book.get_sheet_by_name(title).is_some()
    }

    fn cell_text(&self, sheet: &str, pos: CellPos) -> Option<String> {
        self.book
            .get_sheet_by_name(sheet)?
            .get_cell(pos.to_a1().as_str())
            .map(|cell| cell.get_value().to_string())
    }

    fn set_cell_text(&mut self, sheet: &str, pos: CellPos, text: &str) -> Result<()> {
        self.sheet_mut(sheet)?
            .get_cell_mut(pos.to_a1().as_str())
            .set_value(text);
        Ok(())
    }

    fn used_extent(&self, sheet: &str) -> Option<(u32, u32)> {
        let (max_col, max_row) = self
            .book
            .get_sheet_by_name(sheet)?
            .get_highest_column_and_row();
        Some((max_row, max_col))
    }

    fn duplicate_sheet(&mut self, source: &str, new_title: &str) -> Result<()> {
        if !is_valid_title(new_title) {
            return Err(CatalogError::Workbook(format!(
                "{:?} is not a valid sheet title",
                new_title
            )));
        }

        let mut copy = self.sheet(source)?.clone();
        copy.set_name(new_title);
        self.book.add_sheet(copy).map_err(|e| {
            CatalogError::Workbook(format!("Failed to add sheet {:?}: {}", new_title, e))
        })?;
        Ok(())
    }

    fn remove_sheet(&mut self, title: &str) -> Result<()> {
        self.book.remove_sheet_by_name(title).map_err(|e| {
            CatalogError::Workbook(format!("Failed to remove sheet {:?}: {}", title, e))
        })
    }

    fn is_visible(&self, title: &str) -> Option<bool> {
        let state = self.book.get_sheet_by_name(title)?.get_sheet_state();
        Some(state != "hidden" && state != "veryHidden")
    }

    fn set_visible(&mut self, title: &str, visible: bool) -> Result<()> {
        let state = if visible { "visible" } else { "hidden" };
        self.sheet_mut(title)?.set_sheet_state(state.to_string());
        Ok(())
    }

    fn bind_image(
        &mut self,
        sheet: &str,
        anchor: CellPos,
        asset: &Path,
        size: ImageSize,
    ) -> Result<()> {
        let bytes = std::fs::read(asset)?;
        let name = asset
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| CatalogError::Workbook(format!("{} is not a file", asset.display())))?;

        let mut marker = MarkerType::default();
        marker.set_coordinate(anchor.to_a1());

        // The one-cell anchor extent is written in EMU (9525 per pixel)
        let mut image = Image::default();
        image.new_image_with_dimensions(size.height, size.width, &name, bytes, marker);

        self.sheet_mut(sheet)?.add_image(image);
        Ok(())
    }

    /// Workbook-scoped names pointing into a sheet are attached to that
    /// sheet when read back, so both lists are searched.
    fn named_range(&self, name: &str) -> Option<NamedRange> {
        self.book
            .get_defined_names()
            .iter()
            .chain(
                self.book
                    .get_sheet_collection()
                    .iter()
                    .flat_map(|sheet| sheet.get_defined_names()),
            )
            .find(|defined| defined.get_name() == name)
            .and_then(|defined| NamedRange::parse(&defined.get_address()).ok())
    }
}
