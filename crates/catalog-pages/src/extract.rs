//! Identifier extraction from the schedule sheet
//!
//! Two strategies sit behind [`IdentifierSource`]:
//! - [`HeaderRowExtractor`] reads the identifier column under a header row in
//!   sheet order and stops at the first blank identifier. Repeated rows are
//!   kept; de-duplication happens when pages are planned.
//! - [`LegacyScanExtractor`] serves sheets without a header schema. It scans
//!   every used cell for identifier markers and returns a de-duplicated,
//!   alphabetically sorted list. Its ordering differs from the header mode.

use crate::options::{CatalogOptions, ExtractionMode};
use crate::types::*;
use crate::workbook::{Workbook, is_blank};
use std::collections::BTreeSet;

/// One data row of the schedule, keyed by header text in column order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRow {
    pub row: u32,
    pub values: Vec<(String, String)>,
}

impl ScheduleRow {
    pub fn get(&self, header: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }
}

/// Result of running an extractor
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub identifiers: Vec<Identifier>,
    /// Row data backing each identifier (header mode only)
    pub rows: Vec<ScheduleRow>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Extraction {
    fn reject(&mut self, subject: String, err: InvalidIdentifier) {
        log::warn!("Skipping identifier {}: {}", subject, err);
        self.diagnostics
            .push(Diagnostic::warning(subject, err.to_string()));
    }
}

pub trait IdentifierSource {
    fn extract(&self, book: &dyn Workbook) -> Extraction;
}

/// Pick the extractor configured in `options`
pub fn extractor_for(options: &CatalogOptions) -> Box<dyn IdentifierSource> {
    match options.extraction_mode {
        ExtractionMode::HeaderRow => Box::new(HeaderRowExtractor::from_options(options)),
        ExtractionMode::LegacyScan => Box::new(LegacyScanExtractor::from_options(options)),
    }
}

/// Extract identifiers using the configured strategy
pub fn extract_identifiers(book: &dyn Workbook, options: &CatalogOptions) -> Extraction {
    extractor_for(options).extract(book)
}

#[derive(Debug, Clone)]
pub struct HeaderRowExtractor {
    pub sheet: String,
    pub header_row: u32,
    pub first_data_row: u32,
    pub id_column: String,
}

impl HeaderRowExtractor {
    pub fn from_options(options: &CatalogOptions) -> Self {
        Self {
            sheet: options.schedule_sheet.clone(),
            header_row: options.header_row,
            first_data_row: options.first_data_row,
            id_column: options.id_column.clone(),
        }
    }

    /// Column index → header text for every non-empty header cell
    fn headers(&self, book: &dyn Workbook, max_col: u32) -> Vec<(u32, String)> {
        (1..=max_col)
            .filter_map(|col| {
                let text = book.cell_text(&self.sheet, CellPos::new(self.header_row, col))?;
                let text = text.trim();
                (!text.is_empty()).then(|| (col, text.to_string()))
            })
            .collect()
    }
}

impl IdentifierSource for HeaderRowExtractor {
    fn extract(&self, book: &dyn Workbook) -> Extraction {
        let mut extraction = Extraction::default();

        let Some((max_row, max_col)) = book.used_extent(&self.sheet) else {
            log::warn!("Schedule sheet {:?} not found", self.sheet);
            return extraction;
        };

        let headers = self.headers(book, max_col);
        log::debug!(
            "Found columns: {:?}",
            headers.iter().map(|(_, h)| h.as_str()).collect::<Vec<_>>()
        );

        let Some(id_col) = headers
            .iter()
            .find(|(_, header)| *header == self.id_column)
            .map(|(col, _)| *col)
        else {
            log::warn!(
                "No {:?} column in header row {} of {:?}",
                self.id_column,
                self.header_row,
                self.sheet
            );
            return extraction;
        };

        for row in self.first_data_row..=max_row {
            let raw = book.cell_text(&self.sheet, CellPos::new(row, id_col));
            if is_blank(raw.as_deref()) {
                log::debug!("Row {} has no identifier, stopping", row);
                break;
            }
            let raw = raw.unwrap_or_default();

            match Identifier::clean(&raw) {
                Ok(identifier) => {
                    let values = headers
                        .iter()
                        .map(|(col, header)| {
                            let value = book
                                .cell_text(&self.sheet, CellPos::new(row, *col))
                                .unwrap_or_default();
                            (header.clone(), value)
                        })
                        .collect();
                    extraction.rows.push(ScheduleRow { row, values });
                    extraction.identifiers.push(identifier);
                }
                Err(err) => extraction.reject(format!("row {}", row), err),
            }
        }

        extraction
    }
}

#[derive(Debug, Clone)]
pub struct LegacyScanExtractor {
    pub sheet: String,
    pub markers: Vec<String>,
    pub id_list_name: Option<String>,
}

impl LegacyScanExtractor {
    pub fn from_options(options: &CatalogOptions) -> Self {
        Self {
            sheet: options.schedule_sheet.clone(),
            markers: options
                .identifier_markers
                .iter()
                .filter(|m| !m.is_empty())
                .map(|m| m.to_uppercase())
                .collect(),
            id_list_name: options.id_list_name.clone(),
        }
    }

    fn has_marker(&self, value: &str) -> bool {
        let upper = value.to_uppercase();
        self.markers.iter().any(|marker| upper.contains(marker.as_str()))
    }

    fn collect(
        &self,
        value: &str,
        subject: String,
        found: &mut BTreeSet<Identifier>,
        extraction: &mut Extraction,
    ) {
        match Identifier::clean(value) {
            Ok(identifier) => {
                found.insert(identifier);
            }
            Err(err) => extraction.reject(subject, err),
        }
    }
}

impl IdentifierSource for LegacyScanExtractor {
    fn extract(&self, book: &dyn Workbook) -> Extraction {
        let mut extraction = Extraction::default();
        let mut found = BTreeSet::new();

        if let Some(range) = self
            .id_list_name
            .as_deref()
            .and_then(|name| book.named_range(name))
        {
            log::debug!("Reading named identifier list {}!{}", range.sheet, range.region);
            for pos in range.region.cells() {
                let Some(value) = book.cell_text(&range.sheet, pos) else {
                    continue;
                };
                if value.trim().is_empty() {
                    continue;
                }
                self.collect(&value, format!("{}!{}", range.sheet, pos), &mut found, &mut extraction);
            }
        }

        let Some((max_row, max_col)) = book.used_extent(&self.sheet) else {
            log::warn!("Schedule sheet {:?} not found", self.sheet);
            extraction.identifiers = found.into_iter().collect();
            return extraction;
        };

        if max_row > 0 && max_col > 0 {
            let region = CellRegion::new(CellPos::new(1, 1), CellPos::new(max_row, max_col));
            for pos in region.cells() {
                let Some(value) = book.cell_text(&self.sheet, pos) else {
                    continue;
                };
                if self.has_marker(&value) {
                    self.collect(&value, format!("{}!{}", self.sheet, pos), &mut found, &mut extraction);
                }
            }
        }

        extraction.identifiers = found.into_iter().collect();
        extraction
    }
}
