use crate::types::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How identifiers are pulled out of the schedule sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtractionMode {
    /// Read the identifier column below a header row, stopping at the first blank
    #[default]
    HeaderRow,
    /// Scan every used cell for identifier markers; result is sorted and de-duplicated
    LegacyScan,
}

/// What to do when a page titled with an identifier already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConflictPolicy {
    /// Destroy the existing page and generate it again
    #[default]
    Recreate,
    /// Leave the existing page untouched
    Skip,
}

/// Fixed-page format requested from the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageFormat {
    #[default]
    Pdf,
    /// Archival PDF (PDF/A-2b)
    PdfA,
}

impl PageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            PageFormat::Pdf | PageFormat::PdfA => "pdf",
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogOptions {
    // Schedule sheet
    pub schedule_sheet: String,
    pub header_row: u32,
    pub first_data_row: u32,
    pub id_column: String,
    pub extraction_mode: ExtractionMode,
    /// Defined name holding the identifier list, consulted by the legacy scan
    pub id_list_name: Option<String>,

    // Template
    pub template_prefix: String,
    pub identifier_markers: Vec<String>,
    pub placeholder_region: CellRegion,

    // Images
    pub image_anchor: CellPos,
    pub image_box: ImageSize,
    pub asset_suffixes: Vec<String>,
    pub shared_assets: Vec<String>,
    pub asset_extensions: Vec<String>,

    // Export
    pub front_matter: Vec<String>,
    pub conflict_policy: ConflictPolicy,
    pub export_format: PageFormat,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            schedule_sheet: "Schedule".to_string(),
            header_row: 9,
            first_data_row: 11,
            id_column: "ID".to_string(),
            extraction_mode: ExtractionMode::HeaderRow,
            id_list_name: Some("list_ids".to_string()),
            template_prefix: "Template_".to_string(),
            identifier_markers: ["LC-", "LW-", "LT-", "LJ-"]
                .into_iter()
                .map(String::from)
                .collect(),
            placeholder_region: CellRegion::new(CellPos::new(1, 1), CellPos::new(50, 20)),
            image_anchor: CellPos::new(15, 4),
            image_box: ImageSize::new(300, 200),
            asset_suffixes: vec!["_image".to_string(), "_dimensions".to_string()],
            shared_assets: vec!["_no_image".to_string(), "_blank".to_string()],
            asset_extensions: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
            front_matter: vec!["Cover".to_string(), "GenInfo+Contacts".to_string()],
            conflict_policy: ConflictPolicy::Recreate,
            export_format: PageFormat::Pdf,
        }
    }
}

impl CatalogOptions {
    /// Load options from JSON file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options: Self = serde_json::from_slice(&bytes)
            .map_err(|e| CatalogError::Config(format!("Failed to parse config: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Save options to JSON file
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CatalogError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Title of the template page for a language variant, e.g. `Template_EN`
    pub fn template_title(&self, language: &str) -> Result<String> {
        validate_language(language)?;
        Ok(format!("{}{}", self.template_prefix, language))
    }

    /// Titles that generated pages must never take over
    pub fn protected_titles(&self, language: &str) -> Vec<String> {
        let mut titles = vec![
            self.schedule_sheet.clone(),
            format!("{}{}", self.template_prefix, language),
        ];
        titles.extend(self.front_matter.iter().cloned());
        titles
    }

    /// Candidate asset stems for an identifier, highest priority first
    pub fn asset_stems(&self, identifier: &Identifier) -> Vec<String> {
        self.asset_suffixes
            .iter()
            .map(|suffix| format!("{}{}", identifier, suffix))
            .chain(self.shared_assets.iter().cloned())
            .collect()
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if self.schedule_sheet.trim().is_empty() {
            return Err(CatalogError::Config("Schedule sheet name is empty".to_string()));
        }
        if self.id_column.trim().is_empty() {
            return Err(CatalogError::Config("Identifier column header is empty".to_string()));
        }
        if self.template_prefix.is_empty() {
            return Err(CatalogError::Config("Template prefix is empty".to_string()));
        }
        if self.header_row == 0 {
            return Err(CatalogError::Config("Header row is 1-based".to_string()));
        }
        if self.first_data_row <= self.header_row {
            return Err(CatalogError::Config(format!(
                "First data row ({}) must come after the header row ({})",
                self.first_data_row, self.header_row
            )));
        }
        if self.identifier_markers.iter().all(|m| m.is_empty()) {
            return Err(CatalogError::Config(
                "At least one identifier marker is required".to_string(),
            ));
        }
        if self.placeholder_region.is_inverted() {
            return Err(CatalogError::Config(format!(
                "Placeholder region {} is inverted",
                self.placeholder_region
            )));
        }
        if self.image_box.width == 0 || self.image_box.height == 0 {
            return Err(CatalogError::Config(format!(
                "Image box {} must be non-zero on both axes",
                self.image_box
            )));
        }
        if self.asset_suffixes.is_empty() && self.shared_assets.is_empty() {
            return Err(CatalogError::Config("No image asset candidates configured".to_string()));
        }
        if self.asset_extensions.is_empty() {
            return Err(CatalogError::Config("No image extensions configured".to_string()));
        }
        if let Some(bad) = self.front_matter.iter().find(|name| !is_valid_title(name)) {
            return Err(CatalogError::Config(format!(
                "Front-matter page {:?} is not a valid page title",
                bad
            )));
        }

        Ok(())
    }
}

/// Language variants are short ASCII codes such as `EN` or `DE`
pub fn validate_language(language: &str) -> Result<()> {
    let valid = (1..=8).contains(&language.len())
        && language.chars().all(|c| c.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(CatalogError::Config(format!(
            "Language variant {:?} must be 1-8 ASCII letters or digits",
            language
        )))
    }
}
