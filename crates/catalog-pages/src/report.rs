use crate::resolve::PageAction;
use crate::types::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Page was (re)generated in this run
    Generated,
    /// Existing page was left in place
    Kept,
    /// Page could not be generated; identifier left out of the export
    Failed,
}

/// What happened to one identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub identifier: String,
    pub action: PageAction,
    pub status: EntryStatus,
    pub placeholder: Option<String>,
    pub image: Option<String>,
    pub image_fallback: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub entries: Vec<ReportEntry>,
    pub diagnostics: Vec<Diagnostic>,
    pub backup_path: Option<PathBuf>,
    /// Where the modified document was written (the input path unless the fallback was used)
    pub saved_path: Option<PathBuf>,
    /// Page count of the rendered artifact
    pub export_pages: Option<usize>,
}

impl RunReport {
    pub fn count(&self, status: EntryStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    /// Write one CSV row per identifier
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for entry in &self.entries {
            writer.serialize(entry)?;
        }
        writer.flush()?;
        Ok(())
    }
}
