//! Run orchestration
//!
//! A run walks a fixed sequence of stages:
//! backup → load → extract → generate pages → save → select → render.
//! Backup problems and per-identifier failures are recorded and the run
//! carries on. Everything else stops the run. The outcome is always a
//! [`RunOutcome`], never an error.

pub mod io;

use crate::clone::ClonedPage;
use crate::extract::{Extraction, ScheduleRow, extract_identifiers};
use crate::options::CatalogOptions;
use crate::render::{RenderScope, Renderer, SofficeRenderer, inspect_export};
use crate::report::{EntryStatus, ReportEntry, RunReport};
use crate::resolve::{PageAction, apply_action, plan_pages, remove_generated_pages};
use crate::select::{select_pages, visibility_changes};
use crate::types::*;
use crate::workbook::{Workbook, XlsxWorkbook};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    BackedUp,
    Loaded,
    IdsExtracted,
    PagesResolved,
    Persisted,
    ExportSelected,
    Rendered,
    Done,
    Aborted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::BackedUp => "backed up",
            Stage::Loaded => "loaded",
            Stage::IdsExtracted => "identifiers extracted",
            Stage::PagesResolved => "pages resolved",
            Stage::Persisted => "persisted",
            Stage::ExportSelected => "export selected",
            Stage::Rendered => "rendered",
            Stage::Done => "done",
            Stage::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Progress notifications emitted during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    Stage(Stage),
    Page {
        identifier: String,
        current: usize,
        total: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub document_path: PathBuf,
    pub language: String,
    pub asset_dir: PathBuf,
}

impl RunRequest {
    pub fn new(
        document_path: impl Into<PathBuf>,
        language: impl Into<String>,
        asset_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            document_path: document_path.into(),
            language: language.into(),
            asset_dir: asset_dir.into(),
        }
    }
}

/// Terminal result of a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub success: bool,
    pub message: String,
    pub export_path: Option<PathBuf>,
    /// Last stage reached; [`Stage::Aborted`] on failure
    pub stage: Stage,
    pub report: RunReport,
}

/// A fatal step failure
struct Abort {
    step: &'static str,
    source: CatalogError,
}

impl Abort {
    fn new(step: &'static str, source: CatalogError) -> Self {
        Self { step, source }
    }
}

struct StageTracker<'p> {
    current: Stage,
    progress: &'p mut dyn FnMut(Progress),
}

impl StageTracker<'_> {
    fn advance(&mut self, stage: Stage) {
        log::debug!("Stage: {} -> {}", self.current, stage);
        self.current = stage;
        (self.progress)(Progress::Stage(stage));
    }
}

pub struct Pipeline<R: Renderer> {
    options: CatalogOptions,
    renderer: R,
}

impl<R: Renderer> Pipeline<R> {
    pub fn new(options: CatalogOptions, renderer: R) -> Self {
        Self { options, renderer }
    }

    pub fn options(&self) -> &CatalogOptions {
        &self.options
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Run against an `.xlsx`/`.xlsm` document
    pub fn run(&self, request: &RunRequest) -> RunOutcome {
        self.run_with::<XlsxWorkbook>(request, &mut |_| {})
    }

    /// Run against any [`Workbook`] implementation, reporting progress
    pub fn run_with<W: Workbook>(
        &self,
        request: &RunRequest,
        progress: &mut dyn FnMut(Progress),
    ) -> RunOutcome {
        log::info!("Starting processing of {}", request.document_path.display());

        let mut report = RunReport::default();
        let mut tracker = StageTracker {
            current: Stage::Start,
            progress,
        };
        (tracker.progress)(Progress::Stage(Stage::Start));

        match self.execute::<W>(request, &mut report, &mut tracker) {
            Ok(export_path) => {
                tracker.advance(Stage::Done);
                log::info!("Processing completed successfully: {}", export_path.display());
                RunOutcome {
                    success: true,
                    message: format!(
                        "Processing completed successfully! {} page(s) generated, {} kept, {} failed",
                        report.count(EntryStatus::Generated),
                        report.count(EntryStatus::Kept),
                        report.count(EntryStatus::Failed)
                    ),
                    export_path: Some(export_path),
                    stage: Stage::Done,
                    report,
                }
            }
            Err(abort) => {
                let reached = tracker.current;
                tracker.advance(Stage::Aborted);
                log::error!("Failed to {} (after stage {}): {}", abort.step, reached, abort.source);
                RunOutcome {
                    success: false,
                    message: format!("Failed to {}: {}", abort.step, abort.source),
                    export_path: None,
                    stage: Stage::Aborted,
                    report,
                }
            }
        }
    }

    fn execute<W: Workbook>(
        &self,
        request: &RunRequest,
        report: &mut RunReport,
        tracker: &mut StageTracker<'_>,
    ) -> std::result::Result<PathBuf, Abort> {
        let options = &self.options;
        let document = request.document_path.as_path();

        options
            .validate()
            .map_err(|e| Abort::new("validate options", e))?;
        let template = options
            .template_title(&request.language)
            .map_err(|e| Abort::new("select template", e))?;

        match io::create_backup(document) {
            Ok(path) => report.backup_path = Some(path),
            Err(e) => {
                log::warn!("Could not create backup of {}: {}", document.display(), e);
                report
                    .diagnostics
                    .push(Diagnostic::warning(document.display().to_string(), format!("backup failed: {}", e)));
            }
        }
        tracker.advance(Stage::BackedUp);

        let mut book = W::open(document).map_err(|e| Abort::new("load workbook", e))?;
        for required in [options.schedule_sheet.as_str(), template.as_str()] {
            if !book.has_sheet(required) {
                return Err(Abort::new(
                    "load workbook",
                    CatalogError::MissingSheet(required.to_string()),
                ));
            }
        }
        log::info!("Loaded workbook: {}", document.display());
        tracker.advance(Stage::Loaded);

        let extraction = extract_identifiers(&book, options);
        report.diagnostics.extend(extraction.diagnostics.iter().cloned());
        if extraction.identifiers.is_empty() {
            return Err(Abort::new(
                "extract identifiers",
                CatalogError::NoIdentifiers(options.schedule_sheet.clone()),
            ));
        }
        log::info!("Found {} identifier(s)", extraction.identifiers.len());
        tracker.advance(Stage::IdsExtracted);

        let exported = self.generate_pages(&mut book, &template, &extraction, request, report, tracker);
        tracker.advance(Stage::PagesResolved);

        let saved = io::save_with_fallback(&book, document)
            .map_err(|e| Abort::new("save workbook", e))?;
        report.saved_path = Some(saved.clone());
        tracker.advance(Stage::Persisted);

        let pages = book.sheet_names();
        let selection = select_pages(&options.front_matter, &exported, &pages);
        let current: Vec<(String, bool)> = pages
            .iter()
            .map(|title| (title.clone(), book.is_visible(title).unwrap_or(true)))
            .collect();
        let changes = visibility_changes(&selection, &current);
        log::info!("Sheets to include in export: {:?}", selection.included);
        tracker.advance(Stage::ExportSelected);

        let export_path = io::export_path(document, options.export_format);
        if export_path.exists() {
            std::fs::remove_file(&export_path)
                .map_err(|e| Abort::new("remove previous export", e.into()))?;
        }
        log::info!("Creating export: {}", export_path.display());

        let mut scope = RenderScope::open(&self.renderer, &saved)
            .map_err(|e| Abort::new("open renderer", e))?;
        let rendered = scope
            .apply(&changes)
            .and_then(|()| scope.export(&export_path, options.export_format));
        let finished = scope.finish();
        rendered.map_err(|e| Abort::new("render export", e))?;
        finished.map_err(|e| Abort::new("close renderer", e))?;

        let page_count = inspect_export(&export_path).map_err(|e| Abort::new("verify export", e))?;
        report.export_pages = Some(page_count);
        log::info!("Export created: {} ({} page(s))", export_path.display(), page_count);
        tracker.advance(Stage::Rendered);

        Ok(export_path)
    }

    /// Create or recreate pages in canonical order.
    /// Returns the identifiers that have a page afterwards.
    fn generate_pages(
        &self,
        book: &mut dyn Workbook,
        template: &str,
        extraction: &Extraction,
        request: &RunRequest,
        report: &mut RunReport,
        tracker: &mut StageTracker<'_>,
    ) -> Vec<Identifier> {
        let options = &self.options;
        let protected = options.protected_titles(&request.language);
        let plan = plan_pages(
            &extraction.identifiers,
            &book.sheet_names(),
            &protected,
            options.conflict_policy,
        );
        report.diagnostics.extend(plan.diagnostics.iter().cloned());

        let rows: HashMap<&str, &ScheduleRow> = extraction
            .identifiers
            .iter()
            .zip(&extraction.rows)
            .rev()
            .map(|(id, row)| (id.as_str(), row))
            .collect();

        let total = plan.pages.len();
        let mut exported = Vec::with_capacity(total);

        for (index, page) in plan.pages.iter().enumerate() {
            (tracker.progress)(Progress::Page {
                identifier: page.identifier.to_string(),
                current: index + 1,
                total,
            });
            if let Some(row) = rows.get(page.identifier.as_str()) {
                log::debug!("Row {} data: {:?}", row.row, row.values);
            }

            match apply_action(book, page, template, &request.asset_dir, options) {
                Ok(Some(cloned)) => {
                    report.diagnostics.extend(cloned.diagnostics.iter().cloned());
                    report.entries.push(generated_entry(page.action, &cloned));
                    exported.push(page.identifier.clone());
                }
                Ok(None) => {
                    report.entries.push(ReportEntry {
                        identifier: page.identifier.to_string(),
                        action: page.action,
                        status: EntryStatus::Kept,
                        placeholder: None,
                        image: None,
                        image_fallback: false,
                        message: "existing page kept".to_string(),
                    });
                    exported.push(page.identifier.clone());
                }
                Err(e) => {
                    log::error!("Error creating sheet {}: {}", page.identifier, e);
                    report
                        .diagnostics
                        .push(Diagnostic::error(page.identifier.as_str(), e.to_string()));
                    report.entries.push(ReportEntry {
                        identifier: page.identifier.to_string(),
                        action: page.action,
                        status: EntryStatus::Failed,
                        placeholder: None,
                        image: None,
                        image_fallback: false,
                        message: e.to_string(),
                    });
                }
            }
        }

        log::info!("Created {} sheet(s)", report.count(EntryStatus::Generated));
        exported
    }

    /// Extract identifiers without modifying the document
    pub fn list_identifiers<W: Workbook>(&self, document: &Path) -> Result<Extraction> {
        self.options.validate()?;
        let book = W::open(document)?;
        Ok(extract_identifiers(&book, &self.options))
    }

    /// Remove every generated page named in the schedule and save in place.
    /// Returns the removed page titles.
    pub fn clear_generated_pages<W: Workbook>(&self, document: &Path, language: &str) -> Result<Vec<String>> {
        self.options.validate()?;
        if let Err(e) = io::create_backup(document) {
            log::warn!("Could not create backup of {}: {}", document.display(), e);
        }

        let mut book = W::open(document)?;
        let extraction = extract_identifiers(&book, &self.options);
        let protected = self.options.protected_titles(language);
        let removed = remove_generated_pages(&mut book, &extraction.identifiers, &protected)?;

        if !removed.is_empty() {
            book.save(document)?;
            log::info!("Workbook saved after clearing {} sheet(s)", removed.len());
        }
        Ok(removed)
    }
}

impl<R> Pipeline<R>
where
    R: Renderer + Send + Sync + 'static,
{
    /// Run on the blocking thread pool so async callers stay responsive
    pub async fn run_async<W: Workbook + 'static>(
        self: Arc<Self>,
        request: RunRequest,
    ) -> Result<RunOutcome> {
        let outcome =
            tokio::task::spawn_blocking(move || self.run_with::<W>(&request, &mut |_| {})).await?;
        Ok(outcome)
    }
}

fn generated_entry(action: PageAction, cloned: &ClonedPage) -> ReportEntry {
    let message = match (&cloned.image, cloned.placeholder) {
        (Some(_), Some(_)) => "ok".to_string(),
        (None, _) => "page created without image".to_string(),
        (Some(_), None) => "no placeholder cell found".to_string(),
    };
    ReportEntry {
        identifier: cloned.identifier.to_string(),
        action,
        status: EntryStatus::Generated,
        placeholder: cloned.placeholder.map(|p| p.to_a1()),
        image: cloned
            .image
            .as_ref()
            .map(|img| img.path.display().to_string()),
        image_fallback: cloned.image.as_ref().is_some_and(|img| img.fallback),
        message,
    }
}

/// Run with default options and the LibreOffice renderer.
pub fn run(
    document_path: impl Into<PathBuf>,
    language: &str,
    asset_dir: impl Into<PathBuf>,
) -> RunOutcome {
    let pipeline = Pipeline::new(CatalogOptions::default(), SofficeRenderer::default());
    pipeline.run(&RunRequest::new(document_path, language, asset_dir))
}
