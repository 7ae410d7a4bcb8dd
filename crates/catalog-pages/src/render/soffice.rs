//! Headless LibreOffice renderer
//!
//! Each session works on a scratch copy of the document, so hiding pages
//! for an export never touches the persisted file. LibreOffice leaves
//! hidden sheets out of the PDF. Every session also gets its own
//! LibreOffice profile, so a conversion never hands off to an instance that
//! is already running for the same user.

use super::Renderer;
use crate::options::PageFormat;
use crate::types::*;
use crate::workbook::{Workbook, XlsxWorkbook};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tempfile::TempDir;

pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(120);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct SofficeRenderer {
    soffice_path: PathBuf,
    timeout: Duration,
}

impl Default for SofficeRenderer {
    fn default() -> Self {
        Self::new("soffice")
    }
}

impl SofficeRenderer {
    pub fn new(soffice_path: impl Into<PathBuf>) -> Self {
        Self {
            soffice_path: soffice_path.into(),
            timeout: DEFAULT_RENDER_TIMEOUT,
        }
    }

    /// Limit for a single conversion; the child is killed once it passes
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wait for `child` until the deadline, killing and reaping it on expiry
    fn wait_with_deadline(&self, child: &mut Child) -> Result<ExitStatus> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                if let Err(e) = child.kill() {
                    log::warn!("Could not kill soffice (pid {}): {}", child.id(), e);
                }
                let _ = child.wait();
                return Err(CatalogError::Render(format!(
                    "soffice timed out after {:?}",
                    self.timeout
                )));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    fn filter(format: PageFormat) -> &'static str {
        match format {
            PageFormat::Pdf => "pdf",
            PageFormat::PdfA => {
                r#"pdf:calc_pdf_Export:{"SelectPdfVersion":{"type":"long","value":"2"}}"#
            }
        }
    }
}

pub struct SofficeSession {
    scratch: TempDir,
    copy: PathBuf,
    book: XlsxWorkbook,
}

impl Renderer for SofficeRenderer {
    type Session = SofficeSession;

    fn open(&self, document: &Path) -> Result<SofficeSession> {
        let scratch = tempfile::Builder::new().prefix("catalog-render").tempdir()?;
        let file_name = document
            .file_name()
            .ok_or_else(|| CatalogError::Render(format!("{} is not a file", document.display())))?;
        let copy = scratch.path().join(file_name);
        std::fs::copy(document, &copy)?;
        let book = XlsxWorkbook::open(&copy)?;

        Ok(SofficeSession {
            scratch,
            copy,
            book,
        })
    }

    fn set_visibility(&self, session: &mut SofficeSession, page: &str, visible: bool) -> Result<()> {
        session.book.set_visible(page, visible)
    }

    fn export(&self, session: &mut SofficeSession, output: &Path, format: PageFormat) -> Result<()> {
        session.book.save(&session.copy)?;

        let out_dir = session.scratch.path().join("out");
        std::fs::create_dir_all(&out_dir)?;

        let profile_url = format!(
            "-env:UserInstallation=file://{}",
            session.scratch.path().join("profile").display()
        );
        let stdout_log = session.scratch.path().join("soffice.out");
        let stderr_log = session.scratch.path().join("soffice.err");

        let mut child = Command::new(&self.soffice_path)
            .arg(&profile_url)
            .args([
                "--headless",
                "--norestore",
                "--nodefault",
                "--nofirststartwizard",
                "--nolockcheck",
                "--convert-to",
                Self::filter(format),
                "--outdir",
            ])
            .arg(&out_dir)
            .arg(&session.copy)
            .stdin(Stdio::null())
            .stdout(File::create(&stdout_log)?)
            .stderr(File::create(&stderr_log)?)
            .spawn()
            .map_err(|e| {
                CatalogError::Render(format!(
                    "failed to spawn {}: {}",
                    self.soffice_path.display(),
                    e
                ))
            })?;
        log::debug!("soffice started (pid {}), limit {:?}", child.id(), self.timeout);

        let status = self.wait_with_deadline(&mut child)?;
        if !status.success() {
            return Err(CatalogError::Render(format!(
                "soffice failed (exit {}): stderr={}, stdout={}",
                status.code().unwrap_or(-1),
                std::fs::read_to_string(&stderr_log).unwrap_or_default(),
                std::fs::read_to_string(&stdout_log).unwrap_or_default()
            )));
        }

        let stem = session
            .copy
            .file_stem()
            .ok_or_else(|| CatalogError::Render("scratch copy has no file stem".to_string()))?;
        let produced = out_dir.join(format!("{}.{}", stem.to_string_lossy(), format.extension()));
        if !produced.is_file() {
            return Err(CatalogError::Render(format!(
                "soffice reported success but wrote no {}",
                produced.display()
            )));
        }

        std::fs::copy(&produced, output)?;
        Ok(())
    }

    fn close(&self, session: SofficeSession) -> Result<()> {
        session.scratch.close()?;
        Ok(())
    }
}
