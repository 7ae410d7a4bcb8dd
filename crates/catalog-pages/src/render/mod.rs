//! Delegated rendering
//!
//! The export artifact is produced by an external renderer. The core only
//! tells it which pages to show and where to write. [`RenderScope`] wraps a
//! renderer session so that visibility changes are undone and the session
//! is closed on every exit path, and so that only one render runs per
//! process at a time.

mod soffice;

pub use soffice::{DEFAULT_RENDER_TIMEOUT, SofficeRenderer, SofficeSession};

use crate::options::PageFormat;
use crate::select::VisibilityChange;
use crate::types::*;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// External capability that rasterizes a document into a paginated artifact
pub trait Renderer {
    type Session;

    fn open(&self, document: &Path) -> Result<Self::Session>;

    fn set_visibility(&self, session: &mut Self::Session, page: &str, visible: bool)
    -> Result<()>;

    fn export(&self, session: &mut Self::Session, output: &Path, format: PageFormat)
    -> Result<()>;

    fn close(&self, session: Self::Session) -> Result<()>;
}

static RENDER_LOCK: Mutex<()> = Mutex::new(());

/// An open renderer session with guaranteed cleanup
pub struct RenderScope<'r, R: Renderer> {
    renderer: &'r R,
    session: Option<R::Session>,
    applied: Vec<VisibilityChange>,
    _lock: MutexGuard<'static, ()>,
}

impl<'r, R: Renderer> RenderScope<'r, R> {
    /// Wait for any other render to finish, then open `document`
    pub fn open(renderer: &'r R, document: &Path) -> Result<Self> {
        let lock = RENDER_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let session = renderer.open(document)?;
        log::debug!("Opened render session for {}", document.display());
        Ok(Self {
            renderer,
            session: Some(session),
            applied: Vec::new(),
            _lock: lock,
        })
    }

    fn session_mut(&mut self) -> Result<&mut R::Session> {
        self.session
            .as_mut()
            .ok_or_else(|| CatalogError::Render("render session already closed".to_string()))
    }

    /// Apply visibility changes, remembering each one for restoration
    pub fn apply(&mut self, changes: &[VisibilityChange]) -> Result<()> {
        for change in changes {
            let renderer = self.renderer;
            renderer.set_visibility(self.session_mut()?, &change.title, change.visible)?;
            if !change.visible {
                log::debug!("Hidden sheet: {}", change.title);
            }
            self.applied.push(change.clone());
        }
        Ok(())
    }

    pub fn export(&mut self, output: &Path, format: PageFormat) -> Result<()> {
        let renderer = self.renderer;
        renderer.export(self.session_mut()?, output, format)
    }

    /// Put every changed page back to its original visibility.
    ///
    /// All pages are attempted; the first failure is returned.
    pub fn restore(&mut self) -> Result<()> {
        let renderer = self.renderer;
        let mut first_error = None;
        let applied: Vec<_> = self.applied.drain(..).rev().collect();

        if let Some(session) = self.session.as_mut() {
            for change in applied {
                if let Err(e) = renderer.set_visibility(session, &change.title, change.original) {
                    log::error!("Failed to restore visibility of {}: {}", change.title, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Restore visibility and close the session
    pub fn finish(mut self) -> Result<()> {
        let restored = self.restore();
        let closed = match self.session.take() {
            Some(session) => self.renderer.close(session),
            None => Ok(()),
        };
        restored.and(closed)
    }
}

impl<R: Renderer> Drop for RenderScope<'_, R> {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            log::error!("Visibility restore during cleanup failed: {}", e);
        }
        if let Some(session) = self.session.take() {
            if let Err(e) = self.renderer.close(session) {
                log::error!("Failed to close render session: {}", e);
            }
        }
    }
}

/// Page count of a rendered artifact; fails if it is missing or not a PDF
pub fn inspect_export(path: &Path) -> Result<usize> {
    let doc = lopdf::Document::load(path)?;
    Ok(doc.get_pages().len())
}
