pub mod clone;
pub mod extract;
mod options;
pub mod pipeline;
pub mod render;
mod report;
pub mod resolve;
pub mod select;
mod types;
pub mod workbook;

pub use clone::{ClonedPage, clone_template, find_placeholder, fit_to_box, resolve_asset};
pub use extract::{Extraction, ScheduleRow, extract_identifiers};
pub use options::*;
pub use pipeline::{Pipeline, Progress, RunOutcome, RunRequest, Stage, run};
pub use render::{RenderScope, Renderer, SofficeRenderer, inspect_export};
pub use report::*;
pub use resolve::{PageAction, plan_pages, remove_generated_pages};
pub use select::{ExportSelection, select_pages, visibility_changes};
pub use types::*;
pub use workbook::{MemoryWorkbook, Workbook, XlsxWorkbook};
