use std::path::PathBuf;
use thiserror::Error;

mod worker;

pub use worker::{WorkerHandle, spawn_worker, worker_task};

// Re-export types from the library crate
pub use catalog_pages::{
    CatalogOptions, Diagnostic, Identifier, Progress, RunOutcome, RunReport, RunRequest, Stage,
};

/// Commands sent from a driving interface to the worker
#[derive(Debug)]
pub enum CatalogCommand {
    Run {
        request: RunRequest,
    },
    ListIdentifiers {
        document_path: PathBuf,
    },
    Clear {
        document_path: PathBuf,
        language: String,
    },
}

/// Updates sent from the worker back to the driving interface
#[derive(Debug, Clone)]
pub enum CatalogUpdate {
    Progress(Progress),
    Identifiers {
        identifiers: Vec<Identifier>,
        diagnostics: Vec<Diagnostic>,
    },
    RunFinished {
        outcome: RunOutcome,
    },
    Cleared {
        removed: Vec<String>,
    },
    Error {
        message: String,
    },
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Worker has shut down")]
    Closed,
    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
