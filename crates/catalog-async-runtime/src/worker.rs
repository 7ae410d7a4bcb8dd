use crate::{CatalogCommand, CatalogUpdate, WorkerError};
use catalog_pages::{Pipeline, Renderer, Workbook};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Consume commands until the channel closes, one at a time.
///
/// The pipeline is synchronous, so every command runs on the blocking pool
/// while this task keeps the channel serviced.
pub async fn worker_task<R, W>(
    mut command_rx: mpsc::UnboundedReceiver<CatalogCommand>,
    update_tx: mpsc::UnboundedSender<CatalogUpdate>,
    pipeline: Arc<Pipeline<R>>,
) where
    R: Renderer + Send + Sync + 'static,
    W: Workbook + 'static,
{
    while let Some(cmd) = command_rx.recv().await {
        process_command::<R, W>(cmd, &pipeline, &update_tx).await;
    }
    log::debug!("Command channel closed, worker exiting");
}

async fn process_command<R, W>(
    cmd: CatalogCommand,
    pipeline: &Arc<Pipeline<R>>,
    update_tx: &mpsc::UnboundedSender<CatalogUpdate>,
) where
    R: Renderer + Send + Sync + 'static,
    W: Workbook + 'static,
{
    let pipeline = Arc::clone(pipeline);
    let progress_tx = update_tx.clone();

    let result = tokio::task::spawn_blocking(move || match cmd {
        CatalogCommand::Run { request } => {
            let outcome = pipeline.run_with::<W>(&request, &mut |progress| {
                let _ = progress_tx.send(CatalogUpdate::Progress(progress));
            });
            CatalogUpdate::RunFinished { outcome }
        }
        CatalogCommand::ListIdentifiers { document_path } => {
            match pipeline.list_identifiers::<W>(&document_path) {
                Ok(extraction) => CatalogUpdate::Identifiers {
                    identifiers: extraction.identifiers,
                    diagnostics: extraction.diagnostics,
                },
                Err(e) => CatalogUpdate::Error {
                    message: format!("Failed to list identifiers: {}", e),
                },
            }
        }
        CatalogCommand::Clear {
            document_path,
            language,
        } => match pipeline.clear_generated_pages::<W>(&document_path, &language) {
            Ok(removed) => CatalogUpdate::Cleared { removed },
            Err(e) => CatalogUpdate::Error {
                message: format!("Failed to clear generated pages: {}", e),
            },
        },
    })
    .await;

    let update = result.unwrap_or_else(|e| CatalogUpdate::Error {
        message: format!("Worker task panicked: {}", e),
    });
    let _ = update_tx.send(update);
}

/// Channels to a running worker
pub struct WorkerHandle {
    command_tx: mpsc::UnboundedSender<CatalogCommand>,
    update_rx: mpsc::UnboundedReceiver<CatalogUpdate>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    pub fn send(&self, cmd: CatalogCommand) -> Result<(), WorkerError> {
        self.command_tx.send(cmd).map_err(|_| WorkerError::Closed)
    }

    /// Wait for the next update from the worker
    pub async fn recv(&mut self) -> Option<CatalogUpdate> {
        self.update_rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<CatalogUpdate> {
        self.update_rx.try_recv().ok()
    }

    /// Stop accepting commands and wait for queued ones to finish.
    /// Returns the updates that were still pending.
    pub async fn shutdown(self) -> Result<Vec<CatalogUpdate>, WorkerError> {
        let Self {
            command_tx,
            mut update_rx,
            task,
        } = self;
        drop(command_tx);
        task.await?;

        let mut pending = Vec::new();
        while let Ok(update) = update_rx.try_recv() {
            pending.push(update);
        }
        Ok(pending)
    }
}

/// Spawn a worker on `handle` serving `pipeline`
pub fn spawn_worker<R, W>(handle: &Handle, pipeline: Arc<Pipeline<R>>) -> WorkerHandle
where
    R: Renderer + Send + Sync + 'static,
    W: Workbook + 'static,
{
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, update_rx) = mpsc::unbounded_channel();

    let task = handle.spawn(worker_task::<R, W>(command_rx, update_tx, pipeline));

    WorkerHandle {
        command_tx,
        update_rx,
        task,
    }
}
