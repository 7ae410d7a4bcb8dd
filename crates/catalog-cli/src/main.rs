mod logger;

use anyhow::{Result, anyhow, bail};
use catalog_async_runtime::{CatalogCommand, CatalogUpdate, WorkerHandle, spawn_worker};
use catalog_pages::{
    CatalogOptions, ConflictPolicy, EntryStatus, ExtractionMode, PageFormat, Pipeline, Progress,
    RunRequest, SofficeRenderer, XlsxWorkbook, render::DEFAULT_RENDER_TIMEOUT,
};
use clap::{Parser, Subcommand, ValueEnum};
use logger::StderrLogger;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "catgen", about = "Catalog page generator", version)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one page per schedule row and export the catalog
    Run {
        /// Input workbook (.xlsx / .xlsm)
        #[arg(short, long)]
        input: PathBuf,

        /// Language variant selecting the template page (Template_<LANG>)
        #[arg(short, long, default_value = "EN")]
        language: String,

        /// Directory holding the item images
        #[arg(short, long)]
        assets: PathBuf,

        /// Options file written by `catgen config`
        #[arg(long)]
        config: Option<PathBuf>,

        /// What to do with pages that already exist
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,

        /// Scan the whole schedule for item codes instead of reading the ID column
        #[arg(long)]
        legacy_scan: bool,

        /// Export format
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Write a per-item CSV report
        #[arg(long)]
        report: Option<PathBuf>,

        /// LibreOffice executable used for the export
        #[arg(long, default_value = "soffice")]
        soffice: PathBuf,

        /// Seconds before a hung export is killed
        #[arg(long, default_value_t = DEFAULT_RENDER_TIMEOUT.as_secs())]
        render_timeout: u64,
    },

    /// Print the identifiers found in the schedule
    Ids {
        /// Input workbook (.xlsx / .xlsm)
        #[arg(short, long)]
        input: PathBuf,

        /// Options file written by `catgen config`
        #[arg(long)]
        config: Option<PathBuf>,

        /// Scan the whole schedule for item codes instead of reading the ID column
        #[arg(long)]
        legacy_scan: bool,
    },

    /// Remove all generated pages from a workbook
    Clear {
        /// Input workbook (.xlsx / .xlsm)
        #[arg(short, long)]
        input: PathBuf,

        /// Language variant whose template must be kept
        #[arg(short, long, default_value = "EN")]
        language: String,

        /// Options file written by `catgen config`
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write the default options as JSON
    Config {
        /// Output file
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Recreate,
    Skip,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Pdf,
    PdfA,
}

impl From<PolicyArg> for ConflictPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Recreate => Self::Recreate,
            PolicyArg::Skip => Self::Skip,
        }
    }
}

impl From<FormatArg> for PageFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Pdf => Self::Pdf,
            FormatArg::PdfA => Self::PdfA,
        }
    }
}

async fn load_options(config: Option<&Path>) -> Result<CatalogOptions> {
    let options = match config {
        Some(path) => CatalogOptions::load(path).await?,
        None => CatalogOptions::default(),
    };
    Ok(options)
}

fn start_worker(options: CatalogOptions, renderer: SofficeRenderer) -> Result<WorkerHandle> {
    options.validate()?;
    let pipeline = Arc::new(Pipeline::new(options, renderer));
    Ok(spawn_worker::<_, XlsxWorkbook>(
        &tokio::runtime::Handle::current(),
        pipeline,
    ))
}

/// Wait for the update answering the last command, printing progress on the way
async fn next_result(worker: &mut WorkerHandle) -> Result<CatalogUpdate> {
    while let Some(update) = worker.recv().await {
        match update {
            CatalogUpdate::Progress(Progress::Page {
                identifier,
                current,
                total,
            }) => println!("[{}/{}] {}", current, total, identifier),
            CatalogUpdate::Progress(Progress::Stage(stage)) => log::debug!("Stage: {}", stage),
            CatalogUpdate::Error { message } => bail!(message),
            other => return Ok(other),
        }
    }
    Err(anyhow!("worker stopped without answering"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    StderrLogger::new(StderrLogger::level_for(cli.verbose, cli.quiet)).init()?;

    match cli.command {
        Commands::Run {
            input,
            language,
            assets,
            config,
            policy,
            legacy_scan,
            format,
            report,
            soffice,
            render_timeout,
        } => {
            let mut options = load_options(config.as_deref()).await?;
            if let Some(policy) = policy {
                options.conflict_policy = policy.into();
            }
            if let Some(format) = format {
                options.export_format = format.into();
            }
            if legacy_scan {
                options.extraction_mode = ExtractionMode::LegacyScan;
            }

            let renderer =
                SofficeRenderer::new(soffice).with_timeout(Duration::from_secs(render_timeout));
            let mut worker = start_worker(options, renderer)?;
            worker.send(CatalogCommand::Run {
                request: RunRequest::new(input, language, assets),
            })?;

            let CatalogUpdate::RunFinished { outcome } = next_result(&mut worker).await? else {
                bail!("unexpected reply from worker");
            };
            worker.shutdown().await?;

            for diagnostic in &outcome.report.diagnostics {
                println!("  ! {}", diagnostic);
            }
            if let Some(path) = &report {
                outcome.report.write_csv(path)?;
                println!("Report → {}", path.display());
            }

            if !outcome.success {
                bail!(outcome.message);
            }
            println!(
                "Generated {} page(s), kept {}, failed {}",
                outcome.report.count(EntryStatus::Generated),
                outcome.report.count(EntryStatus::Kept),
                outcome.report.count(EntryStatus::Failed)
            );
            if let Some(path) = &outcome.export_path {
                println!("Exported → {}", path.display());
            }
        }

        Commands::Ids {
            input,
            config,
            legacy_scan,
        } => {
            let mut options = load_options(config.as_deref()).await?;
            if legacy_scan {
                options.extraction_mode = ExtractionMode::LegacyScan;
            }

            let mut worker = start_worker(options, SofficeRenderer::default())?;
            worker.send(CatalogCommand::ListIdentifiers {
                document_path: input,
            })?;

            let CatalogUpdate::Identifiers {
                identifiers,
                diagnostics,
            } = next_result(&mut worker).await?
            else {
                bail!("unexpected reply from worker");
            };
            worker.shutdown().await?;

            for identifier in &identifiers {
                println!("{}", identifier);
            }
            for diagnostic in &diagnostics {
                log::warn!("{}", diagnostic);
            }
            log::info!("{} identifier(s)", identifiers.len());
        }

        Commands::Clear {
            input,
            language,
            config,
        } => {
            let options = load_options(config.as_deref()).await?;
            let mut worker = start_worker(options, SofficeRenderer::default())?;
            worker.send(CatalogCommand::Clear {
                document_path: input.clone(),
                language,
            })?;

            let CatalogUpdate::Cleared { removed } = next_result(&mut worker).await? else {
                bail!("unexpected reply from worker");
            };
            worker.shutdown().await?;

            for title in &removed {
                println!("Removed {}", title);
            }
            println!("Cleared {} page(s) from {}", removed.len(), input.display());
        }

        Commands::Config { output } => {
            CatalogOptions::default().save(&output).await?;
            println!("Default options → {}", output.display());
        }
    }

    Ok(())
}
