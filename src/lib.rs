pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;

use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::AuditConfig;
use crate::error::AuditError;
use crate::models::DocumentRecord;
use crate::pipeline::batch;
use crate::pipeline::extraction::pdfium::PdfiumReader;
use crate::pipeline::photo::{
    ArtifactStore, ChainedOrientationDetector, ExifOrientationDetector, FsArtifactStore,
    NullArtifactStore, OrientationDetector, PhotoEvidencePipeline,
};
use crate::pipeline::processor::ValidationOrchestrator;
use crate::report::{ReportError, ReportPaths, RunContext, RunSummary};

/// Result of a completed audit run.
pub struct AuditOutcome {
    pub records: Vec<DocumentRecord>,
    pub summary: RunSummary,
    pub reports: ReportPaths,
}

pub fn run() -> ExitCode {
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("{}: cannot initialize logging: {e}", config::APP_NAME);
        return ExitCode::FAILURE;
    }

    let config = cli::Cli::parse().into_config();
    info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    match audit(&config) {
        Ok(outcome) => {
            println!("{} case files audited", outcome.summary.documents);
            for (label, count) in outcome.summary.lines() {
                println!("  {label}: {count}");
            }
            println!("Log: {}", outcome.reports.log.display());
            println!("CSV: {}", outcome.reports.csv.display());
            if let Some(json) = &outcome.reports.json {
                println!("JSON: {}", json.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Audit aborted");
            eprintln!("{}: {e}", config::APP_NAME);
            ExitCode::FAILURE
        }
    }
}

/// Audit every case file under `config.root` and write the run's reports.
pub fn audit(config: &AuditConfig) -> Result<AuditOutcome, AuditError> {
    let started = Local::now();

    std::fs::create_dir_all(&config.output_dir).map_err(|source| ReportError::OutputDir {
        path: config.output_dir.clone(),
        source,
    })?;
    let paths = batch::discover(&config.root)?;

    let orchestrator = ValidationOrchestrator::new(
        Box::new(PdfiumReader::new()?),
        PhotoEvidencePipeline::new(orientation_detector(config), artifact_store(config)?, config.photo.clone()),
    );
    let records = batch::run_batch(&orchestrator, &paths, config.jobs)?;

    let context = RunContext {
        root: &config.root,
        started,
    };
    let reports = report::write_reports(&records, &context, &config.output_dir, config.json)?;
    let summary = RunSummary::from_records(&records);

    info!(
        documents = summary.documents,
        read_errors = summary.read_errors,
        coherent = summary.coherent_cuil,
        "Audit complete"
    );
    Ok(AuditOutcome {
        records,
        summary,
        reports,
    })
}

fn orientation_detector(config: &AuditConfig) -> Box<dyn OrientationDetector> {
    let mut chain: Vec<Box<dyn OrientationDetector>> = vec![Box::new(ExifOrientationDetector)];
    if config.osd {
        #[cfg(feature = "leptess-osd")]
        chain.push(Box::new(crate::pipeline::photo::LeptessOrientationDetector::new()));
        #[cfg(not(feature = "leptess-osd"))]
        chain.push(Box::new(crate::pipeline::photo::TesseractOsdDetector::new()));
    }
    Box::new(ChainedOrientationDetector::new(chain))
}

fn artifact_store(config: &AuditConfig) -> Result<Box<dyn ArtifactStore>, AuditError> {
    Ok(match &config.artifact_dir {
        Some(dir) => Box::new(FsArtifactStore::new(dir)?),
        None => Box::new(NullArtifactStore),
    })
}
