//! Run: reads one file on a blocking task and renders its output.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use reader::{TracingSink, UnifiedLogReader};

use crate::cli::OutputFormat;
use crate::output;
use crate::summary::RunSummary;

/// Everything one file produced, ready to print.
#[derive(Debug)]
pub struct FileReport {
    pub summary: RunSummary,
    /// JSON lines, empty unless the json format was requested
    pub output: Vec<u8>,
}

/// Parse one file. Only failing to open it is an error.
pub fn read_file(reader: &UnifiedLogReader, path: &Path, format: OutputFormat) -> Result<FileReport> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let name = path.display().to_string();
    info!("Reading {}", name);

    let lines = BufReader::new(file).split(b'\n').map_while(|chunk| match chunk {
        Ok(bytes) => {
            let mut line = String::from_utf8_lossy(&bytes).into_owned();
            if line.ends_with('\r') {
                line.pop();
            }
            Some(line)
        }
        Err(e) => {
            warn!("Stopped reading {}: {}", name, e);
            None
        }
    });

    let mut summary = RunSummary::new(name.clone());
    let mut out = Vec::new();
    let mut events = reader.events(lines, TracingSink);
    for event in events.by_ref() {
        summary.record(&event);
        if format == OutputFormat::Json {
            output::write_event(&mut out, &name, &event)?;
        }
    }
    let (stats, _) = events.into_parts();
    summary.stats = stats;

    Ok(FileReport { summary, output: out })
}

/// One blocking task per file. Reports come back in input order; the count
/// of files that could not be read is returned.
pub async fn read_all(reader: Arc<UnifiedLogReader>, files: Vec<PathBuf>, format: OutputFormat) -> usize {
    let handles: Vec<_> = files
        .into_iter()
        .map(|path| {
            let reader = Arc::clone(&reader);
            tokio::task::spawn_blocking(move || read_file(&reader, &path, format))
        })
        .collect();

    let mut failed = 0;
    for handle in handles {
        match handle.await {
            Ok(Ok(report)) => print_report(&report, format),
            Ok(Err(e)) => {
                error!("{:#}", e);
                failed += 1;
            }
            Err(e) => {
                error!("Reader task failed: {}", e);
                failed += 1;
            }
        }
    }
    failed
}

fn print_report(report: &FileReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print!("{}", String::from_utf8_lossy(&report.output)),
        OutputFormat::Summary => println!("{}", report.summary),
    }
}
