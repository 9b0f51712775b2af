#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loads the Portland crime report export into memory.
//!
//! The export is a tab-separated file with a header row. Rows are
//! deserialized into [`RawReport`] with the `csv` crate, then cleaned by
//! [`normalize::normalize`] into the [`Dataset`] every aggregate reads.
//! The dataset is loaded once and treated as read-only afterwards.

pub mod normalize;
pub mod progress;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use pdx_crime_report_models::{RawReport, Report};
use thiserror::Error;

use crate::normalize::{NormalizeStats, normalize};
use crate::progress::ProgressCallback;

/// Columns that must be present in the header row.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "Neighborhood",
    "OffenseType",
    "CrimeAgainst",
    "OccurDate",
    "OccurTime",
];

/// How many rows to read between progress updates.
const PROGRESS_BATCH: u64 = 10_000;

/// Errors that can occur while loading an export.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The file could not be opened or read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The header row could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The header row is missing a required column.
    #[error("Missing required column '{column}' in report header")]
    MissingColumn {
        /// Name of the absent column.
        column: &'static str,
    },
}

/// An immutable, cleaned set of reports.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Clean rows in file order.
    pub reports: Vec<Report>,
    /// Normalization counters.
    pub stats: NormalizeStats,
    /// Rows the reader could not decode at all.
    pub rows_skipped: u64,
}

impl Dataset {
    /// Builds a dataset from already-clean reports.
    #[must_use]
    pub fn from_reports(reports: Vec<Report>) -> Self {
        let count = reports.len() as u64;
        Self {
            reports,
            stats: NormalizeStats {
                rows_read: count,
                ..NormalizeStats::default()
            },
            rows_skipped: 0,
        }
    }

    /// Number of clean rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    /// Whether the dataset has no clean rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

/// Loads and normalizes the export at `path`.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be opened, the header row
/// cannot be read, or a required column is missing. Individual rows that
/// fail to decode are skipped with a warning.
pub fn load_dataset(
    path: &Path,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Dataset, IngestError> {
    let start = Instant::now();
    log::info!("Loading crime reports from {}", path.display());

    let file = std::fs::File::open(path)?;
    progress.set_total(file.metadata()?.len());
    let dataset = read_dataset(file, progress)?;

    log::info!(
        "Loaded {} reports ({} dropped, {} undecodable) in {:.2?}",
        dataset.len(),
        dataset.stats.dropped_blank_neighborhood,
        dataset.rows_skipped,
        start.elapsed()
    );

    Ok(dataset)
}

/// Reads and normalizes a tab-separated export from any reader.
///
/// Progress is reported in bytes consumed, so it lines up with a total
/// taken from the file length.
///
/// # Errors
///
/// Returns [`IngestError`] if the header row cannot be read or a required
/// column is missing.
pub fn read_dataset<R: Read>(
    reader: R,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Dataset, IngestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h.trim() == *column) {
            return Err(IngestError::MissingColumn { column });
        }
    }

    progress.set_message("Reading reports".to_string());

    let mut raw_rows = Vec::new();
    let mut rows_skipped: u64 = 0;
    let mut reported = rdr.position().byte();
    progress.inc(reported);

    let mut records = rdr.deserialize::<RawReport>();
    let mut line: u64 = 1;
    while let Some(result) = records.next() {
        line += 1;
        match result {
            Ok(row) => raw_rows.push(row),
            Err(e) => {
                rows_skipped += 1;
                log::warn!("Skipping undecodable row {line}: {e}");
            }
        }

        if (line - 1) % PROGRESS_BATCH == 0 {
            let position = records.reader().position().byte();
            progress.inc(position.saturating_sub(reported));
            reported = position;
        }
    }
    let position = records.reader().position().byte();
    progress.inc(position.saturating_sub(reported));

    let normalized = normalize(raw_rows);
    progress.finish(format!("{} reports loaded", normalized.reports.len()));

    Ok(Dataset {
        reports: normalized.reports,
        stats: normalized.stats,
        rows_skipped,
    })
}
