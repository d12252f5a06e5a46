//! CSV export of query results.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use csv::{Writer, WriterBuilder};
use futures_util::{Stream, StreamExt};
use serde_json::Value;
use tracing::{debug, info};

use crate::models::Record;
use crate::Result;

const DEFAULT_BUFFER_SIZE: usize = 8192;
const PROGRESS_INTERVAL: u64 = 100_000;

/// CSV writer settings.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter (default: comma).
    pub delimiter: u8,
    /// Log a progress line every 100 000 records.
    pub log_progress: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            log_progress: true,
        }
    }
}

impl CsvOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Enable or disable progress logging.
    pub fn with_log_progress(mut self, enabled: bool) -> Self {
        self.log_progress = enabled;
        self
    }
}

/// Outcome of a CSV export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvSummary {
    /// File that was written.
    pub path: PathBuf,
    /// Number of data rows written.
    pub records: u64,
}

/// Write every record of `stream` to a CSV file at `path`.
///
/// The header row is the first record's field names in sorted order. Fields
/// missing from later records are left empty. An empty stream produces an
/// empty file. The first stream error aborts the export; rows already
/// written stay on disk.
///
/// # Example
///
/// ```no_run
/// use devapi_rs::export::{to_csv, CsvOptions};
/// use devapi_rs::QueryOptions;
///
/// # async fn example(client: devapi_rs::DevApiClient) -> devapi_rs::Result<()> {
/// let rigs = client.query("rigs", QueryOptions::new().filter("deleteddate", "null"))?;
/// let summary = to_csv(rigs, "rigs.tsv", CsvOptions::new().with_delimiter(b'\t')).await?;
/// println!("Wrote {} rows to {}", summary.records, summary.path.display());
/// # Ok(())
/// # }
/// ```
pub async fn to_csv<S>(
    mut stream: S,
    path: impl AsRef<Path>,
    options: CsvOptions,
) -> Result<CsvSummary>
where
    S: Stream<Item = Result<Record>> + Unpin,
{
    let path = path.as_ref().to_path_buf();
    debug!("Creating CSV writer: path={}", path.display());

    let file = File::create(&path)?;
    let mut writer: Writer<BufWriter<File>> = WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file));

    let mut header: Vec<String> = Vec::new();
    let mut count: u64 = 0;

    while let Some(record) = stream.next().await {
        let record = record?;
        if count == 0 {
            header = record.keys().cloned().collect();
            header.sort();
            writer.write_record(&header)?;
        }
        writer.write_record(header.iter().map(|field| cell(record.get(field))))?;
        count += 1;

        if options.log_progress && count % PROGRESS_INTERVAL == 0 {
            info!("Wrote {} records to file {}", count, path.display());
        }
    }
    writer.flush()?;

    info!(
        "Completed writing CSV file to {}. Final count {}",
        path.display(),
        count
    );
    Ok(CsvSummary {
        path,
        records: count,
    })
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
