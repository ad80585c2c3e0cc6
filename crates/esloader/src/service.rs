// crates/esloader/src/service.rs

//! Loader: esloader クレートの統合ファサード。
//!
//! - Index lifecycle (recreate, bulk settings)
//! - Record reading and batching per file
//! - Bulk writes with retry
//! - Progress and run summary
//!
//! Files are processed one at a time and at most one bulk request is in
//! flight. The first error of any kind aborts the run; the target index is
//! not rolled back.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::batcher::{Batches, batch_count};
use crate::config::LoaderConfig;
use crate::errors::{LoaderError, LoaderResult};
use crate::lifecycle::{IndexLifecycle, IndexSettings};
use crate::progress::{ProgressTracker, human_duration};
use crate::reader::RecordReader;
use crate::sink::{BulkSinkClient, Credentials, ImportReport, ReqwestTransport, RetryPolicy, Transport};

/// Files sharing one document type label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportJob {
  /// Value written as `_type` in every action line
  pub doc_type: String,
  /// Input files, imported in order
  pub files: Vec<PathBuf>,
}

impl ImportJob {
  /// Builds a job
  pub fn new(doc_type: impl Into<String>, files: Vec<PathBuf>) -> Self {
    Self { doc_type: doc_type.into(), files }
  }
}

/// Bulk loader for one target index.
#[derive(Debug)]
pub struct Loader<T> {
  config: LoaderConfig,
  client: BulkSinkClient<T>,
  reader: RecordReader,
}

impl Loader<ReqwestTransport> {
  /// Validates `config` and builds a loader on an HTTP client.
  ///
  /// # Errors
  /// - Invalid configuration
  /// - HTTP client initialisation failure
  pub fn from_config(config: LoaderConfig) -> LoaderResult<Self> {
    config.validate()?;
    let credentials = config
      .sink
      .username
      .clone()
      .map(|username| Credentials { username, password: config.sink.password.clone() });
    let transport = ReqwestTransport::new(config.request_timeout(), credentials)?;
    Self::with_transport(config, transport)
  }
}

impl<T: Transport> Loader<T> {
  /// Validates `config` and builds a loader on the given transport.
  pub fn with_transport(config: LoaderConfig, transport: T) -> LoaderResult<Self> {
    config.validate()?;
    let client = BulkSinkClient::new(transport, config.bulk_url(), RetryPolicy::from(config.retry))
      .with_dry_run(config.dry_run());
    let reader = RecordReader::new(config.input_format());
    Ok(Self { config, client, reader })
  }

  /// Configuration in use
  pub fn config(&self) -> &LoaderConfig {
    &self.config
  }

  /// Bulk client in use
  pub fn client(&self) -> &BulkSinkClient<T> {
    &self.client
  }

  fn lifecycle(&self) -> IndexLifecycle<'_, T> {
    IndexLifecycle::new(&self.client, self.config.index_name(), self.config.index_url())
  }

  /// Imports every file of every job into the target index.
  ///
  /// # 処理フロー
  /// 1. Recreate the index with `mapping` unless `preserve_index` (skipped in dry run)
  /// 2. Optionally tune index settings for bulk loading
  /// 3. Import each file: read, batch, send
  /// 4. Restore tuned settings
  ///
  /// # Errors
  /// The first failure of any step. Settings tuned in step 2 are still
  /// restored when step 3 fails.
  pub async fn run(&self, jobs: &[ImportJob], mapping: Option<&str>) -> LoaderResult<ImportReport> {
    let total_files: usize = jobs.iter().map(|job| job.files.len()).sum();
    let dry_run = self.config.dry_run();
    info!(
      index = %self.config.index_name(),
      files = total_files,
      format = %self.config.input_format(),
      batch_size = self.config.batch_size(),
      dry_run,
      "import started"
    );

    let lifecycle = self.lifecycle();
    if dry_run {
      info!("dry run: index left untouched");
    } else if self.config.preserve_index() {
      info!(index = %self.config.index_name(), "preserving existing index");
    } else {
      lifecycle.recreate(mapping).await?;
    }

    let tuned = if self.config.import.tune_for_bulk && !dry_run {
      Some(lifecycle.tune_for_bulk().await?)
    } else {
      None
    };

    let mut progress = ProgressTracker::new(total_files, self.config.import.progress_interval);
    let mut report = ImportReport { dry_run, ..ImportReport::default() };
    let imported = self.import_jobs(jobs, &mut progress, &mut report).await;

    if let Some(previous) = &tuned {
      restore_after(&lifecycle, previous, imported.is_ok()).await?;
    }
    imported?;

    report.elapsed = progress.elapsed();
    info!(
      files = report.files,
      batches = report.batches,
      documents = report.documents,
      retried_batches = report.retried_batches,
      elapsed = %human_duration(report.elapsed),
      docs_per_sec = report.throughput(),
      "import finished"
    );
    Ok(report)
  }

  async fn import_jobs(
    &self,
    jobs: &[ImportJob],
    progress: &mut ProgressTracker,
    report: &mut ImportReport,
  ) -> LoaderResult<()> {
    for job in jobs {
      for path in &job.files {
        self.import_file(path, &job.doc_type, progress, report).await?;
      }
    }
    Ok(())
  }

  /// Imports one file, batch by batch.
  async fn import_file(
    &self,
    path: &Path,
    doc_type: &str,
    progress: &mut ProgressTracker,
    report: &mut ImportReport,
  ) -> LoaderResult<()> {
    let stream = self.reader.open(path)?;
    let total = stream.total_records();
    let batch_size = self.config.batch_size();
    progress.start_file(total);
    info!(
      file = %path.display(),
      doc_type,
      records = total,
      batches = batch_count(total, batch_size),
      "importing file"
    );

    for batch in Batches::new(stream, batch_size) {
      let batch = batch?;
      let lines = batch
        .to_bulk_lines(self.config.index_name(), doc_type, self.config.id_field())
        .map_err(|source| LoaderError::Schema { path: path.to_path_buf(), source })?;

      let outcome = self.client.send_batch(&lines).await.map_err(|source| LoaderError::Sink {
        path: path.to_path_buf(),
        batch: batch.number,
        source,
      })?;
      debug!(file = %path.display(), batch = batch.number, documents = batch.len(), "batch done");
      report.record_batch(&outcome);

      if let Some(snapshot) = progress.record_batch(batch.len()) {
        info!("progress: {snapshot}");
      }
    }

    report.record_file();
    info!(file = %path.display(), records = total, "file imported");
    Ok(())
  }
}

/// Restores tuned settings; on a failed import a restore error is only logged
/// so the import error is the one reported.
async fn restore_after<T: Transport>(
  lifecycle: &IndexLifecycle<'_, T>,
  previous: &IndexSettings,
  import_succeeded: bool,
) -> LoaderResult<()> {
  match lifecycle.restore_settings(previous).await {
    Ok(()) => Ok(()),
    Err(e) if import_succeeded => Err(e.into()),
    Err(e) => {
      warn!(error = %e, "failed to restore index settings after a failed import");
      Ok(())
    }
  }
}
