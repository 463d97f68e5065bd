//! Batched persistence of validated leads
//!
//! Batches are submitted strictly one after another. A failed batch is
//! counted and skipped, never retried; the import only fails as a whole when
//! no batch stored anything.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{ImportError, StoreError};
use crate::models::{partition, CandidateRecord, ImportProgress, LeadInsert};

/// Records per bulk insert unless configured otherwise
pub const DEFAULT_BATCH_SIZE: usize = 50;

const NOTHING_INSERTED: &str = "storage reported no rows inserted";

/// Storage collaborator for the `leads` collection
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Insert all rows in one call
    ///
    /// Returns the number of rows the backend reports as inserted, or `None`
    /// when it does not report a count. A reported count of zero is treated
    /// as a rejected batch.
    async fn insert_leads(&self, rows: &[LeadInsert]) -> Result<Option<usize>, StoreError>;
}

/// Receives progress as batches complete
#[async_trait]
pub trait ProgressObserver: Send + Sync {
    /// Called after every batch with the cumulative counters
    async fn on_progress(&self, progress: ImportProgress);

    /// Called when a whole batch was rejected, before `on_progress`
    async fn on_batch_failed(&self, _batch_index: usize, _batch_size: usize, _error: &StoreError) {}
}

/// Observer that ignores all notifications
pub struct NoopObserver;

#[async_trait]
impl ProgressObserver for NoopObserver {
    async fn on_progress(&self, _progress: ImportProgress) {}
}

/// Splits valid records into batches and submits them in order
#[derive(Clone)]
pub struct BatchImporter {
    store: Arc<dyn LeadStore>,
    batch_size: usize,
}

impl BatchImporter {
    /// `batch_size` of 0 is raised to 1
    pub fn new(store: Arc<dyn LeadStore>, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Import the valid records among `records` for `owner_id`
    ///
    /// # Errors
    /// - [`ImportError::NoValidRecords`] if nothing is valid; no batch is sent
    /// - [`ImportError::ImportFailed`] if every batch failed
    pub async fn run(
        &self,
        records: &[CandidateRecord],
        owner_id: &str,
        observer: &dyn ProgressObserver,
    ) -> Result<ImportProgress, ImportError> {
        let valid: Vec<&CandidateRecord> = records.iter().filter(|r| r.is_valid()).collect();
        if valid.is_empty() {
            return Err(ImportError::NoValidRecords);
        }

        let mut progress = ImportProgress {
            total: valid.len(),
            ..Default::default()
        };
        let mut last_error: Option<String> = None;

        let batches = partition(&valid, self.batch_size);
        info!(
            total = progress.total,
            batches = batches.len(),
            batch_size = self.batch_size,
            "Starting batched lead import"
        );

        for batch in &batches {
            let size = batch.len();
            let payload = batch.payload(owner_id);

            let outcome = match self.store.insert_leads(&payload).await {
                Ok(Some(0)) => Err(StoreError::Rejected(NOTHING_INSERTED.to_string())),
                other => other,
            };

            match outcome {
                Ok(reported) => {
                    let inserted = reported.unwrap_or(size).min(size);
                    if inserted < size {
                        warn!(
                            batch_index = batch.index(),
                            batch_size = size,
                            inserted,
                            "Storage reported fewer rows than submitted"
                        );
                    }
                    progress.successful += inserted;
                    progress.failed += size - inserted;
                    debug!(batch_index = batch.index(), inserted, "Batch stored");
                }
                Err(e) => {
                    warn!(
                        batch_index = batch.index(),
                        batch_size = size,
                        error = %e,
                        "Batch insert failed"
                    );
                    observer.on_batch_failed(batch.index(), size, &e).await;
                    progress.failed += size;
                    last_error = Some(e.to_string());
                }
            }

            progress.processed += size;
            observer.on_progress(progress).await;
        }

        if progress.successful == 0 {
            let reason = last_error.unwrap_or_else(|| "no rows were inserted".to_string());
            return Err(ImportError::ImportFailed {
                message: format!("Failed to import leads: {}", reason),
                progress,
            });
        }

        info!(
            successful = progress.successful,
            failed = progress.failed,
            "Batched lead import finished"
        );
        Ok(progress)
    }
}
