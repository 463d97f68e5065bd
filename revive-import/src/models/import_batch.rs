//! Batches of valid records and their insert payload

use serde::Serialize;

use super::CandidateRecord;

/// Initial status given to every imported lead
pub const INITIAL_LEAD_STATUS: &str = "new";

/// Initial score given to every imported lead
pub const INITIAL_LEAD_SCORE: i64 = 50;

/// Source tag recorded on leads created by a file import
pub const CSV_IMPORT_SOURCE: &str = "csv_import";

/// Row submitted to the storage collaborator
///
/// A candidate record without its parse metadata, plus session defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeadInsert {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub lead_score: i64,
    pub source: String,
}

impl LeadInsert {
    pub fn from_record(record: &CandidateRecord, owner_id: &str) -> Self {
        let fields = record.fields().clone();
        Self {
            user_id: owner_id.to_string(),
            first_name: fields.first_name,
            last_name: fields.last_name,
            email: fields.email,
            phone: fields.phone,
            company: fields.company,
            job_title: fields.job_title,
            notes: fields.notes,
            status: INITIAL_LEAD_STATUS.to_string(),
            lead_score: INITIAL_LEAD_SCORE,
            source: CSV_IMPORT_SOURCE.to_string(),
        }
    }
}

/// Contiguous slice of valid records submitted in one storage call
#[derive(Debug, Clone)]
pub struct ImportBatch<'a> {
    index: usize,
    records: &'a [&'a CandidateRecord],
}

impl<'a> ImportBatch<'a> {
    /// 0-based position in submission order
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[&'a CandidateRecord] {
        self.records
    }

    /// Insert payload for this batch
    pub fn payload(&self, owner_id: &str) -> Vec<LeadInsert> {
        self.records
            .iter()
            .map(|record| LeadInsert::from_record(record, owner_id))
            .collect()
    }
}

/// Split `records` into order-preserving batches of at most `batch_size`
///
/// A `batch_size` of 0 is treated as 1.
pub fn partition<'a>(records: &'a [&'a CandidateRecord], batch_size: usize) -> Vec<ImportBatch<'a>> {
    records
        .chunks(batch_size.max(1))
        .enumerate()
        .map(|(index, records)| ImportBatch { index, records })
        .collect()
}
