//! Data models for revive-import
//!
//! - Candidate records and their validation result
//! - Import batches and the insert payload
//! - Import session state machine

pub mod candidate_record;
pub mod import_batch;
pub mod import_session;

pub use candidate_record::{CandidateRecord, LeadFields};
pub use import_batch::{partition, ImportBatch, LeadInsert};
pub use import_session::{ImportSession, Redirect, SessionState, StateTransition};
pub use revive_common::events::{ImportProgress, ParseSummary};
