//! Import session state machine
//!
//! ```text
//! Idle → Parsing → Previewing → Importing → Completed
//!          └→ ParseError        (upload again to retry)
//! Previewing / ParseError / Completed → Idle   (reset)
//! Importing → Previewing                       (every batch failed)
//! ```
//!
//! The session only records transitions; parsing and batch submission are
//! driven by [`crate::services::SessionManager`].

use chrono::{DateTime, Utc};
use revive_common::events::{ImportProgress, ParseSummary};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use super::CandidateRecord;
use crate::error::{FormatError, ImportError, SessionError};
use crate::services::csv_parser::ParsedFile;

/// Import session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// Waiting for a file
    Idle,
    /// File received, records being built
    Parsing,
    /// Records available for review
    Previewing,
    /// File rejected before any row was read
    ParseError,
    /// Batches being submitted
    Importing,
    /// At least one lead stored
    Completed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Parsing => "parsing",
            SessionState::Previewing => "previewing",
            SessionState::ParseError => "showing a parse error",
            SessionState::Importing => "importing",
            SessionState::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// State transition record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateTransition {
    pub session_id: Uuid,
    pub old_state: SessionState,
    pub new_state: SessionState,
    pub transitioned_at: DateTime<Utc>,
}

/// Navigation scheduled after a successful import
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub path: String,
    pub delay_ms: u64,
    /// Moment the UI should navigate
    pub at: DateTime<Utc>,
}

/// One upload-to-completion lifecycle
#[derive(Debug, Clone, Serialize)]
pub struct ImportSession {
    pub session_id: Uuid,

    /// Identifier of the user the leads are imported for
    pub owner_id: String,

    pub state: SessionState,

    /// Name of the most recently uploaded file
    pub file_name: Option<String>,

    /// Parsed records, valid and invalid together, in file order
    pub records: Vec<CandidateRecord>,

    /// Data lines dropped for a column-count mismatch
    pub skipped_rows: usize,

    /// Messages shown to the user verbatim
    pub errors: Vec<String>,

    /// Counters of the current or last import attempt
    pub progress: Option<ImportProgress>,

    pub redirect: Option<Redirect>,

    pub created_at: DateTime<Utc>,

    pub import_started_at: Option<DateTime<Utc>>,

    pub completed_at: Option<DateTime<Utc>>,

    /// Last state change or progress update
    pub updated_at: DateTime<Utc>,
}

impl ImportSession {
    pub fn new(owner_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            state: SessionState::Idle,
            file_name: None,
            records: Vec::new(),
            skipped_rows: 0,
            errors: Vec::new(),
            progress: None,
            redirect: None,
            created_at: now,
            import_started_at: None,
            completed_at: None,
            updated_at: now,
        }
    }

    fn transition_to(&mut self, new_state: SessionState) -> StateTransition {
        let transition = StateTransition {
            session_id: self.session_id,
            old_state: self.state,
            new_state,
            transitioned_at: Utc::now(),
        };
        self.state = new_state;
        self.updated_at = transition.transitioned_at;
        transition
    }

    fn clear(&mut self) {
        self.file_name = None;
        self.records.clear();
        self.skipped_rows = 0;
        self.errors.clear();
        self.progress = None;
        self.redirect = None;
        self.import_started_at = None;
        self.completed_at = None;
    }

    /// Accept a selected or dropped file and enter `Parsing`
    ///
    /// Only files named `*.csv` or typed `text/csv` are accepted. A rejected
    /// file leaves the state untouched and records the error.
    pub fn begin_upload(
        &mut self,
        file_name: &str,
        content_type: Option<&str>,
    ) -> Result<StateTransition, SessionError> {
        match self.state {
            SessionState::Idle | SessionState::ParseError | SessionState::Previewing => {}
            state => {
                return Err(SessionError::InvalidState {
                    action: "upload a file",
                    state,
                })
            }
        }

        if !is_csv_upload(file_name, content_type) {
            let err = SessionError::NotCsv {
                file_name: file_name.to_string(),
            };
            self.errors = vec![err.to_string()];
            return Err(err);
        }

        self.clear();
        self.file_name = Some(file_name.to_string());
        Ok(self.transition_to(SessionState::Parsing))
    }

    /// Record the parser result, leaving `Parsing`
    pub fn finish_parse(&mut self, result: Result<ParsedFile, FormatError>) -> StateTransition {
        match result {
            Ok(parsed) => {
                self.records = parsed.records;
                self.skipped_rows = parsed.skipped_rows;
                self.errors.clear();
                self.transition_to(SessionState::Previewing)
            }
            Err(err) => {
                self.records.clear();
                self.skipped_rows = 0;
                self.errors = vec![err.to_string()];
                self.transition_to(SessionState::ParseError)
            }
        }
    }

    /// Confirm the preview and enter `Importing`
    ///
    /// Returns the valid records to submit, in file order. With no valid
    /// records the session stays in `Previewing`.
    pub fn begin_import(&mut self) -> Result<(StateTransition, Vec<CandidateRecord>), SessionError> {
        if self.state != SessionState::Previewing {
            return Err(SessionError::InvalidState {
                action: "start an import",
                state: self.state,
            });
        }

        let valid: Vec<CandidateRecord> =
            self.records.iter().filter(|r| r.is_valid()).cloned().collect();
        if valid.is_empty() {
            self.errors = vec![ImportError::NoValidRecords.to_string()];
            return Err(ImportError::NoValidRecords.into());
        }

        self.errors.clear();
        self.redirect = None;
        self.completed_at = None;
        self.progress = Some(ImportProgress {
            total: valid.len(),
            ..Default::default()
        });
        self.import_started_at = Some(Utc::now());
        Ok((self.transition_to(SessionState::Importing), valid))
    }

    /// Store the latest progress snapshot
    pub fn record_progress(&mut self, progress: ImportProgress) {
        self.progress = Some(progress);
        self.updated_at = Utc::now();
    }

    /// Record the import outcome, leaving `Importing`
    ///
    /// Success discards the records and schedules the redirect; failure
    /// returns to `Previewing` with the records intact.
    pub fn finish_import(
        &mut self,
        outcome: Result<ImportProgress, ImportError>,
        redirect_path: &str,
        redirect_delay_ms: u64,
    ) -> StateTransition {
        let now = Utc::now();
        match outcome {
            Ok(progress) => {
                self.progress = Some(progress);
                self.records.clear();
                self.skipped_rows = 0;
                self.completed_at = Some(now);
                self.redirect = Some(Redirect {
                    path: redirect_path.to_string(),
                    delay_ms: redirect_delay_ms,
                    at: now + chrono::Duration::milliseconds(redirect_delay_ms as i64),
                });
                self.transition_to(SessionState::Completed)
            }
            Err(err) => {
                if let ImportError::ImportFailed { progress, .. } = &err {
                    self.progress = Some(*progress);
                }
                self.errors = vec![err.to_string()];
                self.transition_to(SessionState::Previewing)
            }
        }
    }

    /// Discard records, errors and the file name, returning to `Idle`
    pub fn reset(&mut self) -> Result<StateTransition, SessionError> {
        if self.is_busy() {
            return Err(SessionError::InvalidState {
                action: "reset",
                state: self.state,
            });
        }
        self.clear();
        Ok(self.transition_to(SessionState::Idle))
    }

    /// Parsing or importing; no other action may start
    pub fn is_busy(&self) -> bool {
        matches!(self.state, SessionState::Parsing | SessionState::Importing)
    }

    /// Not busy and untouched since before `cutoff`
    pub fn is_expired(&self, cutoff: DateTime<Utc>) -> bool {
        !self.is_busy() && self.updated_at < cutoff
    }

    pub fn parse_summary(&self) -> ParseSummary {
        let valid = self.records.iter().filter(|r| r.is_valid()).count();
        ParseSummary {
            valid,
            invalid: self.records.len() - valid,
            skipped: self.skipped_rows,
        }
    }
}

/// `.csv` extension (any case) or a CSV content type
pub fn is_csv_upload(file_name: &str, content_type: Option<&str>) -> bool {
    let by_name = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    let by_type = content_type
        .map(|ct| {
            let mime = ct.split(';').next().unwrap_or("").trim();
            mime.eq_ignore_ascii_case("text/csv")
        })
        .unwrap_or(false);
    by_name || by_type
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::csv_parser::parse_csv;

    const SAMPLE: &str = "first_name,last_name,email\nJohn,Doe,john@example.com\n,Doe,bad-email";

    fn previewing_session() -> ImportSession {
        let mut session = ImportSession::new("user-1");
        session.begin_upload("leads.csv", None).unwrap();
        session.finish_parse(parse_csv(SAMPLE));
        session
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = ImportSession::new("user-1");
        assert_eq!(session.state, SessionState::Idle);
        assert!(session.records.is_empty());
        assert!(!session.is_busy());
    }

    #[test]
    fn test_upload_and_preview() {
        let mut session = ImportSession::new("user-1");
        let t = session.begin_upload("leads.csv", Some("text/csv")).unwrap();
        assert_eq!(t.old_state, SessionState::Idle);
        assert_eq!(t.new_state, SessionState::Parsing);

        let t = session.finish_parse(parse_csv(SAMPLE));
        assert_eq!(t.new_state, SessionState::Previewing);
        assert_eq!(
            session.parse_summary(),
            ParseSummary {
                valid: 1,
                invalid: 1,
                skipped: 0
            }
        );
    }

    #[test]
    fn test_non_csv_rejected_state_unchanged() {
        let mut session = ImportSession::new("user-1");
        let err = session.begin_upload("leads.xlsx", Some("application/vnd.ms-excel")).unwrap_err();

        assert!(matches!(err, SessionError::NotCsv { .. }));
        assert_eq!(session.state, SessionState::Idle);
        assert_eq!(session.errors, vec!["Please upload a CSV file".to_string()]);
    }

    #[test]
    fn test_parse_error_then_retry() {
        let mut session = ImportSession::new("user-1");
        session.begin_upload("leads.csv", None).unwrap();
        session.finish_parse(parse_csv("first_name,email\nJohn,j@x.com"));

        assert_eq!(session.state, SessionState::ParseError);
        assert_eq!(session.errors, vec!["Missing required columns: last_name".to_string()]);
        assert!(session.records.is_empty());

        session.begin_upload("fixed.csv", None).unwrap();
        assert!(session.errors.is_empty());
        session.finish_parse(parse_csv(SAMPLE));
        assert_eq!(session.state, SessionState::Previewing);
        assert_eq!(session.file_name.as_deref(), Some("fixed.csv"));
    }

    #[test]
    fn test_begin_import_forwards_valid_records_only() {
        let mut session = previewing_session();
        let (t, valid) = session.begin_import().unwrap();

        assert_eq!(t.new_state, SessionState::Importing);
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].fields().first_name, "John");
        assert_eq!(session.progress.unwrap().total, 1);
        assert!(session.is_busy());
    }

    #[test]
    fn test_begin_import_without_valid_records_refused() {
        let mut session = ImportSession::new("user-1");
        session.begin_upload("leads.csv", None).unwrap();
        session.finish_parse(parse_csv("first_name,last_name,email\n,Doe,bad-email"));

        let err = session.begin_import().unwrap_err();
        assert_eq!(err, SessionError::Import(ImportError::NoValidRecords));
        assert_eq!(session.state, SessionState::Previewing);
        assert_eq!(session.errors, vec!["No valid leads to import".to_string()]);
    }

    #[test]
    fn test_busy_session_refuses_upload_and_reset() {
        let mut session = previewing_session();
        session.begin_import().unwrap();

        assert!(matches!(
            session.begin_upload("other.csv", None),
            Err(SessionError::InvalidState { .. })
        ));
        assert!(session.reset().is_err());
        assert_eq!(session.state, SessionState::Importing);
    }

    #[test]
    fn test_successful_import_completes_with_redirect() {
        let mut session = previewing_session();
        session.begin_import().unwrap();

        let progress = ImportProgress {
            total: 1,
            processed: 1,
            successful: 1,
            failed: 0,
        };
        let t = session.finish_import(Ok(progress), "/leads", 2000);

        assert_eq!(t.new_state, SessionState::Completed);
        assert!(session.records.is_empty());
        let redirect = session.redirect.clone().unwrap();
        assert_eq!(redirect.path, "/leads");
        assert_eq!(redirect.delay_ms, 2000);
        assert_eq!(redirect.at - session.completed_at.unwrap(), chrono::Duration::milliseconds(2000));

        assert!(session.begin_upload("again.csv", None).is_err());
        session.reset().unwrap();
        assert_eq!(session.state, SessionState::Idle);
    }

    #[test]
    fn test_failed_import_returns_to_preview() {
        let mut session = previewing_session();
        session.begin_import().unwrap();

        let progress = ImportProgress {
            total: 1,
            processed: 1,
            successful: 0,
            failed: 1,
        };
        let err = ImportError::ImportFailed {
            message: "Failed to import leads: connection reset".into(),
            progress,
        };
        let t = session.finish_import(Err(err), "/leads", 2000);

        assert_eq!(t.new_state, SessionState::Previewing);
        assert_eq!(session.records.len(), 2);
        assert_eq!(session.progress, Some(progress));
        assert_eq!(session.errors, vec!["Failed to import leads: connection reset".to_string()]);
        assert!(session.redirect.is_none());

        // Retry without re-uploading
        assert!(session.begin_import().is_ok());
    }

    #[test]
    fn test_cancel_preview_discards_everything() {
        let mut session = previewing_session();
        let t = session.reset().unwrap();

        assert_eq!(t.old_state, SessionState::Previewing);
        assert_eq!(session.state, SessionState::Idle);
        assert!(session.records.is_empty());
        assert!(session.file_name.is_none());
        assert!(session.errors.is_empty());
    }

    #[test]
    fn test_expiry_ignores_busy_sessions() {
        let later = Utc::now() + chrono::Duration::seconds(60);

        let previewing = previewing_session();
        assert!(previewing.is_expired(later));
        assert!(!previewing.is_expired(previewing.updated_at));

        let mut importing = previewing_session();
        importing.begin_import().unwrap();
        assert!(!importing.is_expired(later));
    }

    #[test]
    fn test_is_csv_upload() {
        assert!(is_csv_upload("leads.csv", None));
        assert!(is_csv_upload("LEADS.CSV", None));
        assert!(is_csv_upload("export", Some("text/csv; charset=utf-8")));
        assert!(!is_csv_upload("leads.txt", Some("text/plain")));
        assert!(!is_csv_upload("csv", None));
    }
}
