//! Import session orchestration
//!
//! Owns every live [`ImportSession`], feeds uploads through the parser and
//! hands confirmed previews to the [`BatchImporter`]. Each session is behind
//! its own lock, so one session never waits on another; within a session the
//! state machine refuses a second upload or import while one is running.
//!
//! Sessions left alone longer than `session_ttl_secs` are dropped the next
//! time a session is created, unless they are parsing or importing.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use revive_common::config::ImportConfig;
use revive_common::events::{EventBus, ImportProgress, RevivalEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::batch_importer::{BatchImporter, LeadStore, ProgressObserver};
use super::csv_parser::parse_csv;
use crate::error::{SessionError, StoreError};
use crate::models::{CandidateRecord, ImportSession, SessionState};

type SharedSession = Arc<Mutex<ImportSession>>;

/// Registry and driver of import sessions
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<Uuid, SharedSession>>>,
    importer: BatchImporter,
    event_bus: EventBus,
    settings: ImportConfig,
    last_error: Arc<RwLock<Option<String>>>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn LeadStore>, event_bus: EventBus, settings: ImportConfig) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            importer: BatchImporter::new(store, settings.batch_size),
            event_bus,
            settings,
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    pub fn settings(&self) -> &ImportConfig {
        &self.settings
    }

    /// Most recent whole-import failure, for diagnostics
    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    async fn session(&self, session_id: Uuid) -> Result<SharedSession, SessionError> {
        self.sessions
            .read()
            .await
            .get(&session_id)
            .cloned()
            .ok_or(SessionError::NotFound(session_id))
    }

    /// Open a new idle session for `owner_id`
    pub async fn create_session(&self, owner_id: &str) -> ImportSession {
        self.evict_expired().await;

        let session = ImportSession::new(owner_id);
        let snapshot = session.clone();
        self.sessions
            .write()
            .await
            .insert(session.session_id, Arc::new(Mutex::new(session)));

        info!(session_id = %snapshot.session_id, owner_id, "Import session created");
        snapshot
    }

    /// Drop idle sessions older than the TTL; a session whose lock is held is
    /// in use and kept
    async fn evict_expired(&self) {
        let ttl = i64::try_from(self.settings.session_ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        let cutoff = Utc::now().checked_sub_signed(ttl).unwrap_or(chrono::DateTime::<Utc>::MIN_UTC);

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Ok(guard) => !guard.is_expired(cutoff),
            Err(_) => true,
        });

        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "Expired import sessions discarded");
        }
    }

    /// Current view of a session
    pub async fn snapshot(&self, session_id: Uuid) -> Result<ImportSession, SessionError> {
        let session = self.session(session_id).await?;
        let snapshot = session.lock().await.clone();
        Ok(snapshot)
    }

    /// Accept an uploaded file and parse it into a preview
    ///
    /// A format error is not an `Err` here: it moves the session to
    /// `ParseError` with the message shown to the user.
    pub async fn upload(
        &self,
        session_id: Uuid,
        file_name: &str,
        content_type: Option<&str>,
        content: &str,
    ) -> Result<ImportSession, SessionError> {
        let session = self.session(session_id).await?;

        // Begin and finish under one guard, with no await in between
        let mut guard = session.lock().await;
        guard.begin_upload(file_name, content_type)?;
        info!(session_id = %session_id, file_name, bytes = content.len(), "Parsing uploaded lead file");

        let parsed = parse_csv(content);
        let transition = guard.finish_parse(parsed);
        match transition.new_state {
            SessionState::Previewing => {
                let summary = guard.parse_summary();
                info!(
                    session_id = %session_id,
                    records = summary.records(),
                    valid = summary.valid,
                    invalid = summary.invalid,
                    skipped = summary.skipped,
                    "Lead file parsed"
                );
                self.event_bus.emit_lossy(RevivalEvent::LeadsParsed {
                    session_id,
                    file_name: file_name.to_string(),
                    summary,
                    timestamp: transition.transitioned_at,
                });
            }
            _ => {
                warn!(session_id = %session_id, errors = ?guard.errors, "Lead file rejected");
            }
        }
        Ok(guard.clone())
    }

    /// Confirm the preview and import in the background
    ///
    /// Preconditions are checked before returning; the returned snapshot is
    /// already in `Importing`.
    pub async fn start_import(&self, session_id: Uuid) -> Result<ImportSession, SessionError> {
        let (session, snapshot, valid) = self.prepare_import(session_id).await?;

        let manager = self.clone();
        tokio::spawn(async move {
            manager.execute_import(session_id, session, valid).await;
        });

        Ok(snapshot)
    }

    /// Confirm the preview and import, returning once every batch ran
    #[cfg(test)]
    pub(crate) async fn import_and_wait(&self, session_id: Uuid) -> Result<ImportSession, SessionError> {
        let (session, _, valid) = self.prepare_import(session_id).await?;
        self.execute_import(session_id, session.clone(), valid).await;
        let snapshot = session.lock().await.clone();
        Ok(snapshot)
    }

    async fn prepare_import(
        &self,
        session_id: Uuid,
    ) -> Result<(SharedSession, ImportSession, Vec<CandidateRecord>), SessionError> {
        let session = self.session(session_id).await?;
        let mut guard = session.lock().await;
        let (transition, valid) = guard.begin_import()?;

        self.event_bus.emit_lossy(RevivalEvent::ImportSessionStarted {
            session_id,
            total: valid.len(),
            batch_size: self.importer.batch_size(),
            timestamp: transition.transitioned_at,
        });
        info!(session_id = %session_id, total = valid.len(), "Lead import started");

        let snapshot = guard.clone();
        drop(guard);
        Ok((session, snapshot, valid))
    }

    async fn execute_import(
        &self,
        session_id: Uuid,
        session: SharedSession,
        valid: Vec<CandidateRecord>,
    ) {
        let owner_id = session.lock().await.owner_id.clone();
        let observer = SessionProgressObserver {
            session_id,
            session: session.clone(),
            event_bus: self.event_bus.clone(),
        };

        let outcome = self.importer.run(&valid, &owner_id, &observer).await;

        let mut guard = session.lock().await;
        let transition = guard.finish_import(
            outcome.clone(),
            &self.settings.redirect_path,
            self.settings.redirect_delay_ms,
        );
        let progress = guard.progress.unwrap_or_default();

        match outcome {
            Ok(_) => {
                *self.last_error.write().await = None;
                let duration_seconds = guard
                    .import_started_at
                    .map(|started| (transition.transitioned_at - started).num_seconds().max(0) as u64)
                    .unwrap_or(0);
                info!(
                    session_id = %session_id,
                    successful = progress.successful,
                    failed = progress.failed,
                    "Lead import completed"
                );
                self.event_bus.emit_lossy(RevivalEvent::ImportSessionCompleted {
                    session_id,
                    progress,
                    redirect_to: self.settings.redirect_path.clone(),
                    redirect_after_ms: self.settings.redirect_delay_ms,
                    duration_seconds,
                    timestamp: transition.transitioned_at,
                });
            }
            Err(e) => {
                error!(session_id = %session_id, error = %e, "Lead import failed");
                *self.last_error.write().await = Some(e.to_string());
                self.event_bus.emit_lossy(RevivalEvent::ImportSessionFailed {
                    session_id,
                    error_message: e.to_string(),
                    progress,
                    timestamp: transition.transitioned_at,
                });
            }
        }
    }

    /// Cancel a preview or clear a finished session, returning it to `Idle`
    pub async fn reset(&self, session_id: Uuid) -> Result<ImportSession, SessionError> {
        let session = self.session(session_id).await?;
        let mut guard = session.lock().await;
        let transition = guard.reset()?;

        info!(session_id = %session_id, from = %transition.old_state, "Import session reset");
        self.event_bus.emit_lossy(RevivalEvent::ImportSessionReset {
            session_id,
            timestamp: transition.transitioned_at,
        });
        Ok(guard.clone())
    }

    /// Drop a session that is not parsing or importing
    pub async fn remove(&self, session_id: Uuid) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get(&session_id)
            .ok_or(SessionError::NotFound(session_id))?;

        {
            let guard = session.lock().await;
            if guard.is_busy() {
                return Err(SessionError::InvalidState {
                    action: "discard",
                    state: guard.state,
                });
            }
        }

        sessions.remove(&session_id);
        info!(session_id = %session_id, "Import session discarded");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Mirrors batch progress into the session and onto the event bus
struct SessionProgressObserver {
    session_id: Uuid,
    session: SharedSession,
    event_bus: EventBus,
}

#[async_trait]
impl ProgressObserver for SessionProgressObserver {
    async fn on_progress(&self, progress: ImportProgress) {
        self.session.lock().await.record_progress(progress);
        self.event_bus.emit_lossy(RevivalEvent::ImportProgressUpdate {
            session_id: self.session_id,
            progress,
            percentage: progress.percentage(),
            timestamp: Utc::now(),
        });
    }

    async fn on_batch_failed(&self, batch_index: usize, batch_size: usize, error: &StoreError) {
        self.event_bus.emit_lossy(RevivalEvent::ImportBatchFailed {
            session_id: self.session_id,
            batch_index,
            batch_size,
            error_message: error.to_string(),
            timestamp: Utc::now(),
        });
    }
}
