//! Session hand-off.
//!
//! [`SessionRecorder`] turns a finished Work period into a [`StudySession`]
//! and submits it to a [`SessionStore`]. When a [`Journal`] is attached,
//! every attempt is written to it as well; journal problems are logged and
//! never change the recording result.

mod http;
mod memory;
mod traits;

use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use tracing::{info, warn};

pub use http::HttpSessionStore;
pub use memory::MemorySessionStore;
pub use traits::SessionStore;

use crate::error::RecordingError;
use crate::session::{SessionHandoff, StoredSession, StudySession};
use crate::storage::Journal;

#[derive(Clone)]
pub struct SessionRecorder {
    store: Arc<dyn SessionStore>,
    journal: Option<Arc<Mutex<Journal>>>,
}

impl SessionRecorder {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            journal: None,
        }
    }

    pub fn with_journal(mut self, journal: Arc<Mutex<Journal>>) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Record one session; `durationInMinutes = ceil((end - start) / 60s)`.
    pub async fn record(
        &self,
        course_id: i64,
        topic_id: i64,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    ) -> Result<StoredSession, RecordingError> {
        let session = StudySession::from_interval(course_id, topic_id, start_time, end_time)?;
        let result = self.store.create_session(&session).await;

        match &result {
            Ok(stored) => {
                info!(
                    store = self.store.name(),
                    course_id,
                    topic_id,
                    minutes = session.duration_in_minutes,
                    remote_id = ?stored.id,
                    "study session recorded"
                );
                self.journal_write(|journal| journal.record_success(&session, stored.id));
            }
            Err(e) => {
                warn!(store = self.store.name(), course_id, topic_id, "recording failed: {e}");
                let message = e.to_string();
                self.journal_write(|journal| journal.record_failure(&session, &message));
            }
        }
        result
    }

    pub async fn record_handoff(
        &self,
        handoff: &SessionHandoff,
    ) -> Result<StoredSession, RecordingError> {
        self.record(
            handoff.course_id,
            handoff.topic_id,
            handoff.started_at,
            handoff.ended_at,
        )
        .await
    }

    fn journal_write<F>(&self, write: F)
    where
        F: FnOnce(&Journal) -> Result<i64, crate::error::JournalError>,
    {
        let Some(journal) = &self.journal else {
            return;
        };
        let outcome = match journal.lock() {
            Ok(guard) => write(&guard),
            Err(_) => {
                warn!("journal mutex poisoned; entry dropped");
                return;
            }
        };
        if let Err(e) = outcome {
            warn!("could not write journal entry: {e}");
        }
    }
}
