//! In-process session store, used for offline runs and tests.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::traits::SessionStore;
use crate::error::RecordingError;
use crate::session::{StoredSession, StudySession};

pub struct MemorySessionStore {
    sessions: Mutex<Vec<StudySession>>,
    next_id: AtomicI64,
    failure: Option<String>,
    delay: Option<Duration>,
    assign_ids: bool,
}

impl MemorySessionStore {
    /// Accepts everything and assigns increasing ids.
    pub fn accepting() -> Self {
        Self {
            sessions: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            failure: None,
            delay: None,
            assign_ids: true,
        }
    }

    /// Accepts everything without inventing remote ids or keeping a copy.
    /// Used when the backend is disabled and sessions only reach the journal.
    pub fn local() -> Self {
        Self {
            assign_ids: false,
            ..Self::accepting()
        }
    }

    /// Rejects everything with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::accepting()
        }
    }

    /// Wait `delay` (tokio time) before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sessions accepted so far. Always empty for [`MemorySessionStore::local`].
    pub fn sessions(&self) -> Vec<StudySession> {
        self.sessions
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    fn name(&self) -> &str {
        if self.assign_ids {
            "memory"
        } else {
            "local"
        }
    }

    async fn create_session(
        &self,
        session: &StudySession,
    ) -> Result<StoredSession, RecordingError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.failure {
            return Err(RecordingError::Unavailable(message.clone()));
        }
        let id = self
            .assign_ids
            .then(|| self.next_id.fetch_add(1, Ordering::SeqCst));
        if self.assign_ids {
            self.sessions
                .lock()
                .map_err(|_| RecordingError::Unavailable("memory store poisoned".into()))?
                .push(session.clone());
        }
        Ok(StoredSession {
            id,
            duration_in_minutes: i64::try_from(session.duration_in_minutes).ok(),
        })
    }
}
