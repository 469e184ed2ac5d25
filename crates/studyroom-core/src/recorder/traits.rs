use async_trait::async_trait;

use crate::error::RecordingError;
use crate::session::{StoredSession, StudySession};

/// External collaborator that persists study sessions.
///
/// The timer never depends on a store succeeding: every failure is
/// reported back as a [`RecordingError`] and nothing else.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Short identifier used in logs (e.g. "http", "memory").
    fn name(&self) -> &str;

    /// Submit one session. No retries.
    async fn create_session(&self, session: &StudySession) -> Result<StoredSession, RecordingError>;
}
