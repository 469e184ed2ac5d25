//! Helpers shared by several commands.

use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDate, NaiveDateTime};
use tracing::info;

use studyroom_core::error::Result;
use studyroom_core::{
    Config, HttpSessionStore, Journal, MemorySessionStore, SessionRecorder, SessionStore,
    StoredSession,
};

/// Local calendar day used by every statistics query.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Recorder wired from config. `offline` forces the journal-only store.
pub fn build_recorder(config: &Config, offline: bool) -> Result<SessionRecorder> {
    let store: Arc<dyn SessionStore> = if offline || !config.backend.enabled {
        info!("backend disabled; sessions are kept in the local journal only");
        Arc::new(MemorySessionStore::local())
    } else {
        Arc::new(HttpSessionStore::from_config(&config.backend)?)
    };

    let mut recorder = SessionRecorder::new(store);
    if config.journal.enabled {
        recorder = recorder.with_journal(Arc::new(Mutex::new(Journal::open()?)));
    }
    Ok(recorder)
}

/// Submit one session and wait for the store's answer.
pub fn record_session(
    recorder: &SessionRecorder,
    course_id: i64,
    topic_id: i64,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<StoredSession> {
    Ok(block_on(recorder.record(course_id, topic_id, start, end))??)
}

/// Run `future` on a single-threaded runtime.
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}

/// Render a journal interval as `YYYY-MM-DD HH:MM`.
pub fn short_time(t: &NaiveDateTime) -> String {
    t.format("%Y-%m-%d %H:%M").to_string()
}
