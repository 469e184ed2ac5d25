//! Study session model.
//!
//! Internally a session is a flat `(course_id, topic_id)` pair plus its
//! interval. The nested wire shape lives in [`wire`] and is only built at
//! the HTTP boundary.

mod record;
pub mod wire;

pub use record::{
    duration_minutes, now_local, HandoffTrigger, Selection, SessionHandoff, SkipReason,
    StudySession,
};
pub use wire::{SessionPayload, StoredSession, WIRE_TIME_FORMAT};
