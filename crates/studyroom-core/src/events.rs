use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{HandoffTrigger, SkipReason};
use crate::timer::{Preset, TimerMode, TimerSnapshot};

/// Every state change of a timer produces an Event.
/// Hosts subscribe to them instead of re-deriving countdown state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    PresetSelected {
        preset: Preset,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SelectionChanged {
        course_id: Option<i64>,
        topic_id: Option<i64>,
        at: DateTime<Utc>,
    },
    TimerStarted {
        mode: TimerMode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: TimerMode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    Tick {
        mode: TimerMode,
        remaining_secs: u64,
    },
    /// Countdown reached zero.
    TimerCompleted {
        mode: TimerMode,
        at: DateTime<Utc>,
    },
    /// Manual stop.
    TimerStopped {
        mode: TimerMode,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    ModeChanged {
        from: TimerMode,
        to: TimerMode,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// Work period not handed off (no course/topic, or nothing elapsed).
    RecordingSkipped {
        reason: SkipReason,
        at: DateTime<Utc>,
    },
    SessionRecorded {
        course_id: i64,
        topic_id: i64,
        duration_min: u64,
        remote_id: Option<i64>,
        trigger: HandoffTrigger,
        at: DateTime<Utc>,
    },
    /// Transient, non-blocking notice. The timer is unaffected.
    RecordingFailed {
        course_id: i64,
        topic_id: i64,
        message: String,
        at: DateTime<Utc>,
    },
    StateSnapshot(TimerSnapshot),
}

impl Event {
    /// Whether hosts should surface this event as a warning.
    pub fn is_warning(&self) -> bool {
        matches!(self, Event::RecordingFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let ev = Event::Tick {
            mode: TimerMode::Work,
            remaining_secs: 42,
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "Tick");
        assert_eq!(json["mode"], "work");
        assert_eq!(json["remaining_secs"], 42);
    }

    #[test]
    fn only_recording_failures_are_warnings() {
        let failed = Event::RecordingFailed {
            course_id: 1,
            topic_id: 2,
            message: "offline".into(),
            at: Utc::now(),
        };
        let skipped = Event::RecordingSkipped {
            reason: SkipReason::NoCourseSelected,
            at: Utc::now(),
        };
        assert!(failed.is_warning());
        assert!(!skipped.is_warning());
    }
}
