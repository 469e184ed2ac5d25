use std::fmt;

use chrono::{Duration, Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::RecordingError;

/// Course and topic the next hand-off is attributed to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub course_id: Option<i64>,
    pub topic_id: Option<i64>,
}

/// Why a Work period was not handed off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoCourseSelected,
    NoTopicSelected,
    NothingElapsed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::NoCourseSelected => "no course selected",
            SkipReason::NoTopicSelected => "no topic selected",
            SkipReason::NothingElapsed => "no focus time elapsed",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffTrigger {
    Completed,
    Stopped,
}

impl Selection {
    pub fn new(course_id: Option<i64>, topic_id: Option<i64>) -> Self {
        Self {
            course_id,
            topic_id,
        }
    }

    pub fn of(course_id: i64, topic_id: i64) -> Self {
        Self::new(Some(course_id), Some(topic_id))
    }

    /// Both ids, or the reason recording has to be skipped.
    pub fn resolve(&self) -> Result<(i64, i64), SkipReason> {
        let course = self.course_id.ok_or(SkipReason::NoCourseSelected)?;
        let topic = self.topic_id.ok_or(SkipReason::NoTopicSelected)?;
        Ok((course, topic))
    }
}

/// Snapshot of a finished Work period, taken before the timer resets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHandoff {
    pub course_id: i64,
    pub topic_id: i64,
    pub started_at: NaiveDateTime,
    pub ended_at: NaiveDateTime,
    pub elapsed_secs: u64,
    pub trigger: HandoffTrigger,
}

impl SessionHandoff {
    /// The reported interval is the counted focus time ending at `ended_at`,
    /// so paused time never inflates the recorded duration.
    pub fn ending_at(
        course_id: i64,
        topic_id: i64,
        ended_at: NaiveDateTime,
        elapsed_secs: u64,
        trigger: HandoffTrigger,
    ) -> Self {
        let elapsed = Duration::seconds(i64::try_from(elapsed_secs).unwrap_or(i64::MAX / 1000));
        Self {
            course_id,
            topic_id,
            started_at: ended_at - elapsed,
            ended_at,
            elapsed_secs,
            trigger,
        }
    }

    pub fn duration_min(&self) -> u64 {
        self.elapsed_secs.div_ceil(60)
    }
}

/// A study session ready to be handed to a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySession {
    pub course_id: i64,
    pub topic_id: i64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration_in_minutes: u64,
}

impl StudySession {
    /// Build a session from its interval, rounding the duration up to whole minutes.
    pub fn from_interval(
        course_id: i64,
        topic_id: i64,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    ) -> Result<Self, RecordingError> {
        let duration_in_minutes =
            duration_minutes(start_time, end_time).ok_or(RecordingError::InvalidInterval {
                start: start_time,
                end: end_time,
            })?;
        Ok(Self {
            course_id,
            topic_id,
            start_time,
            end_time,
            duration_in_minutes,
        })
    }
}

/// `ceil((end - start) / 60s)`; `None` when `end` precedes `start`.
pub fn duration_minutes(start: NaiveDateTime, end: NaiveDateTime) -> Option<u64> {
    let secs = (end - start).num_seconds();
    u64::try_from(secs).ok().map(|s| s.div_ceil(60))
}

/// Local wall-clock time truncated to whole seconds.
pub fn now_local() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}
