//! Timer controller implementation.
//!
//! The controller is a synchronous countdown state machine. It does not use
//! internal threads or perform I/O: the caller invokes `tick()` once per
//! second while the timer runs and acts on the returned [`Outcome`].
//!
//! ## State Transitions
//!
//! ```text
//! Work-Idle <-> Work-Running --(zero | stop)--> Break-Idle | Work-Idle
//! Break-Idle <-> Break-Running --(zero)--> Work-Idle
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = TimerController::new(Preset::default(), TimerSettings::default());
//! timer.start();
//! // Once per second:
//! let outcome = timer.tick();
//! if let Some(handoff) = outcome.handoff { /* record it */ }
//! ```

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Preset, TimerMode, TimerSettings};
use crate::events::Event;
use crate::session::{now_local, HandoffTrigger, Selection, SessionHandoff, SkipReason};

/// Countdown state of one timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub mode: TimerMode,
    pub remaining_secs: u64,
    pub running: bool,
    /// Set on the first start of a Work period, kept across pauses.
    pub session_started_at: Option<NaiveDateTime>,
}

impl TimerState {
    fn fresh_work(preset: &Preset) -> Self {
        Self {
            mode: TimerMode::Work,
            remaining_secs: preset.work_secs(),
            running: false,
            session_started_at: None,
        }
    }
}

/// Display-ready view of a timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub mode: TimerMode,
    pub remaining_secs: u64,
    pub total_secs: u64,
    pub running: bool,
    pub display: String,
    pub preset: Preset,
    pub completed_work: u32,
    pub session_started_at: Option<NaiveDateTime>,
    pub course_id: Option<i64>,
    pub topic_id: Option<i64>,
}

/// Result of a controller command.
#[derive(Debug, Default)]
pub struct Outcome {
    pub events: Vec<Event>,
    /// Work period to record, snapshotted before the state reset.
    pub handoff: Option<SessionHandoff>,
}

impl Outcome {
    fn none() -> Self {
        Self::default()
    }

    fn event(event: Event) -> Self {
        Self {
            events: vec![event],
            handoff: None,
        }
    }

    fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    fn merge(&mut self, other: Outcome) {
        self.events.extend(other.events);
        if other.handoff.is_some() {
            self.handoff = other.handoff;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.handoff.is_none()
    }
}

/// Core study timer.
#[derive(Debug, Clone)]
pub struct TimerController {
    preset: Preset,
    settings: TimerSettings,
    selection: Selection,
    state: TimerState,
    /// Work periods completed since the last preset change.
    completed_work: u32,
}

impl TimerController {
    /// Create a controller in Work-Idle for `preset`.
    pub fn new(preset: Preset, settings: TimerSettings) -> Self {
        Self {
            preset,
            settings,
            selection: Selection::default(),
            state: TimerState::fresh_work(&preset),
            completed_work: 0,
        }
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn mode(&self) -> TimerMode {
        self.state.mode
    }

    pub fn remaining_secs(&self) -> u64 {
        self.state.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn completed_work(&self) -> u32 {
        self.completed_work
    }

    /// Configured length of a period in `mode`.
    pub fn duration_secs(&self, mode: TimerMode) -> u64 {
        match mode {
            TimerMode::Work => self.preset.work_secs(),
            TimerMode::ShortBreak => self.preset.break_secs(),
            TimerMode::LongBreak => self.settings.long_break_secs(),
        }
    }

    pub fn total_secs(&self) -> u64 {
        self.duration_secs(self.state.mode)
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            mode: self.state.mode,
            remaining_secs: self.state.remaining_secs,
            total_secs: self.total_secs(),
            running: self.state.running,
            display: format_clock(self.state.remaining_secs),
            preset: self.preset,
            completed_work: self.completed_work,
            session_started_at: self.state.session_started_at,
            course_id: self.selection.course_id,
            topic_id: self.selection.topic_id,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn select_preset(&mut self, preset: Preset) -> Outcome {
        self.preset = preset;
        self.state = TimerState::fresh_work(&preset);
        self.completed_work = 0;
        debug!(preset = %preset.label(), "preset selected");
        Outcome::event(Event::PresetSelected {
            preset,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Attribute future hand-offs to `selection`. Timer state is untouched.
    pub fn set_selection(&mut self, selection: Selection) -> Outcome {
        self.selection = selection;
        Outcome::event(Event::SelectionChanged {
            course_id: selection.course_id,
            topic_id: selection.topic_id,
            at: Utc::now(),
        })
    }

    pub fn start(&mut self) -> Outcome {
        if self.state.running {
            return Outcome::none();
        }
        self.state.running = true;
        if self.state.mode.is_work() && self.state.session_started_at.is_none() {
            self.state.session_started_at = Some(now_local());
        }
        debug!(mode = %self.state.mode, remaining = self.state.remaining_secs, "timer started");
        Outcome::event(Event::TimerStarted {
            mode: self.state.mode,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Outcome {
        if !self.state.running {
            return Outcome::none();
        }
        self.state.running = false;
        debug!(mode = %self.state.mode, remaining = self.state.remaining_secs, "timer paused");
        Outcome::event(Event::TimerPaused {
            mode: self.state.mode,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Advance the countdown by one second. Completes the period at zero.
    pub fn tick(&mut self) -> Outcome {
        if !self.state.running {
            return Outcome::none();
        }
        self.state.remaining_secs = self.state.remaining_secs.saturating_sub(1);
        let mut outcome = Outcome::event(Event::Tick {
            mode: self.state.mode,
            remaining_secs: self.state.remaining_secs,
        });
        if self.state.remaining_secs == 0 {
            outcome.merge(self.complete());
        }
        outcome
    }

    /// Finish the current period and move to the next mode.
    pub fn complete(&mut self) -> Outcome {
        let ended_at = now_local();
        let finished = self.state.mode;
        self.state.running = false;

        let mut outcome = Outcome::event(Event::TimerCompleted {
            mode: finished,
            at: Utc::now(),
        });

        let next = if finished.is_work() {
            outcome.merge(self.hand_off(ended_at, HandoffTrigger::Completed));
            self.completed_work = self.completed_work.saturating_add(1);
            if self.completed_work % self.settings.long_break_every() == 0 {
                TimerMode::LongBreak
            } else {
                TimerMode::ShortBreak
            }
        } else {
            TimerMode::Work
        };

        self.enter(next, &mut outcome);
        outcome
    }

    /// Manual stop: record what was studied, then reset to a fresh Work period.
    pub fn stop(&mut self) -> Outcome {
        let ended_at = now_local();
        let stopped = self.state.mode;
        self.state.running = false;

        let mut outcome = Outcome::event(Event::TimerStopped {
            mode: stopped,
            elapsed_secs: self.elapsed_secs(),
            at: Utc::now(),
        });
        if stopped.is_work() {
            outcome.merge(self.hand_off(ended_at, HandoffTrigger::Stopped));
        }

        self.enter(TimerMode::Work, &mut outcome);
        outcome
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn elapsed_secs(&self) -> u64 {
        self.total_secs().saturating_sub(self.state.remaining_secs)
    }

    /// Must run before the state is reset.
    fn hand_off(&self, ended_at: NaiveDateTime, trigger: HandoffTrigger) -> Outcome {
        if self.state.session_started_at.is_none() {
            return Outcome::none();
        }
        let elapsed = self.elapsed_secs();
        let ids = if elapsed == 0 {
            Err(SkipReason::NothingElapsed)
        } else {
            self.selection.resolve()
        };
        match ids {
            Ok((course_id, topic_id)) => Outcome {
                events: Vec::new(),
                handoff: Some(SessionHandoff::ending_at(
                    course_id, topic_id, ended_at, elapsed, trigger,
                )),
            },
            Err(reason) => {
                debug!(?reason, "hand-off skipped");
                Outcome::event(Event::RecordingSkipped {
                    reason,
                    at: Utc::now(),
                })
            }
        }
    }

    fn enter(&mut self, mode: TimerMode, outcome: &mut Outcome) {
        let from = self.state.mode;
        self.state = TimerState {
            mode,
            remaining_secs: self.duration_secs(mode),
            running: false,
            session_started_at: None,
        };
        if from != mode {
            debug!(%from, to = %mode, "mode changed");
            outcome.push(Event::ModeChanged {
                from,
                to: mode,
                duration_secs: self.state.remaining_secs,
                at: Utc::now(),
            });
        }
    }
}

/// `MM:SS`, with minutes growing past two digits when needed.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
