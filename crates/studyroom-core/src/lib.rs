//! # Studyroom Core Library
//!
//! This library provides the core logic for the Studyroom study timer.
//! The CLI binary is a thin host over the same library: it owns one timer,
//! subscribes to its events and surfaces recording failures as notices.
//!
//! ## Architecture
//!
//! - **Timer Controller**: A synchronous countdown state machine. The caller
//!   invokes `tick()` once per second while the timer runs.
//! - **Session Recorder**: Converts a finished Work period into a study
//!   session and hands it to an external session store over HTTP.
//! - **Runtime**: A tokio task that owns the controller, arms a single
//!   repeating tick while running and spawns hand-offs off the tick path.
//! - **Storage**: TOML configuration and an SQLite journal of hand-offs.
//!
//! ## Key Components
//!
//! - [`TimerController`]: Core timer state machine
//! - [`SessionRecorder`]: Session hand-off to a [`SessionStore`]
//! - [`TimerRuntime`]: Armed-tick driver with event subscriptions
//! - [`Journal`]: Local record of hand-off attempts and study statistics
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod recorder;
pub mod runtime;
pub mod session;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, JournalError, RecordingError};
pub use events::Event;
pub use recorder::{HttpSessionStore, MemorySessionStore, SessionRecorder, SessionStore};
pub use runtime::{ArmedTick, TimerHandle, TimerRuntime};
pub use session::{Selection, SessionHandoff, SkipReason, StoredSession, StudySession};
pub use storage::{Config, Goal, GoalKind, Journal};
pub use timer::{
    Outcome, Preset, TimerController, TimerMode, TimerSettings, TimerSnapshot, TimerState,
};
