mod controller;
mod mode;
mod preset;

pub use controller::{format_clock, Outcome, TimerController, TimerSnapshot, TimerState};
pub use mode::TimerMode;
pub use preset::{Preset, TimerSettings, PRESETS};
