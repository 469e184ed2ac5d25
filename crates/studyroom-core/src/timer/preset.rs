use serde::{Deserialize, Serialize};

/// A selectable (work minutes, break minutes) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub work_min: u32,
    pub break_min: u32,
}

/// Built-in presets offered by every host.
pub const PRESETS: [Preset; 3] = [
    Preset::new(25, 5),
    Preset::new(50, 10),
    Preset::new(100, 20),
];

impl Preset {
    pub const fn new(work_min: u32, break_min: u32) -> Self {
        Self {
            work_min,
            break_min,
        }
    }

    /// Built-in preset by position, `None` when out of range.
    pub fn builtin(index: usize) -> Option<Self> {
        PRESETS.get(index).copied()
    }

    pub fn label(&self) -> String {
        format!("{} / {}", self.work_min, self.break_min)
    }

    pub fn work_secs(&self) -> u64 {
        u64::from(self.work_min).saturating_mul(60)
    }

    pub fn break_secs(&self) -> u64 {
        u64::from(self.break_min).saturating_mul(60)
    }
}

impl Default for Preset {
    fn default() -> Self {
        PRESETS[0]
    }
}

/// Cycle settings shared by every preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    /// Every Nth completed Work period is followed by a long break.
    pub sessions_before_long: u32,
    pub long_break_min: u32,
}

impl TimerSettings {
    pub fn new(sessions_before_long: u32, long_break_min: u32) -> Self {
        Self {
            sessions_before_long,
            long_break_min,
        }
    }

    /// Long-break cadence, never below one.
    pub fn long_break_every(&self) -> u32 {
        self.sessions_before_long.max(1)
    }

    pub fn long_break_secs(&self) -> u64 {
        u64::from(self.long_break_min).saturating_mul(60)
    }
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            sessions_before_long: 4,
            long_break_min: 15,
        }
    }
}
