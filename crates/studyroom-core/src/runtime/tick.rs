use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// A repeating tick that exists only while a timer runs.
///
/// The first tick fires one period after arming. Dropping the value
/// cancels it; there is nothing else to clean up.
#[derive(Debug)]
pub struct ArmedTick {
    interval: Interval,
}

impl ArmedTick {
    pub fn arm(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        // Catch up after a stalled executor so the countdown keeps wall-clock pace.
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
        Self { interval }
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }

    pub async fn fired(&mut self) {
        self.interval.tick().await;
    }
}

/// Resolves on the next tick, or never when disarmed.
pub(crate) async fn next_tick(tick: &mut Option<ArmedTick>) {
    match tick {
        Some(armed) => armed.fired().await,
        None => std::future::pending().await,
    }
}
