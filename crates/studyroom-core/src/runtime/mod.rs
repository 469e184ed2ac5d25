//! Async driver for a [`TimerController`](crate::timer::TimerController).
//!
//! One tokio task owns the controller. While the timer runs it holds a
//! single [`ArmedTick`]; pausing, stopping, completing or shutting down
//! drops it, so no tick is ever delivered to an idle timer. Hand-offs are
//! spawned next to the loop and never delay the following tick.

mod runner;
mod tick;

pub use runner::{Command, TimerHandle, TimerRuntime, DEFAULT_EVENT_CAPACITY};
pub use tick::ArmedTick;
