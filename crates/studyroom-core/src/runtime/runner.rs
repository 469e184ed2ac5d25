use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use super::tick::{next_tick, ArmedTick};
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::recorder::SessionRecorder;
use crate::session::{Selection, SessionHandoff};
use crate::timer::{Outcome, Preset, TimerController, TimerSnapshot};

/// Broadcast buffer per subscriber. Slow subscribers see `Lagged`.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;
const COMMAND_CAPACITY: usize = 32;
const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub enum Command {
    SelectPreset(Preset),
    Select(Selection),
    Start,
    Pause,
    Stop,
    Snapshot(oneshot::Sender<TimerSnapshot>),
    Shutdown,
}

/// Cloneable access to a running [`TimerRuntime`].
///
/// The runtime stops once every handle is dropped.
#[derive(Clone)]
pub struct TimerHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<Event>,
}

impl TimerHandle {
    /// Receive every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| CoreError::RuntimeClosed)
    }

    pub async fn start(&self) -> Result<()> {
        self.send(Command::Start).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(Command::Pause).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.send(Command::Stop).await
    }

    pub async fn select_preset(&self, preset: Preset) -> Result<()> {
        self.send(Command::SelectPreset(preset)).await
    }

    pub async fn select(&self, selection: Selection) -> Result<()> {
        self.send(Command::Select(selection)).await
    }

    pub async fn snapshot(&self) -> Result<TimerSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx)).await?;
        rx.await.map_err(|_| CoreError::RuntimeClosed)
    }

    /// Ask the runtime to stop; pending hand-offs still finish.
    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }
}

/// Owns one controller and drives it from commands and the armed tick.
pub struct TimerRuntime {
    controller: TimerController,
    recorder: SessionRecorder,
    commands: mpsc::Receiver<Command>,
    events: broadcast::Sender<Event>,
    tick: Option<ArmedTick>,
    period: Duration,
    handoffs: JoinSet<()>,
}

impl TimerRuntime {
    pub fn new(controller: TimerController, recorder: SessionRecorder) -> (Self, TimerHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (event_tx, _) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        let handle = TimerHandle {
            commands: command_tx,
            events: event_tx.clone(),
        };
        let runtime = Self {
            controller,
            recorder,
            commands: command_rx,
            events: event_tx,
            tick: None,
            period: TICK_PERIOD,
            handoffs: JoinSet::new(),
        };
        (runtime, handle)
    }

    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn spawn(self) -> JoinHandle<TimerController> {
        tokio::spawn(self.run())
    }

    /// Run until shutdown, then wait for in-flight hand-offs.
    /// Returns the controller in its final state.
    pub async fn run(mut self) -> TimerController {
        info!(
            store = self.recorder.store_name(),
            preset = %self.controller.preset().label(),
            "timer runtime started"
        );

        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle(command),
                },
                _ = next_tick(&mut self.tick) => {
                    let outcome = self.controller.tick();
                    self.apply(outcome);
                }
                Some(joined) = self.handoffs.join_next(), if !self.handoffs.is_empty() => {
                    if let Err(e) = joined {
                        warn!("hand-off task ended abnormally: {e}");
                    }
                }
            }
        }

        self.tick = None;
        let pending = self.handoffs.len();
        if pending > 0 {
            debug!(pending, "waiting for in-flight hand-offs");
        }
        while let Some(joined) = self.handoffs.join_next().await {
            if let Err(e) = joined {
                warn!("hand-off task ended abnormally: {e}");
            }
        }
        info!("timer runtime stopped");
        self.controller
    }

    fn handle(&mut self, command: Command) {
        let outcome = match command {
            Command::SelectPreset(preset) => self.controller.select_preset(preset),
            Command::Select(selection) => self.controller.set_selection(selection),
            Command::Start => self.controller.start(),
            Command::Pause => self.controller.pause(),
            Command::Stop => self.controller.stop(),
            Command::Snapshot(reply) => {
                let _ = reply.send(self.controller.snapshot());
                return;
            }
            Command::Shutdown => return,
        };
        self.apply(outcome);
    }

    fn apply(&mut self, outcome: Outcome) {
        self.sync_tick();
        for event in outcome.events {
            self.publish(event);
        }
        if let Some(handoff) = outcome.handoff {
            self.spawn_handoff(handoff);
        }
    }

    /// Exactly one armed tick while running, none otherwise.
    fn sync_tick(&mut self) {
        match (self.controller.is_running(), self.tick.is_some()) {
            (true, false) => {
                let tick = ArmedTick::arm(self.period);
                debug!(period = ?tick.period(), "tick armed");
                self.tick = Some(tick);
            }
            (false, true) => self.tick = None,
            _ => {}
        }
    }

    fn publish(&self, event: Event) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn spawn_handoff(&mut self, handoff: SessionHandoff) {
        let recorder = self.recorder.clone();
        let events = self.events.clone();
        self.handoffs.spawn(async move {
            let event = match recorder.record_handoff(&handoff).await {
                Ok(stored) => Event::SessionRecorded {
                    course_id: handoff.course_id,
                    topic_id: handoff.topic_id,
                    duration_min: handoff.duration_min(),
                    remote_id: stored.id,
                    trigger: handoff.trigger,
                    at: Utc::now(),
                },
                Err(e) => Event::RecordingFailed {
                    course_id: handoff.course_id,
                    topic_id: handoff.topic_id,
                    message: e.to_string(),
                    at: Utc::now(),
                },
            };
            let _ = events.send(event);
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::recorder::MemorySessionStore;
    use crate::timer::{TimerMode, TimerSettings};

    fn runtime(store: Arc<MemorySessionStore>) -> (TimerRuntime, TimerHandle) {
        let controller = TimerController::new(Preset::new(1, 1), TimerSettings::default())
            .with_selection(Selection::of(3, 7));
        TimerRuntime::new(controller, SessionRecorder::new(store))
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_start_keeps_one_tick() {
        let store = Arc::new(MemorySessionStore::accepting());
        let (rt, handle) = runtime(store);
        let join = rt.spawn();

        for _ in 0..5 {
            handle.start().await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(10_500)).await;
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.remaining_secs, 50);

        drop(handle);
        let controller = join.await.unwrap();
        assert_eq!(controller.mode(), TimerMode::Work);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_returns_final_controller() {
        let store = Arc::new(MemorySessionStore::accepting());
        let (rt, handle) = runtime(store);
        let join = rt.spawn();

        handle.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        handle.shutdown().await.unwrap();

        let controller = join.await.unwrap();
        assert_eq!(controller.remaining_secs(), 57);
        assert!(handle.start().await.is_err());
    }
}
