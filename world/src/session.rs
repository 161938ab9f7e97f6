//! Frame-driven host wrapper around a [`World`].

use std::time::Duration;

use hive_defence_core::{Command, Event, RejectReason, RunState, StateObserver};

use crate::{apply, query, World};

/// Drives a world from host frame timestamps and reports every change.
///
/// The observer receives a snapshot on construction, after every accepted
/// command and after every frame that advanced the simulation.
#[derive(Debug)]
pub struct Session<O> {
    world: World,
    observer: O,
    events: Vec<Event>,
    last_frame: Option<Duration>,
}

impl<O: StateObserver> Session<O> {
    /// Wraps `world` and immediately reports its state to `observer`.
    pub fn new(world: World, mut observer: O) -> Self {
        observer.on_state_changed(&query::snapshot(&world));
        Self {
            world,
            observer,
            events: Vec::new(),
            last_frame: None,
        }
    }

    /// Applies a player action.
    ///
    /// Rejected actions leave the world untouched and do not notify the
    /// observer. Any run state change discards the frame timing baseline, so
    /// a resumed or restarted run starts from a zero-length tick.
    pub fn perform(&mut self, command: Command) -> Result<(), RejectReason> {
        self.events.clear();
        apply(&mut self.world, command, &mut self.events)?;
        if self
            .events
            .iter()
            .any(|event| matches!(event, Event::RunStateChanged { .. } | Event::RunReset))
        {
            self.last_frame = None;
        }
        self.notify();
        Ok(())
    }

    /// Steps the simulation for a host frame rendered at `now`.
    ///
    /// The elapsed time since the previous frame is clamped by the world.
    /// Frames seen while the run is not running discard the timing baseline,
    /// so resuming never replays the time spent paused.
    pub fn frame(&mut self, now: Duration) {
        self.events.clear();
        if query::run_state(&self.world) != RunState::Running {
            self.last_frame = None;
            return;
        }

        let dt = self
            .last_frame
            .map_or(Duration::ZERO, |last| now.saturating_sub(last));
        self.last_frame = Some(now);
        if let Err(reason) = apply(&mut self.world, Command::Tick { dt }, &mut self.events) {
            tracing::warn!(%reason, "tick refused");
            return;
        }
        self.notify();
    }

    /// Events produced by the most recent command or frame.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Read-only access to the wrapped world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    fn notify(&mut self) {
        self.observer.on_state_changed(&query::snapshot(&self.world));
    }
}
