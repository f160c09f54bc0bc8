//! Periodic driver for the timer engine.
//!
//! The scheduler owns the engine and the event dispatcher. Ticks and user
//! commands are processed by the same task, one at a time, so no account is
//! ever touched by two callers at once.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::account::{AccountId, AccountSnapshot};
use crate::clock::Clock;
use crate::dispatch::EventDispatcher;
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::timer::TimerEngine;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// User commands accepted by the scheduler loop.
#[derive(Debug)]
pub enum Command {
    Start(AccountId),
    Stop(AccountId),
    Reset(AccountId),
    UpdateGoal(AccountId, u32),
    UpdateInterval(AccountId, u32),
    UpdateRest(AccountId, u32),
    Snapshot(oneshot::Sender<Vec<AccountSnapshot>>),
    TestSound,
}

pub struct Scheduler<C: Clock> {
    engine: TimerEngine<C>,
    dispatcher: EventDispatcher,
    tick_interval: Duration,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(engine: TimerEngine<C>, dispatcher: EventDispatcher) -> Self {
        Self {
            engine,
            dispatcher,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    /// Coarser cadence only delays observation; totals stay exact.
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval.max(Duration::from_millis(1));
        self
    }

    pub fn engine(&self) -> &TimerEngine<C> {
        &self.engine
    }

    pub fn into_engine(self) -> TimerEngine<C> {
        self.engine
    }

    /// Push the current state of every account to the renderer.
    pub fn render_all(&self) {
        for snapshot in self.engine.snapshots() {
            self.dispatcher.render(&snapshot);
        }
    }

    /// Tick every account against a single clock reading.
    ///
    /// A failure on one account is logged and does not stop the others.
    pub fn tick_once(&mut self) -> Vec<Event> {
        let now = self.engine.clock().now();
        let mut emitted = Vec::new();
        for id in self.engine.account_ids() {
            let was_active = self.engine.is_active(id);
            match self.engine.tick(id, now) {
                Ok(events) => {
                    for event in &events {
                        self.dispatcher.dispatch(event);
                    }
                    if was_active || !events.is_empty() {
                        self.render(id);
                    }
                    emitted.extend(events);
                }
                Err(e) => warn!(account = %id, error = %e, "tick failed"),
            }
        }
        emitted
    }

    /// Apply one command. Unknown accounts are logged and ignored.
    pub fn handle(&mut self, command: Command) -> Option<Event> {
        let (id, result) = match command {
            Command::Start(id) => (id, self.engine.start(id)),
            Command::Stop(id) => (id, self.engine.stop(id)),
            Command::Reset(id) => (id, self.engine.reset(id)),
            Command::UpdateGoal(id, hours) => (id, self.engine.update_goal(id, hours)),
            Command::UpdateInterval(id, minutes) => (id, self.engine.update_interval(id, minutes)),
            Command::UpdateRest(id, minutes) => (id, self.engine.update_rest(id, minutes)),
            Command::Snapshot(reply) => {
                if reply.send(self.engine.snapshots()).is_err() {
                    debug!("snapshot requester went away");
                }
                return None;
            }
            Command::TestSound => {
                self.dispatcher.test_sound();
                return None;
            }
        };

        match result {
            Ok(Some(event)) => {
                self.dispatcher.dispatch(&event);
                self.render(id);
                Some(event)
            }
            Ok(None) => {
                debug!(account = %id, "command had no effect");
                None
            }
            Err(e) => {
                warn!(account = %id, error = %e, "command ignored");
                None
            }
        }
    }

    /// Run until every [`SchedulerHandle`] is dropped.
    ///
    /// Returns the scheduler so callers can inspect the final state.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> Self {
        let mut interval = time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            accounts = self.engine.account_ids().len(),
            tick_ms = self.tick_interval.as_millis() as u64,
            "scheduler started"
        );
        self.render_all();

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick_once();
                }
                command = commands.recv() => match command {
                    Some(command) => {
                        self.handle(command);
                    }
                    None => break,
                },
            }
        }

        info!("scheduler stopped");
        self
    }

    fn render(&self, id: AccountId) {
        if let Ok(snapshot) = self.engine.snapshot(id) {
            self.dispatcher.render(&snapshot);
        }
    }
}

/// Create a command channel for [`Scheduler::run`].
pub fn channel(buffer: usize) -> (SchedulerHandle, mpsc::Receiver<Command>) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    (SchedulerHandle { tx }, rx)
}

/// Cloneable front door to a running scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    tx: mpsc::Sender<Command>,
}

impl SchedulerHandle {
    pub async fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| CoreError::SchedulerClosed)
    }

    pub async fn snapshots(&self) -> Result<Vec<AccountSnapshot>> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot(reply)).await?;
        rx.await.map_err(|_| CoreError::SchedulerClosed)
    }
}
