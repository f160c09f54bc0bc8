//! Deterministic simulation harness.
//!
//! Drives a [`Scheduler`] over a [`ManualClock`] so whole work/rest days can
//! be replayed instantly and reproducibly. Used by `restcycle simulate` and
//! by the integration tests.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::account::{AccountId, AccountSettings, AccountSnapshot};
use crate::clock::ManualClock;
use crate::dispatch::EventDispatcher;
use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::ports::Ports;
use crate::scheduler::{Command, Scheduler};
use crate::timer::TimerEngine;

/// Longest stretch of simulated time a single simulation may cover.
pub const MAX_SIMULATED_SPAN: Duration = Duration::from_secs(366 * 24 * 60 * 60);

/// One scripted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SimulationStep {
    Start { account: AccountId },
    Stop { account: AccountId },
    Reset { account: AccountId },
    /// Let time pass, ticking at the simulation's step size.
    Advance { ms: u64 },
}

/// An event together with the simulated time it happened at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedEvent {
    pub offset_ms: u64,
    pub event: Event,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub elapsed_ms: u64,
    pub events: Vec<SimulatedEvent>,
    pub accounts: Vec<AccountSnapshot>,
}

pub struct Simulation {
    scheduler: Scheduler<ManualClock>,
    clock: ManualClock,
    step: Duration,
    auto_restart: bool,
    events: Vec<SimulatedEvent>,
}

impl Simulation {
    pub fn new(accounts: impl IntoIterator<Item = (AccountId, AccountSettings)>) -> Self {
        Self::with_ports(accounts, Ports::null())
    }

    pub fn with_ports(
        accounts: impl IntoIterator<Item = (AccountId, AccountSettings)>,
        ports: Ports,
    ) -> Self {
        let clock = ManualClock::new();
        let engine = TimerEngine::with_clock(clock.clone(), accounts);
        Self {
            scheduler: Scheduler::new(engine, EventDispatcher::new(ports)),
            clock,
            step: Duration::from_secs(1),
            auto_restart: false,
            events: Vec::new(),
        }
    }

    /// Tick spacing. Totals do not depend on it; only when transitions are
    /// observed does.
    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step.clamp(Duration::from_millis(1), MAX_SIMULATED_SPAN);
        self
    }

    /// Start an account again as soon as its rest ends, like a user who
    /// always returns on time.
    pub fn with_auto_restart(mut self, enabled: bool) -> Self {
        self.auto_restart = enabled;
        self
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    pub fn scheduler(&self) -> &Scheduler<ManualClock> {
        &self.scheduler
    }

    pub fn events(&self) -> &[SimulatedEvent] {
        &self.events
    }

    pub fn apply(&mut self, step: SimulationStep) -> Result<()> {
        match step {
            SimulationStep::Start { account } => self.command(Command::Start(account)),
            SimulationStep::Stop { account } => self.command(Command::Stop(account)),
            SimulationStep::Reset { account } => self.command(Command::Reset(account)),
            SimulationStep::Advance { ms } => return self.advance(Duration::from_millis(ms)),
        }
        Ok(())
    }

    /// Move the clock forward by `by`, ticking every `step` and once more
    /// at the end for any remainder.
    ///
    /// Fails without ticking if the simulation would run past
    /// [`MAX_SIMULATED_SPAN`].
    pub fn advance(&mut self, by: Duration) -> Result<()> {
        let target = self
            .clock
            .elapsed()
            .checked_add(by)
            .filter(|target| *target <= MAX_SIMULATED_SPAN)
            .ok_or_else(|| ValidationError::InvalidConfiguration {
                field: "simulated time".to_string(),
                value: format!("{} ms", by.as_millis()),
                reason: format!(
                    "simulation may not run longer than {} days",
                    MAX_SIMULATED_SPAN.as_secs() / 86_400
                ),
            })?;
        while self.clock.elapsed() < target {
            let next = self.clock.elapsed().saturating_add(self.step).min(target);
            self.clock.set_elapsed(next);
            let emitted = self.scheduler.tick_once();
            self.record(&emitted);

            if self.auto_restart {
                for event in emitted {
                    if let Event::RestEnded { account, .. } = event {
                        self.command(Command::Start(account));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn run(mut self, steps: impl IntoIterator<Item = SimulationStep>) -> Result<SimulationReport> {
        for step in steps {
            self.apply(step)?;
        }
        Ok(self.report())
    }

    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            elapsed_ms: self.clock.elapsed().as_millis() as u64,
            events: self.events.clone(),
            accounts: self.scheduler.engine().snapshots(),
        }
    }

    fn command(&mut self, command: Command) {
        if let Some(event) = self.scheduler.handle(command) {
            self.record(std::slice::from_ref(&event));
        }
    }

    fn record(&mut self, events: &[Event]) {
        let offset_ms = self.clock.elapsed().as_millis() as u64;
        self.events.extend(events.iter().cloned().map(|event| SimulatedEvent {
            offset_ms,
            event,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountStatus;

    const ID: AccountId = AccountId(1);

    fn settings() -> AccountSettings {
        AccountSettings {
            goal_hours: 1,
            interval_minutes: 25,
            rest_minutes: 5,
        }
    }

    #[test]
    fn advance_ticks_in_steps_and_remainder() {
        let mut sim = Simulation::new([(ID, settings())]).with_step(Duration::from_secs(7));
        sim.apply(SimulationStep::Start { account: ID }).unwrap();
        sim.advance(Duration::from_secs(30)).unwrap();
        let report = sim.report();
        assert_eq!(report.elapsed_ms, 30_000);
        assert_eq!(report.accounts[0].total_active_ms, 30_000);
    }

    #[test]
    fn auto_restart_runs_to_goal() {
        let report = Simulation::new([(ID, settings())])
            .with_auto_restart(true)
            .run([
                SimulationStep::Start { account: ID },
                SimulationStep::Advance { ms: 2 * 3_600_000 },
            ])
            .unwrap();

        let rests = report
            .events
            .iter()
            .filter(|e| matches!(e.event, Event::RestStarted { .. }))
            .count();
        let goals: Vec<_> = report
            .events
            .iter()
            .filter(|e| matches!(e.event, Event::GoalReached { .. }))
            .collect();
        // 60 minutes of work at 25 minute intervals: rests after 25 and 50.
        assert_eq!(rests, 2);
        assert_eq!(goals.len(), 1);
        // 60 min work + 2 rests of 5 min.
        assert_eq!(goals[0].offset_ms, 70 * 60_000);
        assert_eq!(report.accounts[0].status, AccountStatus::Idle);
        assert_eq!(report.accounts[0].total_active_ms, 3_600_000);
    }

    #[test]
    fn oversized_advance_is_rejected_without_ticking() {
        let mut sim = Simulation::new([(ID, settings())]).with_step(Duration::MAX);
        sim.apply(SimulationStep::Start { account: ID }).unwrap();

        let err = sim
            .apply(SimulationStep::Advance { ms: u64::MAX })
            .unwrap_err();
        assert!(err.to_string().contains("simulated time"));
        assert_eq!(sim.clock().elapsed(), Duration::ZERO);

        sim.advance(MAX_SIMULATED_SPAN).unwrap();
        assert_eq!(sim.clock().elapsed(), MAX_SIMULATED_SPAN);
        assert!(sim.advance(Duration::from_millis(1)).is_err());
    }

    #[test]
    fn steps_deserialize_from_json() {
        let steps: Vec<SimulationStep> = serde_json::from_str(
            r#"[{"action":"start","account":1},{"action":"advance","ms":1000}]"#,
        )
        .unwrap();
        assert_eq!(
            steps,
            vec![
                SimulationStep::Start { account: ID },
                SimulationStep::Advance { ms: 1000 }
            ]
        );
    }
}
