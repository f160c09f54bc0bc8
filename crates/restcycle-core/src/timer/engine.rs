//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based state machine over a fixed set of
//! accounts. It does not use internal threads - the caller is responsible
//! for calling `tick()` periodically, normally through
//! [`crate::scheduler::Scheduler`].
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Resting -> Idle -> Running -> ...
//! ```
//!
//! `stop` and `reset` return an account to `Idle` from any state (`stop`
//! only from `Running`). A finished rest never resumes work on its own.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(accounts);
//! engine.start(AccountId(1))?;
//! // In a loop:
//! let events = engine.tick(AccountId(1), Instant::now())?;
//! ```

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, trace};

use crate::account::{hours_to_ms, minutes_to_ms, Account, AccountId, AccountSettings, AccountSnapshot, AccountStatus};
use crate::clock::{Clock, SystemClock};
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::format::format_hms;

/// Core timer engine.
///
/// Owns every tracked [`Account`]. All mutation goes through the command
/// methods and `tick`.
#[derive(Debug)]
pub struct TimerEngine<C: Clock = SystemClock> {
    clock: C,
    accounts: BTreeMap<AccountId, Account>,
}

impl TimerEngine<SystemClock> {
    pub fn new(accounts: impl IntoIterator<Item = (AccountId, AccountSettings)>) -> Self {
        Self::with_clock(SystemClock::new(), accounts)
    }
}

impl<C: Clock> TimerEngine<C> {
    pub fn with_clock(
        clock: C,
        accounts: impl IntoIterator<Item = (AccountId, AccountSettings)>,
    ) -> Self {
        let accounts = accounts
            .into_iter()
            .map(|(id, settings)| (id, Account::new(id, settings)))
            .collect();
        Self { clock, accounts }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn account(&self, id: AccountId) -> Result<&Account> {
        self.accounts.get(&id).ok_or(CoreError::UnknownAccount(id))
    }

    pub fn account_ids(&self) -> Vec<AccountId> {
        self.accounts.keys().copied().collect()
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn snapshot(&self, id: AccountId) -> Result<AccountSnapshot> {
        self.account(id).map(Account::snapshot)
    }

    pub fn snapshots(&self) -> Vec<AccountSnapshot> {
        self.accounts.values().map(Account::snapshot).collect()
    }

    /// Running or resting.
    pub fn is_active(&self, id: AccountId) -> bool {
        self.accounts
            .get(&id)
            .is_some_and(|a| a.status != AccountStatus::Idle)
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, id: AccountId) -> Result<Option<Event>> {
        let now = self.clock.now();
        let account = self.account_mut(id)?;
        if account.status != AccountStatus::Idle {
            return Ok(None);
        }
        account.status = AccountStatus::Running;
        account.last_sample = Some(now);
        account.session_elapsed_ms = 0;
        info!(account = %id, "timer started");
        Ok(Some(Event::Started {
            account: id,
            at: Utc::now(),
        }))
    }

    pub fn stop(&mut self, id: AccountId) -> Result<Option<Event>> {
        let account = self.account_mut(id)?;
        if !account.running() {
            return Ok(None);
        }
        halt(account);
        let total_active_ms = account.total_active_ms;
        info!(account = %id, total = %format_hms(total_active_ms), "timer stopped");
        Ok(Some(Event::Stopped {
            account: id,
            total_active_ms,
            at: Utc::now(),
        }))
    }

    /// Stop (or abandon a rest) and return every counter to its
    /// freshly-constructed value. Settings are kept.
    pub fn reset(&mut self, id: AccountId) -> Result<Option<Event>> {
        let account = self.account_mut(id)?;
        halt(account);
        account.total_active_ms = 0;
        account.session_elapsed_ms = 0;
        account.rest_elapsed_ms = 0;
        account.time_to_next_rest_ms = account.interval_ms;
        account.goal_notified = false;
        info!(account = %id, "timer reset");
        Ok(Some(Event::Reset {
            account: id,
            at: Utc::now(),
        }))
    }

    pub fn update_goal(&mut self, id: AccountId, hours: u32) -> Result<Option<Event>> {
        let account = self.account_mut(id)?;
        account.goal_ms = hours_to_ms(hours);
        if account.goal_notified && account.total_active_ms < account.goal_ms {
            account.goal_notified = false;
        }
        debug!(account = %id, hours, "goal updated");
        Ok(Some(settings_changed(account)))
    }

    /// A running account keeps its in-flight countdown; the new interval
    /// applies from the next rest onwards.
    pub fn update_interval(&mut self, id: AccountId, minutes: u32) -> Result<Option<Event>> {
        let account = self.account_mut(id)?;
        account.interval_ms = minutes_to_ms(minutes);
        if !account.running() {
            account.time_to_next_rest_ms = account.interval_ms;
        }
        debug!(account = %id, minutes, "interval updated");
        Ok(Some(settings_changed(account)))
    }

    /// Applies to the rest in progress, if any.
    pub fn update_rest(&mut self, id: AccountId, minutes: u32) -> Result<Option<Event>> {
        let account = self.account_mut(id)?;
        account.rest_ms = minutes_to_ms(minutes);
        debug!(account = %id, minutes, "rest length updated");
        Ok(Some(settings_changed(account)))
    }

    /// Advance one account to `now`. Returns the transitions that happened.
    ///
    /// Elapsed time is always `now - last_sample`, so a late or skipped
    /// tick only delays observation and never loses time.
    pub fn tick(&mut self, id: AccountId, now: Instant) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        match self.account(id)?.status {
            AccountStatus::Running => {
                let account = self.account_mut(id)?;
                let delta = take_delta(account, now);
                account.total_active_ms = account.total_active_ms.saturating_add(delta);
                account.time_to_next_rest_ms = account.time_to_next_rest_ms.saturating_sub(delta);
                account.session_elapsed_ms = account.session_elapsed_ms.saturating_add(delta);
                trace!(account = %id, delta, total = account.total_active_ms, "running tick");

                if account.time_to_next_rest_ms == 0 {
                    events.extend(self.begin_rest(id, now)?);
                }
                events.extend(self.check_goal(id)?);
            }
            AccountStatus::Resting => {
                let account = self.account_mut(id)?;
                let delta = take_delta(account, now);
                account.rest_elapsed_ms = account.rest_elapsed_ms.saturating_add(delta);
                trace!(account = %id, delta, rest = account.rest_elapsed_ms, "resting tick");

                if account.rest_elapsed_ms >= account.rest_ms {
                    events.extend(self.end_rest(id)?);
                }
            }
            AccountStatus::Idle => {}
        }
        Ok(events)
    }

    // ── Internal ─────────────────────────────────────────────────────

    pub(super) fn account_mut(&mut self, id: AccountId) -> Result<&mut Account> {
        self.accounts
            .get_mut(&id)
            .ok_or(CoreError::UnknownAccount(id))
    }

    /// Fires at most once until the latch is cleared by reset or by raising
    /// the goal.
    fn check_goal(&mut self, id: AccountId) -> Result<Option<Event>> {
        let account = self.account_mut(id)?;
        if account.goal_notified || account.total_active_ms < account.goal_ms {
            return Ok(None);
        }
        account.goal_notified = true;
        if account.running() {
            halt(account);
        }
        info!(
            account = %id,
            total = %format_hms(account.total_active_ms),
            "goal reached"
        );
        Ok(Some(Event::GoalReached {
            account: id,
            total_active_ms: account.total_active_ms,
            goal_ms: account.goal_ms,
            at: Utc::now(),
        }))
    }
}

/// Leave the running/resting segment. Counters are untouched.
pub(super) fn halt(account: &mut Account) {
    account.status = AccountStatus::Idle;
    account.last_sample = None;
}

/// Whole milliseconds since the last sample.
///
/// The sample advances by exactly the amount counted, so sub-millisecond
/// remainders carry into the next tick instead of being dropped.
pub(super) fn take_delta(account: &mut Account, now: Instant) -> u64 {
    let Some(last) = account.last_sample else {
        account.last_sample = Some(now);
        return 0;
    };
    let delta = now.saturating_duration_since(last).as_millis() as u64;
    account.last_sample = Some(last + Duration::from_millis(delta));
    delta
}

fn settings_changed(account: &Account) -> Event {
    Event::SettingsChanged {
        account: account.id,
        goal_ms: account.goal_ms,
        interval_ms: account.interval_ms,
        rest_ms: account.rest_ms,
        at: Utc::now(),
    }
}
