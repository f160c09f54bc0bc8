//! Rest transitions.
//!
//! A rest starts when an account's countdown to the next rest reaches zero
//! and ends once the configured rest length has elapsed. Ending a rest
//! leaves the account idle; work only resumes on an explicit `start`.

use std::time::Instant;

use chrono::Utc;
use tracing::info;

use super::engine::{halt, TimerEngine};
use crate::account::{AccountId, AccountStatus};
use crate::clock::Clock;
use crate::error::Result;
use crate::events::Event;
use crate::format::format_hms;

impl<C: Clock> TimerEngine<C> {
    /// Stop the account and begin a rest, sampled from the engine clock.
    pub fn start_rest(&mut self, id: AccountId) -> Result<Option<Event>> {
        let now = self.clock().now();
        self.begin_rest(id, now)
    }

    /// Finish the current rest and re-arm the countdown.
    pub fn end_rest(&mut self, id: AccountId) -> Result<Option<Event>> {
        let account = self.account_mut(id)?;
        if !account.resting() {
            return Ok(None);
        }
        halt(account);
        account.time_to_next_rest_ms = account.interval_ms;
        info!(account = %id, "rest ended");
        Ok(Some(Event::RestEnded {
            account: id,
            at: Utc::now(),
        }))
    }

    /// `now` is the instant of the tick that triggered the rest, so the
    /// rest segment starts exactly where the running segment ended.
    pub(super) fn begin_rest(&mut self, id: AccountId, now: Instant) -> Result<Option<Event>> {
        let account = self.account_mut(id)?;
        if account.resting() {
            return Ok(None);
        }
        halt(account);
        account.status = AccountStatus::Resting;
        account.rest_elapsed_ms = 0;
        account.last_sample = Some(now);
        info!(account = %id, length = %format_hms(account.rest_ms), "rest started");
        Ok(Some(Event::RestStarted {
            account: id,
            rest_ms: account.rest_ms,
            at: Utc::now(),
        }))
    }
}
