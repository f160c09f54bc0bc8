//! Per-account timer state.
//!
//! An [`Account`] is plain data. Every mutation happens inside
//! [`crate::timer::TimerEngine`]; outside the engine the fields are only
//! readable through the query methods below.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::format::progress_pct;

pub const MS_PER_MINUTE: u64 = 60_000;
pub const MS_PER_HOUR: u64 = 3_600_000;

pub fn hours_to_ms(hours: u32) -> u64 {
    u64::from(hours) * MS_PER_HOUR
}

pub fn minutes_to_ms(minutes: u32) -> u64 {
    u64::from(minutes) * MS_PER_MINUTE
}

/// Stable account identifier, displayed as `account<N>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u32);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "account{}", self.0)
    }
}

impl std::str::FromStr for AccountId {
    type Err = ValidationError;

    /// Accepts `3` or `account3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix("account").unwrap_or(trimmed);
        digits
            .parse::<u32>()
            .map(AccountId)
            .map_err(|_| ValidationError::InvalidConfiguration {
                field: "account id".into(),
                value: s.into(),
                reason: "expected a number such as 1 or account1".into(),
            })
    }
}

/// User-facing schedule for one account, in whole hours and minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSettings {
    pub goal_hours: u32,
    pub interval_minutes: u32,
    pub rest_minutes: u32,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            goal_hours: 8,
            interval_minutes: 25,
            rest_minutes: 5,
        }
    }
}

/// Parse a goal/interval/rest amount typed by the user.
///
/// Rejects anything that is not a non-negative integer.
pub fn parse_amount(field: &str, raw: &str) -> Result<u32, ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidConfiguration {
        field: field.to_string(),
        value: raw.to_string(),
        reason: reason.to_string(),
    };
    match raw.trim().parse::<i64>() {
        Ok(n) if n < 0 => Err(invalid("must not be negative")),
        Ok(n) => u32::try_from(n).map_err(|_| invalid("value is too large")),
        Err(_) => Err(invalid("not a whole number")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Idle,
    Running,
    Resting,
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AccountStatus::Idle => "idle",
            AccountStatus::Running => "running",
            AccountStatus::Resting => "resting",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub(crate) id: AccountId,
    pub(crate) status: AccountStatus,
    pub(crate) goal_ms: u64,
    pub(crate) interval_ms: u64,
    pub(crate) rest_ms: u64,
    pub(crate) total_active_ms: u64,
    pub(crate) session_elapsed_ms: u64,
    pub(crate) time_to_next_rest_ms: u64,
    pub(crate) rest_elapsed_ms: u64,
    /// Last clock reading folded into the counters of the current running
    /// or resting segment. `None` while idle.
    pub(crate) last_sample: Option<Instant>,
    /// Set once the goal alert has fired; cleared by reset.
    pub(crate) goal_notified: bool,
}

impl Account {
    pub fn new(id: AccountId, settings: AccountSettings) -> Self {
        let interval_ms = minutes_to_ms(settings.interval_minutes);
        Self {
            id,
            status: AccountStatus::Idle,
            goal_ms: hours_to_ms(settings.goal_hours),
            interval_ms,
            rest_ms: minutes_to_ms(settings.rest_minutes),
            total_active_ms: 0,
            session_elapsed_ms: 0,
            time_to_next_rest_ms: interval_ms,
            rest_elapsed_ms: 0,
            last_sample: None,
            goal_notified: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn status(&self) -> AccountStatus {
        self.status
    }

    pub fn running(&self) -> bool {
        self.status == AccountStatus::Running
    }

    pub fn resting(&self) -> bool {
        self.status == AccountStatus::Resting
    }

    pub fn goal_ms(&self) -> u64 {
        self.goal_ms
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn rest_ms(&self) -> u64 {
        self.rest_ms
    }

    pub fn total_active_ms(&self) -> u64 {
        self.total_active_ms
    }

    pub fn session_elapsed_ms(&self) -> u64 {
        self.session_elapsed_ms
    }

    pub fn time_to_next_rest_ms(&self) -> u64 {
        self.time_to_next_rest_ms
    }

    /// Only meaningful while resting.
    pub fn rest_elapsed_ms(&self) -> u64 {
        self.rest_elapsed_ms
    }

    pub fn goal_notified(&self) -> bool {
        self.goal_notified
    }

    pub fn goal_remaining_ms(&self) -> u64 {
        self.goal_ms.saturating_sub(self.total_active_ms)
    }

    pub fn goal_progress_pct(&self) -> f64 {
        progress_pct(self.total_active_ms, self.goal_ms)
    }

    pub fn rest_remaining_ms(&self) -> u64 {
        self.rest_ms.saturating_sub(self.rest_elapsed_ms)
    }

    pub fn rest_progress_pct(&self) -> f64 {
        progress_pct(self.rest_elapsed_ms, self.rest_ms)
    }

    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            id: self.id,
            status: self.status,
            goal_ms: self.goal_ms,
            interval_ms: self.interval_ms,
            rest_ms: self.rest_ms,
            total_active_ms: self.total_active_ms,
            session_elapsed_ms: self.session_elapsed_ms,
            time_to_next_rest_ms: self.time_to_next_rest_ms,
            rest_elapsed_ms: self.rest_elapsed_ms,
            goal_remaining_ms: self.goal_remaining_ms(),
            goal_progress_pct: self.goal_progress_pct(),
            rest_remaining_ms: self.rest_remaining_ms(),
            rest_progress_pct: self.rest_progress_pct(),
        }
    }
}

/// Read-only view of an account handed to the render port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub id: AccountId,
    pub status: AccountStatus,
    pub goal_ms: u64,
    pub interval_ms: u64,
    pub rest_ms: u64,
    pub total_active_ms: u64,
    pub session_elapsed_ms: u64,
    pub time_to_next_rest_ms: u64,
    pub rest_elapsed_ms: u64,
    pub goal_remaining_ms: u64,
    pub goal_progress_pct: f64,
    pub rest_remaining_ms: u64,
    pub rest_progress_pct: f64,
}

impl AccountSnapshot {
    pub fn running(&self) -> bool {
        self.status == AccountStatus::Running
    }

    pub fn resting(&self) -> bool {
        self.status == AccountStatus::Resting
    }
}
