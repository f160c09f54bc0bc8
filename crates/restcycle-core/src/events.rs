use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::AccountId;

/// Every state transition in the engine produces an Event.
/// The engine only returns them; the dispatcher turns them into port calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    Started {
        account: AccountId,
        at: DateTime<Utc>,
    },
    Stopped {
        account: AccountId,
        total_active_ms: u64,
        at: DateTime<Utc>,
    },
    Reset {
        account: AccountId,
        at: DateTime<Utc>,
    },
    /// Interval elapsed; the account stopped and a rest began.
    RestStarted {
        account: AccountId,
        rest_ms: u64,
        at: DateTime<Utc>,
    },
    /// Rest finished. The account is idle until started again.
    RestEnded {
        account: AccountId,
        at: DateTime<Utc>,
    },
    GoalReached {
        account: AccountId,
        total_active_ms: u64,
        goal_ms: u64,
        at: DateTime<Utc>,
    },
    SettingsChanged {
        account: AccountId,
        goal_ms: u64,
        interval_ms: u64,
        rest_ms: u64,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn account(&self) -> AccountId {
        match self {
            Event::Started { account, .. }
            | Event::Stopped { account, .. }
            | Event::Reset { account, .. }
            | Event::RestStarted { account, .. }
            | Event::RestEnded { account, .. }
            | Event::GoalReached { account, .. }
            | Event::SettingsChanged { account, .. } => *account,
        }
    }

    /// Whether the user should be alerted (banner + sound).
    pub fn is_alert(&self) -> bool {
        matches!(
            self,
            Event::RestStarted { .. } | Event::RestEnded { .. } | Event::GoalReached { .. }
        )
    }
}
