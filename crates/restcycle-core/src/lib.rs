//! # restcycle Core Library
//!
//! Tracks active time for a fixed set of independent accounts, each cycling
//! between work and rest, and raises alerts when a rest is due, when it is
//! over, and when an account reaches its goal.
//!
//! ## Architecture
//!
//! - **Clock**: monotonic timestamps; all accounting is done on deltas
//! - **Timer Engine**: per-account state machine that the caller drives with
//!   `tick()`; returns [`Event`]s instead of touching any output
//! - **Dispatcher**: turns events into render/notify/sound port calls
//! - **Scheduler**: fixed-cadence loop that owns the engine and serializes
//!   ticks with user commands
//! - **Storage**: TOML configuration (timer state is never persisted)
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`Scheduler`]: Periodic driver and command loop
//! - [`EventDispatcher`]: Event to port adapter
//! - [`Config`]: Application configuration management

pub mod account;
pub mod clock;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod format;
pub mod ports;
pub mod scheduler;
pub mod simulation;
pub mod storage;
pub mod timer;

pub use account::{parse_amount, Account, AccountId, AccountSettings, AccountSnapshot, AccountStatus};
pub use clock::{Clock, ManualClock, SystemClock};
pub use dispatch::{alert_message, EventDispatcher};
pub use error::{ConfigError, CoreError, PortError, ValidationError};
pub use events::Event;
pub use format::format_hms;
pub use ports::{Notifier, NullPort, Ports, Renderer, SoundPlayer};
pub use scheduler::{Command, Scheduler, SchedulerHandle};
pub use simulation::{Simulation, SimulationReport, SimulationStep};
pub use storage::Config;
pub use timer::TimerEngine;
