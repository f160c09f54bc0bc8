use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use restcycle_core::simulation::SimulatedEvent;
use restcycle_core::{
    format_hms, AccountId, AccountSettings, Event, Simulation, SimulationStep, ValidationError,
};

#[derive(Args)]
pub struct SimulateArgs {
    /// Goal in hours
    #[arg(long, default_value = "1")]
    goal: u32,
    /// Minutes of work between rests
    #[arg(long, default_value = "25")]
    interval: u32,
    /// Rest length in minutes
    #[arg(long, default_value = "5")]
    rest: u32,
    /// Simulated minutes to run after starting
    #[arg(long, default_value = "120")]
    minutes: u64,
    /// Seconds between simulated ticks
    #[arg(long, default_value = "1")]
    step_secs: u64,
    /// Start work again as soon as each rest ends
    #[arg(long)]
    auto_restart: bool,
    /// JSON file with a list of steps to run instead of start + advance
    #[arg(long)]
    script: Option<PathBuf>,
    /// Print the full report as JSON
    #[arg(long)]
    json: bool,
}

const ACCOUNT: AccountId = AccountId(1);

fn describe(event: &Event) -> String {
    match event {
        Event::Started { .. } => "started".into(),
        Event::Stopped { total_active_ms, .. } => {
            format!("stopped (total {})", format_hms(*total_active_ms))
        }
        Event::Reset { .. } => "reset".into(),
        Event::RestStarted { rest_ms, .. } => format!("rest started ({})", format_hms(*rest_ms)),
        Event::RestEnded { .. } => "rest ended".into(),
        Event::GoalReached { total_active_ms, .. } => {
            format!("goal reached (total {})", format_hms(*total_active_ms))
        }
        Event::SettingsChanged { .. } => "settings changed".into(),
    }
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings = AccountSettings {
        goal_hours: args.goal,
        interval_minutes: args.interval,
        rest_minutes: args.rest,
    };
    let steps: Vec<SimulationStep> = match &args.script {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => {
            let ms = args.minutes.checked_mul(60_000).ok_or_else(|| {
                ValidationError::InvalidConfiguration {
                    field: "minutes".to_string(),
                    value: args.minutes.to_string(),
                    reason: "value is too large".to_string(),
                }
            })?;
            vec![
                SimulationStep::Start { account: ACCOUNT },
                SimulationStep::Advance { ms },
            ]
        }
    };

    let report = Simulation::new([(ACCOUNT, settings)])
        .with_step(Duration::from_secs(args.step_secs))
        .with_auto_restart(args.auto_restart)
        .run(steps)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for SimulatedEvent { offset_ms, event } in &report.events {
        println!("[{}] {} {}", format_hms(*offset_ms), event.account(), describe(event));
    }
    for account in &report.accounts {
        println!(
            "{}: {} total {} (goal remaining {})",
            account.id,
            account.status,
            format_hms(account.total_active_ms),
            format_hms(account.goal_remaining_ms)
        );
    }
    Ok(())
}
