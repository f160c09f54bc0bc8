//! Interactive session: the scheduler ticks in the background while user
//! commands are read line by line from stdin.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use restcycle_core::scheduler::{self, Command};
use restcycle_core::{parse_amount, AccountId, Config, EventDispatcher, Ports, Scheduler, TimerEngine};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::terminal::{status_header, status_line, BannerNotifier, BellPlayer, TerminalRenderer};

const HELP: &str = "\
commands:
  start <id>             start tracking an account
  stop <id>              stop tracking
  reset <id>             stop and clear all counters
  goal <id> <hours>      set the goal
  interval <id> <min>    set the time between rests
  rest <id> <min>        set the rest length
  status                 show all accounts
  json                   show all accounts as JSON
  volume <0-100>         set alert volume (0 mutes)
  test-sound             play the alert sound
  help                   show this help
  quit                   end the session";

#[derive(Args)]
pub struct RunArgs {
    /// Number of accounts (overrides config)
    #[arg(long)]
    accounts: Option<u32>,
    /// Scheduler tick interval in milliseconds (overrides config)
    #[arg(long)]
    tick_ms: Option<u64>,
    /// Print a status line on every render
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug)]
enum Input {
    Engine(Command),
    Status,
    Json,
    Volume(u32),
    Help,
    Quit,
}

fn parse_line(line: &str) -> Result<Option<Input>, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&verb, args)) = words.split_first() else {
        return Ok(None);
    };

    let id = |i: usize| -> Result<AccountId, String> {
        let raw = args.get(i).ok_or_else(|| format!("{verb}: missing account id"))?;
        raw.parse::<AccountId>().map_err(|e| e.to_string())
    };
    let amount = |i: usize, field: &str| -> Result<u32, String> {
        let raw = args.get(i).ok_or_else(|| format!("{verb}: missing {field}"))?;
        parse_amount(field, raw).map_err(|e| e.to_string())
    };

    let input = match verb.to_ascii_lowercase().as_str() {
        "start" => Input::Engine(Command::Start(id(0)?)),
        "stop" => Input::Engine(Command::Stop(id(0)?)),
        "reset" => Input::Engine(Command::Reset(id(0)?)),
        "goal" => Input::Engine(Command::UpdateGoal(id(0)?, amount(1, "goal hours")?)),
        "interval" => Input::Engine(Command::UpdateInterval(id(0)?, amount(1, "interval minutes")?)),
        "rest" => Input::Engine(Command::UpdateRest(id(0)?, amount(1, "rest minutes")?)),
        "test-sound" => Input::Engine(Command::TestSound),
        "status" => Input::Status,
        "json" => Input::Json,
        "volume" => {
            let volume = amount(0, "volume")?;
            if volume > 100 {
                return Err("volume must be between 0 and 100".into());
            }
            Input::Volume(volume)
        }
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Some(input))
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    if let Some(count) = args.accounts {
        config.accounts.count = count;
    }
    if let Some(tick_ms) = args.tick_ms {
        config.scheduler.tick_ms = tick_ms;
    }
    config.validate()?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(session(config, args.verbose))
}

async fn session(config: Config, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let volume = Arc::new(AtomicU32::new(config.notifications.volume));
    let ports = Ports::new(
        TerminalRenderer::new(verbose),
        BannerNotifier,
        BellPlayer::new(volume.clone()),
    );
    let dispatcher = EventDispatcher::new(ports)
        .with_alerts(config.notifications.enabled)
        .with_vibration(config.notifications.vibration);
    let engine = TimerEngine::new(config.account_settings());
    let timer_loop = Scheduler::new(engine, dispatcher)
        .with_tick_interval(Duration::from_millis(config.scheduler.tick_ms));

    let (handle, rx) = scheduler::channel(64);
    let task = tokio::spawn(timer_loop.run(rx));

    if config.notifications.startup_sound_check {
        handle.send(Command::TestSound).await?;
    }
    println!(
        "tracking {} accounts; type 'help' for commands",
        config.accounts.count
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(None) => {}
            Ok(Some(Input::Engine(command))) => handle.send(command).await?,
            Ok(Some(Input::Status)) => {
                println!("{}", status_header());
                for snapshot in handle.snapshots().await? {
                    println!("{}", status_line(&snapshot));
                }
            }
            Ok(Some(Input::Json)) => {
                let snapshots = handle.snapshots().await?;
                println!("{}", serde_json::to_string_pretty(&snapshots)?);
            }
            Ok(Some(Input::Volume(level))) => {
                volume.store(level, Ordering::Relaxed);
                info!(level, "volume changed");
                println!("volume {level}%");
            }
            Ok(Some(Input::Help)) => println!("{HELP}"),
            Ok(Some(Input::Quit)) => break,
            Err(message) => eprintln!("error: {message}"),
        }
    }

    drop(handle);
    task.await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(line: &str) -> Input {
        parse_line(line).unwrap().unwrap()
    }

    #[test]
    fn parses_engine_commands() {
        assert!(matches!(parsed("start 1"), Input::Engine(Command::Start(AccountId(1)))));
        assert!(matches!(parsed("STOP account2"), Input::Engine(Command::Stop(AccountId(2)))));
        assert!(matches!(
            parsed("goal 3 6"),
            Input::Engine(Command::UpdateGoal(AccountId(3), 6))
        ));
        assert!(matches!(
            parsed("  interval 1  50 "),
            Input::Engine(Command::UpdateInterval(AccountId(1), 50))
        ));
    }

    #[test]
    fn blank_lines_are_ignored() {
        assert!(parse_line("   ").unwrap().is_none());
    }

    #[test]
    fn rejects_bad_amounts() {
        assert!(parse_line("goal 1 -2").is_err());
        assert!(parse_line("rest 1 soon").is_err());
        assert!(parse_line("interval 1").is_err());
        assert!(parse_line("volume 101").is_err());
    }

    #[test]
    fn rejects_unknown_commands() {
        let err = parse_line("pause 1").unwrap_err();
        assert!(err.contains("unknown command"));
    }
}
