//! Integration tests for the work/rest cycle.
//!
//! Drives the engine through whole cycles with a manual clock and checks
//! the transitions and counters a user would observe.

use std::time::Duration;

use restcycle_core::{AccountId, AccountSettings, AccountStatus, Clock, Event, ManualClock, TimerEngine};

const ID: AccountId = AccountId(1);

fn engine(goal_hours: u32, interval_minutes: u32, rest_minutes: u32) -> (TimerEngine<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let settings = AccountSettings {
        goal_hours,
        interval_minutes,
        rest_minutes,
    };
    (TimerEngine::with_clock(clock.clone(), [(ID, settings)]), clock)
}

/// Tick once per second for `secs` seconds, collecting events.
fn run_for(engine: &mut TimerEngine<ManualClock>, clock: &ManualClock, secs: u64) -> Vec<(u64, Event)> {
    let mut events = Vec::new();
    for _ in 0..secs {
        clock.advance(Duration::from_secs(1));
        let at = clock.elapsed().as_secs();
        events.extend(engine.tick(ID, clock.now()).unwrap().into_iter().map(|e| (at, e)));
    }
    events
}

#[test]
fn test_pomodoro_scenario_has_no_auto_resume() {
    let (mut engine, clock) = engine(1, 25, 5);
    engine.start(ID).unwrap();

    let events = run_for(&mut engine, &clock, 25 * 60);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, 25 * 60);
    assert!(matches!(events[0].1, Event::RestStarted { .. }));
    let account = engine.account(ID).unwrap();
    assert!(account.resting());
    assert!(!account.running());

    let events = run_for(&mut engine, &clock, 5 * 60);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, 30 * 60);
    assert!(matches!(events[0].1, Event::RestEnded { .. }));
    let account = engine.account(ID).unwrap();
    assert_eq!(account.status(), AccountStatus::Idle);
    assert_eq!(account.time_to_next_rest_ms(), 25 * 60_000);

    // Nothing happens until the user starts again.
    assert!(run_for(&mut engine, &clock, 10 * 60).is_empty());
    assert_eq!(engine.account(ID).unwrap().total_active_ms(), 25 * 60_000);

    engine.start(ID).unwrap();
    run_for(&mut engine, &clock, 60);
    assert_eq!(engine.account(ID).unwrap().total_active_ms(), 26 * 60_000);
}

#[test]
fn test_rest_triggers_once_per_interval() {
    let (mut engine, clock) = engine(8, 5, 1);
    let mut rests = 0;
    for _ in 0..4 {
        engine.start(ID).unwrap();
        let events = run_for(&mut engine, &clock, 6 * 60);
        rests += events
            .iter()
            .filter(|(_, e)| matches!(e, Event::RestStarted { .. }))
            .count();
        let ended: Vec<_> = events
            .iter()
            .filter(|(_, e)| matches!(e, Event::RestEnded { .. }))
            .collect();
        assert_eq!(ended.len(), 1);
    }
    assert_eq!(rests, 4);
    assert_eq!(engine.account(ID).unwrap().total_active_ms(), 4 * 5 * 60_000);
}

#[test]
fn test_total_constant_while_resting() {
    let (mut engine, clock) = engine(8, 1, 2);
    engine.start(ID).unwrap();
    run_for(&mut engine, &clock, 60);
    assert!(engine.account(ID).unwrap().resting());

    for _ in 0..119 {
        clock.advance(Duration::from_secs(1));
        engine.tick(ID, clock.now()).unwrap();
        assert_eq!(engine.account(ID).unwrap().total_active_ms(), 60_000);
    }
}

#[test]
fn test_goal_notifies_once_until_reset() {
    let (mut engine, clock) = engine(1, 600, 5);
    engine.start(ID).unwrap();
    let goals = |events: &[(u64, Event)]| {
        events
            .iter()
            .filter(|(_, e)| matches!(e, Event::GoalReached { .. }))
            .count()
    };

    let events = run_for(&mut engine, &clock, 3600 + 30);
    assert_eq!(goals(&events), 1);
    assert!(!engine.account(ID).unwrap().running());

    engine.start(ID).unwrap();
    let events = run_for(&mut engine, &clock, 600);
    assert_eq!(goals(&events), 0);
    assert!(engine.account(ID).unwrap().running());

    engine.reset(ID).unwrap();
    engine.start(ID).unwrap();
    let events = run_for(&mut engine, &clock, 3600);
    assert_eq!(goals(&events), 1);
}

#[test]
fn test_reset_round_trip() {
    let (mut engine, clock) = engine(1, 5, 1);
    let fresh = engine.snapshot(ID).unwrap();

    engine.start(ID).unwrap();
    run_for(&mut engine, &clock, 90);
    engine.stop(ID).unwrap();
    engine.start(ID).unwrap();
    run_for(&mut engine, &clock, 4 * 60);
    assert!(engine.account(ID).unwrap().resting());

    engine.reset(ID).unwrap();
    let account = engine.account(ID).unwrap();
    assert_eq!(account.total_active_ms(), 0);
    assert_eq!(account.session_elapsed_ms(), 0);
    assert_eq!(account.time_to_next_rest_ms(), account.interval_ms());
    assert!(!account.resting());
    assert!(!account.running());
    assert_eq!(engine.snapshot(ID).unwrap(), fresh);
}

#[test]
fn test_late_ticks_lose_no_time() {
    let (mut engine, clock) = engine(8, 120, 5);
    engine.start(ID).unwrap();

    // Throttled: one tick after 47 seconds, then one after 13.
    clock.advance(Duration::from_secs(47));
    engine.tick(ID, clock.now()).unwrap();
    clock.advance(Duration::from_secs(13));
    engine.tick(ID, clock.now()).unwrap();

    let account = engine.account(ID).unwrap();
    assert_eq!(account.total_active_ms(), 60_000);
    assert_eq!(account.session_elapsed_ms(), 60_000);
    assert_eq!(account.time_to_next_rest_ms(), 119 * 60_000);
}

#[test]
fn test_accounts_are_independent() {
    let clock = ManualClock::new();
    let mut engine = TimerEngine::with_clock(
        clock.clone(),
        [
            (AccountId(1), AccountSettings::default()),
            (AccountId(2), AccountSettings::default()),
        ],
    );
    engine.start(AccountId(1)).unwrap();
    clock.advance(Duration::from_secs(30));
    engine.start(AccountId(2)).unwrap();
    clock.advance(Duration::from_secs(30));
    let now = clock.now();
    for id in engine.account_ids() {
        engine.tick(id, now).unwrap();
    }

    assert_eq!(engine.account(AccountId(1)).unwrap().total_active_ms(), 60_000);
    assert_eq!(engine.account(AccountId(2)).unwrap().total_active_ms(), 30_000);
}
