use cursor_clicker::context::{ClickerContext, TickOutcome};
use cursor_clicker::dispatch::{CursorPos, MouseEventKind, RecordingInjector};
use cursor_clicker::listener::{Focus, KeyDown};
use cursor_clicker::messages::{handle_message, Message};
use cursor_clicker::scheduler::{base_delay_ms, Clock, ManualClock, Scheduler};
use cursor_clicker::settings::SettingsPatch;
use rand::{rngs::StdRng, SeedableRng};
use std::time::Duration;

fn ctx() -> ClickerContext<StdRng> {
    ClickerContext::with_scheduler(CursorPos::new(400.0, 300.0), Scheduler::with_rng(StdRng::seed_from_u64(99)))
}

#[test]
fn test_cps_scenario() {
    let mut c = ctx();
    assert_eq!(base_delay_ms(c.settings().cps), 1000);

    c.apply_settings(&SettingsPatch::default().with_cps(50.0), std::time::Instant::now());
    assert_eq!(base_delay_ms(c.settings().cps), 20);

    c.apply_settings(&SettingsPatch::default().with_cps(100.0), std::time::Instant::now());
    assert_eq!(c.settings().cps, 50.0);
    assert_eq!(base_delay_ms(c.settings().cps), 20);
}

#[test]
fn test_manual_clock_drives_ticks() {
    let clock = ManualClock::new();
    let mut c = ctx();
    let mut rec = RecordingInjector::new();

    handle_message(&mut c, &Message::update_settings(SettingsPatch::default().with_cps(10.0)), clock.now());
    handle_message(&mut c, &Message::start(), clock.now());

    let mut clicked = 0;
    for _ in 0..50 {
        clock.advance(Duration::from_millis(20));
        if c.tick(clock.now(), &mut rec) == TickOutcome::Clicked { clicked += 1; }
    }
    // 1s of simulated time at 100ms per click.
    assert_eq!(clicked, 10);
    assert_eq!(rec.kinds().iter().filter(|k| **k == MouseEventKind::Click).count(), 10);
}

#[test]
fn test_cps_change_mid_run_applies_to_next_tick() {
    let clock = ManualClock::new();
    let mut c = ctx();
    let mut rec = RecordingInjector::new();
    c.start(clock.now());

    clock.advance(Duration::from_millis(500));
    handle_message(&mut c, &Message::from_json(r#"{"settings":{"cps":"50"}}"#).unwrap(), clock.now());
    assert!(c.is_running());
    assert_eq!(c.tick(clock.now(), &mut rec), TickOutcome::Pending(Duration::from_millis(20)));

    clock.advance(Duration::from_millis(20));
    assert_eq!(c.tick(clock.now(), &mut rec), TickOutcome::Clicked);
}

#[test]
fn test_hotkeys_toggle_the_loop() {
    let clock = ManualClock::new();
    let mut c = ctx();
    let mut rec = RecordingInjector::new();

    c.handle_key_down(&KeyDown::new("KeyQ"), clock.now());
    c.handle_key_down(&KeyDown::new("KeyQ").repeated(), clock.now());
    assert_eq!(c.scheduler().armed_count(), 1);

    clock.advance(Duration::from_secs(1));
    assert_eq!(c.tick(clock.now(), &mut rec), TickOutcome::Clicked);

    c.handle_key_down(&KeyDown::new("KeyW").in_focus(Focus::Input), clock.now());
    assert!(c.is_running());
    c.handle_key_down(&KeyDown::new("KeyW"), clock.now());
    assert!(!c.is_running());

    clock.advance(Duration::from_secs(5));
    assert_eq!(c.tick(clock.now(), &mut rec), TickOutcome::Idle);
    assert_eq!(c.clicks(), 1);
}

#[test]
fn test_right_button_never_clicks() {
    let clock = ManualClock::new();
    let mut c = ctx();
    let mut rec = RecordingInjector::new();
    let patch: SettingsPatch = serde_json::from_str(r#"{"mouseButton":"right","clickType":"double"}"#).unwrap();
    c.apply_settings(&patch, clock.now());
    c.start(clock.now());

    for _ in 0..3 {
        clock.advance(Duration::from_secs(1));
        c.tick(clock.now(), &mut rec);
    }
    let kinds = rec.kinds();
    assert_eq!(kinds.len(), 9);
    assert!(!kinds.contains(&MouseEventKind::Click));
    assert!(!kinds.contains(&MouseEventKind::DblClick));
    assert_eq!(kinds.iter().filter(|k| **k == MouseEventKind::ContextMenu).count(), 3);
}
