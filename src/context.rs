use crate::dispatch::{perform_click_at, CursorPos, InputInjector};
use crate::listener::{HotkeyAction, InputListener, KeyDown};
use crate::messages::StatusResponse;
use crate::scheduler::{Poll, Scheduler};
use crate::settings::{Settings, SettingsPatch};
use rand::{rngs::StdRng, Rng};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    Pending(Duration),
    Clicked,
    NoTarget,
}

/// Everything the click loop needs, in one place: current settings, the timer
/// and the tracked pointer.
pub struct ClickerContext<R = StdRng> {
    settings: Settings,
    scheduler: Scheduler<R>,
    listener: InputListener,
    clicks: u64,
}

impl ClickerContext<StdRng> {
    pub fn new(origin: CursorPos) -> Self { Self::with_scheduler(origin, Scheduler::new()) }
}

impl<R: Rng> ClickerContext<R> {
    pub fn with_scheduler(origin: CursorPos, scheduler: Scheduler<R>) -> Self {
        Self { settings: Settings::default(), scheduler, listener: InputListener::new(origin), clicks: 0 }
    }

    pub fn settings(&self) -> &Settings { &self.settings }

    pub fn scheduler(&self) -> &Scheduler<R> { &self.scheduler }

    pub fn cursor(&self) -> CursorPos { self.listener.cursor() }

    pub fn is_running(&self) -> bool { self.scheduler.is_running() }

    /// Clicks dispatched since creation. Ticks without a target don't count.
    pub fn clicks(&self) -> u64 { self.clicks }

    pub fn status(&self) -> StatusResponse {
        StatusResponse { running: self.is_running(), settings: self.settings.clone() }
    }

    pub fn start(&mut self, now: Instant) -> bool {
        let started = self.scheduler.start(now, &self.settings);
        if started {
            tracing::info!("clicking started: {} cps, {}% jitter, {:?} {:?}",
                self.settings.cps, self.settings.jitter, self.settings.mouse_button, self.settings.click_type);
        }
        started
    }

    pub fn stop(&mut self) -> bool {
        let stopped = self.scheduler.stop();
        if stopped { tracing::info!("clicking stopped after {} clicks", self.clicks); }
        stopped
    }

    /// Merges a partial update and, when running, re-arms the timer so the
    /// next tick uses the new values.
    pub fn apply_settings(&mut self, patch: &SettingsPatch, now: Instant) {
        if self.settings.apply(patch) {
            tracing::debug!("settings now {:?}", self.settings);
        }
        self.scheduler.reschedule(now, &self.settings);
    }

    pub fn on_pointer_move(&mut self, pos: CursorPos) { self.listener.on_pointer_move(pos); }

    pub fn handle_key_down(&mut self, event: &KeyDown, now: Instant) -> Option<HotkeyAction> {
        let action = self.listener.on_key_down(event, &self.settings)?;
        tracing::debug!("hotkey {} -> {:?}", event.code, action);
        match action {
            HotkeyAction::Start => { self.start(now); }
            HotkeyAction::Stop => { self.stop(); }
        }
        Some(action)
    }

    /// Runs one step of the loop: clicks if the timer is due, then re-arms
    /// relative to `now`.
    pub fn tick<I: InputInjector + ?Sized>(&mut self, now: Instant, injector: &mut I) -> TickOutcome {
        match self.scheduler.poll(now) {
            Poll::Idle => TickOutcome::Idle,
            Poll::Pending(left) => TickOutcome::Pending(left),
            Poll::Due => {
                if let Some(pos) = injector.pointer_position() { self.listener.on_pointer_move(pos); }
                let pos = self.listener.cursor();
                let hit = perform_click_at(injector, pos, &self.settings);
                self.scheduler.complete_tick(now, &self.settings);
                if hit {
                    self.clicks += 1;
                    TickOutcome::Clicked
                } else {
                    tracing::trace!("nothing under ({:.0}, {:.0}), skipping tick", pos.x, pos.y);
                    TickOutcome::NoTarget
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{MouseEventKind, RecordingInjector, Surface};
    use crate::listener::Focus;
    use rand::SeedableRng;

    fn ctx() -> ClickerContext<StdRng> {
        ClickerContext::with_scheduler(CursorPos::new(50.0, 50.0), Scheduler::with_rng(StdRng::seed_from_u64(1)))
    }

    #[test]
    fn test_tick_clicks_when_due() {
        let mut c = ctx();
        let mut rec = RecordingInjector::new();
        let t0 = Instant::now();
        assert_eq!(c.tick(t0, &mut rec), TickOutcome::Idle);

        c.start(t0);
        assert_eq!(c.tick(t0, &mut rec), TickOutcome::Pending(Duration::from_secs(1)));
        assert_eq!(c.tick(t0 + Duration::from_secs(1), &mut rec), TickOutcome::Clicked);
        assert_eq!(rec.kinds(), vec![MouseEventKind::MouseDown, MouseEventKind::MouseUp, MouseEventKind::Click]);
        assert_eq!(c.clicks(), 1);
        assert!(c.is_running());
    }

    #[test]
    fn test_missing_target_keeps_running() {
        let mut c = ctx();
        let surface = Surface { min_x: 0.0, min_y: 0.0, max_x: 10.0, max_y: 10.0 };
        let mut rec = RecordingInjector::new().with_surface(surface);
        let t0 = Instant::now();
        c.start(t0);
        assert_eq!(c.tick(t0 + Duration::from_secs(1), &mut rec), TickOutcome::NoTarget);
        assert!(c.is_running());
        assert!(rec.events().is_empty());

        c.on_pointer_move(CursorPos::new(3.0, 4.0));
        assert_eq!(c.tick(t0 + Duration::from_secs(2), &mut rec), TickOutcome::Clicked);
        assert_eq!(rec.events()[0].pos, CursorPos::new(3.0, 4.0));
    }

    #[test]
    fn test_settings_change_reschedules_while_running() {
        let mut c = ctx();
        let t0 = Instant::now();
        c.start(t0);
        let t1 = t0 + Duration::from_millis(300);
        c.apply_settings(&SettingsPatch::default().with_cps(50.0), t1);
        assert!(c.is_running());
        assert_eq!(c.tick(t1, &mut RecordingInjector::new()), TickOutcome::Pending(Duration::from_millis(20)));
    }

    #[test]
    fn test_settings_change_while_stopped_stays_stopped() {
        let mut c = ctx();
        c.apply_settings(&SettingsPatch::default().with_cps(5.0), Instant::now());
        assert!(!c.is_running());
        assert_eq!(c.settings().cps, 5.0);
    }

    #[test]
    fn test_stop_hotkey_in_text_input_is_ignored() {
        let mut c = ctx();
        let t0 = Instant::now();
        c.start(t0);
        let key = KeyDown::new("KeyW").in_focus(Focus::Input);
        assert_eq!(c.handle_key_down(&key, t0), None);
        assert!(c.is_running());

        assert_eq!(c.handle_key_down(&KeyDown::new("KeyW"), t0), Some(HotkeyAction::Stop));
        assert!(!c.is_running());
    }
}
