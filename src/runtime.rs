use crate::context::{ClickerContext, TickOutcome};
use crate::dispatch::{CursorPos, InputInjector};
use crate::error::TransportError;
use crate::listener::{Focus, HotkeyAction, KeyDown};
use crate::messages::{handle_message, Message, StatusResponse};
use crate::scheduler::Clock;
use crate::store::{StorageArea, StorageChange};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

struct Shared {
    ctx: Mutex<ClickerContext>,
    wake: Condvar,
    alive: AtomicBool,
    focus: Mutex<Focus>,
    clock: Arc<dyn Clock>,
}

impl Shared {
    /// Runs `f` against the context and wakes the loop so it sees the result.
    fn with_ctx<T>(&self, f: impl FnOnce(&mut ClickerContext, std::time::Instant) -> T) -> T {
        let mut ctx = self.ctx.lock();
        let out = f(&mut *ctx, self.clock.now());
        self.wake.notify_all();
        out
    }
}

/// Owns the thread that drives a [`ClickerContext`]: it sleeps until the next
/// tick is due, or until a command arrives, whichever comes first.
pub struct ClickRuntime {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl ClickRuntime {
    pub fn spawn<I>(ctx: ClickerContext, mut injector: I, clock: Arc<dyn Clock>) -> Self
    where
        I: InputInjector + Send + 'static,
    {
        let shared = Arc::new(Shared {
            ctx: Mutex::new(ctx),
            wake: Condvar::new(),
            alive: AtomicBool::new(true),
            focus: Mutex::new(Focus::Body),
            clock,
        });
        let loop_shared = Arc::clone(&shared);

        let handle = thread::Builder::new()
            .name("click-loop".into())
            .spawn(move || {
                let shared = loop_shared;
                let mut ctx = shared.ctx.lock();
                while shared.alive.load(Ordering::Relaxed) {
                    let now = shared.clock.now();
                    match ctx.tick(now, &mut injector) {
                        TickOutcome::Idle => shared.wake.wait(&mut ctx),
                        TickOutcome::Pending(left) => { shared.wake.wait_for(&mut ctx, left); }
                        TickOutcome::Clicked | TickOutcome::NoTarget => {}
                    }
                }
                tracing::debug!("click loop exited");
            })
            .ok();
        if handle.is_none() {
            tracing::error!("could not spawn the click loop thread");
            shared.alive.store(false, Ordering::Relaxed);
        }

        Self { shared, handle }
    }

    pub fn handle(&self) -> RuntimeHandle { RuntimeHandle { shared: Arc::clone(&self.shared) } }

    pub fn shutdown(mut self) { self.stop_thread(); }

    fn stop_thread(&mut self) {
        {
            let _ctx = self.shared.ctx.lock();
            self.shared.alive.store(false, Ordering::Relaxed);
            self.shared.wake.notify_all();
        }
        if let Some(handle) = self.handle.take() { handle.join().ok(); }
    }
}

impl Drop for ClickRuntime {
    fn drop(&mut self) { self.stop_thread(); }
}

/// Cheap, cloneable way to talk to a running [`ClickRuntime`].
#[derive(Clone)]
pub struct RuntimeHandle {
    shared: Arc<Shared>,
}

impl RuntimeHandle {
    pub fn is_alive(&self) -> bool { self.shared.alive.load(Ordering::Relaxed) }

    pub fn send(&self, msg: &Message) -> Result<Option<StatusResponse>, TransportError> {
        if !self.is_alive() { return Err(TransportError::NoAccess); }
        Ok(self.shared.with_ctx(|ctx, now| handle_message(ctx, msg, now)))
    }

    pub fn status(&self) -> StatusResponse { self.shared.ctx.lock().status() }

    pub fn clicks(&self) -> u64 { self.shared.ctx.lock().clicks() }

    pub fn pointer_moved(&self, pos: CursorPos) {
        // Moves never change timing, so the loop is left asleep.
        self.shared.ctx.lock().on_pointer_move(pos);
    }

    /// Feeds a key press from a global hook. Focus comes from whatever was last
    /// reported through [`RuntimeHandle::set_focus`].
    pub fn key_down(&self, code: &str, repeat: bool) -> Option<HotkeyAction> {
        let focus = *self.shared.focus.lock();
        let event = KeyDown { code: code.to_string(), repeat, focus };
        self.shared.with_ctx(|ctx, now| ctx.handle_key_down(&event, now))
    }

    pub fn set_focus(&self, focus: Focus) { *self.shared.focus.lock() = focus; }

    /// Storage listener body: applies changes from the `sync` area only.
    pub fn storage_changed(&self, change: &StorageChange) {
        if change.area != StorageArea::Sync { return; }
        let patch = change.to_patch();
        if patch.is_empty() { return; }
        self.shared.with_ctx(|ctx, now| ctx.apply_settings(&patch, now));
    }
}
