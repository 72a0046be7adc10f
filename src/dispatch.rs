use crate::settings::{MouseButton, Settings};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CursorPos { pub x: f64, pub y: f64 }

impl CursorPos {
    pub fn new(x: f64, y: f64) -> Self { Self { x, y } }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseEventKind { MouseDown, MouseUp, Click, ContextMenu, DblClick }

impl MouseEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MouseEventKind::MouseDown => "mousedown",
            MouseEventKind::MouseUp => "mouseup",
            MouseEventKind::Click => "click",
            MouseEventKind::ContextMenu => "contextmenu",
            MouseEventKind::DblClick => "dblclick",
        }
    }
}

/// One synthetic mouse event, carrying the cursor position along with the
/// button index and pressed-buttons mask.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SyntheticMouseEvent {
    pub kind: MouseEventKind,
    pub pos: CursorPos,
    pub button: u8,
    pub buttons: u8,
}

impl SyntheticMouseEvent {
    pub fn new(kind: MouseEventKind, pos: CursorPos, button: MouseButton) -> Self {
        Self { kind, pos, button: button.index(), buttons: button.mask() }
    }

    pub fn mouse_button(&self) -> MouseButton {
        match self.button { 1 => MouseButton::Middle, 2 => MouseButton::Right, _ => MouseButton::Left }
    }
}

// -------------- Click sequence --------------
fn single_click(button: MouseButton, out: &mut Vec<(MouseEventKind, MouseButton)>) {
    out.push((MouseEventKind::MouseDown, button));
    out.push((MouseEventKind::MouseUp, button));
    if button == MouseButton::Right {
        out.push((MouseEventKind::ContextMenu, button));
    } else {
        out.push((MouseEventKind::Click, button));
    }
}

/// The events one tick emits, in order.
pub fn click_sequence(settings: &Settings) -> Vec<(MouseEventKind, MouseButton)> {
    let mut out = Vec::with_capacity(7);
    single_click(settings.mouse_button, &mut out);
    if settings.double_click() {
        single_click(MouseButton::Left, &mut out);
        out.push((MouseEventKind::DblClick, MouseButton::Left));
    }
    out
}

// -------------- Injector seam --------------

/// Environment side of the click loop: finds what sits under a point and
/// delivers events to it.
pub trait InputInjector {
    type Target;

    /// `None` means nothing is under the point and the tick is skipped.
    fn target_at(&mut self, pos: CursorPos) -> Option<Self::Target>;

    fn dispatch(&mut self, target: &Self::Target, event: &SyntheticMouseEvent);

    /// Current pointer position, for environments that can report it without
    /// a move event.
    fn pointer_position(&mut self) -> Option<CursorPos> { None }
}

/// Dispatches one tick's worth of events. Returns whether a target was found.
pub fn perform_click_at<I: InputInjector + ?Sized>(injector: &mut I, pos: CursorPos, settings: &Settings) -> bool {
    let Some(target) = injector.target_at(pos) else { return false; };
    for (kind, button) in click_sequence(settings) {
        injector.dispatch(&target, &SyntheticMouseEvent::new(kind, pos, button));
    }
    true
}

/// Axis-aligned rectangle in screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Surface { pub min_x: f64, pub min_y: f64, pub max_x: f64, pub max_y: f64 }

impl Surface {
    pub fn contains(&self, p: CursorPos) -> bool {
        p.x >= self.min_x && p.x < self.max_x && p.y >= self.min_y && p.y < self.max_y
    }
}

/// Keeps every event in memory instead of delivering it, or just logs it when
/// built with [`RecordingInjector::logged`]. Clones share the log.
#[derive(Clone, Default)]
pub struct RecordingInjector {
    events: Arc<Mutex<Vec<SyntheticMouseEvent>>>,
    surface: Option<Surface>,
    log: bool,
}

impl RecordingInjector {
    pub fn new() -> Self { Self::default() }

    /// Only points inside `surface` resolve to a target.
    pub fn with_surface(mut self, surface: Surface) -> Self { self.surface = Some(surface); self }

    /// Emit each event through `tracing` instead of keeping it.
    pub fn logged(mut self) -> Self { self.log = true; self }

    pub fn events(&self) -> Vec<SyntheticMouseEvent> { self.events.lock().clone() }

    pub fn kinds(&self) -> Vec<MouseEventKind> { self.events.lock().iter().map(|e| e.kind).collect() }

    pub fn clear(&self) { self.events.lock().clear(); }
}

impl InputInjector for RecordingInjector {
    type Target = ();

    fn target_at(&mut self, pos: CursorPos) -> Option<()> {
        match self.surface {
            Some(s) if !s.contains(pos) => None,
            _ => Some(()),
        }
    }

    fn dispatch(&mut self, _target: &(), event: &SyntheticMouseEvent) {
        if self.log {
            tracing::info!(
                "{} at ({:.0}, {:.0}) button={} buttons={}",
                event.kind.as_str(), event.pos.x, event.pos.y, event.button, event.buttons
            );
            return;
        }
        self.events.lock().push(*event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ClickType;
    use super::MouseEventKind::*;

    fn settings(click_type: ClickType, button: MouseButton) -> Settings {
        Settings { click_type, mouse_button: button, ..Settings::default() }
    }

    #[test]
    fn test_left_single() {
        let seq = click_sequence(&settings(ClickType::Single, MouseButton::Left));
        assert_eq!(seq.iter().map(|e| e.0).collect::<Vec<_>>(), vec![MouseDown, MouseUp, Click]);
    }

    #[test]
    fn test_right_emits_context_menu_only() {
        for click_type in [ClickType::Single, ClickType::Double] {
            let mut rec = RecordingInjector::new();
            assert!(perform_click_at(&mut rec, CursorPos::new(5.0, 5.0), &settings(click_type, MouseButton::Right)));
            assert_eq!(rec.kinds(), vec![MouseDown, MouseUp, ContextMenu]);
            assert!(rec.events().iter().all(|e| e.button == 2 && e.buttons == 2));
        }
    }

    #[test]
    fn test_left_double() {
        let mut rec = RecordingInjector::new();
        perform_click_at(&mut rec, CursorPos::new(1.0, 2.0), &settings(ClickType::Double, MouseButton::Left));
        assert_eq!(rec.kinds(), vec![MouseDown, MouseUp, Click, MouseDown, MouseUp, Click, DblClick]);
        assert!(rec.events().iter().all(|e| e.pos == CursorPos::new(1.0, 2.0)));
    }

    #[test]
    fn test_middle_button_codes() {
        let mut rec = RecordingInjector::new();
        perform_click_at(&mut rec, CursorPos::new(0.0, 0.0), &settings(ClickType::Double, MouseButton::Middle));
        assert_eq!(rec.kinds(), vec![MouseDown, MouseUp, Click]);
        assert!(rec.events().iter().all(|e| e.button == 1 && e.buttons == 4));
        assert_eq!(rec.events()[0].mouse_button(), MouseButton::Middle);
    }

    #[test]
    fn test_no_target_is_a_noop() {
        let surface = Surface { min_x: 0.0, min_y: 0.0, max_x: 100.0, max_y: 100.0 };
        let mut rec = RecordingInjector::new().with_surface(surface);
        assert!(!perform_click_at(&mut rec, CursorPos::new(150.0, 10.0), &Settings::default()));
        assert!(rec.events().is_empty());
    }
}
