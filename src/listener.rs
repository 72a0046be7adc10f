use crate::dispatch::CursorPos;
use crate::settings::Settings;

pub const ESCAPE: &str = "Escape";

/// What had keyboard focus when a key went down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Body,
    Input,
    TextArea,
    Select,
    ContentEditable,
    Other,
}

impl Focus {
    pub fn is_editable(self) -> bool {
        matches!(self, Focus::Input | Focus::TextArea | Focus::Select | Focus::ContentEditable)
    }
}

/// A key-down event. `code` is the physical key name (`KeyQ`, `Digit1`, `F5`),
/// which does not depend on keyboard layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyDown {
    pub code: String,
    pub repeat: bool,
    pub focus: Focus,
}

impl KeyDown {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into(), repeat: false, focus: Focus::Body }
    }

    pub fn repeated(mut self) -> Self { self.repeat = true; self }

    pub fn in_focus(mut self, focus: Focus) -> Self { self.focus = focus; self }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HotkeyAction { Start, Stop }

/// Tracks the pointer and turns key presses into start/stop actions.
#[derive(Clone, Debug)]
pub struct InputListener {
    cursor: CursorPos,
}

impl InputListener {
    /// `origin` is where clicks land until the pointer first moves.
    pub fn new(origin: CursorPos) -> Self { Self { cursor: origin } }

    pub fn cursor(&self) -> CursorPos { self.cursor }

    pub fn on_pointer_move(&mut self, pos: CursorPos) { self.cursor = pos; }

    pub fn on_key_down(&self, event: &KeyDown, settings: &Settings) -> Option<HotkeyAction> {
        if event.repeat || event.focus.is_editable() { return None; }

        if event.code == ESCAPE { return Some(HotkeyAction::Stop); }
        if event.code == settings.start_hotkey { return Some(HotkeyAction::Start); }
        if event.code == settings.stop_hotkey { return Some(HotkeyAction::Stop); }
        None
    }
}
