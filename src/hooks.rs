//! Global keyboard and pointer hooks, feeding a [`RuntimeHandle`].

use crate::dispatch::CursorPos;
use crate::runtime::RuntimeHandle;
use rdev::{EventType, Key};
use std::thread;

/// Physical key name for an rdev key, in `KeyboardEvent.code` form.
pub fn key_code(key: Key) -> Option<&'static str> {
    let code = match key {
        Key::KeyA => "KeyA", Key::KeyB => "KeyB", Key::KeyC => "KeyC", Key::KeyD => "KeyD",
        Key::KeyE => "KeyE", Key::KeyF => "KeyF", Key::KeyG => "KeyG", Key::KeyH => "KeyH",
        Key::KeyI => "KeyI", Key::KeyJ => "KeyJ", Key::KeyK => "KeyK", Key::KeyL => "KeyL",
        Key::KeyM => "KeyM", Key::KeyN => "KeyN", Key::KeyO => "KeyO", Key::KeyP => "KeyP",
        Key::KeyQ => "KeyQ", Key::KeyR => "KeyR", Key::KeyS => "KeyS", Key::KeyT => "KeyT",
        Key::KeyU => "KeyU", Key::KeyV => "KeyV", Key::KeyW => "KeyW", Key::KeyX => "KeyX",
        Key::KeyY => "KeyY", Key::KeyZ => "KeyZ",
        Key::Num0 => "Digit0", Key::Num1 => "Digit1", Key::Num2 => "Digit2", Key::Num3 => "Digit3",
        Key::Num4 => "Digit4", Key::Num5 => "Digit5", Key::Num6 => "Digit6", Key::Num7 => "Digit7",
        Key::Num8 => "Digit8", Key::Num9 => "Digit9",
        Key::F1 => "F1", Key::F2 => "F2", Key::F3 => "F3", Key::F4 => "F4",
        Key::F5 => "F5", Key::F6 => "F6", Key::F7 => "F7", Key::F8 => "F8",
        Key::F9 => "F9", Key::F10 => "F10", Key::F11 => "F11", Key::F12 => "F12",
        Key::Escape => "Escape",
        Key::Space => "Space",
        Key::Tab => "Tab",
        Key::Return => "Enter",
        Key::Backspace => "Backspace",
        Key::Delete => "Delete",
        Key::Insert => "Insert",
        Key::Home => "Home",
        Key::End => "End",
        Key::PageUp => "PageUp",
        Key::PageDown => "PageDown",
        Key::UpArrow => "ArrowUp",
        Key::DownArrow => "ArrowDown",
        Key::LeftArrow => "ArrowLeft",
        Key::RightArrow => "ArrowRight",
        Key::Minus => "Minus",
        Key::Equal => "Equal",
        Key::BackQuote => "Backquote",
        Key::LeftBracket => "BracketLeft",
        Key::RightBracket => "BracketRight",
        Key::SemiColon => "Semicolon",
        Key::Quote => "Quote",
        Key::BackSlash => "Backslash",
        Key::Comma => "Comma",
        Key::Dot => "Period",
        Key::Slash => "Slash",
        Key::CapsLock => "CapsLock",
        Key::ShiftLeft => "ShiftLeft",
        Key::ShiftRight => "ShiftRight",
        Key::ControlLeft => "ControlLeft",
        Key::ControlRight => "ControlRight",
        Key::Alt => "AltLeft",
        Key::AltGr => "AltRight",
        Key::Pause => "Pause",
        Key::ScrollLock => "ScrollLock",
        Key::PrintScreen => "PrintScreen",
        Key::Kp0 => "Numpad0", Key::Kp1 => "Numpad1", Key::Kp2 => "Numpad2", Key::Kp3 => "Numpad3",
        Key::Kp4 => "Numpad4", Key::Kp5 => "Numpad5", Key::Kp6 => "Numpad6", Key::Kp7 => "Numpad7",
        Key::Kp8 => "Numpad8", Key::Kp9 => "Numpad9",
        _ => return None,
    };
    Some(code)
}

/// Tracks held keys so auto-repeat presses can be told apart from new ones.
#[derive(Default)]
pub struct HeldKeys(Vec<Key>);

impl HeldKeys {
    /// Returns whether this press is a repeat.
    pub fn press(&mut self, key: Key) -> bool {
        if self.0.contains(&key) { return true; }
        self.0.push(key);
        false
    }

    pub fn release(&mut self, key: Key) { self.0.retain(|k| *k != key); }
}

/// Starts the global listener on its own thread. rdev blocks that thread for
/// the life of the process.
pub fn spawn(handle: RuntimeHandle) {
    thread::Builder::new()
        .name("input-hooks".into())
        .spawn(move || {
            let mut held = HeldKeys::default();
            let result = rdev::listen(move |event| match event.event_type {
                EventType::MouseMove { x, y } => handle.pointer_moved(CursorPos::new(x, y)),
                EventType::KeyPress(key) => {
                    let repeat = held.press(key);
                    if let Some(code) = key_code(key) { handle.key_down(code, repeat); }
                }
                EventType::KeyRelease(key) => held.release(key),
                _ => {}
            });
            if let Err(e) = result {
                tracing::error!("global input hooks unavailable: {:?}", e);
            }
        })
        .map(|_| ())
        .unwrap_or_else(|e| tracing::error!("could not spawn hook thread: {e}"));
}
