use crate::control::{format_hotkey, ControlPanel, HotkeySlot, LocalTransport, StatusKind};
use crate::listener::Focus;
use crate::runtime::RuntimeHandle;
use eframe::egui::{self, Color32};
use std::time::{Duration, Instant};

const STATUS_POLL: Duration = Duration::from_millis(500);

/// Physical key name for an egui key, in the same form the hotkeys are stored.
pub fn egui_key_code(key: egui::Key) -> Option<String> {
    let code = match key {
        egui::Key::ArrowUp => "ArrowUp".to_string(),
        egui::Key::ArrowDown => "ArrowDown".to_string(),
        egui::Key::ArrowLeft => "ArrowLeft".to_string(),
        egui::Key::ArrowRight => "ArrowRight".to_string(),
        _ => {
            let name = key.name();
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphabetic() => format!("Key{}", c.to_ascii_uppercase()),
                (Some(c), None) if c.is_ascii_digit() => format!("Digit{c}"),
                (Some(_), Some(_)) => name.to_string(),
                _ => return None,
            }
        }
    };
    Some(code)
}

// -------------- UI State --------------
pub struct ControlApp {
    panel: ControlPanel<LocalTransport>,
    runtime: Option<RuntimeHandle>,
    capturing: Option<HotkeySlot>,
    last_poll: Instant,
    was_focused: bool,
}

impl ControlApp {
    pub fn new(panel: ControlPanel<LocalTransport>, runtime: Option<RuntimeHandle>) -> Self {
        Self { panel, runtime, capturing: None, last_poll: Instant::now(), was_focused: true }
    }

    fn poll_status(&mut self, ctx: &egui::Context) {
        let focused = ctx.input(|i| i.viewport().focused.unwrap_or(true));
        if (focused && !self.was_focused) || self.last_poll.elapsed() >= STATUS_POLL {
            self.panel.refresh_status();
            self.last_poll = Instant::now();
        }
        self.was_focused = focused;
    }

    fn capture_keys(&mut self, ctx: &egui::Context) {
        let Some(slot) = self.capturing else { return; };
        let pressed = ctx.input(|i| {
            i.events.iter().find_map(|e| match e {
                egui::Event::Key { key, pressed: true, .. } => Some(*key),
                _ => None,
            })
        });
        let Some(key) = pressed else { return; };
        if key == egui::Key::Tab { self.capturing = None; return; }
        if let Some(code) = egui_key_code(key) {
            self.panel.capture_hotkey(slot, &code);
            self.capturing = None;
        }
    }

    fn hotkey_row(&mut self, ui: &mut egui::Ui, label: &str, slot: HotkeySlot) {
        ui.horizontal(|ui| {
            ui.label(label);
            let code = match slot {
                HotkeySlot::Start => &self.panel.form.start_hotkey,
                HotkeySlot::Stop => &self.panel.form.stop_hotkey,
            };
            let text = if self.capturing == Some(slot) { "press a key…".to_string() } else { format_hotkey(code) };
            if ui.button(text).clicked() { self.capturing = Some(slot); }
        });
    }
}

impl eframe::App for ControlApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(rt) = &self.runtime {
            let editing = ctx.wants_keyboard_input() || self.capturing.is_some();
            rt.set_focus(if editing { Focus::Input } else { Focus::Body });
        }
        self.capture_keys(ctx);
        self.poll_status(ctx);

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.heading("Cursor Clicker");
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.group(|ui| {
                ui.label("Settings");
                let mut changed = false;

                ui.horizontal(|ui| {
                    ui.label("Clicks per second:");
                    changed |= ui.text_edit_singleline(&mut self.panel.form.cps).lost_focus();
                });
                ui.horizontal(|ui| {
                    ui.label("Jitter (%):");
                    changed |= ui.text_edit_singleline(&mut self.panel.form.jitter).lost_focus();
                });

                egui::ComboBox::from_label("Click type")
                    .selected_text(self.panel.form.click_type.clone())
                    .show_ui(ui, |ui| {
                        for v in ["single", "double"] {
                            changed |= ui.selectable_value(&mut self.panel.form.click_type, v.to_string(), v).changed();
                        }
                    });
                egui::ComboBox::from_label("Mouse button")
                    .selected_text(self.panel.form.mouse_button.clone())
                    .show_ui(ui, |ui| {
                        for v in ["left", "middle", "right"] {
                            changed |= ui.selectable_value(&mut self.panel.form.mouse_button, v.to_string(), v).changed();
                        }
                    });

                if changed { self.panel.save(); }

                ui.separator();
                self.hotkey_row(ui, "Start hotkey:", HotkeySlot::Start);
                self.hotkey_row(ui, "Stop hotkey:", HotkeySlot::Stop);
                ui.small("Esc always stops.");

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() { self.panel.save(); }
                    if ui.button("Start").clicked() { self.panel.start(); }
                    if ui.button("Stop").clicked() { self.panel.stop(); }
                });

                let status = self.panel.status();
                let color = match status.kind {
                    StatusKind::Running => Color32::LIGHT_GREEN,
                    StatusKind::Stopped => Color32::GRAY,
                    StatusKind::Error => Color32::LIGHT_RED,
                };
                ui.colored_label(color, format!("Status: {}", status.text));
            });
        });

        ctx.request_repaint_after(STATUS_POLL);
    }
}
