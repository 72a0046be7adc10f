use crate::error::TransportError;
use crate::messages::{Message, StatusResponse};
use crate::runtime::RuntimeHandle;
use crate::settings::{Settings, SettingsPatch};
use crate::store::SettingsStore;
use serde_json::Value;
use std::sync::Arc;

/// Request/response channel from the control panel to a click loop.
pub trait Transport {
    fn request(&self, msg: &Message) -> Result<Option<StatusResponse>, TransportError>;
}

/// Talks to an in-process runtime. Without one attached there is no page to
/// talk to, which surfaces as "No active tab".
#[derive(Clone, Default)]
pub struct LocalTransport {
    target: Option<RuntimeHandle>,
}

impl LocalTransport {
    pub fn new(target: RuntimeHandle) -> Self { Self { target: Some(target) } }
    pub fn detached() -> Self { Self { target: None } }
}

impl Transport for LocalTransport {
    fn request(&self, msg: &Message) -> Result<Option<StatusResponse>, TransportError> {
        self.target.as_ref().ok_or(TransportError::NoActiveTab)?.send(msg)
    }
}

/// Display form of a key code: `KeyQ` shows as `Q`, `Digit1` as `1`.
pub fn format_hotkey(code: &str) -> String {
    if let Some(rest) = code.strip_prefix("Key") { return rest.to_uppercase(); }
    if let Some(rest) = code.strip_prefix("Digit") { return rest.to_string(); }
    code.to_string()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind { Running, Stopped, Error }

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusLine { pub kind: StatusKind, pub text: String }

impl StatusLine {
    fn new(kind: StatusKind, text: impl Into<String>) -> Self { Self { kind, text: text.into() } }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HotkeySlot { Start, Stop }

/// Field contents exactly as typed, before normalization.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SettingsForm {
    pub cps: String,
    pub jitter: String,
    pub click_type: String,
    pub mouse_button: String,
    pub start_hotkey: String,
    pub stop_hotkey: String,
}

impl SettingsForm {
    pub fn fill(&mut self, s: &Settings) {
        self.cps = s.cps.to_string();
        self.jitter = s.jitter.to_string();
        self.click_type = s.click_type.as_str().to_string();
        self.mouse_button = s.mouse_button.as_str().to_string();
        self.start_hotkey = s.start_hotkey.clone();
        self.stop_hotkey = s.stop_hotkey.clone();
    }

    pub fn to_settings(&self) -> Settings {
        let raw = SettingsPatch {
            cps: Some(Value::from(self.cps.as_str())),
            jitter: Some(Value::from(self.jitter.as_str())),
            click_type: Some(Value::from(self.click_type.as_str())),
            mouse_button: Some(Value::from(self.mouse_button.as_str())),
            start_hotkey: Some(Value::from(self.start_hotkey.as_str())),
            stop_hotkey: Some(Value::from(self.stop_hotkey.as_str())),
            hotkey: None,
        };
        Settings::normalized(&raw)
    }
}

/// State and commands behind the control window.
pub struct ControlPanel<T: Transport> {
    transport: T,
    store: Arc<dyn SettingsStore>,
    pub form: SettingsForm,
    status: StatusLine,
}

impl<T: Transport> ControlPanel<T> {
    pub fn new(transport: T, store: Arc<dyn SettingsStore>) -> Self {
        let mut panel = Self {
            transport,
            store,
            form: SettingsForm::default(),
            status: StatusLine::new(StatusKind::Stopped, "Stopped"),
        };
        panel.load();
        panel
    }

    pub fn status(&self) -> &StatusLine { &self.status }

    /// Fills the form from storage and asks the loop for its state.
    pub fn load(&mut self) {
        let raw = self.store.load(&Settings::default()).unwrap_or_else(|e| {
            tracing::warn!("could not read settings, showing defaults: {e}");
            SettingsPatch::from(&Settings::default())
        });
        self.form.fill(&Settings::normalized(&raw));
        self.refresh_status();
    }

    fn persist(&mut self) -> Settings {
        let settings = self.form.to_settings();
        self.form.fill(&settings);
        if let Err(e) = self.store.write(&settings) {
            tracing::warn!("could not save settings: {e}");
        }
        settings
    }

    fn send(&mut self, msg: &Message) -> Option<StatusResponse> {
        match self.transport.request(msg) {
            Ok(resp) => resp,
            Err(e) => {
                tracing::debug!("request {:?} failed: {e}", msg.action);
                self.status = StatusLine::new(StatusKind::Error, e.to_string());
                None
            }
        }
    }

    pub fn save(&mut self) {
        let settings = self.persist();
        self.send(&Message::update_settings(SettingsPatch::from(&settings)));
        self.refresh_status();
    }

    pub fn start(&mut self) {
        let settings = self.persist();
        self.send(&Message::start().with_settings(SettingsPatch::from(&settings)));
        self.refresh_status();
    }

    pub fn stop(&mut self) {
        self.send(&Message::stop());
        self.refresh_status();
    }

    pub fn refresh_status(&mut self) {
        self.status = match self.transport.request(&Message::get_status()) {
            Ok(Some(resp)) if resp.running => StatusLine::new(StatusKind::Running, "Running"),
            Ok(Some(_)) => StatusLine::new(StatusKind::Stopped, "Stopped"),
            Ok(None) => StatusLine::new(StatusKind::Error, TransportError::NoAccess.to_string()),
            Err(e) => StatusLine::new(StatusKind::Error, e.to_string()),
        };
    }

    /// Binds a captured key to a hotkey slot and saves. `Tab` is left alone so
    /// focus can still move between fields.
    pub fn capture_hotkey(&mut self, slot: HotkeySlot, code: &str) -> bool {
        if code == "Tab" || code.is_empty() { return false; }
        match slot {
            HotkeySlot::Start => self.form.start_hotkey = code.to_string(),
            HotkeySlot::Stop => self.form.stop_hotkey = code.to_string(),
        }
        self.save();
        true
    }
}
