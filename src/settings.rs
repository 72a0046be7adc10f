use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MIN_CPS: f64 = 0.2;
pub const MAX_CPS: f64 = 50.0;
pub const MAX_JITTER: u32 = 80;
pub const DEFAULT_CPS: f64 = 1.0;
pub const DEFAULT_START_HOTKEY: &str = "KeyQ";
pub const DEFAULT_STOP_HOTKEY: &str = "KeyW";

// -------------- Enums --------------
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickType {
    #[default]
    Single,
    Double,
}

impl ClickType {
    pub fn from_value(value: &Value) -> Self {
        match value.as_str() {
            Some("double") => ClickType::Double,
            _ => ClickType::Single,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self { ClickType::Single => "single", ClickType::Double => "double" }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Middle,
    Right,
}

impl MouseButton {
    pub fn from_value(value: &Value) -> Self {
        match value.as_str() {
            Some("middle") => MouseButton::Middle,
            Some("right") => MouseButton::Right,
            _ => MouseButton::Left,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Middle => "middle",
            MouseButton::Right => "right",
        }
    }

    /// Value of the `button` field on a mouse event.
    pub fn index(self) -> u8 {
        match self { MouseButton::Left => 0, MouseButton::Middle => 1, MouseButton::Right => 2 }
    }

    /// Value of the `buttons` bitmask on a mouse event. Note middle and right
    /// are swapped relative to [`MouseButton::index`].
    pub fn mask(self) -> u8 {
        match self { MouseButton::Left => 1, MouseButton::Right => 2, MouseButton::Middle => 4 }
    }
}

// -------------- Normalization --------------

/// Coerces a loosely typed value into a number the way form inputs get read:
/// numbers pass through, numeric strings are parsed (blank reads as zero),
/// booleans are 0/1. Anything else is `None`.
fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) if s.trim().is_empty() => 0.0,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Bool(b) => if *b { 1.0 } else { 0.0 },
        _ => return None,
    };
    n.is_finite().then_some(n)
}

pub fn clamp_cps(cps: f64) -> f64 {
    if !cps.is_finite() { return DEFAULT_CPS; }
    cps.clamp(MIN_CPS, MAX_CPS)
}

pub fn normalize_cps(value: &Value) -> f64 {
    coerce_number(value).map(clamp_cps).unwrap_or(DEFAULT_CPS)
}

pub fn normalize_jitter(value: &Value) -> u32 {
    match coerce_number(value) {
        Some(n) => n.round().clamp(0.0, MAX_JITTER as f64) as u32,
        None => 0,
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

// -------------- Settings --------------
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub cps: f64,
    pub jitter: u32,
    pub click_type: ClickType,
    pub mouse_button: MouseButton,
    pub start_hotkey: String,
    pub stop_hotkey: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cps: DEFAULT_CPS,
            jitter: 0,
            click_type: ClickType::Single,
            mouse_button: MouseButton::Left,
            start_hotkey: DEFAULT_START_HOTKEY.to_string(),
            stop_hotkey: DEFAULT_STOP_HOTKEY.to_string(),
        }
    }
}

impl Settings {
    /// Builds a full record from a raw one, substituting defaults for anything
    /// absent or unusable.
    pub fn normalized(raw: &SettingsPatch) -> Self {
        let mut settings = Self::default();
        settings.apply(raw);
        settings
    }

    /// Merges a partial update. Absent fields keep their current value.
    /// Returns whether anything changed.
    pub fn apply(&mut self, patch: &SettingsPatch) -> bool {
        let before = self.clone();

        if let Some(cps) = &patch.cps { self.cps = normalize_cps(cps); }
        if let Some(jitter) = &patch.jitter { self.jitter = normalize_jitter(jitter); }
        if let Some(click_type) = &patch.click_type { self.click_type = ClickType::from_value(click_type); }
        if let Some(button) = &patch.mouse_button { self.mouse_button = MouseButton::from_value(button); }

        // The legacy single `hotkey` only stands in for a missing start hotkey.
        if let Some(code) = non_empty_str(patch.start_hotkey.as_ref()) {
            self.start_hotkey = code.to_string();
        } else if let Some(code) = non_empty_str(patch.hotkey.as_ref()) {
            self.start_hotkey = code.to_string();
        }
        if let Some(code) = non_empty_str(patch.stop_hotkey.as_ref()) {
            self.stop_hotkey = code.to_string();
        }

        *self != before
    }

    /// Whether a double click sequence is emitted. Only the left button
    /// supports it.
    pub fn double_click(&self) -> bool {
        self.click_type == ClickType::Double && self.mouse_button == MouseButton::Left
    }
}

/// A raw, partial settings record as it arrives from storage or a message.
/// Values stay loosely typed until [`Settings::apply`] normalizes them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cps: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click_type: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mouse_button: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_hotkey: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_hotkey: Option<Value>,
    /// Older records stored a single start hotkey under this name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey: Option<Value>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool { *self == Self::default() }

    pub fn with_cps(mut self, cps: f64) -> Self { self.cps = Some(Value::from(cps)); self }
    pub fn with_jitter(mut self, jitter: u32) -> Self { self.jitter = Some(Value::from(jitter)); self }
    pub fn with_click_type(mut self, t: ClickType) -> Self { self.click_type = Some(Value::from(t.as_str())); self }
    pub fn with_mouse_button(mut self, b: MouseButton) -> Self { self.mouse_button = Some(Value::from(b.as_str())); self }
    pub fn with_start_hotkey(mut self, code: &str) -> Self { self.start_hotkey = Some(Value::from(code)); self }
    pub fn with_stop_hotkey(mut self, code: &str) -> Self { self.stop_hotkey = Some(Value::from(code)); self }
}

impl From<&Settings> for SettingsPatch {
    fn from(s: &Settings) -> Self {
        SettingsPatch::default()
            .with_cps(s.cps)
            .with_jitter(s.jitter)
            .with_click_type(s.click_type)
            .with_mouse_button(s.mouse_button)
            .with_start_hotkey(&s.start_hotkey)
            .with_stop_hotkey(&s.stop_hotkey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patch(v: Value) -> SettingsPatch { serde_json::from_value(v).unwrap() }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.cps, 1.0);
        assert_eq!(s.jitter, 0);
        assert_eq!(s.click_type, ClickType::Single);
        assert_eq!(s.mouse_button, MouseButton::Left);
        assert_eq!(s.start_hotkey, "KeyQ");
        assert_eq!(s.stop_hotkey, "KeyW");
    }

    #[test]
    fn test_cps_clamping() {
        assert_eq!(normalize_cps(&json!(100)), 50.0);
        assert_eq!(normalize_cps(&json!(0.01)), 0.2);
        assert_eq!(normalize_cps(&json!(-3)), 0.2);
        assert_eq!(normalize_cps(&json!("12.5")), 12.5);
        assert_eq!(normalize_cps(&json!("")), 0.2);
        assert_eq!(normalize_cps(&json!("fast")), 1.0);
        assert_eq!(normalize_cps(&json!([1, 2])), 1.0);
    }

    #[test]
    fn test_jitter_rounding_and_clamping() {
        assert_eq!(normalize_jitter(&json!(12.6)), 13);
        assert_eq!(normalize_jitter(&json!(200)), 80);
        assert_eq!(normalize_jitter(&json!(-5)), 0);
        assert_eq!(normalize_jitter(&json!("25")), 25);
        assert_eq!(normalize_jitter(&json!({})), 0);
    }

    #[test]
    fn test_invalid_enums_fall_back() {
        let s = Settings::normalized(&patch(json!({"clickType": "triple", "mouseButton": 7})));
        assert_eq!(s.click_type, ClickType::Single);
        assert_eq!(s.mouse_button, MouseButton::Left);
    }

    #[test]
    fn test_merge_keeps_untouched_fields() {
        let mut s = Settings::default();
        s.apply(&patch(json!({"cps": 2, "jitter": 10})));
        s.apply(&patch(json!({"cps": 5})));
        assert_eq!(s.cps, 5.0);
        assert_eq!(s.jitter, 10);
        assert_eq!(s.start_hotkey, "KeyQ");
    }

    #[test]
    fn test_legacy_hotkey() {
        let s = Settings::normalized(&patch(json!({"hotkey": "KeyH"})));
        assert_eq!(s.start_hotkey, "KeyH");

        let s = Settings::normalized(&patch(json!({"hotkey": "KeyH", "startHotkey": "KeyS"})));
        assert_eq!(s.start_hotkey, "KeyS");

        let s = Settings::normalized(&patch(json!({"hotkey": "KeyH", "startHotkey": ""})));
        assert_eq!(s.start_hotkey, "KeyH");
    }

    #[test]
    fn test_empty_hotkeys_are_ignored() {
        let mut s = Settings::default();
        assert!(!s.apply(&patch(json!({"startHotkey": "", "stopHotkey": ""}))));
        assert_eq!(s.stop_hotkey, "KeyW");
    }

    #[test]
    fn test_double_click_is_left_only() {
        let mut s = Settings::default();
        s.click_type = ClickType::Double;
        assert!(s.double_click());
        s.mouse_button = MouseButton::Right;
        assert!(!s.double_click());
    }

    #[test]
    fn test_serialized_field_names() {
        let v = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(v, json!({
            "cps": 1.0, "jitter": 0, "clickType": "single", "mouseButton": "left",
            "startHotkey": "KeyQ", "stopHotkey": "KeyW"
        }));
    }
}
