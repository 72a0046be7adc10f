use crate::context::ClickerContext;
use crate::settings::{Settings, SettingsPatch};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Start,
    Stop,
    UpdateSettings,
    GetStatus,
    /// Any action name this side does not know. Ignored.
    #[serde(other)]
    Unknown,
}

/// A request from the control surface. `settings`, when present, is merged
/// before the action runs, so `{settings}` alone is an implicit update.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<SettingsPatch>,
}

impl Message {
    pub fn action(action: Action) -> Self { Self { action: Some(action), settings: None } }
    pub fn start() -> Self { Self::action(Action::Start) }
    pub fn stop() -> Self { Self::action(Action::Stop) }
    pub fn get_status() -> Self { Self::action(Action::GetStatus) }

    pub fn update_settings(settings: SettingsPatch) -> Self {
        Self { action: Some(Action::UpdateSettings), settings: Some(settings) }
    }

    pub fn with_settings(mut self, settings: SettingsPatch) -> Self { self.settings = Some(settings); self }

    pub fn from_json(json: &str) -> serde_json::Result<Self> { serde_json::from_str(json) }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub running: bool,
    pub settings: Settings,
}

/// Applies a message to the context. Only `getStatus` produces a response.
pub fn handle_message<R: Rng>(ctx: &mut ClickerContext<R>, msg: &Message, now: Instant) -> Option<StatusResponse> {
    if let Some(patch) = &msg.settings {
        ctx.apply_settings(patch, now);
    }

    match msg.action? {
        Action::Start => { ctx.start(now); None }
        Action::Stop => { ctx.stop(); None }
        Action::UpdateSettings | Action::Unknown => None,
        Action::GetStatus => Some(ctx.status()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::CursorPos;
    use serde_json::json;

    fn ctx() -> ClickerContext { ClickerContext::new(CursorPos::new(0.0, 0.0)) }

    #[test]
    fn test_parse_wire_shapes() {
        assert_eq!(Message::from_json(r#"{"action":"start"}"#).unwrap(), Message::start());
        assert_eq!(Message::from_json(r#"{"action":"getStatus"}"#).unwrap(), Message::get_status());
        assert_eq!(Message::from_json(r#"{"action":"selfDestruct"}"#).unwrap().action, Some(Action::Unknown));

        let implicit = Message::from_json(r#"{"settings":{"cps":5}}"#).unwrap();
        assert_eq!(implicit.action, None);
        assert_eq!(implicit.settings.unwrap().cps, Some(json!(5)));
    }

    #[test]
    fn test_start_stop_status() {
        let mut c = ctx();
        let now = Instant::now();
        assert_eq!(handle_message(&mut c, &Message::start(), now), None);
        let status = handle_message(&mut c, &Message::get_status(), now).unwrap();
        assert!(status.running);
        handle_message(&mut c, &Message::stop(), now);
        handle_message(&mut c, &Message::stop(), now);
        assert!(!handle_message(&mut c, &Message::get_status(), now).unwrap().running);
    }

    #[test]
    fn test_settings_apply_before_action() {
        let mut c = ctx();
        let now = Instant::now();
        let msg = Message::start().with_settings(SettingsPatch::default().with_cps(100.0));
        handle_message(&mut c, &msg, now);
        assert!(c.is_running());
        assert_eq!(c.settings().cps, 50.0);
    }

    #[test]
    fn test_implicit_update_and_status_json() {
        let mut c = ctx();
        let now = Instant::now();
        let msg = Message::from_json(r#"{"settings":{"jitter":"15","mouseButton":"right"}}"#).unwrap();
        assert_eq!(handle_message(&mut c, &msg, now), None);

        let status = handle_message(&mut c, &Message::get_status(), now).unwrap();
        assert_eq!(serde_json::to_value(&status).unwrap(), json!({
            "running": false,
            "settings": {
                "cps": 1.0, "jitter": 15, "clickType": "single", "mouseButton": "right",
                "startHotkey": "KeyQ", "stopHotkey": "KeyW"
            }
        }));
    }
}
