pub mod app;
pub mod cli;
pub mod context;
pub mod control;
pub mod desktop;
pub mod dispatch;
pub mod error;
#[cfg(feature = "hooks")]
pub mod hooks;
pub mod listener;
pub mod logging;
pub mod messages;
pub mod runtime;
pub mod scheduler;
pub mod settings;
pub mod store;

pub use context::ClickerContext;
pub use dispatch::{CursorPos, InputInjector};
pub use messages::{Message, StatusResponse};
pub use runtime::{ClickRuntime, RuntimeHandle};
pub use settings::{Settings, SettingsPatch};
pub use store::SettingsStore;
