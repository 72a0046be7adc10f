use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cursor_clicker", version, about = "Clicks at the cursor at a configurable rate")]
pub struct Args {
    /// Settings file. Defaults to `cursor_clicker/settings.json` in the user config dir.
    #[arg(long, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Run without the control window; use hotkeys to start and stop.
    #[arg(long)]
    pub headless: bool,

    /// Start clicking right away.
    #[arg(long)]
    pub start: bool,

    /// Log the events that would be sent instead of injecting them.
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long)]
    pub debug: bool,
}

impl Args {
    pub fn settings_path(&self) -> PathBuf {
        if let Some(p) = &self.settings { return p.clone(); }
        dirs_next::config_dir()
            .map(|d| d.join("cursor_clicker"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("settings.json")
    }
}
