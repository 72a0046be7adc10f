use clap::Parser;
use cursor_clicker::app::ControlApp;
use cursor_clicker::cli::Args;
use cursor_clicker::control::{ControlPanel, LocalTransport};
use cursor_clicker::desktop::{self, EnigoInjector};
use cursor_clicker::dispatch::RecordingInjector;
use cursor_clicker::scheduler::{Clock, SystemClock};
use cursor_clicker::store::JsonFileStore;
use cursor_clicker::{logging, ClickRuntime, ClickerContext, Message, Settings, SettingsStore};
use eframe::egui;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.debug);

    let path = args.settings_path();
    let file_store = Arc::new(JsonFileStore::new(path.clone()));
    if let Err(e) = file_store.watch() {
        tracing::warn!("outside edits to {} will not be picked up: {e}", path.display());
    }
    let store: Arc<dyn SettingsStore> = file_store;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let displays = desktop::displays();
    let mut ctx = ClickerContext::new(desktop::primary_center(&displays));
    match store.load(&Settings::default()) {
        Ok(raw) => ctx.apply_settings(&raw, clock.now()),
        Err(e) => tracing::warn!("using default settings, {} unreadable: {e}", path.display()),
    }
    tracing::info!("settings file: {}", path.display());

    let runtime = if args.dry_run {
        ClickRuntime::spawn(ctx, RecordingInjector::new().logged(), Arc::clone(&clock))
    } else {
        ClickRuntime::spawn(ctx, EnigoInjector::new(displays), Arc::clone(&clock))
    };
    let handle = runtime.handle();

    let on_change = handle.clone();
    store.on_changed(Box::new(move |change| on_change.storage_changed(change)));

    #[cfg(feature = "hooks")]
    cursor_clicker::hooks::spawn(handle.clone());
    #[cfg(not(feature = "hooks"))]
    if args.headless {
        tracing::warn!("built without the `hooks` feature, hotkeys are unavailable");
    }

    if args.start { handle.send(&Message::start())?; }

    if args.headless {
        tracing::info!("running headless");
        loop { std::thread::park(); }
    }

    let panel = ControlPanel::new(LocalTransport::new(handle.clone()), Arc::clone(&store));
    let mut opts = eframe::NativeOptions::default();
    opts.viewport.inner_size = Some(egui::vec2(380.0, 360.0));
    opts.viewport.resizable = Some(true);
    opts.follow_system_theme = true;

    eframe::run_native(
        "Cursor Clicker",
        opts,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Box::new(ControlApp::new(panel, Some(handle)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("control window failed: {e}"))?;

    runtime.shutdown();
    Ok(())
}
