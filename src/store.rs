use crate::error::StoreError;
use crate::settings::{Settings, SettingsPatch};
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

/// Storage areas a record can live in. Change notifications carry the area so
/// listeners can ignore the ones they do not read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageArea { Sync, Local }

#[derive(Clone, Debug, PartialEq)]
pub struct ValueChange {
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StorageChange {
    pub area: StorageArea,
    pub changes: BTreeMap<String, ValueChange>,
}

impl StorageChange {
    /// Collects the new values of changed keys into a partial update.
    pub fn to_patch(&self) -> SettingsPatch {
        let mut record = Map::new();
        for (key, change) in &self.changes {
            if let Some(v) = &change.new_value { record.insert(key.clone(), v.clone()); }
        }
        // Unknown keys are dropped by the patch; known keys with odd types are
        // kept and normalized later.
        serde_json::from_value(Value::Object(record)).unwrap_or_default()
    }
}

pub type ChangeListener = Box<dyn Fn(&StorageChange) + Send + Sync>;

pub trait SettingsStore: Send + Sync {
    fn area(&self) -> StorageArea;

    /// Returns the stored record with `defaults` filled in for absent keys.
    fn load(&self, defaults: &Settings) -> Result<SettingsPatch, StoreError>;

    /// Merges `settings` into the stored record and notifies listeners of the
    /// keys whose value changed.
    fn write(&self, settings: &Settings) -> Result<(), StoreError>;

    fn on_changed(&self, listener: ChangeListener);
}

// -------------- Shared record logic --------------
fn settings_record(settings: &Settings) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(settings)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::NotAnObject),
    }
}

fn with_defaults(mut record: Map<String, Value>, defaults: &Settings) -> Result<SettingsPatch, StoreError> {
    for (key, value) in settings_record(defaults)? {
        record.entry(key).or_insert(value);
    }
    Ok(serde_json::from_value(Value::Object(record))?)
}

/// Merges `update` into `record` in place and reports what changed.
fn merge_record(record: &mut Map<String, Value>, update: Map<String, Value>) -> BTreeMap<String, ValueChange> {
    let mut changes = BTreeMap::new();
    for (key, value) in update {
        let old = record.get(&key).cloned();
        if old.as_ref() == Some(&value) { continue; }
        record.insert(key.clone(), value.clone());
        changes.insert(key, ValueChange { old_value: old, new_value: Some(value) });
    }
    changes
}

#[derive(Default)]
struct Listeners(Mutex<Vec<ChangeListener>>);

impl Listeners {
    fn push(&self, l: ChangeListener) { self.0.lock().push(l); }

    fn notify(&self, area: StorageArea, changes: BTreeMap<String, ValueChange>) {
        if changes.is_empty() { return; }
        let change = StorageChange { area, changes };
        tracing::debug!("storage change in {:?}: {:?}", area, change.changes.keys().collect::<Vec<_>>());
        for listener in self.0.lock().iter() { listener(&change); }
    }
}

// -------------- JSON file store --------------
pub struct JsonFileStore {
    path: PathBuf,
    area: StorageArea,
    // Serializes read-modify-write cycles against the file.
    io: Mutex<()>,
    // Last record seen on disk, so edits from outside can be diffed.
    known: Mutex<Map<String, Value>>,
    watcher: Mutex<Option<RecommendedWatcher>>,
    listeners: Listeners,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            area: StorageArea::Sync,
            io: Mutex::new(()),
            known: Mutex::new(Map::new()),
            watcher: Mutex::new(None),
            listeners: Listeners::default(),
        }
    }

    pub fn with_area(mut self, area: StorageArea) -> Self { self.area = area; self }

    pub fn path(&self) -> &Path { &self.path }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io { path: self.path.display().to_string(), source }
    }

    fn read_record(&self) -> Result<Map<String, Value>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(self.io_err(e)),
        };
        if content.trim().is_empty() { return Ok(Map::new()); }
        match serde_json::from_str(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::NotAnObject),
        }
    }

    fn write_record(&self, record: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(dir) = self.parent_dir() {
            std::fs::create_dir_all(dir).map_err(|e| self.io_err(e))?;
        }
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(&self.path, json).map_err(|e| self.io_err(e))
    }

    fn parent_dir(&self) -> Option<&Path> {
        self.path.parent().filter(|d| !d.as_os_str().is_empty())
    }

    /// Watches the settings file so edits made outside this store reach the
    /// change listeners. The watch lasts as long as the store.
    pub fn watch(self: &Arc<Self>) -> Result<(), StoreError> {
        let dir = self.parent_dir().unwrap_or_else(|| Path::new(".")).to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| self.io_err(e))?;
        {
            let _io = self.io.lock();
            *self.known.lock() = self.read_record().unwrap_or_default();
        }

        let store: Weak<Self> = Arc::downgrade(self);
        let file_name = self.path.file_name().map(|n| n.to_os_string());
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<notify::Event>| match res {
                Ok(ev) => {
                    if !matches!(ev.kind, EventKind::Modify(_) | EventKind::Create(_)) { return; }
                    let ours = ev.paths.iter().any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if !ours { return; }
                    if let Some(store) = store.upgrade() { store.reload(); }
                }
                Err(e) => tracing::error!("settings watch error: {:?}", e),
            },
            Config::default(),
        )?;
        // The file itself may be replaced rather than rewritten, so watch its directory.
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::debug!("watching {}", self.path.display());
        *self.watcher.lock() = Some(watcher);
        Ok(())
    }

    /// Re-reads the file and notifies listeners of keys that differ from the
    /// last record seen.
    pub fn reload(&self) {
        let changes = {
            let _io = self.io.lock();
            let fresh = match self.read_record() {
                Ok(record) => record,
                Err(e) => {
                    // Editors often leave a half-written file for a moment.
                    tracing::debug!("skipping unreadable settings file: {e}");
                    return;
                }
            };
            merge_record(&mut self.known.lock(), fresh)
        };
        self.listeners.notify(self.area, changes);
    }
}

impl SettingsStore for JsonFileStore {
    fn area(&self) -> StorageArea { self.area }

    fn load(&self, defaults: &Settings) -> Result<SettingsPatch, StoreError> {
        let _io = self.io.lock();
        let record = self.read_record()?;
        *self.known.lock() = record.clone();
        with_defaults(record, defaults)
    }

    fn write(&self, settings: &Settings) -> Result<(), StoreError> {
        let changes = {
            let _io = self.io.lock();
            let mut record = match self.read_record() {
                Ok(record) => record,
                Err(e @ (StoreError::Json(_) | StoreError::NotAnObject)) => {
                    tracing::warn!("replacing corrupt settings record: {e}");
                    Map::new()
                }
                Err(e) => return Err(e),
            };
            let changes = merge_record(&mut record, settings_record(settings)?);
            if !changes.is_empty() { self.write_record(&record)?; }
            *self.known.lock() = record;
            changes
        };
        self.listeners.notify(self.area, changes);
        Ok(())
    }

    fn on_changed(&self, listener: ChangeListener) { self.listeners.push(listener); }
}

// -------------- In-memory store --------------
pub struct MemoryStore {
    area: StorageArea,
    record: Mutex<Map<String, Value>>,
    listeners: Listeners,
}

impl MemoryStore {
    pub fn new(area: StorageArea) -> Self {
        Self { area, record: Mutex::new(Map::new()), listeners: Listeners::default() }
    }

    /// Seeds a raw record without notifying anyone, e.g. a legacy layout.
    pub fn with_record(self, record: Map<String, Value>) -> Self {
        *self.record.lock() = record;
        self
    }

    pub fn snapshot(&self) -> Map<String, Value> { self.record.lock().clone() }
}

impl SettingsStore for MemoryStore {
    fn area(&self) -> StorageArea { self.area }

    fn load(&self, defaults: &Settings) -> Result<SettingsPatch, StoreError> {
        with_defaults(self.record.lock().clone(), defaults)
    }

    fn write(&self, settings: &Settings) -> Result<(), StoreError> {
        let update = settings_record(settings)?;
        let changes = merge_record(&mut self.record.lock(), update);
        self.listeners.notify(self.area, changes);
        Ok(())
    }

    fn on_changed(&self, listener: ChangeListener) { self.listeners.push(listener); }
}
