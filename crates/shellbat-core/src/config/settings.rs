use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use smallvec::SmallVec;
use tracing::{debug, info};

use super::favorites::{Favorite, FavoriteToggle};
use super::schema::{self, PropertyDescriptor, SettingsDocument};
use super::terminals::{default_terminals, TerminalEntry};
use crate::history::{clamp_max_entries, Location};
use crate::services::LocationProbe;
use crate::store::{DurableStore, Result};
use crate::utils::eq_ignore_case;

pub const SEND_ERROR_REPORT: &str = "sendErrorReport";
pub const MAXIMUM_INSTANCES: &str = "maximumInstances";
pub const INSTANCES_UPDATE_INTERVAL: &str = "instancesUpdateInterval";
pub const BACKUPS_MAX_DAYS: &str = "backupsMaxDays";
pub const MAXIMUM_HISTORY_ENTRIES: &str = "maximumHistoryEntries";
pub const CLOSE_EXITED_TERMINAL_PROCESSES: &str = "closeExitedTerminalProcesses";
pub const FAVORITES: &str = "favorites";
pub const SHORTCUTS: &str = "shortcuts";
pub const TERMINALS: &str = "terminals";

pub const SETTINGS_SCHEMA: &[PropertyDescriptor] = &[
    PropertyDescriptor::bool(SEND_ERROR_REPORT, true, "Send error reports"),
    PropertyDescriptor::int(MAXIMUM_INSTANCES, 10, 1, 100, "Maximum number of instances"),
    PropertyDescriptor::int(
        INSTANCES_UPDATE_INTERVAL,
        5000,
        100,
        600_000,
        "Instances update interval in milliseconds",
    ),
    PropertyDescriptor::int(
        BACKUPS_MAX_DAYS,
        30,
        -1,
        3650,
        "Days to keep settings backups, negative disables backups",
    ),
    PropertyDescriptor::int(MAXIMUM_HISTORY_ENTRIES, 100, 10, 1000, "Maximum history entries"),
    PropertyDescriptor::bool(
        CLOSE_EXITED_TERMINAL_PROCESSES,
        false,
        "Close terminals when their process exits",
    ),
];

/// Global application settings (`globalSettings.json`)
pub struct Settings {
    store: DurableStore,
}

impl SettingsDocument for Settings {
    fn document(&self) -> &DurableStore {
        &self.store
    }

    fn schema(&self) -> &'static [PropertyDescriptor] {
        SETTINGS_SCHEMA
    }
}

impl Settings {
    pub fn open(path: &Path) -> Self {
        Self::from_store(DurableStore::load(path))
    }

    pub fn from_store(store: DurableStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &DurableStore {
        &self.store
    }

    fn int(&self, name: &str) -> i64 {
        schema::get(&self.store, SETTINGS_SCHEMA, name)
            .and_then(|v| v.as_i64())
            .unwrap_or_default()
    }

    fn flag(&self, name: &str) -> bool {
        schema::get(&self.store, SETTINGS_SCHEMA, name)
            .and_then(|v| v.as_bool())
            .unwrap_or_default()
    }

    pub fn send_error_report(&self) -> bool {
        self.flag(SEND_ERROR_REPORT)
    }

    pub fn maximum_instances(&self) -> usize {
        self.int(MAXIMUM_INSTANCES) as usize
    }

    pub fn instances_update_interval(&self) -> Duration {
        Duration::from_millis(self.int(INSTANCES_UPDATE_INTERVAL) as u64)
    }

    pub fn backups_max_days(&self) -> i64 {
        self.int(BACKUPS_MAX_DAYS)
    }

    /// Retention for backups; negative disables them
    pub fn backup_max_age(&self) -> chrono::Duration {
        chrono::Duration::days(self.backups_max_days())
    }

    pub fn maximum_history_entries(&self) -> usize {
        clamp_max_entries(self.int(MAXIMUM_HISTORY_ENTRIES) as usize)
    }

    pub fn close_exited_terminal_processes(&self) -> bool {
        self.flag(CLOSE_EXITED_TERMINAL_PROCESSES)
    }

    pub fn favorites(&self) -> Vec<Favorite> {
        self.store.get(FAVORITES, Vec::new())
    }

    fn set_favorites(&self, favorites: &[Favorite]) {
        self.store.set(FAVORITES, favorites);
        self.store.save_soon();
    }

    pub fn favorite_index(&self, location_key: &str) -> Option<usize> {
        self.favorites()
            .iter()
            .position(|f| eq_ignore_case(&f.location_key, location_key))
    }

    /// Add `location` to the favorites, or remove it if already there
    pub fn toggle_favorite(&self, location: &Location, icon_path: Option<String>) -> FavoriteToggle {
        let mut favorites = self.favorites();
        let toggle = match favorites
            .iter()
            .position(|f| eq_ignore_case(&f.location_key, &location.key))
        {
            Some(index) => {
                favorites.remove(index);
                FavoriteToggle::Removed
            }
            None => {
                favorites.push(Favorite {
                    location_key: location.key.clone(),
                    display_name: location.display_name.clone(),
                    icon_path,
                });
                FavoriteToggle::Added
            }
        };
        debug!("Favorite {:?} {:?}", location.key, toggle);
        self.set_favorites(&favorites);
        toggle
    }

    /// Drop favorites whose location no longer exists
    pub fn remove_deleted_favorites(&self, probe: &dyn LocationProbe) -> bool {
        let mut favorites = self.favorites();
        let before = favorites.len();
        favorites.retain(|f| probe.exists(&f.location_key));
        if favorites.len() == before {
            return false;
        }
        info!("Removed {} missing favorites", before - favorites.len());
        self.set_favorites(&favorites);
        true
    }

    /// Key bindings by command name
    pub fn shortcuts(&self) -> BTreeMap<String, String> {
        self.store.get(SHORTCUTS, BTreeMap::new())
    }

    pub fn set_shortcut(&self, command: &str, keys: &str) -> bool {
        let mut shortcuts = self.shortcuts();
        shortcuts.retain(|name, _| !eq_ignore_case(name, command));
        if !keys.is_empty() {
            shortcuts.insert(command.to_string(), keys.to_string());
        }
        let changed = self.store.set(SHORTCUTS, shortcuts);
        if changed {
            self.store.save_soon();
        }
        changed
    }

    /// Configured terminals, or the built-in list when none are set
    pub fn terminals(&self) -> Vec<TerminalEntry> {
        let terminals: Vec<TerminalEntry> = self.store.get(TERMINALS, Vec::new());
        if terminals.is_empty() {
            default_terminals()
        } else {
            terminals
        }
    }

    /// Apply changes made to the file by another process
    pub fn reload(&self) -> SmallVec<[String; 8]> {
        self.store.reload()
    }

    pub async fn flush(&self) -> Result<()> {
        self.store.flush().await
    }

    pub fn backup(&self) -> Option<std::path::PathBuf> {
        self.store.backup(self.backup_max_age())
    }
}
