//! Persisted navigation history.

mod entry;
mod navigation;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use compact_str::CompactString;
use parking_lot::Mutex;
use tracing::{debug, info};

pub use entry::{HistoryEntry, Location};
pub use navigation::{
    clamp_max_entries, NavigationHistory, DEFAULT_MAX_ENTRIES, MAX_MAX_ENTRIES, MIN_MAX_ENTRIES,
};

use crate::services::{IconKind, IconResolver, LocationProbe};
use crate::store::{DurableStore, Result};

/// Property holding the entry array in the history document
pub const HISTORY_ENTRIES_KEY: &str = "entries";

/// Icon size requested for history entries
pub const ICON_SIZE: u32 = 16;

/// Navigation history bound to its JSON document.
///
/// The entry list and cursor sit behind one lock. Icon lookups and
/// existence probes run outside it.
pub struct History {
    navigation: Mutex<NavigationHistory>,
    store: DurableStore,
    icons: Arc<dyn IconResolver>,
}

impl History {
    pub fn open(store: DurableStore, max_entries: usize, icons: Arc<dyn IconResolver>) -> Self {
        let mut navigation = NavigationHistory::new(max_entries);
        let entries: Vec<HistoryEntry> = store.get(HISTORY_ENTRIES_KEY, Vec::new());
        navigation.replace_all(entries);
        debug!("Loaded {} history entries from {:?}", navigation.len(), store.path());

        Self {
            navigation: Mutex::new(navigation),
            store,
            icons,
        }
    }

    pub fn path(&self) -> PathBuf {
        self.store.path().to_path_buf()
    }

    pub fn store(&self) -> &DurableStore {
        &self.store
    }

    /// Record a visit, resolving an icon for locations that lack one
    pub async fn visit(&self, location: &Location) -> bool {
        if location.is_placeholder || location.key.is_empty() {
            return false;
        }

        let needs_icon = self.navigation.lock().needs_icon(&location.key);
        let icon = if needs_icon {
            self.icons
                .resolve_icon_path(IconKind::Icon, &location.key, ICON_SIZE)
                .await
        } else {
            None
        };

        let mut navigation = self.navigation.lock();
        if !navigation.visit(location, icon, Utc::now()) {
            return false;
        }
        self.persist(&navigation);
        true
    }

    pub fn move_back(&self, step: usize) -> Option<HistoryEntry> {
        self.navigation.lock().move_back(step).cloned()
    }

    pub fn move_forward(&self, step: usize) -> Option<HistoryEntry> {
        self.navigation.lock().move_forward(step).cloned()
    }

    pub fn current(&self) -> Option<HistoryEntry> {
        self.navigation.lock().current().cloned()
    }

    pub fn previous(&self) -> Option<HistoryEntry> {
        self.navigation.lock().previous().cloned()
    }

    pub fn next(&self) -> Option<HistoryEntry> {
        self.navigation.lock().next().cloned()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.navigation.lock().cursor()
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.navigation.lock().entries().to_vec()
    }

    pub fn len(&self) -> usize {
        self.navigation.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.navigation.lock().is_empty()
    }

    pub fn set_max_entries(&self, max: usize) {
        self.navigation.lock().set_max_entries(max);
    }

    pub fn remove_entry(&self, key: &str) -> bool {
        let mut navigation = self.navigation.lock();
        let removed = navigation.remove_key(key);
        if removed {
            self.persist(&navigation);
        }
        removed
    }

    /// Remove `root` and every entry below it
    pub fn remove_entries(&self, root: &str) -> bool {
        let mut navigation = self.navigation.lock();
        let removed = navigation.remove_by_key_prefix(root);
        if removed {
            self.persist(&navigation);
        }
        removed
    }

    /// Remove entries whose location no longer exists
    pub fn remove_deleted_entries(&self, probe: &dyn LocationProbe) -> bool {
        let keys: Vec<CompactString> = self
            .navigation
            .lock()
            .entries()
            .iter()
            .map(|e| e.location_key.clone())
            .collect();

        let missing: Vec<CompactString> = keys.into_iter().filter(|k| !probe.exists(k)).collect();
        if missing.is_empty() {
            return false;
        }

        let mut navigation = self.navigation.lock();
        let removed = navigation.prune_missing(|key| !missing.iter().any(|m| m.as_str() == key));
        if removed {
            info!("Removed {} missing history entries", missing.len());
            self.persist(&navigation);
        }
        removed
    }

    pub fn clear(&self) -> usize {
        let mut navigation = self.navigation.lock();
        let count = navigation.clear();
        if count > 0 {
            self.persist(&navigation);
        }
        count
    }

    pub async fn flush(&self) -> Result<()> {
        self.store.flush().await
    }

    pub fn backup(&self, max_age: chrono::Duration) -> Option<PathBuf> {
        self.store.backup(max_age)
    }

    // Runs under the navigation lock so saves land in mutation order
    fn persist(&self, navigation: &NavigationHistory) {
        self.store.set(HISTORY_ENTRIES_KEY, navigation.entries());
        self.store.save_soon();
    }
}
