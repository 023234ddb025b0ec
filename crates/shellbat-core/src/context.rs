use std::path::PathBuf;
use std::sync::Arc;

use compact_str::CompactString;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigPaths, FavoriteToggle, Settings};
use crate::history::{History, HistoryEntry, Location, ICON_SIZE};
use crate::messages::ShellEvent;
use crate::services::{IconKind, IconResolver, LocationProbe, SettingsWatcher};
use crate::store::{DurableStore, Result};

/// Owns the settings and history of one running application
pub struct AppContext {
    paths: ConfigPaths,
    settings: Arc<Settings>,
    history: Arc<History>,
    icons: Arc<dyn IconResolver>,
    /// Event sender for the UI
    event_tx: async_channel::Sender<ShellEvent>,
    /// Event receiver for the UI
    event_rx: async_channel::Receiver<ShellEvent>,
    watcher: Option<JoinHandle<()>>,
}

impl AppContext {
    /// Load settings and history, then back both up
    pub fn open(paths: ConfigPaths, icons: Arc<dyn IconResolver>) -> Self {
        let settings = Arc::new(Settings::open(&paths.global_settings));
        let history = Arc::new(History::open(
            DurableStore::load(&paths.global_history),
            settings.maximum_history_entries(),
            icons.clone(),
        ));
        let (event_tx, event_rx) = async_channel::bounded::<ShellEvent>(64);

        let context = Self {
            paths,
            settings,
            history,
            icons,
            event_tx,
            event_rx,
            watcher: None,
        };
        context.backup_all();
        info!("Opened {:?} with {} history entries", context.paths.config_dir, context.history.len());
        context
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    pub fn history(&self) -> &Arc<History> {
        &self.history
    }

    /// Get a clone of the event receiver for a component
    pub fn event_receiver(&self) -> async_channel::Receiver<ShellEvent> {
        self.event_rx.clone()
    }

    /// Get a clone of the event sender
    pub fn event_sender(&self) -> async_channel::Sender<ShellEvent> {
        self.event_tx.clone()
    }

    fn emit(&self, event: ShellEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            debug!("Dropped event: {}", e);
        }
    }

    /// Back up settings and history with the configured retention
    pub fn backup_all(&self) -> Vec<PathBuf> {
        let max_age = self.settings.backup_max_age();
        [self.settings.backup(), self.history.backup(max_age)]
            .into_iter()
            .flatten()
            .collect()
    }

    pub async fn visit(&self, location: &Location) -> bool {
        let visited = self.history.visit(location).await;
        if visited {
            self.emit(ShellEvent::HistoryChanged);
        }
        visited
    }

    pub fn go_back(&self, step: usize) -> Option<HistoryEntry> {
        let entry = self.history.move_back(step)?;
        self.navigate(&entry.location_key);
        Some(entry)
    }

    pub fn go_forward(&self, step: usize) -> Option<HistoryEntry> {
        let entry = self.history.move_forward(step)?;
        self.navigate(&entry.location_key);
        Some(entry)
    }

    fn navigate(&self, location_key: &CompactString) {
        self.emit(ShellEvent::Navigate {
            location_key: location_key.clone(),
            from_history: true,
        });
    }

    pub async fn toggle_favorite(&self, location: &Location) -> FavoriteToggle {
        let icon = match self.settings.favorite_index(&location.key) {
            Some(_) => None,
            None => {
                self.icons
                    .resolve_icon_path(IconKind::Icon, &location.key, ICON_SIZE)
                    .await
            }
        };
        let toggle = self.settings.toggle_favorite(location, icon);
        self.emit(ShellEvent::FavoritesChanged);
        toggle
    }

    /// Remove history entries at or below `root`
    pub fn forget(&self, root: &str) -> bool {
        let removed = self.history.remove_entries(root);
        if removed {
            self.emit(ShellEvent::HistoryChanged);
        }
        removed
    }

    /// Drop history entries and favorites whose location is gone
    pub fn prune(&self, probe: &dyn LocationProbe) -> bool {
        let history = self.history.remove_deleted_entries(probe);
        let favorites = self.settings.remove_deleted_favorites(probe);
        if history {
            self.emit(ShellEvent::HistoryChanged);
        }
        if favorites {
            self.emit(ShellEvent::FavoritesChanged);
        }
        history || favorites
    }

    pub fn clear_history(&self) -> usize {
        let count = self.history.clear();
        if count > 0 {
            self.emit(ShellEvent::HistoryChanged);
        }
        count
    }

    /// Start reloading settings when the file changes on disk
    pub fn watch_settings(&mut self) {
        if self.watcher.is_some() {
            return;
        }

        let watcher = SettingsWatcher::new(
            self.paths.clone(),
            self.settings.clone(),
            self.history.clone(),
            self.event_tx.clone(),
        );
        self.watcher = Some(tokio::spawn(async move {
            if let Err(e) = watcher.run().await {
                error!("Settings watcher error: {}", e);
            }
        }));
    }

    /// Stop the watcher and write pending changes
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
        self.event_tx.close();

        let settings = self.settings.flush().await;
        let history = self.history.flush().await;
        if let Err(e) = &settings {
            warn!("Failed to save settings: {}", e);
        }
        settings.and(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::NoIcons;

    fn open(dir: &std::path::Path) -> AppContext {
        AppContext::open(ConfigPaths::in_dir(dir), Arc::new(NoIcons))
    }

    #[tokio::test]
    async fn back_and_forward_emit_navigation() {
        let dir = tempfile::tempdir().unwrap();
        let context = open(dir.path());
        let events = context.event_receiver();

        context.visit(&Location::new("A", "A")).await;
        context.visit(&Location::new("B", "B")).await;
        context.visit(&Location::new("A", "A")).await;
        for _ in 0..3 {
            assert_eq!(events.try_recv().unwrap(), ShellEvent::HistoryChanged);
        }

        assert_eq!(context.go_back(1).unwrap().location_key, "B");
        assert_eq!(
            events.try_recv().unwrap(),
            ShellEvent::Navigate {
                location_key: "B".into(),
                from_history: true
            }
        );
        assert!(context.go_back(1).is_none());
        assert_eq!(context.go_forward(1).unwrap().location_key, "A");
        assert!(matches!(events.try_recv().unwrap(), ShellEvent::Navigate { .. }));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn shutdown_persists_everything() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let context = open(dir.path());
        context.visit(&Location::new("/a", "a")).await;
        context.visit(&Location::new("/b", "b")).await;
        assert_eq!(context.toggle_favorite(&Location::new("/a", "a")).await, FavoriteToggle::Added);
        context.shutdown().await?;

        let context = open(dir.path());
        assert_eq!(context.history().len(), 2);
        assert_eq!(context.settings().favorite_index("/A"), Some(0));

        // Opening backs up both documents
        let backups = dir.path().join("globalHistory.bak");
        assert_eq!(std::fs::read_dir(backups)?.count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn prune_and_forget() {
        let dir = tempfile::tempdir().unwrap();
        let context = open(dir.path());
        for key in ["/data", "/data/a", "/other", "/gone"] {
            context.visit(&Location::new(key, key)).await;
        }
        context.toggle_favorite(&Location::new("/gone", "gone")).await;

        assert!(context.forget("/data"));
        assert!(context.prune(&|key: &str| key != "/gone"));
        assert!(!context.prune(&|_: &str| true));
        assert_eq!(context.history().len(), 1);
        assert!(context.settings().favorites().is_empty());
        assert_eq!(context.clear_history(), 1);
    }

    #[tokio::test]
    async fn disabled_backups_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("globalSettings.json"),
            br#"{ "backupsMaxDays": -1 }"#,
        )
        .unwrap();

        let context = open(dir.path());
        assert!(context.backup_all().is_empty());
    }
}
