use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_channel::Sender;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::{ConfigPaths, Settings};
use crate::history::History;
use crate::messages::ShellEvent;
use crate::utils::sleep_until_deadline;

const DEBOUNCE: Duration = Duration::from_millis(100);

/// Reloads global settings when another instance rewrites them
pub struct SettingsWatcher {
    paths: ConfigPaths,
    settings: Arc<Settings>,
    history: Arc<History>,
    event_tx: Sender<ShellEvent>,
}

impl SettingsWatcher {
    pub fn new(
        paths: ConfigPaths,
        settings: Arc<Settings>,
        history: Arc<History>,
        event_tx: Sender<ShellEvent>,
    ) -> Self {
        Self {
            paths,
            settings,
            history,
            event_tx,
        }
    }

    /// Watch until the event receiver goes away
    pub async fn run(self) -> anyhow::Result<()> {
        info!("Watching settings in {:?}", self.paths.config_dir);
        tokio::fs::create_dir_all(&self.paths.config_dir).await?;

        let (notify_tx, mut notify_rx) = mpsc::channel::<PathBuf>(32);
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    // Atomic replace shows up as a create or rename
                    if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        for path in event.paths {
                            let _ = notify_tx.blocking_send(path);
                        }
                    }
                }
            },
            notify::Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&self.paths.config_dir, RecursiveMode::NonRecursive)?;

        let mut deadline: Option<tokio::time::Instant> = None;

        loop {
            tokio::select! {
                path = notify_rx.recv() => match path {
                    Some(path) if path.file_name() == self.paths.global_settings.file_name() => {
                        deadline = Some(tokio::time::Instant::now() + DEBOUNCE);
                    }
                    Some(_) => {}
                    None => break,
                },

                _ = sleep_until_deadline(deadline) => {
                    deadline = None;
                    if !self.reload().await {
                        break;
                    }
                }
            }
        }

        debug!("Settings watcher stopped");
        Ok(())
    }

    /// Returns false once nobody listens for events
    async fn reload(&self) -> bool {
        let settings = self.settings.clone();
        let changed = match tokio::task::spawn_blocking(move || settings.reload()).await {
            Ok(changed) => changed,
            Err(e) => {
                warn!("Settings reload failed: {}", e);
                return true;
            }
        };
        if changed.is_empty() {
            return true;
        }

        info!("Settings reloaded, {} properties changed", changed.len());
        self.history
            .set_max_entries(self.settings.maximum_history_entries());
        self.event_tx
            .send(ShellEvent::SettingsReloaded { changed })
            .await
            .is_ok()
    }
}
