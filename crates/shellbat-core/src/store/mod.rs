//! Debounced, atomically written JSON property documents.

mod bag;
pub mod backup;
mod error;
pub mod fs;
mod writer;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use smallvec::SmallVec;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, warn};

pub use bag::PropertyBag;
pub use error::{Result, StoreError};
use writer::WriteRequest;

/// Delay used by callers that just want "save soon"
pub const DEFAULT_SAVE_DELAY: Duration = Duration::from_millis(300);

/// Notification sent when a property value changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChanged {
    pub key: String,
}

pub(crate) struct StoreInner {
    path: PathBuf,
    values: RwLock<PropertyBag>,
    changes: broadcast::Sender<PropertyChanged>,
    dirty: AtomicBool,
    write_lock: Mutex<()>,
    writes: AtomicU64,
}

impl StoreInner {
    fn notify(&self, key: &str) {
        // No subscribers is fine
        let _ = self.changes.send(PropertyChanged {
            key: key.to_string(),
        });
    }

    /// Write the document if a save is pending
    pub(crate) fn write_pending(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        if !self.dirty.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        let data = self.values.read().to_json_pretty()?;
        fs::write_atomic(&self.path, &data)?;
        self.writes.fetch_add(1, Ordering::Relaxed);
        debug!("Saved {:?}", self.path);
        Ok(())
    }
}

/// A property document bound to one file.
///
/// Reads and writes go to the in-memory bag; `save` schedules the file
/// write. Inside a tokio runtime, deferred saves are coalesced by a writer
/// task. Outside one they are written immediately. Dropping the store writes
/// any pending change.
pub struct DurableStore {
    inner: Arc<StoreInner>,
    writer: Option<mpsc::UnboundedSender<WriteRequest>>,
}

impl DurableStore {
    /// Open the document at `path`; missing or malformed files give an empty store
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = PropertyBag::load(&path);
        Self::with_values(path, values)
    }

    pub fn with_values(path: impl Into<PathBuf>, values: PropertyBag) -> Self {
        let path = path.into();
        let (changes, _) = broadcast::channel(64);

        let inner = Arc::new(StoreInner {
            path,
            values: RwLock::new(values),
            changes,
            dirty: AtomicBool::new(false),
            write_lock: Mutex::new(()),
            writes: AtomicU64::new(0),
        });

        let writer = match Handle::try_current() {
            Ok(handle) => {
                let (tx, rx) = mpsc::unbounded_channel();
                handle.spawn(writer::run(inner.clone(), rx));
                Some(tx)
            }
            Err(_) => {
                debug!("No async runtime, saves to {:?} are synchronous", inner.path);
                None
            }
        };

        Self { inner, writer }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.inner.values.read().get(key, default)
    }

    pub fn try_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.inner.values.read().try_get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.values.read().contains(key)
    }

    /// Store a value; subscribers are notified when it changed
    pub fn set<V: Serialize>(&self, key: &str, value: V) -> bool {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                warn!("Cannot store property {}: {}", key, e);
                return false;
            }
        };

        let changed = self.inner.values.write().set_value(key, value);
        if changed {
            self.inner.notify(key);
        }
        changed
    }

    pub fn remove(&self, key: &str) -> bool {
        let removed = self.inner.values.write().remove(key);
        if removed {
            self.inner.notify(key);
        }
        removed
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PropertyChanged> {
        self.inner.changes.subscribe()
    }

    /// Independent copy of every property
    pub fn snapshot(&self) -> PropertyBag {
        self.inner.values.read().clone()
    }

    /// Apply every property of `other`, returning how many changed
    pub fn copy_from(&self, other: &PropertyBag) -> usize {
        other
            .iter()
            .filter(|(name, value)| self.set(name, value))
            .count()
    }

    /// Schedule a write of the document.
    ///
    /// A zero `defer` writes synchronously. Otherwise any pending write is
    /// pushed back to `defer` from now.
    pub fn save(&self, defer: Duration) -> Result<()> {
        self.inner.dirty.store(true, Ordering::SeqCst);

        if defer.is_zero() {
            return self.inner.write_pending();
        }

        match &self.writer {
            Some(tx) if tx.send(WriteRequest::Schedule(defer)).is_ok() => Ok(()),
            _ => self.inner.write_pending(),
        }
    }

    /// `save(DEFAULT_SAVE_DELAY)`, logging instead of returning failures
    pub fn save_soon(&self) {
        if let Err(e) = self.save(DEFAULT_SAVE_DELAY) {
            warn!("Failed to save {:?}: {}", self.inner.path, e);
        }
    }

    /// Write any pending change now
    pub async fn flush(&self) -> Result<()> {
        if let Some(tx) = &self.writer {
            let (ack_tx, ack_rx) = oneshot::channel();
            if tx.send(WriteRequest::Flush(ack_tx)).is_ok() {
                let _ = ack_rx.await;
            }
        }
        self.inner.write_pending()
    }

    pub fn has_pending_write(&self) -> bool {
        self.inner.dirty.load(Ordering::SeqCst)
    }

    /// Number of physical writes so far
    pub fn writes(&self) -> u64 {
        self.inner.writes.load(Ordering::Relaxed)
    }

    /// Back up the document file; failures are logged and ignored
    pub fn backup(&self, max_age: chrono::Duration) -> Option<PathBuf> {
        match backup::backup_file(&self.inner.path, max_age) {
            Ok(created) => created,
            Err(e) => {
                warn!("Backup of {:?} failed: {}", self.inner.path, e);
                None
            }
        }
    }

    /// Re-read the file and apply differences, returning the changed names.
    ///
    /// Skipped while a local change is waiting to be written.
    pub fn reload(&self) -> SmallVec<[String; 8]> {
        if self.has_pending_write() {
            debug!("Skipping reload of {:?}, local changes pending", self.inner.path);
            return SmallVec::new();
        }

        let fresh = match PropertyBag::read(&self.inner.path) {
            Ok(Some(bag)) => bag,
            Ok(None) => return SmallVec::new(),
            Err(e) => {
                warn!("Failed to reload {:?}: {}", self.inner.path, e);
                return SmallVec::new();
            }
        };

        let changed = self.inner.values.write().replace_with(fresh);
        for key in &changed {
            self.inner.notify(key);
        }
        changed
    }
}

impl Drop for DurableStore {
    fn drop(&mut self) {
        // Closing the channel stops the writer task
        self.writer.take();
        if let Err(e) = self.inner.write_pending() {
            warn!("Failed to save {:?} on close: {}", self.inner.path, e);
        }
    }
}
