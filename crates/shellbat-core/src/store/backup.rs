//! Dated backups of settings documents.
//!
//! `<dir>/globalSettings.json` is copied to
//! `<dir>/globalSettings.bak/2026_10_19.<tick>.globalSettings.json`. Old
//! copies are removed based on the date at the start of their file name.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use tracing::{debug, warn};

use super::error::{Result, StoreError};
use super::fs::copy_file;

pub const BACKUP_DIRECTORY_EXTENSION: &str = ".bak";

// If you change this format, change `backup_date` as well.
const BACKUP_DATE_FORMAT: &str = "%Y_%m_%d";

static LAST_TICK: AtomicI64 = AtomicI64::new(0);

/// Millisecond tick, strictly increasing within the process
fn next_tick() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_TICK.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_TICK.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// Sibling directory that holds backups of `path`
pub fn backup_directory(path: &Path) -> Option<PathBuf> {
    let stem = path.file_stem()?.to_str()?;
    let parent = path.parent()?;
    Some(parent.join(format!("{}{}", stem, BACKUP_DIRECTORY_EXTENSION)))
}

/// Date embedded in a backup file name
pub fn backup_date(file_name: &str) -> Option<NaiveDate> {
    let (date, _) = file_name.split_once('.')?;
    NaiveDate::parse_from_str(date, BACKUP_DATE_FORMAT).ok()
}

/// Copy `path` into its backup directory and drop backups older than `max_age`.
///
/// Returns the new backup, or `None` when `max_age` is negative or there is
/// nothing to back up.
pub fn backup_file(path: &Path, max_age: Duration) -> Result<Option<PathBuf>> {
    backup_file_at(path, max_age, Local::now())
}

pub(crate) fn backup_file_at(
    path: &Path,
    max_age: Duration,
    now: DateTime<Local>,
) -> Result<Option<PathBuf>> {
    backup_then_prune(path, max_age, now, prune_backups)
}

/// A written snapshot is reported even if pruning fails
fn backup_then_prune(
    path: &Path,
    max_age: Duration,
    now: DateTime<Local>,
    prune: impl FnOnce(&Path, &Path, Duration, NaiveDate) -> Result<usize>,
) -> Result<Option<PathBuf>> {
    if max_age < Duration::zero() || !path.is_file() {
        return Ok(None);
    }

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| StoreError::InvalidPath(path.to_path_buf()))?;
    let dir = backup_directory(path).ok_or_else(|| StoreError::InvalidPath(path.to_path_buf()))?;

    let target = dir.join(format!(
        "{}.{}.{}.json",
        now.format(BACKUP_DATE_FORMAT),
        next_tick(),
        stem
    ));
    copy_file(path, &target)?;

    match prune(&dir, &target, max_age, now.date_naive()) {
        Ok(removed) => debug!("Backed up {:?} to {:?}, removed {} old backups", path, target, removed),
        Err(e) => warn!("Backed up {:?} to {:?}, but pruning old backups failed: {}", path, target, e),
    }

    Ok(Some(target))
}

fn prune_backups(dir: &Path, keep: &Path, max_age: Duration, today: NaiveDate) -> Result<usize> {
    let mut removed = 0;

    for entry in fs::read_dir(dir)?.flatten() {
        let file = entry.path();
        if file == keep || !file.is_file() {
            continue;
        }

        let Some(date) = file
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(backup_date)
        else {
            continue;
        };

        if today.signed_duration_since(date) > max_age {
            match fs::remove_file(&file) {
                Ok(()) => removed += 1,
                Err(e) => debug!("Could not remove old backup {:?}: {}", file, e),
            }
        }
    }

    Ok(removed)
}
