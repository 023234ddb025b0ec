use std::path::Path;

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// One visited location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub location_key: CompactString,
    #[serde(default)]
    pub display_name: CompactString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_path: Option<String>,
    #[serde(default)]
    pub last_visited_time: DateTime<Utc>,
    /// Secondary sort key, newer visits get larger values
    #[serde(skip)]
    pub(crate) visit_seq: u64,
}

impl HistoryEntry {
    pub fn new(location_key: impl Into<CompactString>, display_name: impl Into<CompactString>) -> Self {
        Self {
            location_key: location_key.into(),
            display_name: display_name.into(),
            icon_path: None,
            last_visited_time: Utc::now(),
            visit_seq: 0,
        }
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.last_visited_time = time;
        self
    }
}

/// Location handed to the history by the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub key: CompactString,
    pub display_name: CompactString,
    /// Transient locations such as the desktop are never recorded
    pub is_placeholder: bool,
}

impl Location {
    pub fn new(key: impl Into<CompactString>, display_name: impl Into<CompactString>) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            is_placeholder: false,
        }
    }

    pub fn placeholder(key: impl Into<CompactString>) -> Self {
        let key = key.into();
        Self {
            display_name: key.clone(),
            key,
            is_placeholder: true,
        }
    }

    /// Location for a filesystem path, named after its last component
    pub fn from_path(path: &Path) -> Self {
        let key = path.to_string_lossy();
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_else(|| key.clone());
        Self::new(key.as_ref(), display_name.as_ref())
    }
}
