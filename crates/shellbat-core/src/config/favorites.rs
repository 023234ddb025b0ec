use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A pinned location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub location_key: CompactString,
    #[serde(default)]
    pub display_name: CompactString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_path: Option<String>,
}

/// Result of toggling a favorite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteToggle {
    Added,
    Removed,
}
