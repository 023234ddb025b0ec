use compact_str::CompactString;
use smallvec::SmallVec;

/// Events from the core to the UI layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    /// The UI should show this location
    Navigate {
        location_key: CompactString,
        /// Set for back/forward moves, which must not record a new visit
        from_history: bool,
    },

    /// Entries were added or removed
    HistoryChanged,

    /// Favorites list changed
    FavoritesChanged,

    /// Global settings changed on disk and were reloaded
    SettingsReloaded { changed: SmallVec<[String; 8]> },
}
