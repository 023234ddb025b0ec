pub mod config;
pub mod context;
pub mod history;
pub mod messages;
pub mod services;
pub mod store;
pub mod utils;

pub use config::{ConfigPaths, Favorite, FavoriteToggle, InstanceSettings, Settings, TerminalEntry};
pub use context::AppContext;
pub use history::{History, HistoryEntry, Location, NavigationHistory};
pub use messages::ShellEvent;
pub use services::{
    ExtensionIconResolver, FileSystemProbe, IconKind, IconResolver, LocationProbe, NoIcons,
    SettingsWatcher,
};
pub use store::{DurableStore, PropertyBag, PropertyChanged, StoreError, DEFAULT_SAVE_DELAY};
