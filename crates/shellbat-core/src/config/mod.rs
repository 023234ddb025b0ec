mod favorites;
mod instance;
mod paths;
pub mod schema;
mod settings;
mod terminals;

pub use favorites::{Favorite, FavoriteToggle};
pub use instance::{InstanceSettings, INSTANCE_SCHEMA};
pub use paths::{ConfigPaths, CONFIG_DIR_ENV, GLOBAL_HISTORY_FILE, GLOBAL_SETTINGS_FILE};
pub use schema::{PropertyDescriptor, PropertyKind, PropertyValue, SettingsDocument};
pub use settings::{Settings, SETTINGS_SCHEMA};
pub use terminals::{default_terminals, TerminalEntry};
