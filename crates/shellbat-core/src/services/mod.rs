mod icons;
mod probe;
mod settings_watcher;

pub use icons::{icon_name, ExtensionIconResolver, IconKind, IconResolver, NoIcons};
pub use probe::{FileSystemProbe, LocationProbe};
pub use settings_watcher::SettingsWatcher;
