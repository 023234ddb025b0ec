use super::paths::ConfigPaths;
use super::schema::{self, PropertyDescriptor, SettingsDocument};
use crate::store::{DurableStore, Result};

pub const INSTANCE_NAME: &str = "instanceName";
pub const NOTIFY_ON_FOLDER_EVENTS: &str = "notifyOnFolderEvents";
pub const THUMBNAILS_SIZE: &str = "thumbnailsSize";

pub const INSTANCE_SCHEMA: &[PropertyDescriptor] = &[
    PropertyDescriptor::text(INSTANCE_NAME, None, "Instance name"),
    PropertyDescriptor::bool(NOTIFY_ON_FOLDER_EVENTS, true, "Notify on folder events"),
    PropertyDescriptor::int(THUMBNAILS_SIZE, 96, 16, 512, "Thumbnails size"),
];

/// Settings of one named window instance (`instances/<name>.json`)
pub struct InstanceSettings {
    store: DurableStore,
}

impl SettingsDocument for InstanceSettings {
    fn document(&self) -> &DurableStore {
        &self.store
    }

    fn schema(&self) -> &'static [PropertyDescriptor] {
        INSTANCE_SCHEMA
    }
}

impl InstanceSettings {
    pub fn open(paths: &ConfigPaths, name: &str) -> Result<Self> {
        let store = DurableStore::load(paths.instance_settings(name)?);
        let settings = Self { store };
        if settings.instance_name().is_none() && settings.store.set(INSTANCE_NAME, name) {
            settings.store.save_soon();
        }
        Ok(settings)
    }

    pub fn instance_name(&self) -> Option<String> {
        self.store.try_get(INSTANCE_NAME)
    }

    pub fn notify_on_folder_events(&self) -> bool {
        schema::get(&self.store, INSTANCE_SCHEMA, NOTIFY_ON_FOLDER_EVENTS)
            .and_then(|v| v.as_bool())
            .unwrap_or(true)
    }

    pub fn thumbnails_size(&self) -> u32 {
        schema::get(&self.store, INSTANCE_SCHEMA, THUMBNAILS_SIZE)
            .and_then(|v| v.as_u64())
            .map_or(96, |v| v as u32)
    }

    pub async fn flush(&self) -> Result<()> {
        self.store.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PropertyBag;

    #[test]
    fn instance_defaults_and_name() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let paths = ConfigPaths::in_dir(dir.path());

        let instance = InstanceSettings::open(&paths, "work")?;
        assert_eq!(instance.instance_name().as_deref(), Some("work"));
        assert!(instance.notify_on_folder_events());
        assert_eq!(instance.thumbnails_size(), 96);

        assert!(instance.set_from_str("ThumbnailsSize", "1024")?);
        assert_eq!(instance.get("thumbnailssize"), Some(serde_json::json!(512)));
        assert_eq!(instance.thumbnails_size(), 512);
        drop(instance);

        let reopened = InstanceSettings::open(&paths, "work")?;
        assert_eq!(reopened.thumbnails_size(), 512);
        assert!(paths.instances_dir.join("work.json").exists());

        assert!(InstanceSettings::open(&paths, "../escape").is_err());
        Ok(())
    }

    #[test]
    fn new_instance_name_is_written() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let paths = ConfigPaths::in_dir(dir.path());

        drop(InstanceSettings::open(&paths, "work")?);

        let saved = PropertyBag::load(&paths.instance_settings("work")?);
        assert_eq!(saved.try_get::<String>(INSTANCE_NAME).as_deref(), Some("work"));
        Ok(())
    }
}
