use std::path::Path;

/// Answers whether a location still exists
pub trait LocationProbe: Send + Sync {
    fn exists(&self, location_key: &str) -> bool;
}

impl<F> LocationProbe for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn exists(&self, location_key: &str) -> bool {
        self(location_key)
    }
}

/// Probe backed by the local filesystem.
///
/// Keys that are not filesystem paths (shell namespace items such as
/// `::{GUID}`) are assumed to exist.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSystemProbe;

impl LocationProbe for FileSystemProbe {
    fn exists(&self, location_key: &str) -> bool {
        if location_key.starts_with("::") {
            return true;
        }
        Path::new(location_key).exists()
    }
}
