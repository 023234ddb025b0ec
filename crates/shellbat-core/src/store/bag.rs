use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use smallvec::SmallVec;
use tracing::{debug, warn};

use super::error::Result;
use super::fs::read_file;

#[derive(Debug, Clone, PartialEq)]
struct Property {
    name: String,
    value: Value,
}

/// Case-insensitive set of named JSON values.
///
/// Names keep the casing they were first written with; lookups ignore case.
#[derive(Clone, Default, PartialEq)]
pub struct PropertyBag {
    values: BTreeMap<String, Property>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(&key.to_lowercase())
    }

    /// Raw stored value
    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.values.get(&key.to_lowercase()).map(|p| &p.value)
    }

    /// Stored value converted to `T`, or `default` if unset or not convertible
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.try_get(key).unwrap_or(default)
    }

    pub fn try_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_value(key).and_then(convert)
    }

    /// Store a value, returning whether it differs from the previous one
    pub fn set_value(&mut self, key: &str, value: Value) -> bool {
        if key.is_empty() {
            return false;
        }

        match self.values.get_mut(&key.to_lowercase()) {
            Some(existing) if existing.value == value => false,
            Some(existing) => {
                existing.value = value;
                true
            }
            None => {
                self.values.insert(
                    key.to_lowercase(),
                    Property {
                        name: key.to_string(),
                        value,
                    },
                );
                true
            }
        }
    }

    pub fn set<V: Serialize>(&mut self, key: &str, value: V) -> Result<bool> {
        let value = serde_json::to_value(value)?;
        Ok(self.set_value(key, value))
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(&key.to_lowercase()).is_some()
    }

    /// Declared names and values, ordered case-insensitively
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.values().map(|p| (p.name.as_str(), &p.value))
    }

    /// Replace all values with `other`, returning names that changed
    pub fn replace_with(&mut self, other: PropertyBag) -> SmallVec<[String; 8]> {
        let mut changed = SmallVec::new();

        for (key, property) in &self.values {
            if !other.values.contains_key(key) {
                changed.push(property.name.clone());
            }
        }
        for (key, property) in &other.values {
            if self.values.get(key).map(|p| &p.value) != Some(&property.value) {
                changed.push(property.name.clone());
            }
        }

        self.values = other.values;
        changed
    }

    pub fn from_json(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    pub fn to_json_pretty(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Read a document; `Ok(None)` when the file does not exist
    pub fn read(path: &Path) -> Result<Option<Self>> {
        match read_file(path)? {
            Some(data) => Ok(Some(Self::from_json(&data)?)),
            None => Ok(None),
        }
    }

    /// Read a document, falling back to an empty bag on any failure
    pub fn load(path: &Path) -> Self {
        match Self::read(path) {
            Ok(Some(bag)) => {
                debug!("Loaded {} properties from {:?}", bag.len(), path);
                bag
            }
            Ok(None) => {
                debug!("No settings at {:?}, using defaults", path);
                Self::default()
            }
            Err(e) => {
                warn!("Failed to load settings from {:?}: {}", path, e);
                Self::default()
            }
        }
    }
}

/// Convert a stored value, accepting JSON literals written as strings
fn convert<T: DeserializeOwned>(value: &Value) -> Option<T> {
    if let Ok(converted) = T::deserialize(value) {
        return Some(converted);
    }
    match value {
        Value::String(text) => serde_json::from_str(text.trim()).ok(),
        _ => None,
    }
}

impl fmt::Debug for PropertyBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl Serialize for PropertyBag {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PropertyBag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        let mut bag = PropertyBag::new();
        for (name, value) in map {
            bag.set_value(&name, value);
        }
        Ok(bag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unset_key_returns_default() {
        let bag = PropertyBag::new();
        assert_eq!(bag.get("maximumHistoryEntries", 100), 100);
        assert_eq!(bag.get::<Option<String>>("theme", None), None);
    }

    #[test]
    fn keys_are_case_insensitive_and_keep_first_casing() {
        let mut bag = PropertyBag::new();
        assert!(bag.set_value("BackupsMaxDays", json!(30)));
        assert!(!bag.set_value("backupsmaxdays", json!(30)));
        assert!(bag.set_value("BACKUPSMAXDAYS", json!(7)));

        assert_eq!(bag.get("backupsMaxDays", 0), 7);
        let names: Vec<_> = bag.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["BackupsMaxDays"]);
    }

    #[test]
    fn conversion_failure_falls_back() {
        let mut bag = PropertyBag::new();
        bag.set_value("size", json!("large"));
        bag.set_value("count", json!("42"));
        bag.set_value("flag", json!("true"));

        assert_eq!(bag.get("size", 96), 96);
        assert_eq!(bag.get("count", 0), 42);
        assert!(bag.get("flag", false));
        assert_eq!(bag.get("size", String::new()), "large");
    }

    #[test]
    fn json_round_trip_preserves_every_value() -> Result<()> {
        let mut bag = PropertyBag::new();
        bag.set("sendErrorReport", false)?;
        bag.set("shortcuts", json!({ "OpenHistory": "Ctrl+H" }))?;
        bag.set("entries", vec![json!({ "locationKey": "C:\\" })])?;
        bag.set_value("nothing", Value::Null);

        let restored = PropertyBag::from_json(&bag.to_json_pretty()?)?;
        assert_eq!(restored, bag);
        Ok(())
    }

    #[test]
    fn malformed_document_is_an_error_but_load_degrades() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("broken.json");
        std::fs::write(&path, b"{ not json")?;

        assert!(PropertyBag::read(&path).is_err());
        assert!(PropertyBag::load(&path).is_empty());

        std::fs::write(&path, b"[1, 2, 3]")?;
        assert!(PropertyBag::load(&path).is_empty());
        Ok(())
    }

    #[test]
    fn replace_reports_added_changed_and_removed() {
        let mut bag = PropertyBag::new();
        bag.set_value("kept", json!(1));
        bag.set_value("changed", json!(1));
        bag.set_value("removed", json!(1));

        let mut fresh = PropertyBag::new();
        fresh.set_value("kept", json!(1));
        fresh.set_value("changed", json!(2));
        fresh.set_value("added", json!(3));

        let mut changed = bag.replace_with(fresh).to_vec();
        changed.sort();
        assert_eq!(changed, vec!["added", "changed", "removed"]);
        assert_eq!(bag.get("changed", 0), 2);
        assert!(!bag.contains("removed"));
    }
}
