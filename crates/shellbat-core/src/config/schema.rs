//! Declared settings properties.
//!
//! Each document has a table of known properties with a type, a default
//! and an optional range. Keys outside the table are kept as-is.

use serde_json::Value;

use crate::store::{DurableStore, Result, StoreError, DEFAULT_SAVE_DELAY};
use crate::utils::eq_ignore_case;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Bool { default: bool },
    Int { default: i64, min: i64, max: i64 },
    Text { default: Option<&'static str> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub name: &'static str,
    pub kind: PropertyKind,
    pub description: &'static str,
}

impl PropertyDescriptor {
    pub const fn bool(name: &'static str, default: bool, description: &'static str) -> Self {
        Self {
            name,
            kind: PropertyKind::Bool { default },
            description,
        }
    }

    pub const fn int(
        name: &'static str,
        default: i64,
        min: i64,
        max: i64,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            kind: PropertyKind::Int { default, min, max },
            description,
        }
    }

    pub const fn text(name: &'static str, default: Option<&'static str>, description: &'static str) -> Self {
        Self {
            name,
            kind: PropertyKind::Text { default },
            description,
        }
    }

    pub fn default_value(&self) -> Value {
        match self.kind {
            PropertyKind::Bool { default } => Value::Bool(default),
            PropertyKind::Int { default, .. } => Value::from(default),
            PropertyKind::Text { default } => default.map_or(Value::Null, Value::from),
        }
    }

    /// Effective value for a stored one, falling back to the default
    pub fn resolve(&self, store: &DurableStore) -> Value {
        match self.kind {
            PropertyKind::Bool { default } => Value::Bool(store.get(self.name, default)),
            PropertyKind::Int { default, min, max } => {
                Value::from(store.get(self.name, default).clamp(min, max))
            }
            PropertyKind::Text { .. } => store
                .try_get::<String>(self.name)
                .map_or_else(|| self.default_value(), Value::String),
        }
    }

    /// Parse user text into a value of this property's type
    pub fn parse(&self, raw: &str) -> Result<Value> {
        let text = raw.trim();
        let invalid = || StoreError::InvalidValue {
            name: self.name.to_string(),
            value: raw.to_string(),
        };

        match self.kind {
            PropertyKind::Bool { .. } => parse_bool(text).map(Value::Bool).ok_or_else(invalid),
            PropertyKind::Int { min, max, .. } => text
                .parse::<i64>()
                .map(|v| Value::from(v.clamp(min, max)))
                .map_err(|_| invalid()),
            PropertyKind::Text { .. } => Ok(Value::String(raw.to_string())),
        }
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn find<'a>(schema: &'a [PropertyDescriptor], name: &str) -> Option<&'a PropertyDescriptor> {
    schema.iter().find(|d| eq_ignore_case(d.name, name))
}

/// One row of a settings listing
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyValue {
    pub name: String,
    pub value: Value,
    pub declared: Option<&'static PropertyDescriptor>,
    pub is_default: bool,
}

/// Declared properties in table order, then every other stored key
pub fn list(store: &DurableStore, schema: &'static [PropertyDescriptor]) -> Vec<PropertyValue> {
    let mut rows: Vec<PropertyValue> = schema
        .iter()
        .map(|d| PropertyValue {
            name: d.name.to_string(),
            value: d.resolve(store),
            declared: Some(d),
            is_default: !store.contains(d.name),
        })
        .collect();

    for (name, value) in store.snapshot().iter() {
        if find(schema, name).is_none() {
            rows.push(PropertyValue {
                name: name.to_string(),
                value: value.clone(),
                declared: None,
                is_default: false,
            });
        }
    }
    rows
}

/// Current value of a property, declared or not
pub fn get(store: &DurableStore, schema: &[PropertyDescriptor], name: &str) -> Option<Value> {
    match find(schema, name) {
        Some(descriptor) => Some(descriptor.resolve(store)),
        None => store.try_get(name),
    }
}

/// Set a property from user text.
///
/// Declared properties are parsed by kind. Other keys are stored as JSON when
/// the text is valid JSON, otherwise as a string.
pub fn set_from_str(
    store: &DurableStore,
    schema: &[PropertyDescriptor],
    name: &str,
    raw: &str,
) -> Result<bool> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidValue {
            name: name.to_string(),
            value: raw.to_string(),
        });
    }

    let (key, value) = match find(schema, name) {
        Some(descriptor) => (descriptor.name, descriptor.parse(raw)?),
        None => (
            name,
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())),
        ),
    };
    Ok(store.set(key, value))
}

/// A settings document described by a property table
pub trait SettingsDocument {
    fn document(&self) -> &DurableStore;

    fn schema(&self) -> &'static [PropertyDescriptor];

    fn get(&self, name: &str) -> Option<Value> {
        get(self.document(), self.schema(), name)
    }

    fn list(&self) -> Vec<PropertyValue> {
        list(self.document(), self.schema())
    }

    /// Set a property from user text and schedule a save
    fn set_from_str(&self, name: &str, raw: &str) -> Result<bool> {
        let changed = set_from_str(self.document(), self.schema(), name, raw)?;
        if changed {
            self.document().save(DEFAULT_SAVE_DELAY)?;
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SCHEMA: &[PropertyDescriptor] = &[
        PropertyDescriptor::bool("enabled", true, "Enabled"),
        PropertyDescriptor::int("size", 96, 16, 512, "Size"),
        PropertyDescriptor::text("name", None, "Name"),
    ];

    fn store() -> (tempfile::TempDir, DurableStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DurableStore::load(dir.path().join("s.json"));
        (dir, store)
    }

    #[test]
    fn defaults_and_clamping() {
        let (_dir, store) = store();
        assert_eq!(get(&store, SCHEMA, "ENABLED"), Some(json!(true)));
        assert_eq!(get(&store, SCHEMA, "size"), Some(json!(96)));
        assert_eq!(get(&store, SCHEMA, "name"), Some(Value::Null));
        assert_eq!(get(&store, SCHEMA, "other"), None);

        store.set("size", 4096);
        assert_eq!(get(&store, SCHEMA, "size"), Some(json!(512)));
        store.set("size", "not a number");
        assert_eq!(get(&store, SCHEMA, "size"), Some(json!(96)));
    }

    #[test]
    fn set_from_str_parses_by_kind() {
        let (_dir, store) = store();
        assert!(set_from_str(&store, SCHEMA, "Enabled", "off").unwrap());
        assert!(set_from_str(&store, SCHEMA, "size", " 2 ").unwrap());
        assert_eq!(get(&store, SCHEMA, "size"), Some(json!(16)));
        assert!(!set_from_str(&store, SCHEMA, "size", "16").unwrap());

        let err = set_from_str(&store, SCHEMA, "enabled", "maybe").unwrap_err();
        assert!(matches!(err, StoreError::InvalidValue { .. }));
        assert!(set_from_str(&store, SCHEMA, "", "1").is_err());

        set_from_str(&store, SCHEMA, "theme", "dark").unwrap();
        set_from_str(&store, SCHEMA, "zoom", "1.5").unwrap();
        assert_eq!(store.try_get::<String>("theme").as_deref(), Some("dark"));
        assert_eq!(store.try_get::<f64>("zoom"), Some(1.5));
    }

    #[test]
    fn list_includes_side_table() {
        let (_dir, store) = store();
        store.set("size", 128);
        store.set("Custom", json!({ "a": 1 }));

        let rows = list(&store, SCHEMA);
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["enabled", "size", "name", "Custom"]);
        assert!(rows[0].is_default);
        assert!(!rows[1].is_default);
        assert!(rows[3].declared.is_none());
    }
}
