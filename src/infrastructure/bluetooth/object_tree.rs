//! Snapshot of BlueZ managed objects
//!
//! A typed view of `org.freedesktop.DBus.ObjectManager.GetManagedObjects`.
//! Only property types the programmer inspects are kept; everything else is
//! recorded as [`PropertyValue::Other`].

use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Bool(bool),
    Bytes(Vec<u8>),
    Other,
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

pub type PropertyMap = HashMap<String, PropertyValue>;
pub type InterfaceMap = HashMap<String, PropertyMap>;

/// Immutable per-session snapshot: object path -> interface -> properties.
///
/// Paths are kept ordered so lookups that can match several objects always
/// pick the same one.
#[derive(Debug, Clone, Default)]
pub struct RemoteObjectTree {
    objects: BTreeMap<String, InterfaceMap>,
}

impl RemoteObjectTree {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the properties of one interface on one object
    #[cfg(test)]
    pub fn insert(&mut self, path: &str, interface: &str, properties: PropertyMap) {
        self.objects
            .entry(path.to_string())
            .or_default()
            .insert(interface.to_string(), properties);
    }

    #[cfg(test)]
    pub fn with_object<I, K>(mut self, path: &str, interface: &str, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, PropertyValue)>,
        K: Into<String>,
    {
        let props = properties.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.insert(path, interface, props);
        self
    }

    pub fn property(&self, path: &str, interface: &str, name: &str) -> Option<&PropertyValue> {
        self.objects.get(path)?.get(interface)?.get(name)
    }

    /// Objects in path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &InterfaceMap)> {
        self.objects.iter().map(|(path, ifaces)| (path.as_str(), ifaces))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl FromIterator<(String, InterfaceMap)> for RemoteObjectTree {
    fn from_iter<T: IntoIterator<Item = (String, InterfaceMap)>>(iter: T) -> Self {
        Self {
            objects: iter.into_iter().collect(),
        }
    }
}
