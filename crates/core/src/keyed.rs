//! Insertion-ordered string-keyed list.
//!
//! The catalog and the report tree are both keyed mappings whose order is meaningful for display,
//! so they share this small ordered map. It (de)serialises as a plain mapping while keeping the
//! source order.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

/// A mapping from string keys to values that iterates in insertion order.
///
/// Lookups are linear; the lists held here have at most a few dozen entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyedList<T> {
    entries: Vec<(String, T)>,
}

impl<T> Default for KeyedList<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> KeyedList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `key`, replacing (in place) any existing entry with the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: T) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: T) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.iter_mut().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Default> KeyedList<T> {
    /// Mutable access to the entry under `key`, appending a default value first if absent.
    pub fn entry_or_default(&mut self, key: &str) -> &mut T {
        let index = match self.entries.iter().position(|(k, _)| k == key) {
            Some(index) => index,
            None => {
                self.entries.push((key.to_string(), T::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }
}

impl<K: Into<String>, T> FromIterator<(K, T)> for KeyedList<T> {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        let mut list = Self::new();
        for (key, value) in iter {
            list.insert(key, value);
        }
        list
    }
}

impl<T: Serialize> Serialize for KeyedList<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for KeyedList<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct KeyedListVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for KeyedListVisitor<T> {
            type Value = KeyedList<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping with string keys")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut list = KeyedList::new();
                while let Some((key, value)) = access.next_entry::<String, T>()? {
                    if list.contains_key(&key) {
                        return Err(serde::de::Error::custom(format!("duplicate key '{key}'")));
                    }
                    list.insert(key, value);
                }
                Ok(list)
            }
        }

        deserializer.deserialize_map(KeyedListVisitor(PhantomData))
    }
}
