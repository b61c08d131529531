//! String-keyed device configuration properties (`touch.size.calibration` etc).

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap {
    values: BTreeMap<String, String>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Parse a property, warning and returning `None` when the value is malformed.
    pub fn parse<T>(&self, key: &str) -> Option<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.get(key)?;
        match raw.trim().parse() {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("Ignoring malformed value '{}' for {}: {}", raw, key, e);
                None
            }
        }
    }

    /// Booleans accept `0`/`1` as well as `true`/`false`.
    pub fn parse_bool(&self, key: &str) -> Option<bool> {
        let raw = self.get(key)?;
        match raw.trim() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            other => {
                log::warn!("Ignoring malformed boolean '{}' for {}", other, key);
                None
            }
        }
    }

    /// Flatten a TOML table into dotted keys.
    pub fn from_toml(table: &toml::Table) -> Self {
        let mut map = Self::new();
        flatten("", table, &mut map);
        map
    }
}

fn flatten(prefix: &str, table: &toml::Table, out: &mut PropertyMap) {
    for (key, value) in table {
        let full = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            toml::Value::Table(inner) => flatten(&full, inner, out),
            toml::Value::String(s) => out.insert(full, s.clone()),
            other => out.insert(full, other.to_string()),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}
