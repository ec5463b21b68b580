use crate::error::{GrenmlError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Case-insensitive multimap of extension properties.
///
/// Keys are folded to lowercase on every access. Values under a key keep
/// insertion order and are never deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyBag {
    entries: IndexMap<String, Vec<String>>,
}

/// One mutation request against a property (or a first-class field).
///
/// `append` and `remove` are mutually exclusive; [`PropertyUpdate::check`]
/// rejects a request carrying both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyUpdate {
    pub value: Option<String>,
    pub append: bool,
    pub remove: bool,
}

impl PropertyUpdate {
    pub fn new(value: Option<String>, append: bool, remove: bool) -> Self {
        Self {
            value,
            append,
            remove,
        }
    }

    /// Replace the current value(s) with `value`.
    pub fn set(value: impl Into<String>) -> Self {
        Self::new(Some(value.into()), false, false)
    }

    pub fn append(value: impl Into<String>) -> Self {
        Self::new(Some(value.into()), true, false)
    }

    /// Drop a single value.
    pub fn remove_value(value: impl Into<String>) -> Self {
        Self::new(Some(value.into()), false, true)
    }

    /// Drop the whole key.
    pub fn remove() -> Self {
        Self::new(None, false, true)
    }

    pub fn check(&self, attribute: &str) -> Result<()> {
        if self.append && self.remove {
            return Err(GrenmlError::ConflictingUpdate(attribute.to_string()));
        }
        if !self.remove && self.value.is_none() {
            return Err(GrenmlError::invalid(
                attribute,
                "a value is required unless removing",
            ));
        }
        Ok(())
    }
}

fn fold(key: &str) -> String {
    key.to_lowercase()
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &str, value: impl Into<String>) {
        self.entries.entry(fold(key)).or_default().push(value.into());
    }

    pub fn extend<I, S>(&mut self, key: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .entry(fold(key))
            .or_default()
            .extend(values.into_iter().map(Into::into));
    }

    /// Replace every value under `key`.
    pub fn replace<I, S>(&mut self, key: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .insert(fold(key), values.into_iter().map(Into::into).collect());
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(&fold(key)).map(Vec::as_slice)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&fold(key))
    }

    /// Remove the first occurrence of `value` under `key`. The key itself is
    /// dropped once its last value is gone.
    pub fn remove_value(&mut self, key: &str, value: &str) -> Result<()> {
        let folded = fold(key);
        let values = self
            .entries
            .get_mut(&folded)
            .ok_or_else(|| GrenmlError::ValueNotFound {
                key: folded.clone(),
                value: value.to_string(),
            })?;
        let position = values
            .iter()
            .position(|v| v == value)
            .ok_or_else(|| GrenmlError::ValueNotFound {
                key: folded.clone(),
                value: value.to_string(),
            })?;
        values.remove(position);
        if values.is_empty() {
            self.entries.shift_remove(&folded);
        }
        Ok(())
    }

    pub fn remove_key(&mut self, key: &str) -> Result<Vec<String>> {
        let folded = fold(key);
        self.entries
            .shift_remove(&folded)
            .ok_or(GrenmlError::KeyNotFound(folded))
    }

    /// Apply an update request to `key`.
    pub fn apply(&mut self, key: &str, update: &PropertyUpdate) -> Result<()> {
        update.check(key)?;
        match (&update.value, update.append, update.remove) {
            (Some(value), false, true) => self.remove_value(key, value),
            (None, _, true) => self.remove_key(key).map(|_| ()),
            (Some(value), true, _) => {
                self.add(key, value.as_str());
                Ok(())
            }
            (Some(value), false, false) => {
                self.replace(key, [value.as_str()]);
                Ok(())
            }
            (None, _, false) => Err(GrenmlError::invalid(key, "missing value")),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
