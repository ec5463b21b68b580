//! Update rules for first-class fields, shared by every entity kind.

use super::lifetime::normalize_timestamp;
use super::{EntityKind, Meta};
use crate::error::{GrenmlError, Result};
use crate::properties::PropertyUpdate;
use indexmap::IndexSet;

fn single_valued(attribute: &str) -> GrenmlError {
    GrenmlError::invalid(attribute, "single-valued field cannot be appended to")
}

/// Header fields. Returns `None` when `attribute` is not a header field.
pub(crate) fn meta_field(
    kind: EntityKind,
    meta: &mut Meta,
    attribute: &str,
    update: &PropertyUpdate,
) -> Option<Result<()>> {
    let result = match attribute {
        "id" if update.remove => Err(GrenmlError::NonRemovable {
            kind,
            attribute: attribute.to_string(),
        }),
        "id" => Err(GrenmlError::invalid(attribute, "identifiers are immutable")),
        "name" if update.remove => Err(GrenmlError::NonRemovable {
            kind,
            attribute: attribute.to_string(),
        }),
        "name" => required_text(attribute, &mut meta.name, update),
        "short_name" => optional_text(attribute, &mut meta.short_name, update),
        "version" => optional_text(attribute, &mut meta.version, update),
        _ => return None,
    };
    Some(result)
}

fn required_text(attribute: &str, slot: &mut String, update: &PropertyUpdate) -> Result<()> {
    if update.append {
        return Err(single_valued(attribute));
    }
    if let Some(value) = &update.value {
        *slot = value.clone();
    }
    Ok(())
}

/// Single optional string. Removing with a value only clears a match.
pub(crate) fn optional_text(
    attribute: &str,
    slot: &mut Option<String>,
    update: &PropertyUpdate,
) -> Result<()> {
    if update.append {
        return Err(single_valued(attribute));
    }
    match (&update.value, update.remove) {
        (Some(value), true) if slot.as_deref() != Some(value.as_str()) => {
            Err(GrenmlError::ValueNotFound {
                key: attribute.to_string(),
                value: value.clone(),
            })
        }
        (_, true) => {
            *slot = None;
            Ok(())
        }
        (value, false) => {
            *slot = value.clone();
            Ok(())
        }
    }
}

pub(crate) fn optional_timestamp(
    attribute: &str,
    slot: &mut Option<String>,
    update: &PropertyUpdate,
) -> Result<()> {
    if update.remove {
        return optional_text(attribute, slot, update);
    }
    if update.append {
        return Err(single_valued(attribute));
    }
    let raw = update.value.as_deref().unwrap_or_default();
    *slot = Some(normalize_timestamp(attribute, raw)?);
    Ok(())
}

pub(crate) fn optional_number(
    attribute: &str,
    slot: &mut Option<f64>,
    update: &PropertyUpdate,
    check: fn(f64) -> Result<()>,
) -> Result<()> {
    if update.append {
        return Err(single_valued(attribute));
    }
    if update.remove {
        *slot = None;
        return Ok(());
    }
    let raw = update.value.as_deref().unwrap_or_default();
    let number: f64 = raw
        .trim()
        .parse()
        .map_err(|_| GrenmlError::invalid(attribute, format!("'{}' is not a number", raw)))?;
    check(number)?;
    *slot = Some(number);
    Ok(())
}

/// Set-valued field. Setting replaces the whole set with one element;
/// removing without a value clears it.
pub(crate) fn string_set(
    attribute: &str,
    set: &mut IndexSet<String>,
    update: &PropertyUpdate,
) -> Result<()> {
    match (&update.value, update.append, update.remove) {
        (Some(value), _, true) => {
            if set.shift_remove(value.as_str()) {
                Ok(())
            } else {
                Err(GrenmlError::ValueNotFound {
                    key: attribute.to_string(),
                    value: value.clone(),
                })
            }
        }
        (None, _, true) => {
            set.clear();
            Ok(())
        }
        (Some(value), true, false) => {
            set.insert(value.clone());
            Ok(())
        }
        (Some(value), false, false) => {
            set.clear();
            set.insert(value.clone());
            Ok(())
        }
        (None, _, false) => Err(GrenmlError::invalid(attribute, "missing value")),
    }
}
