use super::location::{check_altitude, check_latitude, check_longitude, Location};
use super::update::{meta_field, optional_number, optional_text, string_set};
use super::{EntityKind, GrenmlObject, Meta, MetaBuilder};
use crate::error::{GrenmlError, Result};
use crate::properties::PropertyUpdate;
use crate::query::{FieldTable, FieldValue, Matchable};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

pub const DEFAULT_INSTITUTION_TYPE: &str = "unknown";

/// An organisation owning network resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Institution {
    pub meta: Meta,
    /// Never empty; falls back to [`DEFAULT_INSTITUTION_TYPE`].
    types: IndexSet<String>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct InstitutionBuilder {
    meta: MetaBuilder,
    types: IndexSet<String>,
    location: Location,
}

impl_identity!(Institution);

fn default_types() -> IndexSet<String> {
    IndexSet::from([DEFAULT_INSTITUTION_TYPE.to_string()])
}

impl InstitutionBuilder {
    meta_builder_methods!();

    pub fn institution_type(mut self, institution_type: impl Into<String>) -> Self {
        self.types.insert(institution_type.into());
        self
    }

    pub fn types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types.extend(types.into_iter().map(Into::into));
        self
    }

    pub fn latitude(mut self, latitude: f64) -> Self {
        self.location.latitude = Some(latitude);
        self
    }

    pub fn longitude(mut self, longitude: f64) -> Self {
        self.location.longitude = Some(longitude);
        self
    }

    pub fn altitude(mut self, altitude: f64) -> Self {
        self.location.altitude = Some(altitude);
        self
    }

    pub fn unlocode(mut self, unlocode: impl Into<String>) -> Self {
        self.location.unlocode = Some(unlocode.into());
        self
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.location.add_address(address);
        self
    }

    pub fn addresses<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.location.add_addresses(addresses);
        self
    }

    pub fn build(self) -> Result<Institution> {
        self.location.check()?;
        let types = if self.types.is_empty() {
            default_types()
        } else {
            self.types
        };
        Ok(Institution {
            meta: self.meta.finish(EntityKind::Institution),
            types,
            location: self.location,
        })
    }
}

impl Institution {
    pub fn builder(name: impl Into<String>) -> InstitutionBuilder {
        InstitutionBuilder {
            meta: MetaBuilder::new(name),
            types: IndexSet::new(),
            location: Location::default(),
        }
    }

    /// Institution with a determinate ID and no location.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: MetaBuilder::new(name).finish(EntityKind::Institution),
            types: default_types(),
            location: Location::default(),
        }
    }

    pub fn types(&self) -> &IndexSet<String> {
        &self.types
    }

    /// Primary type tag.
    pub fn institution_type(&self) -> &str {
        self.types
            .first()
            .map_or(DEFAULT_INSTITUTION_TYPE, String::as_str)
    }

    /// Adding a concrete type drops the "unknown" placeholder.
    pub fn add_type(&mut self, institution_type: impl Into<String>) {
        let institution_type = institution_type.into();
        if institution_type != DEFAULT_INSTITUTION_TYPE {
            self.types.shift_remove(DEFAULT_INSTITUTION_TYPE);
        }
        self.types.insert(institution_type);
    }

    pub fn remove_type(&mut self, institution_type: &str) -> Result<()> {
        if !self.types.shift_remove(institution_type) {
            return Err(GrenmlError::ValueNotFound {
                key: "type".to_string(),
                value: institution_type.to_string(),
            });
        }
        if self.types.is_empty() {
            self.types = default_types();
        }
        Ok(())
    }

    pub fn address(&self) -> Option<&str> {
        self.location.address()
    }

    pub fn add_address(&mut self, address: impl Into<String>) -> bool {
        self.location.add_address(address)
    }

    pub fn add_addresses<I, S>(&mut self, addresses: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.location.add_addresses(addresses);
    }

    pub fn remove_address(&mut self, address: &str) -> Result<()> {
        self.location.remove_address(address)
    }

    fn update_types(&mut self, update: &PropertyUpdate) -> Result<()> {
        if let (Some(value), true, false) = (&update.value, update.append, update.remove) {
            self.add_type(value.clone());
            return Ok(());
        }
        let result = string_set("type", &mut self.types, update);
        if self.types.is_empty() {
            self.types = default_types();
        }
        result
    }

    /// Update a first-class field. `None` when `attribute` is not one.
    pub(crate) fn update_field(
        &mut self,
        attribute: &str,
        update: &PropertyUpdate,
    ) -> Option<Result<()>> {
        if let Some(result) = meta_field(Self::KIND, &mut self.meta, attribute, update) {
            return Some(result);
        }
        if matches!(attribute, "type" | "types" | "institution_type") {
            return Some(self.update_types(update));
        }
        let location = &mut self.location;
        let result = match attribute {
            "latitude" => optional_number(attribute, &mut location.latitude, update, check_latitude),
            "longitude" => {
                optional_number(attribute, &mut location.longitude, update, check_longitude)
            }
            "altitude" => optional_number(attribute, &mut location.altitude, update, check_altitude),
            "unlocode" => optional_text(attribute, &mut location.unlocode, update),
            "address" | "addresses" => string_set("address", &mut location.addresses, update),
            _ => return None,
        };
        Some(result)
    }
}

impl GrenmlObject for Institution {
    const KIND: EntityKind = EntityKind::Institution;

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }
}

const INSTITUTION_FIELDS: FieldTable<Institution> = &[
    ("id", |i| FieldValue::Str(&i.meta.id)),
    ("name", |i| FieldValue::Str(&i.meta.name)),
    ("short_name", |i| FieldValue::opt_str(&i.meta.short_name)),
    ("version", |i| FieldValue::opt_str(&i.meta.version)),
    ("type", |i| FieldValue::Str(i.institution_type())),
    ("institution_type", |i| FieldValue::Str(i.institution_type())),
    ("types", |i| FieldValue::set(&i.types)),
    ("latitude", |i| FieldValue::opt_num(i.location.latitude)),
    ("longitude", |i| FieldValue::opt_num(i.location.longitude)),
    ("altitude", |i| FieldValue::opt_num(i.location.altitude)),
    ("unlocode", |i| FieldValue::opt_str(&i.location.unlocode)),
    ("address", |i| FieldValue::set(&i.location.addresses)),
    ("addresses", |i| FieldValue::set(&i.location.addresses)),
];

impl Matchable for Institution {
    fn field_table() -> FieldTable<Self> {
        INSTITUTION_FIELDS
    }
}
