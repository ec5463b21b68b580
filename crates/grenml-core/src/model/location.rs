use crate::error::{GrenmlError, Result};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Geographic placement of an Institution or Node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    pub unlocode: Option<String>,
    pub addresses: IndexSet<String>,
}

pub fn check_latitude(latitude: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(GrenmlError::invalid(
            "latitude",
            format!("{} is outside [-90, 90]", latitude),
        ));
    }
    Ok(())
}

pub fn check_longitude(longitude: f64) -> Result<()> {
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(GrenmlError::invalid(
            "longitude",
            format!("{} is outside [-180, 180]", longitude),
        ));
    }
    Ok(())
}

pub fn check_altitude(altitude: f64) -> Result<()> {
    if !altitude.is_finite() {
        return Err(GrenmlError::invalid("altitude", "must be a finite number"));
    }
    Ok(())
}

impl Location {
    /// Value-domain check applied when an entity is built.
    pub fn check(&self) -> Result<()> {
        if let Some(latitude) = self.latitude {
            check_latitude(latitude)?;
        }
        if let Some(longitude) = self.longitude {
            check_longitude(longitude)?;
        }
        if let Some(altitude) = self.altitude {
            check_altitude(altitude)?;
        }
        Ok(())
    }

    /// First address, if any.
    pub fn address(&self) -> Option<&str> {
        self.addresses.first().map(String::as_str)
    }

    /// Returns false if the address was already present.
    pub fn add_address(&mut self, address: impl Into<String>) -> bool {
        self.addresses.insert(address.into())
    }

    pub fn add_addresses<I, S>(&mut self, addresses: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.addresses.extend(addresses.into_iter().map(Into::into));
    }

    pub fn remove_address(&mut self, address: &str) -> Result<()> {
        if self.addresses.shift_remove(address) {
            Ok(())
        } else {
            Err(GrenmlError::ValueNotFound {
                key: "address".to_string(),
                value: address.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_inclusive() {
        let location = Location {
            latitude: Some(90.0),
            longitude: Some(-180.0),
            ..Location::default()
        };
        assert!(location.check().is_ok());
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        assert!(check_latitude(90.5).is_err());
        assert!(check_longitude(181.0).is_err());
        assert!(check_latitude(f64::NAN).is_err());
        assert!(check_altitude(f64::INFINITY).is_err());
    }

    #[test]
    fn test_addresses() -> Result<()> {
        let mut location = Location::default();
        assert!(location.add_address("1 Main St"));
        assert!(!location.add_address("1 Main St"));
        location.add_addresses(["2 Side Rd"]);
        assert_eq!(location.address(), Some("1 Main St"));
        location.remove_address("1 Main St")?;
        assert_eq!(location.address(), Some("2 Side Rd"));
        assert!(location.remove_address("nowhere").unwrap_err().is_value_error());
        Ok(())
    }
}
