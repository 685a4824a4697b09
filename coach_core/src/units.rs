//! Weight unit conversion.
//!
//! Weights are canonicalized to kilograms at the boundary. The input unit is
//! never persisted; every stored weight field is kg.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exact international avoirdupois pound
pub const KG_PER_LB: f64 = 0.453_592_37;

/// Unit a weight is entered or displayed in
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lb,
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightUnit::Kg => f.write_str("kg"),
            WeightUnit::Lb => f.write_str("lb"),
        }
    }
}

impl FromStr for WeightUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "kg" | "kgs" | "kilogram" | "kilograms" => Ok(WeightUnit::Kg),
            "lb" | "lbs" | "pound" | "pounds" => Ok(WeightUnit::Lb),
            other => Err(Error::Validation(format!(
                "unknown weight unit '{}' (expected kg or lb)",
                other
            ))),
        }
    }
}

/// A weight as entered by a caller
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Weight {
    pub value: f64,
    pub unit: WeightUnit,
}

impl Weight {
    pub fn new(value: f64, unit: WeightUnit) -> Self {
        Self { value, unit }
    }

    pub fn kg(value: f64) -> Self {
        Self::new(value, WeightUnit::Kg)
    }

    pub fn lb(value: f64) -> Self {
        Self::new(value, WeightUnit::Lb)
    }

    /// Canonical kilogram value
    pub fn to_kg(&self) -> f64 {
        to_kg(self.value, self.unit)
    }

    /// Canonical kilogram value, rejecting negative or non-finite input
    pub fn validated_kg(&self) -> Result<f64> {
        if !self.value.is_finite() || self.value < 0.0 {
            return Err(Error::Validation(format!(
                "weight must be a non-negative number, got {} {}",
                self.value, self.unit
            )));
        }
        Ok(self.to_kg())
    }
}

/// Convert a value in `unit` to kilograms
pub fn to_kg(value: f64, unit: WeightUnit) -> f64 {
    match unit {
        WeightUnit::Kg => value,
        WeightUnit::Lb => value * KG_PER_LB,
    }
}

/// Convert a kilogram value to `unit`
pub fn from_kg(kg: f64, unit: WeightUnit) -> f64 {
    match unit {
        WeightUnit::Kg => kg,
        WeightUnit::Lb => kg / KG_PER_LB,
    }
}
