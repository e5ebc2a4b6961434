//! MCU Specification
//!
//! The canonical record for one microcontroller part. Everything else in the
//! crate reads physical facts about a part from here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },
    #[error("{min_field} ({min}) is greater than {max_field} ({max})")]
    InvertedRange {
        min_field: &'static str,
        max_field: &'static str,
        min: String,
        max: String,
    },
    #[error("{field} is not a finite number")]
    NotFinite { field: &'static str },
    #[error("board id '{0}' may only contain ASCII letters, digits, '_', '-' and '.' and must not start with '.'")]
    UnsafeBoardId(String),
    #[error("{field} '{value}' is not a numeric literal")]
    InvalidLiteral { field: &'static str, value: String },
}

/// Field values for [`McuSpecification::create`].
#[derive(Debug, Clone, Default)]
pub struct McuFields {
    pub part_number: String,
    pub family: String,
    pub core: String,
    pub package: String,
    pub pin_count: u32,
    pub flash_bytes: u64,
    pub ram_bytes: u64,
    pub operating_voltage_min: f64,
    pub operating_voltage_max: f64,
    pub temperature_min: i32,
    pub temperature_max: i32,
    pub max_frequency_hz: Option<u64>,
    pub peripherals: BTreeSet<String>,
    pub features: BTreeSet<String>,
}

/// One microcontroller part. Immutable once created; equality and hashing
/// go by part number only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McuSpecification {
    part_number: String,
    family: String,
    core: String,
    package: String,
    pin_count: u32,
    flash_bytes: u64,
    ram_bytes: u64,
    operating_voltage_min: f64,
    operating_voltage_max: f64,
    temperature_min: i32,
    temperature_max: i32,
    #[serde(default)]
    max_frequency_hz: Option<u64>,
    #[serde(default)]
    peripherals: BTreeSet<String>,
    #[serde(default)]
    features: BTreeSet<String>,
}

impl McuSpecification {
    /// Validate the fields and build the record.
    pub fn create(fields: McuFields) -> Result<Self, ValidationError> {
        let part_number = fields.part_number.trim().to_uppercase();
        if part_number.is_empty() {
            return Err(ValidationError::Empty { field: "part_number" });
        }
        if fields.family.trim().is_empty() {
            return Err(ValidationError::Empty { field: "family" });
        }
        if fields.package.trim().is_empty() {
            return Err(ValidationError::Empty { field: "package" });
        }
        if fields.pin_count == 0 {
            return Err(ValidationError::NotPositive { field: "pin_count" });
        }
        if fields.flash_bytes == 0 {
            return Err(ValidationError::NotPositive { field: "flash_bytes" });
        }
        if fields.ram_bytes == 0 {
            return Err(ValidationError::NotPositive { field: "ram_bytes" });
        }
        if fields.max_frequency_hz == Some(0) {
            return Err(ValidationError::NotPositive { field: "max_frequency_hz" });
        }
        if !fields.operating_voltage_min.is_finite() {
            return Err(ValidationError::NotFinite { field: "operating_voltage_min" });
        }
        if !fields.operating_voltage_max.is_finite() {
            return Err(ValidationError::NotFinite { field: "operating_voltage_max" });
        }
        if fields.operating_voltage_min <= 0.0 {
            return Err(ValidationError::NotPositive { field: "operating_voltage_min" });
        }
        if fields.operating_voltage_min > fields.operating_voltage_max {
            return Err(ValidationError::InvertedRange {
                min_field: "operating_voltage_min",
                max_field: "operating_voltage_max",
                min: fields.operating_voltage_min.to_string(),
                max: fields.operating_voltage_max.to_string(),
            });
        }
        if fields.temperature_min > fields.temperature_max {
            return Err(ValidationError::InvertedRange {
                min_field: "temperature_min",
                max_field: "temperature_max",
                min: fields.temperature_min.to_string(),
                max: fields.temperature_max.to_string(),
            });
        }

        let core = match fields.core.trim() {
            "" => crate::mcu::family::UNKNOWN_CORE.to_string(),
            core => core.to_lowercase(),
        };

        Ok(Self {
            part_number,
            family: fields.family.trim().to_uppercase(),
            core,
            package: fields.package.trim().to_uppercase(),
            pin_count: fields.pin_count,
            flash_bytes: fields.flash_bytes,
            ram_bytes: fields.ram_bytes,
            operating_voltage_min: fields.operating_voltage_min,
            operating_voltage_max: fields.operating_voltage_max,
            temperature_min: fields.temperature_min,
            temperature_max: fields.temperature_max,
            max_frequency_hz: fields.max_frequency_hz,
            peripherals: fields
                .peripherals
                .into_iter()
                .map(|p| p.trim().to_uppercase())
                .filter(|p| !p.is_empty())
                .collect(),
            features: fields
                .features
                .into_iter()
                .map(|f| f.trim().to_lowercase())
                .filter(|f| !f.is_empty())
                .collect(),
        })
    }

    pub fn part_number(&self) -> &str {
        &self.part_number
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn core(&self) -> &str {
        &self.core
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn pin_count(&self) -> u32 {
        self.pin_count
    }

    pub fn flash_bytes(&self) -> u64 {
        self.flash_bytes
    }

    pub fn ram_bytes(&self) -> u64 {
        self.ram_bytes
    }

    pub fn operating_voltage(&self) -> (f64, f64) {
        (self.operating_voltage_min, self.operating_voltage_max)
    }

    pub fn temperature_range(&self) -> (i32, i32) {
        (self.temperature_min, self.temperature_max)
    }

    pub fn max_frequency_hz(&self) -> Option<u64> {
        self.max_frequency_hz
    }

    pub fn peripherals(&self) -> &BTreeSet<String> {
        &self.peripherals
    }

    pub fn features(&self) -> &BTreeSet<String> {
        &self.features
    }

    pub fn has_peripheral(&self, name: &str) -> bool {
        self.peripherals.contains(&name.to_uppercase())
    }

    pub fn has_feature(&self, tag: &str) -> bool {
        self.features.contains(&tag.to_lowercase())
    }
}

impl PartialEq for McuSpecification {
    fn eq(&self, other: &Self) -> bool {
        self.part_number == other.part_number
    }
}

impl Eq for McuSpecification {}

impl Hash for McuSpecification {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.part_number.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l432_fields() -> McuFields {
        McuFields {
            part_number: "STM32L432KCU6".to_string(),
            family: "STM32L4".to_string(),
            core: "cortex-m4".to_string(),
            package: "UFQFPN32".to_string(),
            pin_count: 32,
            flash_bytes: 256 * 1024,
            ram_bytes: 64 * 1024,
            operating_voltage_min: 1.71,
            operating_voltage_max: 3.6,
            temperature_min: -40,
            temperature_max: 85,
            max_frequency_hz: Some(80_000_000),
            peripherals: ["usart", "SPI"].iter().map(|s| s.to_string()).collect(),
            features: ["FPU"].iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_create_valid() {
        let spec = McuSpecification::create(l432_fields()).unwrap();
        assert_eq!(spec.part_number(), "STM32L432KCU6");
        assert_eq!(spec.flash_bytes(), 262_144);
        assert!(spec.has_peripheral("USART"));
        assert!(spec.has_feature("fpu"));
    }

    #[test]
    fn test_inverted_voltage_rejected() {
        let mut fields = l432_fields();
        fields.operating_voltage_min = 3.6;
        fields.operating_voltage_max = 1.71;
        let err = McuSpecification::create(fields).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvertedRange { min_field: "operating_voltage_min", .. }
        ));
    }

    #[test]
    fn test_inverted_temperature_rejected() {
        let mut fields = l432_fields();
        fields.temperature_min = 125;
        assert!(McuSpecification::create(fields).is_err());
    }

    #[test]
    fn test_zero_sizes_rejected() {
        let mut fields = l432_fields();
        fields.pin_count = 0;
        assert_eq!(
            McuSpecification::create(fields).unwrap_err(),
            ValidationError::NotPositive { field: "pin_count" }
        );

        let mut fields = l432_fields();
        fields.ram_bytes = 0;
        assert!(McuSpecification::create(fields).is_err());
    }

    #[test]
    fn test_equality_by_part_number() {
        let a = McuSpecification::create(l432_fields()).unwrap();
        let mut other = l432_fields();
        other.package = "LQFP32".to_string();
        other.flash_bytes = 128 * 1024;
        let b = McuSpecification::create(other).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_core_is_unknown() {
        let mut fields = l432_fields();
        fields.core = String::new();
        let spec = McuSpecification::create(fields).unwrap();
        assert_eq!(spec.core(), "unknown");
    }
}
