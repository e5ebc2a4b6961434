//! Board description record and its destination JSON shape.

use crate::mcu::family;
use crate::mcu::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const JLINK_PROBE: &str = "jlink_device";
pub const OPENOCD_PROBE: &str = "openocd_target";

pub const VENDOR: &str = "ST";
/// USB vendor/product pair of the on-board ST-LINK.
pub const STLINK_HWID: [&str; 2] = ["0x0483", "0x374B"];
pub const VENDOR_CATALOGUE_URL: &str = "https://www.st.com/en/microcontrollers-microprocessors.html";

/// Destination-toolchain view of one MCU part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardDescription {
    pub board_id: String,
    pub mcu_part_number: String,
    pub family: String,
    pub core: String,
    /// Ordered; the order is part of the emitted text.
    pub build_flags: Vec<String>,
    pub clock_literal: String,
    pub cpu_frequency_literal: String,
    /// Probe tool name → device identifier.
    pub debug_probe_ids: BTreeMap<String, String>,
    pub flash_kib: u64,
    pub ram_kib: u64,
    pub connectivity: Vec<String>,
    /// Peripheral and feature tags carried from the vendor page, sorted.
    pub peripherals: Vec<String>,
    pub features: Vec<String>,
    pub url: String,
}

/// Board ids become file names, so only `[A-Za-z0-9_.-]` is accepted and a
/// leading `.` is refused.
pub fn validate_board_id(board_id: &str) -> Result<(), ValidationError> {
    let safe = !board_id.is_empty()
        && !board_id.starts_with('.')
        && board_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if safe {
        Ok(())
    } else {
        Err(ValidationError::UnsafeBoardId(board_id.to_string()))
    }
}

impl BoardDescription {
    pub fn file_name(&self) -> String {
        format!("{}.json", self.board_id)
    }

    pub fn probe_id(&self, probe: &str) -> Option<&str> {
        self.debug_probe_ids.get(probe).map(String::as_str)
    }

    /// The record in the destination toolchain's board-file layout.
    pub fn to_board_file(&self) -> BoardFile {
        let stripped = family::strip_package_suffix(&self.mcu_part_number);
        BoardFile {
            build: BuildSection {
                core: "stm32".to_string(),
                cpu: self.core.clone(),
                extra_flags: self.build_flags.join(" "),
                f_cpu: self.cpu_frequency_literal.clone(),
                features: self.features.clone(),
                hwids: vec![STLINK_HWID.map(str::to_string)],
                mcu: self.mcu_part_number.to_lowercase(),
                peripherals: self.peripherals.clone(),
                product_line: family::product_line(&self.mcu_part_number),
                variant: self.mcu_part_number.to_uppercase(),
            },
            connectivity: self.connectivity.clone(),
            debug: DebugSection {
                jlink_device: self.probe_id(JLINK_PROBE).map(str::to_string),
                openocd_target: self.probe_id(OPENOCD_PROBE).map(str::to_string),
                svd_path: Some(format!("{}.svd", stripped)),
            },
            frameworks: vec!["arduino".to_string(), "stm32cube".to_string()],
            name: format!(
                "{} ({}KB flash, {}KB RAM)",
                self.mcu_part_number, self.flash_kib, self.ram_kib
            ),
            upload: UploadSection {
                maximum_ram_size: self.ram_kib * 1024,
                maximum_size: self.flash_kib * 1024,
                protocol: "stlink".to_string(),
                protocols: ["blackmagic", "jlink", "mbed", "stlink"]
                    .iter()
                    .map(|p| p.to_string())
                    .collect(),
            },
            url: self.url.clone(),
            vendor: VENDOR.to_string(),
        }
    }

    /// Pretty JSON with a trailing newline. Same record, same bytes.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut text = serde_json::to_string_pretty(&self.to_board_file())?;
        text.push('\n');
        Ok(text)
    }
}

// Field order below is the serialized key order.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardFile {
    pub build: BuildSection,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connectivity: Vec<String>,
    #[serde(default)]
    pub debug: DebugSection,
    #[serde(default)]
    pub frameworks: Vec<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub upload: UploadSection,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub vendor: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSection {
    #[serde(default)]
    pub core: String,
    #[serde(default)]
    pub cpu: String,
    #[serde(default)]
    pub extra_flags: String,
    #[serde(default)]
    pub f_cpu: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    #[serde(default)]
    pub hwids: Vec<[String; 2]>,
    #[serde(default)]
    pub mcu: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub peripherals: Vec<String>,
    #[serde(default)]
    pub product_line: String,
    #[serde(default)]
    pub variant: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jlink_device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openocd_target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub svd_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSection {
    #[serde(default)]
    pub maximum_ram_size: u64,
    #[serde(default)]
    pub maximum_size: u64,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub protocols: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BoardDescription {
        let mut probes = BTreeMap::new();
        probes.insert(JLINK_PROBE.to_string(), "STM32L432KC".to_string());
        probes.insert(OPENOCD_PROBE.to_string(), "stm32l4x".to_string());
        BoardDescription {
            board_id: "custom_l432".to_string(),
            mcu_part_number: "STM32L432KCU6".to_string(),
            family: "STM32L4".to_string(),
            core: "cortex-m4".to_string(),
            build_flags: vec![
                "-DSTM32L432KCU6".to_string(),
                "-DSTM32L4".to_string(),
                "-DHSE_VALUE=8000000U".to_string(),
                "-DUSE_HAL_DRIVER".to_string(),
            ],
            clock_literal: "8000000U".to_string(),
            cpu_frequency_literal: "80000000L".to_string(),
            debug_probe_ids: probes,
            flash_kib: 256,
            ram_kib: 64,
            connectivity: vec![],
            peripherals: vec!["CAN".to_string(), "I2C".to_string(), "USART".to_string()],
            features: vec![],
            url: VENDOR_CATALOGUE_URL.to_string(),
        }
    }

    #[test]
    fn test_board_id_validation() {
        assert!(validate_board_id("nucleo_l432kc").is_ok());
        assert!(validate_board_id("my-board.v2").is_ok());
        assert!(validate_board_id("").is_err());
        assert!(validate_board_id("../evil").is_err());
        assert!(validate_board_id(".hidden").is_err());
        assert!(validate_board_id("a b").is_err());
    }

    #[test]
    fn test_board_file_shape() {
        let json: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert_eq!(
            json["build"]["extra_flags"],
            "-DSTM32L432KCU6 -DSTM32L4 -DHSE_VALUE=8000000U -DUSE_HAL_DRIVER"
        );
        assert_eq!(json["build"]["f_cpu"], "80000000L");
        assert_eq!(json["build"]["mcu"], "stm32l432kcu6");
        assert_eq!(json["build"]["product_line"], "STM32L432xx");
        assert_eq!(json["debug"]["jlink_device"], "STM32L432KC");
        assert_eq!(json["debug"]["openocd_target"], "stm32l4x");
        assert_eq!(json["debug"]["svd_path"], "STM32L432KC.svd");
        assert_eq!(json["upload"]["maximum_size"], 262_144);
        assert_eq!(json["upload"]["maximum_ram_size"], 65_536);
        assert_eq!(json["name"], "STM32L432KCU6 (256KB flash, 64KB RAM)");
        assert!(json.get("connectivity").is_none());
    }

    #[test]
    fn test_board_file_metadata() {
        let json: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert_eq!(json["build"]["hwids"][0][0], "0x0483");
        assert_eq!(json["build"]["hwids"][0][1], "0x374B");
        assert_eq!(
            json["build"]["peripherals"],
            serde_json::json!(["CAN", "I2C", "USART"])
        );
        // empty tag lists are left out
        assert!(json["build"].get("features").is_none());

        let mut tagged = sample();
        tagged.features = vec!["fpu".to_string()];
        let json: serde_json::Value = serde_json::from_str(&tagged.to_json().unwrap()).unwrap();
        assert_eq!(json["build"]["features"], serde_json::json!(["fpu"]));
    }

    #[test]
    fn test_json_is_stable() {
        let a = sample().to_json().unwrap();
        let b = sample().to_json().unwrap();
        assert_eq!(a, b);
        assert!(a.ends_with("}\n"));
        // keys come out in declaration order
        assert!(a.find("\"build\"").unwrap() < a.find("\"debug\"").unwrap());
        assert!(a.find("\"debug\"").unwrap() < a.find("\"vendor\"").unwrap());
    }
}
