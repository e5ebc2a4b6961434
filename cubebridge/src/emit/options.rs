//! Knobs for one migration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Library name the destination registry knows the kernel middleware by.
pub const KERNEL_LIBRARY: &str = "mincrmatt12/STM32Cube Middleware-FreeRTOS";

/// Environment keys the kernel library reads, in emission order.
pub const KERNEL_LIBRARY_SETTINGS: &[(&str, &str)] = &[
    ("custom_freertos_config_location", "include/FreeRTOSConfig.h"),
    ("custom_freertos_cmsis_impl", "CMSIS_RTOS_V2"),
    ("custom_freertos_features", "timers, event_groups"),
];

/// How the real-time kernel of a kernel-enabled project is provided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelMode {
    /// Pull the kernel in as a library dependency when its sources are absent.
    #[default]
    Library,
    /// Use the kernel built into the destination framework.
    Framework,
    /// Leave the kernel out; the user wires it up by hand.
    Disabled,
}

impl KernelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            KernelMode::Library => "library",
            KernelMode::Framework => "framework",
            KernelMode::Disabled => "disabled",
        }
    }
}

impl fmt::Display for KernelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KernelMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "library" => Ok(KernelMode::Library),
            "framework" => Ok(KernelMode::Framework),
            "disabled" => Ok(KernelMode::Disabled),
            other => Err(format!(
                "unknown kernel mode '{}' (expected library, framework or disabled)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationOptions {
    pub kernel: KernelMode,
    pub platform: String,
    pub framework: String,
    pub upload_protocol: String,
    pub monitor_speed: u32,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            kernel: KernelMode::Library,
            platform: "ststm32".to_string(),
            framework: "stm32cube".to_string(),
            upload_protocol: "stlink".to_string(),
            monitor_speed: 115_200,
        }
    }
}
