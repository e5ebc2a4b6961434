//! Board Description Synthesizer
//!
//! Maps an [`McuSpecification`] plus optional [`BoardOverrides`] onto a
//! [`BoardDescription`]. Per-family data comes from [`crate::mcu::family`].

use crate::board::schema::{
    validate_board_id, BoardDescription, JLINK_PROBE, OPENOCD_PROBE, VENDOR_CATALOGUE_URL,
};
use crate::mcu::family::{self, FamilyRecord};
use crate::mcu::{McuSpecification, ValidationError};
use crate::warning::{self, Outcome, Warning, WarningKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Crystal frequency used when neither the caller nor the project gives one.
pub const DEFAULT_HSE_HZ: u64 = 8_000_000;

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("family {family} (part {part}) has no build record; supported families: {supported}")]
    UnsupportedFamily {
        family: String,
        part: String,
        supported: String,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Caller-side corrections applied on top of the extracted data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardOverrides {
    pub board_id: Option<String>,
    /// Crystal frequency literal; a missing `U` suffix is added.
    pub hse_value: Option<String>,
    /// CPU frequency literal; a missing `L` suffix is added.
    pub cpu_frequency: Option<String>,
    pub extra_defines: Vec<String>,
    pub jlink_device: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BoardSynthesizer;

impl BoardSynthesizer {
    pub fn new() -> Self {
        Self
    }

    pub fn synthesize(
        &self,
        spec: &McuSpecification,
        overrides: &BoardOverrides,
    ) -> Result<Outcome<BoardDescription>, SynthesisError> {
        let record = family::family_record(spec.family()).ok_or_else(|| {
            SynthesisError::UnsupportedFamily {
                family: spec.family().to_string(),
                part: spec.part_number().to_string(),
                supported: family::FAMILIES
                    .iter()
                    .map(|r| r.family)
                    .collect::<Vec<_>>()
                    .join(", "),
            }
        })?;

        let mut warnings = Vec::new();

        let board_id = match &overrides.board_id {
            Some(id) => id.trim().to_string(),
            None => default_board_id(spec.part_number()),
        };
        validate_board_id(&board_id)?;

        let clock_literal = match &overrides.hse_value {
            Some(raw) => normalize_literal("hse_value", raw, 'U', &mut warnings)?,
            None => format!("{}U", DEFAULT_HSE_HZ),
        };
        let cpu_frequency_literal = match &overrides.cpu_frequency {
            Some(raw) => normalize_literal("cpu_frequency", raw, 'L', &mut warnings)?,
            None => format!(
                "{}L",
                spec.max_frequency_hz().unwrap_or(record.default_f_cpu)
            ),
        };

        let mut debug_probe_ids = BTreeMap::new();
        debug_probe_ids.insert(
            JLINK_PROBE.to_string(),
            overrides
                .jlink_device
                .clone()
                .unwrap_or_else(|| family::jlink_device(spec.part_number())),
        );
        debug_probe_ids.insert(OPENOCD_PROBE.to_string(), record.openocd_target.to_string());

        let description = BoardDescription {
            board_id,
            mcu_part_number: spec.part_number().to_string(),
            family: record.family.to_string(),
            core: spec.core().to_string(),
            build_flags: build_flags(spec, record, &clock_literal, &overrides.extra_defines),
            clock_literal,
            cpu_frequency_literal,
            debug_probe_ids,
            flash_kib: spec.flash_bytes() / 1024,
            ram_kib: spec.ram_bytes() / 1024,
            connectivity: connectivity(spec),
            peripherals: spec.peripherals().iter().cloned().collect(),
            features: spec.features().iter().cloned().collect(),
            url: overrides
                .url
                .clone()
                .unwrap_or_else(|| VENDOR_CATALOGUE_URL.to_string()),
        };

        tracing::info!(
            "Synthesized board '{}' for {} ({} KiB flash, {} KiB RAM)",
            description.board_id,
            description.mcu_part_number,
            description.flash_kib,
            description.ram_kib
        );
        Ok(Outcome::new(description, warnings))
    }
}

/// `STM32L432KCU6` → `stm32l432kc`.
pub fn default_board_id(part_number: &str) -> String {
    family::strip_package_suffix(part_number).to_lowercase()
}

/// Fixed order: part, family, crystal, family defines, FPU, caller defines.
fn build_flags(
    spec: &McuSpecification,
    record: &FamilyRecord,
    clock_literal: &str,
    extra_defines: &[String],
) -> Vec<String> {
    let mut flags = vec![
        format!("-D{}", spec.part_number()),
        format!("-D{}", record.family),
        format!("-DHSE_VALUE={}", clock_literal),
    ];
    flags.extend(record.defines.iter().map(|d| format!("-D{}", d)));
    if let Some(fpu) = record.fpu {
        if spec.has_feature("fpu") {
            flags.push(format!("-mfpu={}", fpu));
            flags.push("-mfloat-abi=hard".to_string());
        }
    }
    for define in extra_defines {
        let define = define.trim();
        if define.is_empty() {
            continue;
        }
        let flag = if define.starts_with('-') {
            define.to_string()
        } else {
            format!("-D{}", define)
        };
        if !flags.contains(&flag) {
            flags.push(flag);
        }
    }
    flags
}

fn connectivity(spec: &McuSpecification) -> Vec<String> {
    let mut out = Vec::new();
    if spec.has_peripheral("CAN") || spec.has_peripheral("FDCAN") {
        out.push("can".to_string());
    }
    if spec.has_peripheral("USB") {
        out.push("usb".to_string());
    }
    out
}

/// Make sure a numeric literal carries `suffix`. Existing `u`/`l` suffixes
/// are replaced; anything other than digits is refused.
pub fn normalize_literal(
    field: &'static str,
    raw: &str,
    suffix: char,
    warnings: &mut Vec<Warning>,
) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    let digits = trimmed.trim_end_matches(['u', 'U', 'l', 'L']);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidLiteral {
            field,
            value: raw.to_string(),
        });
    }
    if digits.chars().all(|c| c == '0') {
        return Err(ValidationError::NotPositive { field });
    }
    let literal = format!("{}{}", digits, suffix);
    if literal != trimmed {
        warning::push(
            warnings,
            WarningKind::Recovered,
            format!("{} '{}' normalized to '{}'", field, trimmed, literal),
        );
    }
    Ok(literal)
}
