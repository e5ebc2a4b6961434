//! Vendor Data Extractor
//!
//! Turns the text of one vendor product page into an [`McuSpecification`].
//! The extractor never performs I/O: retrieving the page is the caller's
//! job (see [`crate::fetch`]).

use std::collections::BTreeSet;

use thiserror::Error;

use crate::extract::text::{
    find_word, first_integer, label_values, normalize_lines, parse_frequency, parse_range,
    parse_size, tokens,
};
use crate::mcu::family::{infer_family, resolve_prefix, UNKNOWN_CORE};
use crate::mcu::{McuFields, McuSpecification, ValidationError};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("incomplete vendor data for {}: missing {}", .part.as_deref().unwrap_or("unknown part"), .missing.join(", "))]
    Incomplete {
        part: Option<String>,
        missing: Vec<&'static str>,
    },
    #[error("extracted data is invalid: {0}")]
    Validation(#[from] ValidationError),
}

impl ExtractError {
    /// Names of the required fields the page did not provide.
    pub fn missing_fields(&self) -> &[&'static str] {
        match self {
            ExtractError::Incomplete { missing, .. } => missing,
            ExtractError::Validation(_) => &[],
        }
    }
}

const PART_LABELS: &[&str] = &["part number", "part no", "part #", "order code", "commercial part number"];
const PACKAGE_LABELS: &[&str] = &["package", "package type", "packaging"];
const PIN_LABELS: &[&str] = &["pin count", "number of pins", "pins", "pin number"];
const FLASH_LABELS: &[&str] = &["flash memory", "flash size", "flash", "program memory size"];
const RAM_LABELS: &[&str] = &["ram size", "sram", "ram", "data ram size"];
const VOLTAGE_LABELS: &[&str] = &[
    "operating voltage",
    "supply voltage",
    "operating supply voltage",
    "voltage range",
    "vdd",
];
const TEMPERATURE_LABELS: &[&str] = &[
    "operating temperature",
    "operating temperature range",
    "temperature range",
    "temperature",
];
const FREQUENCY_LABELS: &[&str] = &["max frequency", "maximum frequency", "cpu frequency", "max clock frequency", "frequency"];
const CORE_LABELS: &[&str] = &["core", "cpu core", "processor"];
const PERIPHERAL_LABELS: &[&str] = &["peripherals", "interfaces", "connectivity"];

const PACKAGE_FAMILIES: &[&str] = &[
    "UFQFPN", "VFQFPN", "LQFP", "TQFP", "TSSOP", "UFBGA", "TFBGA", "LFBGA", "WLCSP", "QFN", "BGA", "SO",
];

const PERIPHERAL_VOCABULARY: &[&str] = &[
    "USART", "UART", "LPUART", "SPI", "I2C", "I2S", "CAN", "FDCAN", "USB", "ADC", "DAC", "SAI",
    "SDMMC", "QUADSPI", "OCTOSPI", "ETHERNET", "TIM", "RTC", "DMA", "COMP", "OPAMP", "LCD", "TSC",
];

const FEATURE_NEEDLES: &[(&str, &str)] = &[
    ("fpu", "fpu"),
    ("floating point unit", "fpu"),
    ("dsp", "dsp"),
    ("crypto", "crypto"),
    ("rng", "rng"),
    ("random number generator", "rng"),
    ("aes", "aes"),
    ("trustzone", "trustzone"),
    ("ultra-low-power", "low-power"),
    ("low-power", "low-power"),
];

/// Stateless extractor over vendor page text.
#[derive(Debug, Default, Clone, Copy)]
pub struct VendorExtractor;

impl VendorExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Build a specification from raw page text (HTML or plain text).
    ///
    /// Every missing required field is reported in one
    /// [`ExtractError::Incomplete`]; optional fields default to empty.
    pub fn extract(&self, raw_text: &str, source_url: &str) -> Result<McuSpecification, ExtractError> {
        let lines = normalize_lines(raw_text);
        let mut missing = Vec::new();

        let part_number = find_part_number(&lines, source_url);
        if part_number.is_none() {
            missing.push("part_number");
        }
        tracing::debug!("Extracting {:?} from {} lines of {}", part_number, lines.len(), source_url);

        let package = first_match(&lines, PACKAGE_LABELS, parse_package)
            .or_else(|| lines.iter().find_map(|l| package_token(l)));
        if package.is_none() {
            missing.push("package");
        }

        let pin_count = first_match(&lines, PIN_LABELS, |v| first_integer(v).filter(|n| *n > 0))
            .or_else(|| package.as_deref().and_then(pins_from_package));
        if pin_count.is_none() {
            missing.push("pin_count");
        }

        let flash_bytes = first_match(&lines, FLASH_LABELS, parse_size)
            .or_else(|| size_before_keyword(&lines, &["flash"]));
        if flash_bytes.is_none() {
            missing.push("flash");
        }

        let ram_bytes = first_match(&lines, RAM_LABELS, parse_size)
            .or_else(|| size_before_keyword(&lines, &["sram", "ram"]));
        if ram_bytes.is_none() {
            missing.push("ram");
        }

        let (voltage_min, voltage_max) = first_range(&lines, VOLTAGE_LABELS, &["voltage"]);
        if voltage_min.is_none() {
            missing.push("voltage_min");
        }
        if voltage_max.is_none() {
            missing.push("voltage_max");
        }

        let (temperature_min, temperature_max) =
            first_range(&lines, TEMPERATURE_LABELS, &["temperature", "°c"]);
        if temperature_min.is_none() {
            missing.push("temperature_min");
        }
        if temperature_max.is_none() {
            missing.push("temperature_max");
        }

        let (
            Some(part_number),
            Some(package),
            Some(pin_count),
            Some(flash_bytes),
            Some(ram_bytes),
            Some(voltage_min),
            Some(voltage_max),
            Some(temperature_min),
            Some(temperature_max),
        ) = (
            part_number.clone(),
            package,
            pin_count,
            flash_bytes,
            ram_bytes,
            voltage_min,
            voltage_max,
            temperature_min,
            temperature_max,
        )
        else {
            tracing::warn!("Vendor page {} is missing {}", source_url, missing.join(", "));
            return Err(ExtractError::Incomplete {
                part: part_number,
                missing,
            });
        };

        let family = infer_family(&part_number);
        let core = match resolve_prefix(&part_number) {
            Some(p) => p.core.to_string(),
            None => first_match(&lines, CORE_LABELS, cortex_mention)
                .or_else(|| lines.iter().find_map(|l| cortex_mention(l)))
                .unwrap_or_else(|| UNKNOWN_CORE.to_string()),
        };

        let max_frequency_hz = first_match(&lines, FREQUENCY_LABELS, parse_frequency).or_else(|| {
            lines
                .iter()
                .filter(|l| {
                    let lower = l.to_ascii_lowercase();
                    lower.contains("frequency") || lower.contains("up to")
                })
                .find_map(|l| parse_frequency(l))
        });

        let spec = McuSpecification::create(McuFields {
            part_number,
            family,
            core,
            package,
            pin_count,
            flash_bytes,
            ram_bytes,
            operating_voltage_min: voltage_min,
            operating_voltage_max: voltage_max,
            temperature_min: temperature_min.round() as i32,
            temperature_max: temperature_max.round() as i32,
            max_frequency_hz,
            peripherals: find_peripherals(&lines),
            features: find_features(&lines),
        })?;

        tracing::info!(
            "Extracted {} ({}, {} KB flash, {} KB RAM)",
            spec.part_number(),
            spec.family(),
            spec.flash_bytes() / 1024,
            spec.ram_bytes() / 1024
        );
        Ok(spec)
    }
}

fn first_match<T>(lines: &[String], labels: &[&str], parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    label_values(lines, labels).iter().find_map(|v| parse(v))
}

/// A labelled range, else any line mentioning one of `keywords` that holds
/// two numbers.
fn first_range(lines: &[String], labels: &[&str], keywords: &[&str]) -> (Option<f64>, Option<f64>) {
    let mut best = (None, None);
    for value in label_values(lines, labels) {
        match parse_range(&value) {
            (Some(min), Some(max)) => return (Some(min), Some(max)),
            (Some(min), None) if best.0.is_none() => best = (Some(min), None),
            _ => {}
        }
    }
    let mentioned = lines.iter().filter(|l| {
        let lower = l.to_lowercase();
        keywords.iter().any(|k| lower.contains(k))
    });
    for line in mentioned {
        if let (Some(min), Some(max)) = parse_range(line) {
            return (Some(min), Some(max));
        }
    }
    best
}

fn is_part_token(token: &str) -> bool {
    token.len() >= 9
        && token.to_ascii_uppercase().starts_with("STM32")
        && token.chars().all(|c| c.is_ascii_alphanumeric())
}

fn find_part_number(lines: &[String], source_url: &str) -> Option<String> {
    if let Some(part) = first_match(lines, PART_LABELS, |v| tokens(v).find(|t| is_part_token(t)).map(str::to_string)) {
        return Some(part.to_uppercase());
    }
    if let Some(part) = lines
        .iter()
        .find_map(|l| tokens(l).find(|t| is_part_token(t)).map(str::to_string))
    {
        return Some(part.to_uppercase());
    }
    let path = source_url.split(['?', '#']).next().unwrap_or("");
    let segment = path.trim_end_matches('/').rsplit('/').next().unwrap_or("");
    let stem = segment.split('.').next().unwrap_or("");
    if is_part_token(stem) {
        return Some(stem.to_uppercase());
    }
    None
}

/// `UFQFPN32`, `LQFP-64`, or a split `UFQFPN 32 5x5 mm` joined to `UFQFPN32`.
fn parse_package(value: &str) -> Option<String> {
    let mut words = value.split_whitespace();
    let token = words.next()?.trim_end_matches([',', ';']);
    if !token.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let mut package = token.to_uppercase();
    if package.chars().all(|c| c.is_ascii_alphabetic()) {
        let pins: String = words
            .next()
            .unwrap_or("")
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        package.push_str(&pins);
    }
    Some(package)
}

/// A package designator such as `UFQFPN32` or `LQFP-64` anywhere in a line.
fn package_token(line: &str) -> Option<String> {
    tokens(line).find_map(|t| {
        let upper = t.to_ascii_uppercase();
        PACKAGE_FAMILIES
            .iter()
            .find(|p| {
                upper.starts_with(*p)
                    && upper[p.len()..]
                        .trim_start_matches('-')
                        .chars()
                        .next()
                        .map_or(false, |c| c.is_ascii_digit())
            })
            .map(|_| upper)
    })
}

fn pins_from_package(package: &str) -> Option<u32> {
    let digits: String = package
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    digits.parse().ok().filter(|n| *n > 0)
}

/// `256 KB Flash` style phrases: the size right before a keyword.
fn size_before_keyword(lines: &[String], keywords: &[&str]) -> Option<u64> {
    for keyword in keywords {
        for line in lines {
            let lower = line.to_ascii_lowercase();
            for pos in find_word(&lower, keyword) {
                let before = &line[..pos];
                let Some(last_digit) = before
                    .char_indices()
                    .rev()
                    .find(|(_, c)| c.is_ascii_digit())
                    .map(|(i, _)| i)
                else {
                    continue;
                };
                // walk back to the start of that number
                let start = before[..=last_digit]
                    .char_indices()
                    .rev()
                    .take_while(|(_, c)| c.is_ascii_digit() || *c == '.')
                    .last()
                    .map(|(i, _)| i)
                    .unwrap_or(last_digit);
                if let Some(size) = parse_size(&before[start..]) {
                    return Some(size);
                }
            }
        }
    }
    None
}

/// `ARM Cortex-M0+ core` → `cortex-m0plus`; `Cortex-M33` stays `cortex-m33`.
fn cortex_mention(text: &str) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    let mut from = 0;
    while let Some(pos) = lower[from..].find("cortex") {
        let rest = &lower[from + pos + "cortex".len()..];
        let rest = rest.trim_start_matches(|c: char| c == '-' || c == ' ' || !c.is_ascii());
        let mut chars = rest.chars();
        if let Some(kind @ ('m' | 'a' | 'r')) = chars.next() {
            let digits: String = chars.clone().take_while(|c| c.is_ascii_digit()).collect();
            if !digits.is_empty() {
                let after = &rest[1 + digits.len()..];
                let plus = after.starts_with('+') || after.starts_with("plus");
                return Some(format!("cortex-{}{}{}", kind, digits, if plus { "plus" } else { "" }));
            }
        }
        from += pos + "cortex".len();
    }
    None
}

fn peripheral_name(token: &str) -> Option<&'static str> {
    let upper = token.to_ascii_uppercase();
    let stem = upper.trim_end_matches(|c: char| c.is_ascii_digit());
    let stem = stem.strip_suffix('S').filter(|s| PERIPHERAL_VOCABULARY.contains(s)).unwrap_or(stem);
    PERIPHERAL_VOCABULARY.iter().copied().find(|p| *p == stem)
}

fn find_peripherals(lines: &[String]) -> BTreeSet<String> {
    let labelled: BTreeSet<String> = label_values(lines, PERIPHERAL_LABELS)
        .iter()
        .flat_map(|v| tokens(v).filter_map(peripheral_name).collect::<Vec<_>>())
        .map(str::to_string)
        .collect();
    if !labelled.is_empty() {
        return labelled;
    }
    // without a label, only trust upper-case acronyms in running text
    lines
        .iter()
        .flat_map(|l| tokens(l).collect::<Vec<_>>())
        .filter(|t| t.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()))
        .filter_map(peripheral_name)
        .map(str::to_string)
        .collect()
}

fn find_features(lines: &[String]) -> BTreeSet<String> {
    let mut features = BTreeSet::new();
    for line in lines {
        let lower = line.to_ascii_lowercase();
        for (needle, tag) in FEATURE_NEEDLES {
            if !find_word(&lower, needle).is_empty() {
                features.insert(tag.to_string());
            }
        }
    }
    features
}
