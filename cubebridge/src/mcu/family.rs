//! Family tables
//!
//! Everything that varies by MCU family lives here as static data, so
//! supporting a new family is a table edit:
//!
//! - [`PREFIXES`]: part-number prefix → family tag and CPU core
//! - [`FAMILIES`]: families the destination toolchain can build, with their
//!   debug target, default clock, FPU and feature defines
//! - [`JLINK_EXCEPTIONS`]: parts whose J-Link device name is not the
//!   stripped part number
//! - [`KNOWN_BOARDS`]: boards the destination toolchain already ships

pub const UNKNOWN_CORE: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyPrefix {
    pub prefix: &'static str,
    pub family: &'static str,
    pub core: &'static str,
}

/// Per-family build record consumed by the board synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyRecord {
    pub family: &'static str,
    pub openocd_target: &'static str,
    pub default_f_cpu: u64,
    pub fpu: Option<&'static str>,
    pub defines: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownBoard {
    pub mcu_prefix: &'static str,
    pub board_id: &'static str,
}

const fn prefix(prefix: &'static str, family: &'static str, core: &'static str) -> FamilyPrefix {
    FamilyPrefix { prefix, family, core }
}

pub static PREFIXES: &[FamilyPrefix] = &[
    prefix("STM32C0", "STM32C0", "cortex-m0plus"),
    prefix("STM32F0", "STM32F0", "cortex-m0"),
    prefix("STM32F1", "STM32F1", "cortex-m3"),
    prefix("STM32F2", "STM32F2", "cortex-m3"),
    prefix("STM32F3", "STM32F3", "cortex-m4"),
    prefix("STM32F4", "STM32F4", "cortex-m4"),
    prefix("STM32F7", "STM32F7", "cortex-m7"),
    prefix("STM32G0", "STM32G0", "cortex-m0plus"),
    prefix("STM32G4", "STM32G4", "cortex-m4"),
    prefix("STM32H5", "STM32H5", "cortex-m33"),
    prefix("STM32H7", "STM32H7", "cortex-m7"),
    prefix("STM32L0", "STM32L0", "cortex-m0plus"),
    prefix("STM32L1", "STM32L1", "cortex-m3"),
    prefix("STM32L4", "STM32L4", "cortex-m4"),
    prefix("STM32L5", "STM32L5", "cortex-m33"),
    prefix("STM32MP1", "STM32MP1", "cortex-a7"),
    prefix("STM32U5", "STM32U5", "cortex-m33"),
    prefix("STM32WB", "STM32WB", "cortex-m4"),
    prefix("STM32WBA", "STM32WBA", "cortex-m33"),
    prefix("STM32WL", "STM32WL", "cortex-m4"),
];

const HAL: &[&str] = &["USE_HAL_DRIVER"];

pub static FAMILIES: &[FamilyRecord] = &[
    FamilyRecord { family: "STM32C0", openocd_target: "stm32c0x", default_f_cpu: 48_000_000, fpu: None, defines: HAL },
    FamilyRecord { family: "STM32F0", openocd_target: "stm32f0x", default_f_cpu: 48_000_000, fpu: None, defines: HAL },
    FamilyRecord { family: "STM32F1", openocd_target: "stm32f1x", default_f_cpu: 72_000_000, fpu: None, defines: HAL },
    FamilyRecord { family: "STM32F2", openocd_target: "stm32f2x", default_f_cpu: 120_000_000, fpu: None, defines: HAL },
    FamilyRecord { family: "STM32F3", openocd_target: "stm32f3x", default_f_cpu: 72_000_000, fpu: Some("fpv4-sp-d16"), defines: HAL },
    FamilyRecord { family: "STM32F4", openocd_target: "stm32f4x", default_f_cpu: 84_000_000, fpu: Some("fpv4-sp-d16"), defines: HAL },
    FamilyRecord { family: "STM32F7", openocd_target: "stm32f7x", default_f_cpu: 216_000_000, fpu: Some("fpv5-sp-d16"), defines: HAL },
    FamilyRecord { family: "STM32G0", openocd_target: "stm32g0x", default_f_cpu: 64_000_000, fpu: None, defines: HAL },
    FamilyRecord { family: "STM32G4", openocd_target: "stm32g4x", default_f_cpu: 170_000_000, fpu: Some("fpv4-sp-d16"), defines: HAL },
    FamilyRecord { family: "STM32H5", openocd_target: "stm32h5x", default_f_cpu: 250_000_000, fpu: Some("fpv5-sp-d16"), defines: HAL },
    FamilyRecord {
        family: "STM32H7",
        openocd_target: "stm32h7x",
        default_f_cpu: 480_000_000,
        fpu: Some("fpv5-d16"),
        defines: &["USE_HAL_DRIVER", "USE_PWR_LDO_SUPPLY"],
    },
    FamilyRecord { family: "STM32L0", openocd_target: "stm32l0", default_f_cpu: 32_000_000, fpu: None, defines: HAL },
    FamilyRecord { family: "STM32L1", openocd_target: "stm32l1", default_f_cpu: 32_000_000, fpu: None, defines: HAL },
    FamilyRecord { family: "STM32L4", openocd_target: "stm32l4x", default_f_cpu: 80_000_000, fpu: Some("fpv4-sp-d16"), defines: HAL },
    FamilyRecord { family: "STM32L5", openocd_target: "stm32l5x", default_f_cpu: 110_000_000, fpu: Some("fpv5-sp-d16"), defines: HAL },
    FamilyRecord { family: "STM32U5", openocd_target: "stm32u5x", default_f_cpu: 160_000_000, fpu: Some("fpv5-sp-d16"), defines: HAL },
    FamilyRecord { family: "STM32WB", openocd_target: "stm32wbx", default_f_cpu: 64_000_000, fpu: Some("fpv4-sp-d16"), defines: HAL },
    FamilyRecord { family: "STM32WL", openocd_target: "stm32wlx", default_f_cpu: 48_000_000, fpu: None, defines: HAL },
];

/// (stripped part prefix, suffix appended to the J-Link device name)
pub static JLINK_EXCEPTIONS: &[(&str, &str)] = &[
    ("STM32H745", "_M7"),
    ("STM32H747", "_M7"),
    ("STM32H755", "_M7"),
    ("STM32H757", "_M7"),
];

pub static KNOWN_BOARDS: &[KnownBoard] = &[
    KnownBoard { mcu_prefix: "STM32F401RE", board_id: "nucleo_f401re" },
    KnownBoard { mcu_prefix: "STM32F103C8", board_id: "bluepill_f103c8" },
    KnownBoard { mcu_prefix: "STM32F407VG", board_id: "disco_f407vg" },
    KnownBoard { mcu_prefix: "STM32F429ZI", board_id: "nucleo_f429zi" },
    KnownBoard { mcu_prefix: "STM32F746ZG", board_id: "nucleo_f746zg" },
    KnownBoard { mcu_prefix: "STM32L476RG", board_id: "nucleo_l476rg" },
    KnownBoard { mcu_prefix: "STM32G474RE", board_id: "nucleo_g474re" },
    KnownBoard { mcu_prefix: "STM32H743ZI", board_id: "nucleo_h743zi" },
    KnownBoard { mcu_prefix: "STM32L432KC", board_id: "nucleo_l432kc" },
];

/// Longest-prefix lookup of a part number or MCU name.
pub fn resolve_prefix(name: &str) -> Option<&'static FamilyPrefix> {
    let upper = normalize_mcu_name(name);
    PREFIXES
        .iter()
        .filter(|p| upper.starts_with(p.prefix))
        .max_by_key(|p| p.prefix.len())
}

pub fn family_record(family: &str) -> Option<&'static FamilyRecord> {
    let family = family.trim().to_uppercase();
    FAMILIES.iter().find(|r| r.family == family)
}

/// Family tag for a part, falling back to `STM32` plus the two characters
/// after it when the prefix table has no entry.
pub fn infer_family(part_number: &str) -> String {
    if let Some(p) = resolve_prefix(part_number) {
        return p.family.to_string();
    }
    let upper = normalize_mcu_name(part_number);
    match upper.strip_prefix("STM32") {
        Some(rest) => format!("STM32{}", rest.chars().take(2).collect::<String>()),
        None => upper
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect(),
    }
}

/// Whether two family tags (or part numbers) name the same product line.
/// Both sides go through [`infer_family`]; a bare `STM32` or `STM32L` never
/// matches a full family tag.
pub fn same_family(a: &str, b: &str) -> bool {
    let a = infer_family(a);
    !a.is_empty() && a == infer_family(b)
}

/// Upper-case and drop parenthetical variant markers:
/// `STM32L432K(B-C)Ux` → `STM32L432KUX`.
pub fn normalize_mcu_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut depth = 0usize;
    for c in name.trim().chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 && !c.is_whitespace() => out.push(c.to_ascii_uppercase()),
            _ => {}
        }
    }
    out
}

/// Every concrete name a variant-marked MCU name stands for:
/// `STM32L432K(B-C)Ux` → `[STM32L432KBUX, STM32L432KCUX]`.
pub fn expand_variants(name: &str) -> Vec<String> {
    let upper = name.trim().to_uppercase();
    let Some(open) = upper.find('(') else {
        return vec![normalize_mcu_name(&upper)];
    };
    let Some(close) = upper[open..].find(')').map(|i| open + i) else {
        return vec![normalize_mcu_name(&upper)];
    };
    let head = &upper[..open];
    let tail = &upper[close + 1..];
    upper[open + 1..close]
        .split(['-', '|', ','])
        .map(str::trim)
        .filter(|alt| !alt.is_empty())
        .flat_map(|alt| expand_variants(&format!("{}{}{}", head, alt, tail)))
        .collect()
}

/// The series core of a part: `STM32L432KCU6` → `STM32L432`,
/// `STM32L4R5ZIT6` → `STM32L4R5`.
pub fn core_name(name: &str) -> Option<String> {
    let upper = normalize_mcu_name(name);
    let rest = upper.strip_prefix("STM32")?;
    let chars: Vec<char> = rest.chars().collect();

    let mut i = 0;
    while i < chars.len() && chars[i].is_ascii_alphabetic() {
        i += 1;
    }
    if i == 0 {
        return None;
    }
    let digits_start = i;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    if i == digits_start {
        return None;
    }
    // single-digit lines carry a letter+digit sub-line (L4R5, G0B1, H7A3)
    if i - digits_start == 1
        && i + 1 < chars.len()
        && chars[i].is_ascii_alphabetic()
        && chars[i + 1].is_ascii_digit()
    {
        i += 2;
    }
    Some(format!("STM32{}", chars[..i].iter().collect::<String>()))
}

/// Drop package, temperature and option codes, keeping the pin-count and
/// flash-size letters: `STM32L432KCU6` → `STM32L432KC`.
pub fn strip_package_suffix(part_number: &str) -> String {
    let upper = normalize_mcu_name(part_number);
    match core_name(&upper) {
        Some(core) => upper.chars().take(core.len() + 2).collect(),
        None => upper,
    }
}

/// CMSIS device line: `STM32L432KCU6` → `STM32L432xx`.
pub fn product_line(part_number: &str) -> String {
    match core_name(part_number) {
        Some(core) => format!("{}xx", core),
        None => format!("{}xx", normalize_mcu_name(part_number)),
    }
}

pub fn jlink_device(part_number: &str) -> String {
    let stripped = strip_package_suffix(part_number);
    JLINK_EXCEPTIONS
        .iter()
        .find(|(prefix, _)| stripped.starts_with(prefix))
        .map(|(_, suffix)| format!("{}{}", stripped, suffix))
        .unwrap_or(stripped)
}

/// Find a board the destination toolchain already knows for an MCU name.
pub fn known_board(mcu_name: &str) -> Option<&'static KnownBoard> {
    let candidates = expand_variants(mcu_name);
    KNOWN_BOARDS
        .iter()
        .find(|b| candidates.iter().any(|c| c.starts_with(b.mcu_prefix)))
}

/// MCU hinted at by a board id: the known-board table first, then an
/// `stm32…` token or a bare `f401cc`-style token in the id.
pub fn mcu_from_board_id(board_id: &str) -> Option<String> {
    if let Some(board) = KNOWN_BOARDS.iter().find(|b| b.board_id.eq_ignore_ascii_case(board_id)) {
        return Some(board.mcu_prefix.to_string());
    }
    let upper = board_id.to_ascii_uppercase();
    if let Some(at) = upper.find("STM32") {
        let part: String = upper[at..].chars().take_while(|c| c.is_ascii_alphanumeric()).collect();
        if resolve_prefix(&part).is_some() {
            return Some(part);
        }
    }
    upper
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| {
            token.starts_with(|c: char| c.is_ascii_alphabetic())
                && token.chars().filter(char::is_ascii_digit).count() >= 2
        })
        .map(|token| format!("STM32{}", token))
        .find(|candidate| resolve_prefix(candidate).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_prefix_wins() {
        assert_eq!(resolve_prefix("STM32WBA52CGU6").unwrap().family, "STM32WBA");
        assert_eq!(resolve_prefix("STM32WB55CGU6").unwrap().family, "STM32WB");
        assert_eq!(resolve_prefix("stm32l432kcu6").unwrap().family, "STM32L4");
        assert!(resolve_prefix("ATMEGA328P").is_none());
    }

    #[test]
    fn test_infer_family_fallback() {
        assert_eq!(infer_family("STM32F103C8T6"), "STM32F1");
        assert_eq!(infer_family("STM32N657X0"), "STM32N6");
        assert_eq!(infer_family("GD32F303"), "GD");
    }

    #[test]
    fn test_normalize_and_core_name() {
        assert_eq!(normalize_mcu_name("STM32L432K(B-C)Ux"), "STM32L432KUX");
        assert_eq!(core_name("STM32L432K(B-C)Ux").as_deref(), Some("STM32L432"));
        assert_eq!(core_name("STM32F103C8T6").as_deref(), Some("STM32F103"));
        assert_eq!(core_name("STM32L4R5ZIT6").as_deref(), Some("STM32L4R5"));
        assert_eq!(core_name("STM32WB55CGU6").as_deref(), Some("STM32WB55"));
        assert_eq!(core_name("LPC1768"), None);
    }

    #[test]
    fn test_expand_variants() {
        assert_eq!(
            expand_variants("STM32L432K(B-C)Ux"),
            vec!["STM32L432KBUX".to_string(), "STM32L432KCUX".to_string()]
        );
        assert_eq!(expand_variants("STM32F103C8Tx"), vec!["STM32F103C8TX".to_string()]);
    }

    #[test]
    fn test_debug_names() {
        assert_eq!(strip_package_suffix("STM32L432KCU6"), "STM32L432KC");
        assert_eq!(product_line("STM32L432KCU6"), "STM32L432xx");
        assert_eq!(jlink_device("STM32L432KCU6"), "STM32L432KC");
        assert_eq!(jlink_device("STM32H745ZIT6"), "STM32H745ZI_M7");
    }

    #[test]
    fn test_same_family() {
        assert!(same_family("STM32L4", "STM32L432KCU6"));
        assert!(!same_family("STM32F4", "STM32L432KCU6"));
        assert!(!same_family("STM32WB", "STM32WBA52CG"));
    }

    #[test]
    fn test_mcu_from_board_id() {
        assert_eq!(mcu_from_board_id("nucleo_l432kc").as_deref(), Some("STM32L432KC"));
        assert_eq!(mcu_from_board_id("blackpill_f401cc").as_deref(), Some("STM32F401CC"));
        assert_eq!(mcu_from_board_id("genericSTM32F103C8").as_deref(), Some("STM32F103C8"));
        assert_eq!(mcu_from_board_id("my_custom_board"), None);
    }

    #[test]
    fn test_partial_names_do_not_match_family() {
        assert!(!same_family("STM32L4", "stm32"));
        assert!(!same_family("STM32L4", "STM32L"));
        assert!(!same_family("", ""));
        assert!(same_family("STM32L4", "stm32l432kcu6"));
    }

    #[test]
    fn test_known_board_through_variants() {
        assert_eq!(known_board("STM32L432K(B-C)Ux").unwrap().board_id, "nucleo_l432kc");
        assert_eq!(known_board("STM32F103C8Tx").unwrap().board_id, "bluepill_f103c8");
        assert!(known_board("STM32U575ZITxQ").is_none());
    }

    #[test]
    fn test_every_buildable_family_has_a_prefix() {
        for record in FAMILIES {
            assert!(PREFIXES.iter().any(|p| p.family == record.family), "{}", record.family);
        }
    }
}
