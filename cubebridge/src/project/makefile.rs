//! Reads the generated Makefile for what the new build needs: the define
//! list, the target name and the CPU/FPU switches.

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildSettings {
    pub target: Option<String>,
    pub cpu: Option<String>,
    pub fpu: Option<String>,
    pub float_abi: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MakefileInfo {
    /// Symbols from `-D` tokens of every `*_DEFS` variable, first occurrence
    /// wins. Values are kept: `HSE_VALUE=8000000`.
    pub defines: Vec<String>,
    pub settings: BuildSettings,
}

pub fn parse_makefile(text: &str) -> MakefileInfo {
    let mut info = MakefileInfo::default();

    for line in logical_lines(text) {
        for token in line.split_whitespace() {
            flag_value(token, "-mcpu=", &mut info.settings.cpu);
            flag_value(token, "-mfpu=", &mut info.settings.fpu);
            flag_value(token, "-mfloat-abi=", &mut info.settings.float_abi);
        }

        let Some((name, value)) = assignment(&line) else {
            continue;
        };
        if name == "TARGET" && info.settings.target.is_none() && !value.is_empty() {
            info.settings.target = Some(value.to_string());
        }
        if name.ends_with("_DEFS") {
            let mut tokens = value.split_whitespace();
            while let Some(token) = tokens.next() {
                let symbol = match token.strip_prefix("-D") {
                    Some("") => tokens.next().unwrap_or(""),
                    Some(symbol) => symbol,
                    None => continue,
                };
                let symbol = symbol.trim_matches(|c| c == '"' || c == '\'');
                if !symbol.is_empty() && !info.defines.iter().any(|d| d == symbol) {
                    info.defines.push(symbol.to_string());
                }
            }
        }
    }

    tracing::debug!(
        "Makefile: {} defines, target {:?}",
        info.defines.len(),
        info.settings.target
    );
    info
}

/// Source lines with `\` continuations folded in and comments dropped.
fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for raw in text.lines() {
        let line = raw.trim_end();
        if current.is_empty() && line.trim_start().starts_with('#') {
            continue;
        }
        match line.strip_suffix('\\') {
            Some(head) => {
                current.push_str(head);
                current.push(' ');
            }
            None => {
                current.push_str(line);
                lines.push(std::mem::take(&mut current));
            }
        }
    }
    if !current.trim().is_empty() {
        lines.push(current);
    }
    lines
}

/// `NAME = value`, `NAME := value`, `NAME += value`, `NAME ?= value`.
fn assignment(line: &str) -> Option<(&str, &str)> {
    let eq = line.find('=')?;
    let name = line[..eq].trim_end_matches([':', '+', '?']).trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    Some((name, line[eq + 1..].trim()))
}

fn flag_value(token: &str, prefix: &str, slot: &mut Option<String>) {
    if slot.is_some() {
        return;
    }
    if let Some(value) = token.strip_prefix(prefix) {
        if !value.is_empty() && !value.starts_with('$') {
            *slot = Some(value.to_string());
        }
    }
}
