//! Source inventory of a legacy project.

use std::path::Path;

pub const SOURCE_ROOTS: &[&str] = &["Core", "Middlewares", "Drivers"];
pub const SOURCE_EXTENSIONS: &[&str] = &["c", "h", "cpp", "hpp", "cc", "s", "S"];
pub const HEADER_EXTENSIONS: &[&str] = &["h", "hpp"];

/// Newlib stubs that clash with the destination toolchain's own.
const EXCLUDED_FILES: &[&str] = &["syscalls.c", "sysmem.c"];

pub const KERNEL_DIR: &str = "Middlewares/Third_Party/FreeRTOS";
pub const KERNEL_DEFINES: &[&str] = &["USE_FREERTOS", "CMSIS_OS_V2"];
pub const KERNEL_NAMESPACE: &str = "FREERTOS";
/// Defines the registry kernel library expects on top of the project's own.
pub const KERNEL_LIBRARY_DEFINES: &[&str] = &["USE_FREERTOS", "configUSE_CMSIS_RTOS_V2=1"];
pub const KERNEL_CONFIG_HEADER: &str = "FreeRTOSConfig.h";

const MAX_DEPTH: usize = 20;

/// Every source file under the conventional roots, relative to `root`,
/// `/`-separated and sorted. HAL driver and CMSIS trees are left out; the
/// destination framework brings its own.
pub fn discover_sources(root: &Path) -> std::io::Result<Vec<String>> {
    let mut files = Vec::new();
    for dir in SOURCE_ROOTS {
        let path = root.join(dir);
        if path.is_dir() {
            walk(&path, dir, &mut files, 0)?;
        }
    }
    files.sort();
    Ok(files)
}

fn walk(dir: &Path, rel: &str, files: &mut Vec<String>, depth: usize) -> std::io::Result<()> {
    if depth > MAX_DEPTH {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let child = format!("{}/{}", rel, name);
        if file_type.is_dir() {
            if is_excluded_dir(&child) {
                tracing::debug!("Skipping vendor tree {}", child);
                continue;
            }
            walk(&entry.path(), &child, files, depth + 1)?;
        } else if file_type.is_file() && is_source(&name) && !EXCLUDED_FILES.contains(&name.as_str()) {
            files.push(child);
        }
    }
    Ok(())
}

fn is_excluded_dir(rel: &str) -> bool {
    match rel.strip_prefix("Drivers/") {
        Some(name) if !name.contains('/') => name == "CMSIS" || name.ends_with("_HAL_Driver"),
        _ => false,
    }
}

fn is_source(name: &str) -> bool {
    name.rsplit_once('.')
        .map_or(false, |(_, ext)| SOURCE_EXTENSIONS.contains(&ext))
}

pub fn is_header(path: &str) -> bool {
    path.rsplit_once('.')
        .map_or(false, |(_, ext)| HEADER_EXTENSIONS.contains(&ext))
}

/// Directories (relative, sorted, unique) that hold at least one header.
pub fn header_dirs(sources: &[String]) -> Vec<String> {
    let mut dirs: Vec<String> = sources
        .iter()
        .filter(|p| is_header(p))
        .filter_map(|p| p.rsplit_once('/').map(|(dir, _)| dir.to_string()))
        .collect();
    dirs.sort();
    dirs.dedup();
    dirs
}

/// The project's kernel configuration header, `Core/Inc` first.
pub fn kernel_config_header(sources: &[String]) -> Option<&str> {
    let named = |p: &&String| p.rsplit('/').next() == Some(KERNEL_CONFIG_HEADER);
    sources
        .iter()
        .filter(named)
        .find(|p| p.starts_with("Core/Inc/"))
        .or_else(|| sources.iter().find(named))
        .map(String::as_str)
}

/// Symbol part of a define: `HSE_VALUE=8000000` → `HSE_VALUE`.
pub fn define_symbol(define: &str) -> &str {
    define.split_once('=').map_or(define, |(symbol, _)| symbol).trim()
}
