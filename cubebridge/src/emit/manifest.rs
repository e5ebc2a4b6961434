//! Renders `platformio.ini` for a migrated project.

use crate::emit::options::{KernelMode, MigrationOptions, KERNEL_LIBRARY, KERNEL_LIBRARY_SETTINGS};
use crate::project::sources::{self, KERNEL_DEFINES, KERNEL_LIBRARY_DEFINES};
use crate::project::LegacyProjectModel;
use std::fmt::Write;

pub const MANIFEST_FILE: &str = "platformio.ini";
pub const SOURCE_DIR: &str = "src";
pub const INCLUDE_DIR: &str = "include";
pub const BOARDS_DIR: &str = "boards";

/// Lines under `build_flags`, in emission order.
pub fn build_flags(model: &LegacyProjectModel, options: &MigrationOptions) -> Vec<String> {
    let mut flags: Vec<String> = model
        .toolchain_defines
        .iter()
        .map(|d| format!("-D {}", d))
        .collect();

    if let Some(hse) = model.hse_value {
        if !model.has_define("HSE_VALUE") {
            flags.push(format!("-D HSE_VALUE={}U", hse));
        }
    }
    if let Some(fpu) = &model.build.fpu {
        flags.push(format!("-mfpu={}", fpu));
    }
    if let Some(abi) = &model.build.float_abi {
        flags.push(format!("-mfloat-abi={}", abi));
    }
    for dir in sources::header_dirs(&model.source_files) {
        flags.push(format!("-I {}/{}", SOURCE_DIR, dir));
    }
    if model.uses_real_time_kernel && options.kernel == KernelMode::Framework {
        for define in KERNEL_DEFINES {
            if !model.has_define(define) {
                flags.push(format!("-D {}", define));
            }
        }
    }
    if uses_kernel_library(model, options) {
        for define in KERNEL_LIBRARY_DEFINES {
            if !model.has_define(sources::define_symbol(define)) {
                flags.push(format!("-D {}", define));
            }
        }
        flags.push(format!("-I {}", INCLUDE_DIR));
    }
    flags
}

/// The kernel comes from the registry library: the project uses it, ships
/// no kernel sources, and library mode is selected.
pub fn uses_kernel_library(model: &LegacyProjectModel, options: &MigrationOptions) -> bool {
    model.kernel_missing() && options.kernel == KernelMode::Library
}

/// Library dependencies; only the kernel library, and only when its sources
/// have to be fetched.
pub fn lib_deps(model: &LegacyProjectModel, options: &MigrationOptions) -> Vec<&'static str> {
    if uses_kernel_library(model, options) {
        vec![KERNEL_LIBRARY]
    } else {
        Vec::new()
    }
}

/// The full manifest. No timestamps or host paths, so equal inputs render
/// equal text.
pub fn render_manifest(model: &LegacyProjectModel, board_id: &str, options: &MigrationOptions) -> String {
    let mut out = String::new();
    // writes to a String cannot fail
    let _ = write_manifest(&mut out, model, board_id, options);
    out
}

fn write_manifest(
    out: &mut String,
    model: &LegacyProjectModel,
    board_id: &str,
    options: &MigrationOptions,
) -> std::fmt::Result {
    writeln!(out, "; Generated by cubebridge from {}", model.project_name)?;
    writeln!(out)?;
    writeln!(out, "[platformio]")?;
    writeln!(out, "src_dir = {}", SOURCE_DIR)?;
    writeln!(out, "include_dir = {}", INCLUDE_DIR)?;
    writeln!(out)?;
    writeln!(out, "[env:{}]", board_id)?;
    writeln!(out, "platform = {}", options.platform)?;
    writeln!(out, "board = {}", board_id)?;
    writeln!(out, "framework = {}", options.framework)?;

    let flags = build_flags(model, options);
    if !flags.is_empty() {
        writeln!(out, "build_flags =")?;
        for flag in &flags {
            writeln!(out, "    {}", flag)?;
        }
    }
    let deps = lib_deps(model, options);
    if !deps.is_empty() {
        writeln!(out, "lib_deps =")?;
        for dep in deps {
            writeln!(out, "    {}", dep)?;
        }
    }
    if uses_kernel_library(model, options) {
        for (key, value) in KERNEL_LIBRARY_SETTINGS {
            writeln!(out, "{} = {}", key, value)?;
        }
    }

    writeln!(out, "upload_protocol = {}", options.upload_protocol)?;
    writeln!(out, "debug_tool = {}", options.upload_protocol)?;
    writeln!(out, "monitor_speed = {}", options.monitor_speed)?;
    Ok(())
}
