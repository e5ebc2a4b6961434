//! Analyze a CubeMX project and print what a migration would carry over.

use cubebridge::prelude::*;
use std::path::Path;

fn main() -> Result<(), CubeBridgeError> {
    let dir = std::env::args().nth(1).unwrap_or_else(|| ".".to_string());
    let dir = Path::new(&dir);

    if !dir.is_dir() {
        eprintln!("Not a directory: {}", dir.display());
        eprintln!("Usage: cargo run --example analyze_project [path/to/cubemx/project]");
        std::process::exit(1);
    }

    let outcome = CubeBridgeCore::analyze(dir)?;
    let model = &outcome.value;

    println!("Project {} ({})", model.project_name, model.config_file.display());
    println!("MCU: {} / {}", model.mcu_name, model.mcu_family);
    println!("Defines: {}", model.toolchain_defines.join(" "));
    println!("Pins:");
    for pin in &model.pin_assignments {
        println!("  {:<20} {}", pin.pin, pin.signal.as_deref().unwrap_or("-"));
    }
    println!("Sources: {}", model.source_files.len());

    if model.kernel_missing() {
        println!("FreeRTOS is used but its sources are not in the project");
    }
    for warning in &outcome.warnings {
        println!("warning: {}", warning);
    }

    Ok(())
}
