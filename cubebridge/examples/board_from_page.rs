//! Build a PlatformIO board file from a saved vendor product page.

use cubebridge::prelude::*;
use std::path::Path;

fn main() -> Result<(), CubeBridgeError> {
    let page = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/pages/stm32l432kc.html".to_string());
    if !Path::new(&page).exists() {
        eprintln!("File not found: {}", page);
        eprintln!("Usage: cargo run --example board_from_page [path/to/page.html] [HSE_HZ]");
        std::process::exit(1);
    }

    let spec = CubeBridgeCore::fetch_and_extract(&cubebridge::FilePageSource, &page)?;
    println!(
        "{}: {} KB flash, {} KB RAM, {}",
        spec.part_number(),
        spec.flash_bytes() / 1024,
        spec.ram_bytes() / 1024,
        spec.package()
    );

    let overrides = BoardOverrides {
        hse_value: std::env::args().nth(2),
        ..Default::default()
    };
    let outcome = CubeBridgeCore::synthesize(&spec, &overrides)?;
    for warning in &outcome.warnings {
        eprintln!("warning: {}", warning);
    }

    let json = outcome
        .value
        .to_json()
        .map_err(cubebridge::board::BoardSourceError::from)?;
    print!("{}", json);
    Ok(())
}
