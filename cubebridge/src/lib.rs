//! CubeBridge - STM32CubeMX to PlatformIO migration library
//!
//! This library reads a CubeMX-generated Makefile project (the `.ioc`
//! configuration, the Makefile and the source tree) and re-emits it as a
//! PlatformIO project. For boards PlatformIO does not ship, it synthesizes
//! a board file from the part's vendor page.
//!
//! # Quick Start
//!
//! ```no_run
//! use cubebridge::{BoardRequest, CubeBridgeCore, FilePageSource, MigrationOptions};
//! use std::path::Path;
//!
//! let result = CubeBridgeCore::migrate(
//!     Path::new("blinky"),
//!     &BoardRequest::from_source("pages/stm32l432kc.html"),
//!     Path::new("blinky-pio"),
//!     MigrationOptions::default(),
//!     &FilePageSource,
//! ).unwrap();
//!
//! for file in result.written() {
//!     println!("{:?} {}", file.status, file.path);
//! }
//! for warning in &result.warnings {
//!     eprintln!("{}", warning);
//! }
//! ```
//!
//! # Pipeline
//!
//! - **Extract**: vendor page text → [`McuSpecification`]
//! - **Synthesize**: [`McuSpecification`] → [`BoardDescription`] (board JSON)
//! - **Analyze**: project directory → [`LegacyProjectModel`]
//! - **Emit**: model + [`BoardSource`] → `platformio.ini`, `boards/`, `src/`

pub mod board;
pub mod core;
pub mod emit;
pub mod extract;
pub mod fetch;
pub mod mcu;
pub mod project;
pub mod warning;

// Re-export main types
pub use crate::core::{BoardRequest, CubeBridgeCore, CubeBridgeError};
pub use board::{BoardDescription, BoardOverrides, BoardSource, BoardSynthesizer, SynthesisError};
pub use emit::{
    EmitError, EmittedFile, FileStatus, KernelMode, MigrationEmitter, MigrationOptions,
    MigrationResult,
};
pub use extract::{ExtractError, VendorExtractor};
pub use fetch::{FetchError, FilePageSource, PageSource};
pub use mcu::{McuFields, McuSpecification, ValidationError};
pub use project::{AnalyzeError, LegacyProjectAnalyzer, LegacyProjectModel, PinAssignment};
pub use warning::{Outcome, Warning, WarningKind};

/// Analyze a project directory (convenience wrapper).
pub fn analyze_project(
    dir: &std::path::Path,
) -> Result<Outcome<LegacyProjectModel>, CubeBridgeError> {
    CubeBridgeCore::analyze(dir)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        BoardOverrides, BoardRequest, BoardSource, CubeBridgeCore, CubeBridgeError, KernelMode,
        MigrationOptions, MigrationResult, Outcome, Warning, WarningKind,
    };
}
