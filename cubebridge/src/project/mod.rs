//! Legacy Project Analyzer: `.ioc` configuration, Makefile and source tree.

pub mod analyzer;
pub mod ioc;
pub mod makefile;
pub mod sources;

pub use analyzer::{AnalyzeError, LegacyProjectAnalyzer, LegacyProjectModel, PinAssignment};
pub use ioc::IocFile;
pub use makefile::BuildSettings;
