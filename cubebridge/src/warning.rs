//! Non-fatal findings collected while a pipeline step runs.
//!
//! Warnings never abort an operation. They travel with the result value
//! ([`Outcome`]) so the host can show all of them at once.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A value was corrected on the way through (e.g. a literal suffix added).
    Recovered,
    /// Kernel was declared (define or configuration) but its sources are absent.
    KernelSignalMismatch,
    /// `Mcu.Family` disagrees with the family resolved from `Mcu.Name`.
    FamilyKeyMismatch,
    /// No build description next to the configuration file.
    MissingBuildDescription,
    /// Kernel handling was switched off by the caller.
    KernelDisabled,
    /// The kernel library needs a configuration header the project lacks.
    MissingKernelConfig,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningKind::Recovered => "recovered",
            WarningKind::KernelSignalMismatch => "kernel_signal_mismatch",
            WarningKind::FamilyKeyMismatch => "family_key_mismatch",
            WarningKind::MissingBuildDescription => "missing_build_description",
            WarningKind::KernelDisabled => "kernel_disabled",
            WarningKind::MissingKernelConfig => "missing_kernel_config",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str(), self.message)
    }
}

/// A result value plus the warnings gathered while producing it.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
}

impl<T> Outcome<T> {
    pub fn new(value: T, warnings: Vec<Warning>) -> Self {
        Self { value, warnings }
    }

    /// Wrap a value that was produced without any warnings.
    pub fn clean(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn has_kind(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }

    pub fn into_parts(self) -> (T, Vec<Warning>) {
        (self.value, self.warnings)
    }
}

impl<T> From<T> for Outcome<T> {
    fn from(value: T) -> Self {
        Outcome::clean(value)
    }
}

/// Record a warning and mirror it to the log.
pub(crate) fn push(warnings: &mut Vec<Warning>, kind: WarningKind, message: impl Into<String>) {
    let warning = Warning::new(kind, message);
    tracing::warn!("{}", warning);
    warnings.push(warning);
}
