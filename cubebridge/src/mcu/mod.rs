//! MCU model: the validated part record and the static family tables.

pub mod family;
pub mod spec;

pub use family::{FamilyPrefix, FamilyRecord, KnownBoard, UNKNOWN_CORE};
pub use spec::{McuFields, McuSpecification, ValidationError};
