//! Migration Emitter: manifest, board file and relocated sources.

pub mod emitter;
pub mod manifest;
pub mod options;
pub mod writer;

pub use emitter::{EmitError, EmittedFile, MigrationEmitter, MigrationResult};
pub use options::{KernelMode, MigrationOptions};
pub use writer::FileStatus;
