//! Board descriptions: the record, its synthesizer and where a migration
//! gets its board from.

pub mod schema;
pub mod source;
pub mod synth;

pub use schema::{validate_board_id, BoardDescription, BoardFile};
pub use source::{BoardSource, BoardSourceError, ResolvedBoard};
pub use synth::{BoardOverrides, BoardSynthesizer, SynthesisError};
