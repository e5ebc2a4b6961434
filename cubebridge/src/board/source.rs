//! Where the board file of a migration comes from.

use crate::board::schema::{validate_board_id, BoardDescription};
use crate::mcu::{KnownBoard, ValidationError};
use crate::warning::{Outcome, Warning};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardSourceError {
    #[error("cannot read board file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("board file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("board file {0} names no MCU (expected build.mcu, build.variant or debug.jlink_device)")]
    NoMcu(PathBuf),
    #[error("board file {path}: {source}")]
    BoardId {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },
    #[error("failed to render board file: {0}")]
    Render(#[from] serde_json::Error),
}

/// Board selection for one migration, resolved before anything is written.
#[derive(Debug, Clone)]
pub enum BoardSource {
    /// Freshly synthesized from vendor data, with the synthesizer's warnings.
    Synthesized(Outcome<BoardDescription>),
    /// A board file the user already has; copied verbatim.
    UserSupplied(PathBuf),
    /// A board the destination toolchain ships; no file is written.
    Known(KnownBoard),
    /// A board id the user named, trusted to exist in the destination
    /// toolchain. `mcu` is what the family check runs against.
    Named { board_id: String, mcu: String },
}

/// What the emitter needs from any [`BoardSource`].
#[derive(Debug, Clone)]
pub struct ResolvedBoard {
    pub board_id: String,
    /// MCU name used for the family check.
    pub mcu: String,
    /// Bytes for `boards/<board_id>.json`, absent for known boards.
    pub contents: Option<Vec<u8>>,
    pub warnings: Vec<Warning>,
}

impl BoardSource {
    pub fn kind(&self) -> &'static str {
        match self {
            BoardSource::Synthesized(_) => "synthesized",
            BoardSource::UserSupplied(_) => "user-supplied",
            BoardSource::Known(_) => "known",
            BoardSource::Named { .. } => "named",
        }
    }

    pub fn resolve(&self) -> Result<ResolvedBoard, BoardSourceError> {
        match self {
            BoardSource::Synthesized(outcome) => Ok(ResolvedBoard {
                board_id: outcome.value.board_id.clone(),
                mcu: outcome.value.mcu_part_number.clone(),
                contents: Some(outcome.value.to_json()?.into_bytes()),
                warnings: outcome.warnings.clone(),
            }),
            BoardSource::UserSupplied(path) => load_user_board(path),
            BoardSource::Known(board) => Ok(ResolvedBoard {
                board_id: board.board_id.to_string(),
                mcu: board.mcu_prefix.to_string(),
                contents: None,
                warnings: Vec::new(),
            }),
            BoardSource::Named { board_id, mcu } => Ok(ResolvedBoard {
                board_id: board_id.clone(),
                mcu: mcu.clone(),
                contents: None,
                warnings: Vec::new(),
            }),
        }
    }
}

/// Read a user board file. The board id is the file stem; the bytes are
/// kept exactly as read.
pub fn load_user_board(path: &Path) -> Result<ResolvedBoard, BoardSourceError> {
    let bytes = std::fs::read(path).map_err(|source| BoardSourceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let json: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|source| BoardSourceError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let mcu = ["/build/mcu", "/build/variant", "/debug/jlink_device"]
        .iter()
        .filter_map(|pointer| json.pointer(pointer).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .ok_or_else(|| BoardSourceError::NoMcu(path.to_path_buf()))?
        .to_uppercase();

    let board_id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    validate_board_id(&board_id).map_err(|source| BoardSourceError::BoardId {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!("Loaded user board file {} (mcu {})", path.display(), mcu);
    Ok(ResolvedBoard {
        board_id,
        mcu,
        contents: Some(bytes),
        warnings: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_board_mcu_fallbacks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("my_board.json");
        std::fs::write(&path, r#"{"build":{"variant":"stm32l432kc"},"name":"x"}"#).unwrap();
        let resolved = load_user_board(&path).unwrap();
        assert_eq!(resolved.board_id, "my_board");
        assert_eq!(resolved.mcu, "STM32L432KC");

        std::fs::write(&path, r#"{"debug":{"jlink_device":"STM32F401RE"}}"#).unwrap();
        assert_eq!(load_user_board(&path).unwrap().mcu, "STM32F401RE");
    }

    #[test]
    fn test_user_board_without_mcu_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.json");
        std::fs::write(&path, r#"{"name":"bare"}"#).unwrap();
        assert!(matches!(load_user_board(&path), Err(BoardSourceError::NoMcu(_))));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(load_user_board(&path), Err(BoardSourceError::Parse { .. })));
    }

    #[test]
    fn test_known_board_writes_nothing() {
        let known = crate::mcu::family::known_board("STM32F401RETx").unwrap();
        let resolved = BoardSource::Known(*known).resolve().unwrap();
        assert_eq!(resolved.board_id, "nucleo_f401re");
        assert!(resolved.contents.is_none());
    }

    #[test]
    fn test_named_board_writes_nothing() {
        let source = BoardSource::Named {
            board_id: "blackpill_f401cc".to_string(),
            mcu: "STM32F401CC".to_string(),
        };
        assert_eq!(source.kind(), "named");
        let resolved = source.resolve().unwrap();
        assert_eq!(resolved.board_id, "blackpill_f401cc");
        assert_eq!(resolved.mcu, "STM32F401CC");
        assert!(resolved.contents.is_none());
    }
}
