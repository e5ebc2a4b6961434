//! Pipeline facade shared by the CLI and library users.
//! Runs analyze → extract → synthesize → emit; performs no network I/O itself.

use std::path::{Path, PathBuf};

use crate::board::{
    validate_board_id, BoardDescription, BoardOverrides, BoardSource, BoardSourceError,
    BoardSynthesizer, SynthesisError,
};
use crate::emit::writer::{write_if_changed, FileStatus};
use crate::emit::{EmitError, MigrationEmitter, MigrationOptions, MigrationResult};
use crate::extract::{ExtractError, VendorExtractor};
use crate::fetch::{is_url, FetchError, PageSource};
use crate::mcu::{family, McuSpecification, ValidationError};
use crate::project::{AnalyzeError, LegacyProjectAnalyzer, LegacyProjectModel};
use crate::warning::Outcome;

#[derive(Debug, thiserror::Error)]
pub enum CubeBridgeError {
    #[error("invalid MCU data: {0}")]
    Validation(#[from] ValidationError),
    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),
    #[error("board synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),
    #[error("project analysis failed: {0}")]
    Analyze(#[from] AnalyzeError),
    #[error("emit failed: {0}")]
    Emit(#[from] EmitError),
    #[error("{0}")]
    Fetch(#[from] FetchError),
    #[error("{0}")]
    BoardSource(#[from] BoardSourceError),
    #[error(
        "no known board for {mcu_name}; pass a vendor page URL, a saved page or a board .json \
         as the board source"
    )]
    UnsupportedBoard { mcu_name: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What the caller asked for as the migration's board.
#[derive(Debug, Clone, Default)]
pub struct BoardRequest {
    /// URL or saved vendor page, or a board `.json`. `None` means "look the
    /// MCU up among known boards".
    pub source: Option<String>,
    pub overrides: BoardOverrides,
}

impl BoardRequest {
    pub fn known() -> Self {
        Self::default()
    }

    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            overrides: BoardOverrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: BoardOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// Core migration API used by the CLI.
pub struct CubeBridgeCore;

impl CubeBridgeCore {
    pub fn analyze(dir: &Path) -> Result<Outcome<LegacyProjectModel>, CubeBridgeError> {
        Ok(LegacyProjectAnalyzer::new().analyze(dir)?)
    }

    pub fn extract(raw_text: &str, source_url: &str) -> Result<McuSpecification, CubeBridgeError> {
        Ok(VendorExtractor::new().extract(raw_text, source_url)?)
    }

    /// One retrieval attempt, then extraction.
    pub fn fetch_and_extract(
        pages: &dyn PageSource,
        location: &str,
    ) -> Result<McuSpecification, CubeBridgeError> {
        tracing::info!("Fetching vendor page {}", location);
        let raw = pages.fetch_page(location)?;
        Self::extract(&raw, location)
    }

    pub fn synthesize(
        spec: &McuSpecification,
        overrides: &BoardOverrides,
    ) -> Result<Outcome<BoardDescription>, CubeBridgeError> {
        Ok(BoardSynthesizer::new().synthesize(spec, overrides)?)
    }

    /// Write `<board_id>.json` into `dir`.
    pub fn write_board(board: &BoardDescription, dir: &Path) -> Result<(PathBuf, FileStatus), CubeBridgeError> {
        let path = dir.join(board.file_name());
        let json = board.to_json().map_err(BoardSourceError::from)?;
        let status = write_if_changed(&path, json.as_bytes())?;
        Ok((path, status))
    }

    /// Pick the board for a migration:
    /// a `.json` path is used as is, any other source is fetched, extracted
    /// and synthesized. Without a source, a board id the caller named wins
    /// over the known-board table.
    pub fn resolve_board(
        project: &LegacyProjectModel,
        request: &BoardRequest,
        pages: &dyn PageSource,
    ) -> Result<BoardSource, CubeBridgeError> {
        let Some(source) = request.source.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            if let Some(board_id) = request.overrides.board_id.as_deref().map(str::trim) {
                validate_board_id(board_id)?;
                let mcu = family::mcu_from_board_id(board_id).unwrap_or_else(|| {
                    tracing::info!(
                        "Board id '{}' hints at no MCU; assuming it carries {}",
                        board_id,
                        project.mcu_name
                    );
                    project.mcu_name.clone()
                });
                return Ok(BoardSource::Named {
                    board_id: board_id.to_string(),
                    mcu,
                });
            }
            return family::known_board(&project.mcu_name)
                .map(|board| BoardSource::Known(*board))
                .ok_or_else(|| CubeBridgeError::UnsupportedBoard {
                    mcu_name: project.mcu_name.clone(),
                });
        };

        if !is_url(source) && source.to_ascii_lowercase().ends_with(".json") {
            return Ok(BoardSource::UserSupplied(PathBuf::from(source)));
        }

        let spec = Self::fetch_and_extract(pages, source)?;
        let mut overrides = request.overrides.clone();
        if overrides.hse_value.is_none() {
            overrides.hse_value = project.hse_value.map(|hz| format!("{}U", hz));
        }
        if overrides.url.is_none() && is_url(source) {
            overrides.url = Some(source.to_string());
        }
        Ok(BoardSource::Synthesized(Self::synthesize(&spec, &overrides)?))
    }

    /// Analyze `dir`, resolve the board and emit into `destination`.
    pub fn migrate(
        dir: &Path,
        request: &BoardRequest,
        destination: &Path,
        options: MigrationOptions,
        pages: &dyn PageSource,
    ) -> Result<MigrationResult, CubeBridgeError> {
        let project = Self::analyze(dir)?;
        let board = Self::resolve_board(&project.value, request, pages)?;
        Ok(MigrationEmitter::new(options).emit(&project, &board, destination)?)
    }
}
