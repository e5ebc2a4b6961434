//! Migration Emitter
//!
//! Joins an analyzed legacy project with a board source and writes the
//! destination project: manifest, board file and relocated sources.

use crate::board::{BoardSource, BoardSourceError};
use crate::emit::manifest::{self, BOARDS_DIR, INCLUDE_DIR, MANIFEST_FILE, SOURCE_DIR};
use crate::emit::options::{KernelMode, MigrationOptions};
use crate::emit::writer::{write_if_changed, FileStatus};
use crate::mcu::family;
use crate::project::sources::{self, KERNEL_CONFIG_HEADER};
use crate::project::LegacyProjectModel;
use crate::warning::{self, Outcome, Warning, WarningKind};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmitError {
    #[error(
        "project MCU family {project_family} does not match board MCU {board_mcu} \
         ({board_family}); refusing to emit"
    )]
    FamilyMismatch {
        project_family: String,
        board_mcu: String,
        board_family: String,
    },
    #[error("invalid board file: {0}")]
    InvalidBoardFile(#[from] BoardSourceError),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmittedFile {
    /// Relative to the destination, `/`-separated.
    pub path: String,
    pub status: FileStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationResult {
    pub destination: PathBuf,
    pub board_id: String,
    pub board_source: &'static str,
    pub files: Vec<EmittedFile>,
    pub kernel_needs_retrieval: bool,
    pub warnings: Vec<Warning>,
}

impl MigrationResult {
    /// Files created or updated by this run.
    pub fn written(&self) -> impl Iterator<Item = &EmittedFile> {
        self.files.iter().filter(|f| f.status != FileStatus::Unchanged)
    }

    pub fn unchanged(&self) -> impl Iterator<Item = &EmittedFile> {
        self.files.iter().filter(|f| f.status == FileStatus::Unchanged)
    }

    pub fn file(&self, path: &str) -> Option<&EmittedFile> {
        self.files.iter().find(|f| f.path == path)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MigrationEmitter {
    options: MigrationOptions,
}

impl MigrationEmitter {
    pub fn new(options: MigrationOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MigrationOptions {
        &self.options
    }

    /// Nothing is written unless the board and the project agree on the
    /// MCU family. Each file is replaced atomically; files that already hold
    /// the right bytes are left alone.
    pub fn emit(
        &self,
        project: &Outcome<LegacyProjectModel>,
        board: &BoardSource,
        destination: &Path,
    ) -> Result<MigrationResult, EmitError> {
        let model = &project.value;
        let resolved = board.resolve()?;

        if !family::same_family(&model.mcu_family, &resolved.mcu) {
            return Err(EmitError::FamilyMismatch {
                project_family: model.mcu_family.clone(),
                board_mcu: resolved.mcu.clone(),
                board_family: family::infer_family(&resolved.mcu),
            });
        }
        tracing::info!(
            "Emitting '{}' to {} with {} board '{}'",
            model.project_name,
            destination.display(),
            board.kind(),
            resolved.board_id
        );

        let mut warnings = project.warnings.clone();
        warnings.extend(resolved.warnings.iter().cloned());
        if model.uses_real_time_kernel && self.options.kernel == KernelMode::Disabled {
            warning::push(
                &mut warnings,
                WarningKind::KernelDisabled,
                "project uses the real-time kernel but kernel handling is disabled; \
                 kernel sources and flags must be set up by hand",
            );
        }

        let mut files = Vec::new();
        let mut put = |rel: String, contents: &[u8]| -> Result<(), EmitError> {
            let path = destination.join(&rel);
            let status = write_if_changed(&path, contents).map_err(|source| EmitError::Io {
                path: path.clone(),
                source,
            })?;
            tracing::debug!("{} {}", status.as_str(), rel);
            files.push(EmittedFile { path: rel, status });
            Ok(())
        };

        let manifest = manifest::render_manifest(model, &resolved.board_id, &self.options);
        put(MANIFEST_FILE.to_string(), manifest.as_bytes())?;

        if let Some(contents) = &resolved.contents {
            put(format!("{}/{}.json", BOARDS_DIR, resolved.board_id), contents.as_slice())?;
        }

        for rel in &model.source_files {
            let from = model.root.join(rel);
            let contents = std::fs::read(&from).map_err(|source| EmitError::Io {
                path: from.clone(),
                source,
            })?;
            put(format!("{}/{}", SOURCE_DIR, rel), contents.as_slice())?;
        }

        let kernel_library = manifest::uses_kernel_library(model, &self.options);
        if kernel_library {
            match sources::kernel_config_header(&model.source_files) {
                Some(rel) => {
                    let from = model.root.join(rel);
                    let contents = std::fs::read(&from).map_err(|source| EmitError::Io {
                        path: from.clone(),
                        source,
                    })?;
                    put(format!("{}/{}", INCLUDE_DIR, KERNEL_CONFIG_HEADER), contents.as_slice())?;
                }
                None => warning::push(
                    &mut warnings,
                    WarningKind::MissingKernelConfig,
                    format!(
                        "no {} in the project; the kernel library needs one in {}/",
                        KERNEL_CONFIG_HEADER, INCLUDE_DIR
                    ),
                ),
            }
        }

        let include = destination.join(INCLUDE_DIR);
        std::fs::create_dir_all(&include).map_err(|source| EmitError::Io {
            path: include,
            source,
        })?;

        let result = MigrationResult {
            destination: destination.to_path_buf(),
            board_id: resolved.board_id,
            board_source: board.kind(),
            files,
            kernel_needs_retrieval: kernel_library,
            warnings,
        };
        tracing::info!(
            "Migration done: {} written, {} unchanged, {} warnings",
            result.written().count(),
            result.unchanged().count(),
            result.warnings.len()
        );
        Ok(result)
    }
}
