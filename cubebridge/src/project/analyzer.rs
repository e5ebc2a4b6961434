//! Legacy Project Analyzer
//!
//! Reads a generated project directory (configuration file, Makefile and
//! source tree) into a [`LegacyProjectModel`]. The directory is never
//! written to.

use crate::mcu::family;
use crate::project::ioc::IocFile;
use crate::project::makefile::{self, BuildSettings};
use crate::project::sources::{self, KERNEL_DEFINES, KERNEL_DIR, KERNEL_NAMESPACE};
use crate::warning::{self, Outcome, Warning, WarningKind};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("no project found at {path}: {reason}")]
    ProjectNotFound { path: PathBuf, reason: String },
    #[error("MCU '{mcu_name}' does not match any known family prefix")]
    UnresolvedFamily { mcu_name: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PinAssignment {
    /// `N` of the `Mcu.Pin<N>` key.
    pub index: u32,
    pub pin: String,
    pub signal: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LegacyProjectModel {
    pub root: PathBuf,
    pub config_file: PathBuf,
    pub project_name: String,
    /// Family resolved from `mcu_name` through the prefix table.
    pub mcu_family: String,
    /// `Mcu.Name` as written, variant markers included.
    pub mcu_name: String,
    pub pin_assignments: Vec<PinAssignment>,
    pub toolchain_defines: Vec<String>,
    pub source_files: Vec<String>,
    pub uses_real_time_kernel: bool,
    pub kernel_sources_present: bool,
    /// `RCC.HSE_VALUE`, in hertz.
    pub hse_value: Option<u64>,
    pub build: BuildSettings,
    #[serde(skip)]
    pub config: IocFile,
}

impl LegacyProjectModel {
    pub fn has_define(&self, symbol: &str) -> bool {
        self.toolchain_defines
            .iter()
            .any(|d| sources::define_symbol(d) == symbol)
    }

    /// The kernel is used but its sources are not part of the project.
    pub fn kernel_missing(&self) -> bool {
        self.uses_real_time_kernel && !self.kernel_sources_present
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyProjectAnalyzer;

impl LegacyProjectAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, dir: &Path) -> Result<Outcome<LegacyProjectModel>, AnalyzeError> {
        if !dir.is_dir() {
            return Err(AnalyzeError::ProjectNotFound {
                path: dir.to_path_buf(),
                reason: "not a directory".to_string(),
            });
        }
        let config_file = find_config_file(dir)?;
        tracing::info!("Analyzing {}", config_file.display());

        let text = read_lossy(&config_file)?;
        let config = IocFile::parse(&text);
        let mut warnings = Vec::new();

        let mcu_name = config
            .get("Mcu.Name")
            .or_else(|| config.get("Mcu.UserName"))
            .ok_or_else(|| AnalyzeError::ProjectNotFound {
                path: config_file.clone(),
                reason: "neither Mcu.Name nor Mcu.UserName is set".to_string(),
            })?
            .to_string();
        let mcu_family = family::resolve_prefix(&mcu_name)
            .ok_or_else(|| AnalyzeError::UnresolvedFamily {
                mcu_name: mcu_name.clone(),
            })?
            .family
            .to_string();
        if let Some(declared) = config.get("Mcu.Family") {
            if !family::same_family(declared, &mcu_name) {
                warning::push(
                    &mut warnings,
                    WarningKind::FamilyKeyMismatch,
                    format!(
                        "Mcu.Family is {} but {} belongs to {}; using {}",
                        declared, mcu_name, mcu_family, mcu_family
                    ),
                );
            }
        }

        let project_name = config
            .get("ProjectManager.ProjectName")
            .map(str::to_string)
            .or_else(|| dir.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "project".to_string());

        let pin_assignments = pin_assignments(&config, &mut warnings);
        let hse_value = config
            .get("RCC.HSE_VALUE")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|hz| *hz > 0);

        let makefile_path = dir.join("Makefile");
        let parsed = if makefile_path.is_file() {
            makefile::parse_makefile(&read_lossy(&makefile_path)?)
        } else {
            warning::push(
                &mut warnings,
                WarningKind::MissingBuildDescription,
                format!("no Makefile in {}; no defines recovered", dir.display()),
            );
            makefile::MakefileInfo::default()
        };

        let source_files = sources::discover_sources(dir).map_err(|source| AnalyzeError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let kernel_sources_present = dir.join(KERNEL_DIR).is_dir();
        let kernel_define = parsed
            .defines
            .iter()
            .map(|d| sources::define_symbol(d))
            .find(|symbol| KERNEL_DEFINES.contains(symbol));
        let kernel_configured = config.has_namespace(KERNEL_NAMESPACE);
        if !kernel_sources_present && (kernel_define.is_some() || kernel_configured) {
            let signal = match kernel_define {
                Some(symbol) => format!("define {}", symbol),
                None => format!("{}.* configuration", KERNEL_NAMESPACE),
            };
            warning::push(
                &mut warnings,
                WarningKind::KernelSignalMismatch,
                format!(
                    "kernel declared by {} but {} is missing; it will have to be retrieved",
                    signal, KERNEL_DIR
                ),
            );
        }
        let uses_real_time_kernel =
            kernel_sources_present || kernel_define.is_some() || kernel_configured;

        let model = LegacyProjectModel {
            root: dir.to_path_buf(),
            config_file,
            project_name,
            mcu_family,
            mcu_name,
            pin_assignments,
            toolchain_defines: parsed.defines,
            source_files,
            uses_real_time_kernel,
            kernel_sources_present,
            hse_value,
            build: parsed.settings,
            config,
        };
        tracing::info!(
            "Project '{}': {} ({}), {} pins, {} defines, {} source files",
            model.project_name,
            model.mcu_name,
            model.mcu_family,
            model.pin_assignments.len(),
            model.toolchain_defines.len(),
            model.source_files.len()
        );
        Ok(Outcome::new(model, warnings))
    }
}

/// First `*.ioc` in the project root, by name.
fn find_config_file(dir: &Path) -> Result<PathBuf, AnalyzeError> {
    let entries = std::fs::read_dir(dir).map_err(|source| AnalyzeError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().map_or(false, |ext| ext == "ioc"))
        .collect();
    candidates.sort();
    candidates
        .into_iter()
        .next()
        .ok_or_else(|| AnalyzeError::ProjectNotFound {
            path: dir.to_path_buf(),
            reason: "no .ioc configuration file".to_string(),
        })
}

fn read_lossy(path: &Path) -> Result<String, AnalyzeError> {
    std::fs::read(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .map_err(|source| AnalyzeError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// `Mcu.Pin<N>` entries in file order. An index too large for `u32` keeps
/// the pin at `u32::MAX` and records a warning.
fn pin_assignments(config: &IocFile, warnings: &mut Vec<Warning>) -> Vec<PinAssignment> {
    let mut pins = Vec::new();
    for (key, pin) in config.namespace("Mcu") {
        let Some(index) = key.strip_prefix("Pin") else {
            continue;
        };
        if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let index = match index.parse::<u32>() {
            Ok(n) => n,
            Err(_) => {
                warning::push(
                    warnings,
                    WarningKind::Recovered,
                    format!("pin index {} of {} is out of range; kept as {}", index, pin, u32::MAX),
                );
                u32::MAX
            }
        };
        let signal = config
            .get(&format!("{}.Signal", pin))
            .or_else(|| config.get(&format!("{}.Mode", pin)))
            .map(str::to_string);
        pins.push(PinAssignment {
            index,
            pin: pin.to_string(),
            signal,
        });
    }
    pins
}
