//! CubeBridge CLI - migrate STM32CubeMX Makefile projects to PlatformIO.

mod host;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use cubebridge::mcu::family::{FAMILIES, KNOWN_BOARDS};
use cubebridge::{
    BoardDescription, BoardOverrides, BoardRequest, CubeBridgeCore, FileStatus, KernelMode,
    LegacyProjectModel, MigrationOptions, MigrationResult, Outcome, Warning,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "cubebridge")]
#[command(about = "Migrate STM32CubeMX Makefile projects to PlatformIO", long_about = None)]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what would be migrated from a CubeMX project
    Analyze {
        /// Path to the CubeMX project directory
        #[arg(value_name = "DIR", default_value = ".")]
        dir: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Generate a PlatformIO board file from a vendor product page
    GenerateBoard {
        /// Product page URL, or a saved HTML/text page
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Board id (file name); defaults to the part without package suffix
        #[arg(long)]
        board_id: Option<String>,

        /// HSE crystal frequency in Hz
        #[arg(long)]
        hse: Option<String>,

        /// CPU frequency in Hz
        #[arg(long)]
        f_cpu: Option<String>,

        /// Extra define for build.extra_flags (repeatable)
        #[arg(short = 'D', long = "define", value_name = "DEFINE")]
        defines: Vec<String>,

        /// Write <board-id>.json into this directory instead of printing it
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Migrate a CubeMX project into a new PlatformIO project
    Migrate {
        /// Path to the CubeMX project directory
        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        /// Destination directory
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Product page URL, saved page or board .json for a custom board
        #[arg(long)]
        board_source: Option<String>,

        /// Existing PlatformIO board to target, or the id of a generated board
        #[arg(short, long)]
        board_id: Option<String>,

        /// How the FreeRTOS kernel is provided
        #[arg(long, value_enum, default_value = "library")]
        kernel: KernelArg,

        /// Run `pio run` after migrating
        #[arg(long)]
        build: bool,

        /// Open the migrated project in an editor
        #[arg(long)]
        open: bool,

        /// Editor command used with --open
        #[arg(long, default_value = "code")]
        editor: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// List boards PlatformIO already ships and the supported MCU families
    ListBoards {
        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripts
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum KernelArg {
    /// Add the kernel as a library dependency when its sources are missing
    Library,
    /// Use the framework's built-in kernel
    Framework,
    /// Leave the kernel out
    Disabled,
}

impl From<KernelArg> for KernelMode {
    fn from(arg: KernelArg) -> Self {
        match arg {
            KernelArg::Library => KernelMode::Library,
            KernelArg::Framework => KernelMode::Framework,
            KernelArg::Disabled => KernelMode::Disabled,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match cli.command {
        Commands::Analyze { dir, format } => handle_analyze(&dir, format),
        Commands::GenerateBoard {
            source,
            board_id,
            hse,
            f_cpu,
            defines,
            output,
            format,
        } => {
            let overrides = BoardOverrides {
                board_id,
                hse_value: hse,
                cpu_frequency: f_cpu,
                extra_defines: defines,
                ..Default::default()
            };
            handle_generate_board(&source, overrides, output.as_deref(), format)
        }
        Commands::Migrate {
            source,
            output,
            board_source,
            board_id,
            kernel,
            build,
            open,
            editor,
            format,
        } => {
            let request = BoardRequest {
                source: board_source,
                overrides: BoardOverrides {
                    board_id,
                    ..Default::default()
                },
            };
            let options = MigrationOptions {
                kernel: kernel.into(),
                ..Default::default()
            };
            let post = PostSteps { build, open, editor };
            handle_migrate(&source, &output, &request, options, &post, format)
        }
        Commands::ListBoards { format } => {
            handle_list_boards(format);
            0
        }
    };

    process::exit(exit_code);
}

/// Logs go to stderr so `--format json` output stays clean.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: failed to serialize output: {}", e),
    }
}

fn print_warnings(warnings: &[Warning]) {
    if warnings.is_empty() {
        return;
    }
    println!("\nWarnings:");
    for warning in warnings {
        println!("  - {}", warning);
    }
}

fn handle_analyze(dir: &Path, format: OutputFormat) -> i32 {
    match CubeBridgeCore::analyze(dir) {
        Ok(outcome) => {
            match format {
                OutputFormat::Human => output_project_human(&outcome),
                OutputFormat::Json => print_json(&outcome),
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn output_project_human(outcome: &Outcome<LegacyProjectModel>) {
    let model = &outcome.value;
    println!("\nProject: {}", model.project_name);
    println!("{}", "─".repeat(60));
    println!("  MCU:        {} ({})", model.mcu_name, model.mcu_family);
    println!("  Config:     {}", model.config_file.display());
    if let Some(target) = &model.build.target {
        println!("  Target:     {}", target);
    }
    if let Some(hse) = model.hse_value {
        println!("  HSE:        {} Hz", hse);
    }
    println!(
        "  Kernel:     {}",
        match (model.uses_real_time_kernel, model.kernel_sources_present) {
            (false, _) => "not used",
            (true, true) => "FreeRTOS (sources present)",
            (true, false) => "FreeRTOS (sources missing)",
        }
    );

    println!("\n  Defines ({}):", model.toolchain_defines.len());
    for define in &model.toolchain_defines {
        println!("    -D {}", define);
    }
    println!("\n  Pins ({}):", model.pin_assignments.len());
    for pin in &model.pin_assignments {
        println!("    {:<20} {}", pin.pin, pin.signal.as_deref().unwrap_or("-"));
    }
    println!("\n  Source files: {}", model.source_files.len());
    print_warnings(&outcome.warnings);
}

fn handle_generate_board(
    source: &str,
    overrides: BoardOverrides,
    output: Option<&Path>,
    format: OutputFormat,
) -> i32 {
    let pages = match host::HttpPageSource::new() {
        Ok(pages) => pages,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return 1;
        }
    };
    let board = CubeBridgeCore::fetch_and_extract(&pages, source)
        .and_then(|spec| CubeBridgeCore::synthesize(&spec, &overrides));
    let outcome = match board {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    match output {
        Some(dir) => match CubeBridgeCore::write_board(&outcome.value, dir) {
            Ok((path, status)) => {
                output_written_board(&outcome, &path, status, format);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        None => {
            match outcome.value.to_json() {
                Ok(json) => print!("{}", json),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return 1;
                }
            }
            for warning in &outcome.warnings {
                eprintln!("warning: {}", warning);
            }
            0
        }
    }
}

fn output_written_board(
    outcome: &Outcome<BoardDescription>,
    path: &Path,
    status: FileStatus,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Human => {
            let board = &outcome.value;
            println!("Board file {}: {}", status.as_str(), path.display());
            println!("  MCU:    {} ({})", board.mcu_part_number, board.family);
            println!("  Memory: {} KB flash, {} KB RAM", board.flash_kib, board.ram_kib);
            println!("  Clock:  HSE {}, f_cpu {}", board.clock_literal, board.cpu_frequency_literal);
            print_warnings(&outcome.warnings);
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "path": path.display().to_string(),
            "status": status,
            "board": outcome.value,
            "warnings": outcome.warnings,
        })),
    }
}

struct PostSteps {
    build: bool,
    open: bool,
    editor: String,
}

fn handle_migrate(
    source: &Path,
    output: &Path,
    request: &BoardRequest,
    options: MigrationOptions,
    post: &PostSteps,
    format: OutputFormat,
) -> i32 {
    let pages = match host::HttpPageSource::new() {
        Ok(pages) => pages,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return 1;
        }
    };
    let result = match CubeBridgeCore::migrate(source, request, output, options, &pages) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    match format {
        OutputFormat::Human => output_migration_human(&result),
        OutputFormat::Json => print_json(&result),
    }

    // post-steps report, they never fail the migration
    if post.build {
        match host::run_build(&result.destination) {
            Ok(()) => eprintln!("Build succeeded"),
            Err(e) => eprintln!("Build failed: {:#}", e),
        }
    }
    if post.open {
        if let Err(e) = host::open_editor(&post.editor, &result.destination) {
            eprintln!("Could not open editor: {:#}", e);
        }
    }
    0
}

fn output_migration_human(result: &MigrationResult) {
    println!("\nMigrated to: {}", result.destination.display());
    println!("{}", "─".repeat(60));
    println!("  Board:      {} ({})", result.board_id, result.board_source);
    println!(
        "  Files:      {} written, {} unchanged",
        result.written().count(),
        result.unchanged().count()
    );
    for file in result.written() {
        println!("    {:<9} {}", file.status.as_str(), file.path);
    }
    if result.kernel_needs_retrieval {
        println!("\n  FreeRTOS sources are not in the project; PlatformIO will fetch them via lib_deps.");
    }
    print_warnings(&result.warnings);
}

fn handle_list_boards(format: OutputFormat) {
    match format {
        OutputFormat::Human => {
            println!("Boards PlatformIO already ships:\n");
            for board in KNOWN_BOARDS {
                println!("  {:<16} {}", board.mcu_prefix, board.board_id);
            }
            println!("\nFamilies supported for generated boards:\n");
            for record in FAMILIES {
                println!(
                    "  {:<10} openocd {:<10} f_cpu {} Hz",
                    record.family, record.openocd_target, record.default_f_cpu
                );
            }
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "boards": KNOWN_BOARDS
                .iter()
                .map(|b| serde_json::json!({ "mcu": b.mcu_prefix, "board_id": b.board_id }))
                .collect::<Vec<_>>(),
            "families": FAMILIES.iter().map(|r| r.family).collect::<Vec<_>>(),
        })),
    }
}
