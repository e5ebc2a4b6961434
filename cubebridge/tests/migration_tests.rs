//! End-to-end migrations into temporary destinations

use cubebridge::prelude::*;
use cubebridge::{EmitError, FileStatus, FilePageSource};
use std::fs;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn l432_page() -> String {
    fixture_path("pages")
        .join("stm32l432kc.txt")
        .to_string_lossy()
        .into_owned()
}

fn migrate(project: &str, request: &BoardRequest, options: MigrationOptions) -> (tempfile::TempDir, MigrationResult) {
    let dest = tempfile::tempdir().unwrap();
    let result = CubeBridgeCore::migrate(
        &fixture_path(project),
        request,
        dest.path(),
        options,
        &FilePageSource,
    )
    .unwrap();
    (dest, result)
}

#[test]
fn test_migrate_with_synthesized_board() {
    let (dest, result) = migrate(
        "l432_blinky",
        &BoardRequest::from_source(l432_page()),
        MigrationOptions::default(),
    );

    assert_eq!(result.board_id, "stm32l432kc");
    assert_eq!(result.board_source, "synthesized");
    assert!(!result.kernel_needs_retrieval);
    assert!(result.warnings.is_empty());
    assert!(result.files.iter().all(|f| f.status == FileStatus::Created));
    assert!(result.file("platformio.ini").is_some());
    assert!(result.file("boards/stm32l432kc.json").is_some());
    assert!(result.file("src/Core/Src/main.c").is_some());
    assert!(result.file("src/Core/Startup/startup_stm32l432xx.s").is_some());
    assert!(result.file("src/Core/Src/syscalls.c").is_none());
    assert!(dest.path().join("include").is_dir());
    assert!(!dest.path().join("src/Drivers").exists());

    let manifest = fs::read_to_string(dest.path().join("platformio.ini")).unwrap();
    assert!(manifest.contains("[env:stm32l432kc]\n"));
    assert!(manifest.contains("board = stm32l432kc\n"));
    assert!(manifest.contains("    -D HSE_VALUE=8000000U\n"));
    assert!(manifest.contains("    -I src/Core/Inc\n"));
    assert!(!manifest.contains("lib_deps"));
    assert_eq!(manifest.matches("-D USE_HAL_DRIVER").count(), 1);

    let board: serde_json::Value =
        serde_json::from_slice(&fs::read(dest.path().join("boards/stm32l432kc.json")).unwrap()).unwrap();
    assert_eq!(board["build"]["f_cpu"], "80000000L");
    assert_eq!(board["debug"]["jlink_device"], "STM32L432KC");

    let copied = fs::read(dest.path().join("src/Core/Src/main.c")).unwrap();
    let original = fs::read(fixture_path("l432_blinky").join("Core/Src/main.c")).unwrap();
    assert_eq!(copied, original);
}

#[test]
fn test_second_run_changes_nothing() {
    let dest = tempfile::tempdir().unwrap();
    let request = BoardRequest::from_source(l432_page());
    let run = || {
        CubeBridgeCore::migrate(
            &fixture_path("l432_blinky"),
            &request,
            dest.path(),
            MigrationOptions::default(),
            &FilePageSource,
        )
        .unwrap()
    };

    let first = run();
    let manifest = fs::read(dest.path().join("platformio.ini")).unwrap();
    let second = run();

    assert_eq!(first.files.len(), second.files.len());
    assert_eq!(second.written().count(), 0);
    assert!(second.files.iter().all(|f| f.status == FileStatus::Unchanged));
    assert_eq!(fs::read(dest.path().join("platformio.ini")).unwrap(), manifest);
}

#[test]
fn test_stale_manifest_is_updated() {
    let dest = tempfile::tempdir().unwrap();
    fs::write(dest.path().join("platformio.ini"), "; stale\n").unwrap();
    let result = CubeBridgeCore::migrate(
        &fixture_path("l432_blinky"),
        &BoardRequest::from_source(l432_page()),
        dest.path(),
        MigrationOptions::default(),
        &FilePageSource,
    )
    .unwrap();
    assert_eq!(result.file("platformio.ini").unwrap().status, FileStatus::Updated);
}

#[test]
fn test_user_board_is_copied_verbatim() {
    let board = fixture_path("boards").join("custom_l432.json");
    let (dest, result) = migrate(
        "l432_blinky",
        &BoardRequest::from_source(board.to_string_lossy()),
        MigrationOptions::default(),
    );

    assert_eq!(result.board_id, "custom_l432");
    assert_eq!(result.board_source, "user-supplied");
    assert_eq!(
        fs::read(dest.path().join("boards/custom_l432.json")).unwrap(),
        fs::read(&board).unwrap()
    );
    let manifest = fs::read_to_string(dest.path().join("platformio.ini")).unwrap();
    assert!(manifest.contains("board = custom_l432\n"));
}

#[test]
fn test_known_board_and_kernel_library() {
    let (dest, result) = migrate("rtos_f401", &BoardRequest::known(), MigrationOptions::default());

    assert_eq!(result.board_id, "nucleo_f401re");
    assert_eq!(result.board_source, "known");
    assert!(!dest.path().join("boards").exists());
    assert!(result.kernel_needs_retrieval);
    assert!(result.warnings.iter().any(|w| w.kind == WarningKind::KernelSignalMismatch));

    let manifest = fs::read_to_string(dest.path().join("platformio.ini")).unwrap();
    assert!(manifest.contains("lib_deps =\n    mincrmatt12/STM32Cube Middleware-FreeRTOS\n"));
    assert!(manifest.contains("    -D HSE_VALUE=25000000U\n"));
    assert!(manifest.contains("custom_freertos_config_location = include/FreeRTOSConfig.h\n"));
    assert!(manifest.contains("custom_freertos_cmsis_impl = CMSIS_RTOS_V2\n"));
    assert!(manifest.contains("custom_freertos_features = timers, event_groups\n"));
    assert!(manifest.contains("    -D configUSE_CMSIS_RTOS_V2=1\n"));
    assert!(manifest.contains("    -I include\n"));
    assert_eq!(manifest.matches("-D USE_FREERTOS").count(), 1);

    let header = result.file("include/FreeRTOSConfig.h").unwrap();
    assert_eq!(header.status, FileStatus::Created);
    assert_eq!(
        fs::read(dest.path().join("include/FreeRTOSConfig.h")).unwrap(),
        fs::read(fixture_path("rtos_f401").join("Core/Inc/FreeRTOSConfig.h")).unwrap()
    );
}

#[test]
fn test_kernel_library_without_config_header_warns() {
    let project = tempfile::tempdir().unwrap();
    fs::write(
        project.path().join("f4.ioc"),
        "Mcu.Family=STM32F4\nMcu.Name=STM32F401RETx\nProjectName=f4\nFREERTOS.IPParameters=Tasks01\n",
    )
    .unwrap();
    let dest = tempfile::tempdir().unwrap();

    let result = CubeBridgeCore::migrate(
        project.path(),
        &BoardRequest::known(),
        dest.path(),
        MigrationOptions::default(),
        &FilePageSource,
    )
    .unwrap();
    assert!(result.kernel_needs_retrieval);
    assert!(result.warnings.iter().any(|w| w.kind == WarningKind::MissingKernelConfig));
    assert!(result.file("include/FreeRTOSConfig.h").is_none());
}

#[test]
fn test_named_board_without_source() {
    let overrides = BoardOverrides {
        board_id: Some("blackpill_f401cc".to_string()),
        ..Default::default()
    };
    let (dest, result) = migrate(
        "rtos_f401",
        &BoardRequest::known().with_overrides(overrides),
        MigrationOptions::default(),
    );

    assert_eq!(result.board_id, "blackpill_f401cc");
    assert_eq!(result.board_source, "named");
    assert!(!dest.path().join("boards").exists());
    let manifest = fs::read_to_string(dest.path().join("platformio.ini")).unwrap();
    assert!(manifest.contains("[env:blackpill_f401cc]\n"));
    assert!(manifest.contains("board = blackpill_f401cc\n"));
}

#[test]
fn test_named_board_for_part_outside_known_table() {
    let project = tempfile::tempdir().unwrap();
    fs::write(
        project.path().join("f411.ioc"),
        "Mcu.Family=STM32F4\nMcu.Name=STM32F411CEUx\nProjectName=f411\n",
    )
    .unwrap();
    let dest = tempfile::tempdir().unwrap();
    let request = BoardRequest::known().with_overrides(BoardOverrides {
        board_id: Some("blackpill_f411ce".to_string()),
        ..Default::default()
    });

    let result = CubeBridgeCore::migrate(
        project.path(),
        &request,
        dest.path(),
        MigrationOptions::default(),
        &FilePageSource,
    )
    .unwrap();
    assert_eq!(result.board_id, "blackpill_f411ce");
    assert_eq!(result.board_source, "named");
}

#[test]
fn test_named_board_family_is_checked() {
    let dest = tempfile::tempdir().unwrap();
    let request = BoardRequest::known().with_overrides(BoardOverrides {
        board_id: Some("nucleo_l432kc".to_string()),
        ..Default::default()
    });
    let err = CubeBridgeCore::migrate(
        &fixture_path("rtos_f401"),
        &request,
        dest.path(),
        MigrationOptions::default(),
        &FilePageSource,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        CubeBridgeError::Emit(EmitError::FamilyMismatch { .. })
    ));
    assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 0);

    let request = BoardRequest::known().with_overrides(BoardOverrides {
        board_id: Some("../boards/evil".to_string()),
        ..Default::default()
    });
    let err = CubeBridgeCore::migrate(
        &fixture_path("rtos_f401"),
        &request,
        dest.path(),
        MigrationOptions::default(),
        &FilePageSource,
    )
    .unwrap_err();
    assert!(matches!(err, CubeBridgeError::Validation(_)));
}

#[test]
fn test_kernel_framework_mode() {
    let options = MigrationOptions {
        kernel: KernelMode::Framework,
        ..Default::default()
    };
    let (dest, result) = migrate("rtos_f401", &BoardRequest::known(), options);

    assert!(!result.kernel_needs_retrieval);
    let manifest = fs::read_to_string(dest.path().join("platformio.ini")).unwrap();
    assert!(!manifest.contains("lib_deps"));
    assert_eq!(manifest.matches("-D USE_FREERTOS").count(), 1);
    assert!(manifest.contains("    -D CMSIS_OS_V2\n"));
}

#[test]
fn test_kernel_disabled_warns() {
    let options = MigrationOptions {
        kernel: KernelMode::Disabled,
        ..Default::default()
    };
    let (_dest, result) = migrate("rtos_f401", &BoardRequest::known(), options);

    assert!(!result.kernel_needs_retrieval);
    assert!(result.warnings.iter().any(|w| w.kind == WarningKind::KernelDisabled));
}

#[test]
fn test_family_mismatch_writes_nothing() {
    let dest = tempfile::tempdir().unwrap();
    let err = CubeBridgeCore::migrate(
        &fixture_path("rtos_f401"),
        &BoardRequest::from_source(l432_page()),
        dest.path(),
        MigrationOptions::default(),
        &FilePageSource,
    )
    .unwrap_err();

    match err {
        CubeBridgeError::Emit(EmitError::FamilyMismatch { project_family, board_family, .. }) => {
            assert_eq!(project_family, "STM32F4");
            assert_eq!(board_family, "STM32L4");
        }
        other => panic!("expected FamilyMismatch, got {:?}", other),
    }
    assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 0);
}

#[test]
fn test_no_board_for_unknown_part() {
    let project = tempfile::tempdir().unwrap();
    fs::write(
        project.path().join("u5.ioc"),
        "Mcu.Family=STM32U5\nMcu.Name=STM32U575ZITxQ\nProjectName=u5\n",
    )
    .unwrap();
    let dest = tempfile::tempdir().unwrap();

    let err = CubeBridgeCore::migrate(
        project.path(),
        &BoardRequest::known(),
        dest.path(),
        MigrationOptions::default(),
        &FilePageSource,
    )
    .unwrap_err();
    assert!(matches!(err, CubeBridgeError::UnsupportedBoard { .. }));
    assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 0);
}

#[test]
fn test_closure_page_source() {
    let page = fs::read_to_string(l432_page()).unwrap();
    let pages = move |_: &str| -> Result<String, cubebridge::FetchError> { Ok(page.clone()) };
    let dest = tempfile::tempdir().unwrap();
    let result = CubeBridgeCore::migrate(
        &fixture_path("l432_blinky"),
        &BoardRequest::from_source("https://www.st.com/en/microcontrollers/stm32l432kc.html"),
        dest.path(),
        MigrationOptions::default(),
        &pages,
    )
    .unwrap();

    let board: serde_json::Value =
        serde_json::from_slice(&fs::read(dest.path().join("boards/stm32l432kc.json")).unwrap()).unwrap();
    assert_eq!(result.board_source, "synthesized");
    assert_eq!(board["url"], "https://www.st.com/en/microcontrollers/stm32l432kc.html");
}
