//! Loads the `demos/sample_suite` cdylib for real. Windows executables do not
//! export `unit_test_register`, so this only runs on unix.
#![cfg(unix)]

use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::process::Command;

use lazy_static::lazy_static;
use tempfile::tempdir;

use console_testrunner::driver::run_suite;
use console_testrunner::dynlib::NativeLoader;
use console_testrunner::framework::{registry, UnitTestFramework, EXIT_SUCCESS};


lazy_static! {
    static ref SAMPLE_SUITE: PathBuf = build_sample_suite();
}

/// Builds the demo suite into a private target dir, away from the lock held
/// on the workspace one.
fn build_sample_suite() -> PathBuf {
    let target_dir = Path::new(env!("CARGO_TARGET_TMPDIR")).join("sample_suite");
    let status = Command::new(env!("CARGO"))
        .args(&["build", "--quiet", "-p", "sample_suite", "--manifest-path"])
        .arg(Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml"))
        .arg("--target-dir")
        .arg(&target_dir)
        .status()
        .expect("cargo can be spawned");
    assert!(status.success(), "building sample_suite failed");

    let lib = target_dir.join("debug").join(format!("{}sample_suite{}", DLL_PREFIX, DLL_SUFFIX));
    assert!(lib.is_file(), "{} was not produced", lib.display());
    lib
}

fn sample_suite() -> String {
    SAMPLE_SUITE.to_str().expect("target path is UTF-8").to_owned()
}

#[test]
fn runs_registered_cases_and_tears_down() {
    let dir = tempdir().unwrap();
    let sink = dir.path().join("report.json");
    let args = vec![
        "--report_format".to_owned(),
        "JSON".to_owned(),
        "--report_sink".to_owned(),
        sink.to_str().unwrap().to_owned(),
    ];

    let code = run_suite(&mut NativeLoader::new(), &mut UnitTestFramework::default(), &sample_suite(), &args).unwrap();
    assert_eq!(code, EXIT_SUCCESS);

    let report: serde_json::Value = serde_json::from_str(&read_to_string(&sink).unwrap()).unwrap();
    assert_eq!(report["total"], 3);
    assert_eq!(report["passed"], 3);
    assert_eq!(report["testcases"][0]["name"], "addition_commutes");
    assert!(registry::global().is_empty());
}

#[test]
fn binary_relays_the_run_loop_exit_code() {
    let output = Command::new(env!("CARGO_BIN_EXE_console_test_runner"))
        .arg(sample_suite())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(EXIT_SUCCESS));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Passed testcases: 3 / 3"));

    let output = Command::new(env!("CARGO_BIN_EXE_console_test_runner"))
        .args(&[sample_suite().as_str(), "--run_test", "no_such_case"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(console_testrunner::framework::EXIT_EXCEPTION_FAILURE));

    let output = Command::new(env!("CARGO_BIN_EXE_console_test_runner"))
        .args(&[sample_suite().as_str(), "--list_content"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(EXIT_SUCCESS));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "addition_commutes\nsplit_whitespace\nchecked_overflow\n");
}

#[test]
fn diagnostics_are_printed_once() {
    let output = Command::new(env!("CARGO_BIN_EXE_console_test_runner"))
        .env_remove("RUST_LOG")
        .arg("/nonexistent/libsuite.so")
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(console_testrunner::driver::EXIT_BOOTSTRAP_FAILURE));
    assert_eq!(stderr.matches("fail to load test library").count(), 1, "stderr: {}", stderr);

    let output = Command::new(env!("CARGO_BIN_EXE_console_test_runner"))
        .env_remove("RUST_LOG")
        .args(&[sample_suite().as_str(), "--report_format", "xml"])
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("invalid options").count(), 1, "stderr: {}", stderr);
}
