//! A small unit test framework driven through a process-wide registry.
//!
//! Test libraries add cases with [`registry::unit_test_register`] from their
//! initialization function; [`runner::unit_test_main`] then runs them.

pub mod options;
pub mod registry;
pub mod runner;
pub mod testresult;

use thiserror::Error;


pub const EXIT_SUCCESS: i32 = 0;
/// Options, configuration, registration or reporting went wrong.
pub const EXIT_EXCEPTION_FAILURE: i32 = 200;
/// At least one test case failed.
pub const EXIT_TEST_FAILURE: i32 = 201;

#[derive(Debug, Error)]
pub enum FrameworkError {
    #[error("{0}")]
    HelpDisplayed(String),
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    #[error("invalid test filter: {0}")]
    InvalidFilter(String),
    #[error("config not found: {0}")]
    ConfigNotFound(String),
    #[error("failed parsing config: {0}")]
    ConfigParseError(String),
    #[error("test initialization function reported failure")]
    InitFailed,
    #[error("test tree is empty")]
    EmptyTestTree,
    #[error("no test cases matching filter")]
    NoMatchingTests,
    #[error("error generating report: {0}")]
    ReportError(String),
    #[error("cannot write report to {0}: {1}")]
    ReportSink(String, #[source] std::io::Error),
}

/// The run loop the bootstrap driver hands control to.
pub trait TestFramework {
    /// Calls `init` to register tests, runs them, and returns the exit code.
    fn run(&mut self, init: &mut dyn FnMut() -> bool, args: &[String]) -> i32;

    /// Drops everything registered so far.
    fn clear(&mut self);
}

/// [`TestFramework`] backed by the process-wide registry.
#[derive(Debug, Default)]
pub struct UnitTestFramework;

impl TestFramework for UnitTestFramework {
    fn run(&mut self, init: &mut dyn FnMut() -> bool, args: &[String]) -> i32 {
        runner::unit_test_main(init, args)
    }

    fn clear(&mut self) {
        registry::global().clear();
    }
}
