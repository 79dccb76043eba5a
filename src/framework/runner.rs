use std::fs::write;
use std::time::Instant;

use tracing::{debug, info};

use super::options::{FrameworkOptions, ReportFormat};
use super::registry::{self, TestCase};
use super::testresult::{Report, TestResult};
use super::{FrameworkError, EXIT_EXCEPTION_FAILURE, EXIT_SUCCESS, EXIT_TEST_FAILURE};


/// Executes registered test cases according to the parsed options.
#[derive(Debug)]
pub struct Runner {
    options: FrameworkOptions,
}

impl Runner {
    pub fn new(options: FrameworkOptions) -> Self {
        Runner { options }
    }

    pub fn run_cases(&self, cases: &[TestCase]) -> Result<Report, FrameworkError> {
        let selected: Vec<&TestCase> = cases.iter().filter(|tc| self.options.selects(&tc.name)).collect();
        if cases.is_empty() {
            return Err(FrameworkError::EmptyTestTree);
        }
        if selected.is_empty() {
            return Err(FrameworkError::NoMatchingTests);
        }

        info!(selected = selected.len(), registered = cases.len(), "running test cases");
        let results = selected
            .iter()
            .enumerate()
            .map(|(idx, tc)| {
                let started = Instant::now();
                let passed = (tc.body)();
                debug!(name = %tc.name, passed, "test case finished");
                TestResult::new(idx + 1, &tc.name, passed, started.elapsed())
            })
            .collect();
        Ok(Report { results })
    }

    pub fn list_cases(&self, cases: &[TestCase]) -> String {
        cases
            .iter()
            .filter(|tc| self.options.selects(&tc.name))
            .map(|tc| format!("{}\n", tc.name))
            .collect()
    }

    pub fn publish(&self, report: &Report) -> Result<(), FrameworkError> {
        let rendered = match self.options.report_format {
            ReportFormat::Human => report.to_human(),
            ReportFormat::Json => report.to_json()?,
        };
        match &self.options.report_sink {
            Some(path) => write(path, rendered).map_err(|err| FrameworkError::ReportSink(path.display().to_string(), err)),
            None => {
                print!("{}", rendered);
                Ok(())
            }
        }
    }

    /// Runs `cases` and publishes the report, mapping the outcome to an exit code.
    pub fn execute(&self, cases: &[TestCase]) -> Result<i32, FrameworkError> {
        if self.options.list_content {
            print!("{}", self.list_cases(cases));
            return Ok(EXIT_SUCCESS);
        }
        let report = self.run_cases(cases)?;
        self.publish(&report)?;
        Ok(if report.all_passed() { EXIT_SUCCESS } else { EXIT_TEST_FAILURE })
    }
}

/// The run loop: parse `args`, let `init` populate the global registry, run
/// what it registered.
pub fn unit_test_main(init: &mut dyn FnMut() -> bool, args: &[String]) -> i32 {
    let options = match FrameworkOptions::from_args(args) {
        Ok(options) => options,
        Err(FrameworkError::HelpDisplayed(help)) => {
            println!("{}", help);
            return EXIT_SUCCESS;
        }
        Err(err) => {
            debug!(error = %err, "invalid framework options");
            eprintln!("Test setup error: {}", err);
            return EXIT_EXCEPTION_FAILURE;
        }
    };

    if !init() {
        debug!("test initialization function reported failure");
        eprintln!("Test setup error: {}", FrameworkError::InitFailed);
        return EXIT_EXCEPTION_FAILURE;
    }

    // registration is over, run on a snapshot so the lock is not held by test bodies
    let cases = registry::global().cases().to_vec();
    match Runner::new(options).execute(&cases) {
        Ok(code) => code,
        Err(err) => {
            debug!(error = %err, "test run aborted");
            eprintln!("Test setup error: {}", err);
            EXIT_EXCEPTION_FAILURE
        }
    }
}
