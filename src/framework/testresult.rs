use std::convert::TryFrom;
use std::time::Duration;

use serde_derive::Serialize;
use serde_json::json;

use super::FrameworkError;


#[derive(Clone, Debug, Serialize)]
pub struct TestResult {
    pub number: usize,
    pub name: String,
    pub passed: bool,
    pub elapsed_us: u64,
}

impl TestResult {
    pub fn new(number: usize, name: &str, passed: bool, elapsed: Duration) -> Self {
        TestResult {
            number,
            name: name.to_owned(),
            passed,
            elapsed_us: u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
        }
    }

    pub fn get_json_entry(&self) -> serde_json::Value {
        json!({
            "number": self.number,
            "name": self.name,
            "passed": self.passed,
            "elapsed_us": self.elapsed_us,
        })
    }
}

/// Outcome of one pass of the run loop.
#[derive(Debug, Default)]
pub struct Report {
    pub results: Vec<TestResult>,
}

impl Report {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|tc| tc.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    pub fn to_json(&self) -> Result<String, FrameworkError> {
        let report = json!({
            "testcases": self.results.iter().map(TestResult::get_json_entry).collect::<Vec<_>>(),
            "passed": self.passed(),
            "failed": self.failed(),
            "total": self.results.len(),
        });
        serde_json::to_string_pretty(&report).map_err(|err| FrameworkError::ReportError(err.to_string()))
    }

    pub fn to_human(&self) -> String {
        let mut out = String::new();
        for tc in &self.results {
            let status = if tc.passed { " ok " } else { "FAIL" };
            out.push_str(&format!("[{}] #{:0>2} {} ({}us)\n", status, tc.number, tc.name, tc.elapsed_us));
        }
        out.push_str(&format!("\nPassed testcases: {} / {}\n", self.passed(), self.results.len()));
        match self.failed() {
            0 => out.push_str("*** No errors detected\n"),
            1 => out.push_str("*** 1 failure is detected\n"),
            n => out.push_str(&format!("*** {} failures are detected\n", n)),
        }
        out
    }
}
