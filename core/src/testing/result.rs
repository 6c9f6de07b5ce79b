use std::time::Duration;

use super::testcase::TestCase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum Outcome {
    #[strum(serialize = "PASS")]
    Passed,

    #[strum(serialize = "FAIL")]
    Failed,

    #[strum(serialize = "TIME")]
    Timeout,

    /// Nonzero exit, abnormal termination, or a fault while piping.
    #[strum(serialize = "DEAD")]
    Error,
}

impl Outcome {
    pub fn is_passed(self) -> bool {
        self == Outcome::Passed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    pub outcome: Outcome,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,

    /// Exit code, `None` if terminated by signal or never started.
    pub status: Option<i32>,

    /// Diagnostic of a harness fault (spawn or pipe failure).
    pub fault: Option<String>,
}

impl TestResult {
    pub fn harness_fault(err: impl std::fmt::Display) -> Self {
        Self {
            outcome: Outcome::Error,
            stdout: Vec::new(),
            stderr: Vec::new(),
            status: None,
            fault: Some(err.to_string()),
        }
    }

    pub fn stdout_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    pub fn stderr_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }
}

/// What the scheduler collects for each testcase once its task is done.
#[derive(Debug, Clone)]
pub struct TestReport {
    pub testcase: TestCase,
    pub result: TestResult,
    pub elapsed: Duration,
}

impl TestReport {
    pub fn outcome(&self) -> Outcome {
        self.result.outcome
    }
}
