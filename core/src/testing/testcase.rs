use std::time::Duration;

/// One input/expected-output pair exercised against the command under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    pub input: Vec<u8>,
    pub output: String,

    /// Zero means no timeout.
    pub timeout: Duration,

    /// Decimal places for numeric comparison. Zero means exact comparison.
    pub digits: usize,
}

impl TestCase {
    pub fn new(
        name: impl Into<String>,
        input: impl Into<Vec<u8>>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            input: input.into(),
            output: output.into(),
            timeout: Duration::ZERO,
            digits: 0,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn digits(mut self, digits: usize) -> Self {
        self.digits = digits;
        self
    }

    pub fn has_timeout(&self) -> bool {
        !self.timeout.is_zero()
    }
}
