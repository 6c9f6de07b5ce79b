use crate::testing::TestCase;

/// Everything a run needs, assembled by the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Command under test. `command[0]` is the program.
    pub command: Vec<String>,
    pub testcases: Vec<TestCase>,

    /// Upper bound of concurrently running subprocesses. Must be at least 1.
    pub max_jobs: usize,
    pub verbosity: Verbosity,
}

/// Which testcases get a detailed report after the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verbosity {
    #[default]
    Silent,
    Failures,
    All,
}

impl From<u8> for Verbosity {
    fn from(level: u8) -> Self {
        match level {
            0 => Verbosity::Silent,
            1 => Verbosity::Failures,
            _ => Verbosity::All,
        }
    }
}

impl Verbosity {
    pub fn wants_detail(self, passed: bool) -> bool {
        match self {
            Verbosity::Silent => false,
            Verbosity::Failures => !passed,
            Verbosity::All => true,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn verbosity_from_flag_count() {
        assert_eq!(Verbosity::from(0), Verbosity::Silent);
        assert_eq!(Verbosity::from(1), Verbosity::Failures);
        assert_eq!(Verbosity::from(2), Verbosity::All);
        assert_eq!(Verbosity::from(7), Verbosity::All);
    }

    #[test]
    fn detail_selection() {
        assert!(!Verbosity::Silent.wants_detail(false));
        assert!(Verbosity::Failures.wants_detail(false));
        assert!(!Verbosity::Failures.wants_detail(true));
        assert!(Verbosity::All.wants_detail(true));
    }
}
