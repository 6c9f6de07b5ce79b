use std::path::PathBuf;

use anyhow::{ensure, Context as _};
use attest_core::{testing::testfile, Config, Verbosity};

use crate::config::{FileConfig, Settings};

const AFTER_HELP: &str = "\
attest loads test files (*.txt) from the test directory and examines command
behavior against input and output text written in each test file. The test
file must be formatted like this:

  input
  ---
  output

Namely, input lines and output lines are delimited by a line consisting of
three hyphens. Defaults for the options can be put in attest.toml in the
current directory or one of its ancestors.";

#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None, after_help = AFTER_HELP)]
pub struct Args {
    /// Directory containing test files [default: tests]
    #[arg(short = 'd', long)]
    pub tests_dir: Option<PathBuf>,

    /// Glob matched against test file names [default: *.txt]
    #[arg(short = 'p', long)]
    pub pattern: Option<String>,

    /// Compare numbers to this many decimal places; 0 means exact comparison
    #[arg(short = 'f', long)]
    pub digits: Option<usize>,

    /// Number of concurrent runs; 0 means the number of CPUs
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Timeout of a single run in seconds; 0 means no timeout
    #[arg(short = 't', long)]
    pub timeout: Option<f64>,

    /// Display detailed results; -v for failed tests and -vv for all tests
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Command to test, with its arguments
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl Args {
    /// Runs all tests and returns the process exit code.
    pub async fn exec(&self) -> anyhow::Result<i32> {
        let cur_dir = std::env::current_dir().context("Failed to get current dir")?;
        let file_cfg = FileConfig::from_file_finding_in_ancestors(cur_dir)?.unwrap_or_default();
        let settings = Settings::resolve(self.overrides().or(file_cfg))?;

        let config = self.make_config(&settings)?;
        attest_core::run(config).await
    }

    fn overrides(&self) -> FileConfig {
        FileConfig {
            source_config_file: None,
            tests_dir: self.tests_dir.clone(),
            pattern: self.pattern.clone(),
            jobs: self.jobs,
            timeout: self.timeout,
            digits: self.digits,
        }
    }

    fn make_config(&self, settings: &Settings) -> anyhow::Result<Config> {
        let testcases = testfile::load_testcases(&settings.tests_dir, &settings.pattern)
            .context("Failed to load test files")?;
        ensure!(
            !testcases.is_empty(),
            "No test files matching '{}' in {:?}",
            settings.pattern,
            settings.tests_dir
        );

        let testcases = testcases
            .into_iter()
            .map(|t| t.timeout(settings.timeout).digits(settings.digits))
            .collect();

        Ok(Config {
            command: self.command.clone(),
            testcases,
            max_jobs: settings.jobs,
            verbosity: Verbosity::from(self.verbose),
        })
    }
}
