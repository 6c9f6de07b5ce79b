pub mod error {
    #[allow(unused_imports)]
    pub(crate) use anyhow::{anyhow, bail, ensure, Context as _};
    pub use anyhow::{Error, Result};
}

use std::{
    io::{self, Write},
    time::Duration,
};

use error::*;
use tokio::{
    task::JoinSet,
    time::{Instant, MissedTickBehavior},
};

use crate::config::{Config, Verbosity};
use crate::slot::SlotPool;
use crate::status::{self, BoardOptions, RowUpdater, StatusBoard, Surface, TerminalSurface};
use crate::style::{self, Spinner};
use crate::testing::{TestCase, TestReport, TestResult, TestRunner};

/// Runs `config` with the live display and reports on stdout. Returns the
/// process exit code: 0 if every testcase passed, 1 otherwise.
pub async fn run(config: Config) -> Result<i32> {
    let summary = Scheduler::new(config).run().await?;
    Ok(summary.exit_code())
}

#[derive(Debug, Clone)]
pub struct Summary {
    /// One report per testcase, in input order.
    pub reports: Vec<TestReport>,

    /// Highest number of subprocesses that ran at the same time.
    pub peak_concurrency: usize,
}

impl Summary {
    pub fn all_passed(&self) -> bool {
        self.reports.iter().all(|r| r.outcome().is_passed())
    }

    pub fn exit_code(&self) -> i32 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }
}

pub struct Scheduler<S = TerminalSurface<io::Stdout>, W = io::Stdout> {
    config: Config,
    surface: S,
    out: W,
    board_opts: BoardOptions,
    spin_interval: Duration,
    kill_grace: Option<Duration>,
}

impl Scheduler {
    const DEFAULT_SPIN_INTERVAL: Duration = Duration::from_millis(100);

    pub fn new(config: Config) -> Self {
        Self {
            config,
            surface: TerminalSurface::stdout(),
            out: io::stdout(),
            board_opts: BoardOptions::default(),
            spin_interval: Self::DEFAULT_SPIN_INTERVAL,
            kill_grace: None,
        }
    }
}

impl<S, W> Scheduler<S, W>
where
    S: Surface + Send + 'static,
    W: Write,
{
    /// Where the status rows are painted.
    pub fn surface<S2>(self, surface: S2) -> Scheduler<S2, W> {
        Scheduler {
            config: self.config,
            surface,
            out: self.out,
            board_opts: self.board_opts,
            spin_interval: self.spin_interval,
            kill_grace: self.kill_grace,
        }
    }

    /// Where detailed reports and the summary line are written.
    pub fn report_writer<W2>(self, out: W2) -> Scheduler<S, W2> {
        Scheduler {
            config: self.config,
            surface: self.surface,
            out,
            board_opts: self.board_opts,
            spin_interval: self.spin_interval,
            kill_grace: self.kill_grace,
        }
    }

    pub fn board_options(mut self, opts: BoardOptions) -> Self {
        self.board_opts = opts;
        self
    }

    pub fn spin_interval(mut self, interval: Duration) -> Self {
        self.spin_interval = interval;
        self
    }

    pub fn kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = Some(grace);
        self
    }

    pub async fn run(self) -> Result<Summary> {
        let Self {
            config,
            surface,
            mut out,
            board_opts,
            spin_interval,
            kill_grace,
        } = self;
        let Config {
            command,
            testcases,
            max_jobs,
            verbosity,
        } = config;

        ensure!(!command.is_empty(), "Command to test must not be empty");
        let pool = SlotPool::new(max_jobs).context("Failed to set up worker pool")?;

        let mut runner = TestRunner::new(command);
        if let Some(grace) = kill_grace {
            runner = runner.kill_grace(grace);
        }

        let num_tests = testcases.len();
        log::info!(
            "Running {} testcases with up to {} jobs: {}",
            num_tests,
            max_jobs,
            runner.get_command().join(" ")
        );

        let board = StatusBoard::start(num_tests, board_opts, surface);

        let mut tasks = JoinSet::new();
        for (row, testcase) in testcases.into_iter().enumerate() {
            let task = Task {
                row,
                runner: runner.clone(),
                updater: board.updater(),
                pool: pool.clone(),
                spin_interval,
            };
            tasks.spawn(task.run(testcase));
        }

        let mut slots: Vec<Option<TestReport>> = vec![None; num_tests];
        while let Some(joined) = tasks.join_next().await {
            let (row, report) = joined.context("Test task panicked")?;
            slots[row] = Some(report);
        }
        let reports: Vec<TestReport> = slots.into_iter().flatten().collect();
        ensure!(
            reports.len() == num_tests,
            "Lost results: got {} of {}",
            reports.len(),
            num_tests
        );

        board.stop().await;

        let summary = Summary {
            reports,
            peak_concurrency: pool.peak(),
        };
        write_reports(&mut out, &summary, verbosity).context("Failed to write test reports")?;
        Ok(summary)
    }
}

fn write_reports(out: &mut impl Write, summary: &Summary, verbosity: Verbosity) -> io::Result<()> {
    summary
        .reports
        .iter()
        .filter(|r| verbosity.wants_detail(r.outcome().is_passed()))
        .try_for_each(|r| style::write_report_detail(out, r))?;

    if !summary.reports.is_empty() {
        style::write_summary(out, &summary.reports)?;
    }
    out.flush()
}

/// Drives one testcase from WAIT to its final outcome.
struct Task {
    row: usize,
    runner: TestRunner,
    updater: RowUpdater,
    pool: SlotPool,
    spin_interval: Duration,
}

impl Task {
    async fn run(self, testcase: TestCase) -> (usize, TestReport) {
        self.updater
            .update(self.row, style::format_wait(&testcase.name))
            .await;

        let slot = self.pool.acquire().await;
        let started = Instant::now();

        let result = match &slot {
            Ok(_) => self.run_with_spinner(&testcase, started).await,
            Err(e) => TestResult::harness_fault(e),
        };
        let elapsed = started.elapsed();

        self.updater
            .update(
                self.row,
                style::format_outcome(&testcase.name, elapsed, result.outcome),
            )
            .await;
        drop(slot);

        let report = TestReport {
            testcase,
            result,
            elapsed,
        };
        (self.row, report)
    }

    async fn run_with_spinner(&self, testcase: &TestCase, started: Instant) -> TestResult {
        let mut spinner = Spinner::default();
        let mut ticker = tokio::time::interval(self.spin_interval.max(status::MIN_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let run = self.runner.run(testcase);
        tokio::pin!(run);

        let res = loop {
            tokio::select! {
                biased;
                res = &mut run => break res,
                _ = ticker.tick() => {
                    let text = style::format_run(&testcase.name, started.elapsed(), spinner.next_frame());
                    // Keep driving the run while the display queue is full.
                    tokio::select! {
                        biased;
                        res = &mut run => break res,
                        _ = self.updater.update(self.row, text) => {}
                    }
                }
            }
        };

        res.unwrap_or_else(|e| {
            log::warn!("Testcase {}: {}", testcase.name, e);
            TestResult::harness_fault(e)
        })
    }
}
