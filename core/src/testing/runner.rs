use std::{io, sync::Arc, time::Duration};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    time::Instant,
};

use super::{
    compare,
    process::{ExitError, Process, Signal, Signaller},
    result::*,
    testcase::*,
};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Failed to spawn '{cmd}': {source}")]
    Spawn {
        cmd: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to communicate with subprocess: {0}")]
    Io(#[source] io::Error),
}

/// Runs the command under test against one testcase at a time.
#[derive(Debug, Clone)]
pub struct TestRunner {
    argv: Arc<[String]>,
    kill_grace: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deadline {
    Term,
    Kill,
    Disarmed,
}

impl TestRunner {
    const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(2);

    pub fn new(argv: impl Into<Arc<[String]>>) -> Self {
        Self {
            argv: argv.into(),
            kill_grace: Self::DEFAULT_KILL_GRACE,
        }
    }

    /// How long a timed-out process may take to exit after SIGTERM before it
    /// gets SIGKILL.
    pub fn kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    pub fn get_command(&self) -> &[String] {
        &self.argv
    }

    /// Runs the command with `testcase.input` as stdin and classifies the run.
    ///
    /// A nonzero exit or a timeout is a valid observation and yields `Ok`.
    /// `Err` is returned only if the process cannot be spawned or piped.
    pub async fn run(&self, testcase: &TestCase) -> Result<TestResult, RunError> {
        let mut proc = Process::start(&self.argv).map_err(|source| RunError::Spawn {
            cmd: self.argv.join(" "),
            source,
        })?;
        let signaller = proc.signaller();

        let mut stdin = proc.take_stdin().map_err(RunError::Io)?;
        let mut stdout = proc.take_stdout().map_err(RunError::Io)?;
        let mut stderr = proc.take_stderr().map_err(RunError::Io)?;

        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();
        let mut timed_out = false;

        let exit = {
            let feed_stdin = async {
                let res = stdin.write_all(&testcase.input).await;
                drop(stdin); // NOTE: this line is essential
                match res {
                    // The child is free to exit without reading its input.
                    Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                    res => res,
                }
            };
            let communicate = async {
                tokio::try_join!(
                    feed_stdin,
                    stdout.read_to_end(&mut stdout_buf),
                    stderr.read_to_end(&mut stderr_buf)
                )
                .map_err(RunError::Io)?;
                Ok::<_, RunError>(proc.wait().await)
            };
            tokio::pin!(communicate);

            let mut phase = if testcase.has_timeout() {
                Deadline::Term
            } else {
                Deadline::Disarmed
            };
            let deadline = tokio::time::sleep(testcase.timeout);
            tokio::pin!(deadline);

            // `communicate` is polled first, so the child is never reaped when
            // a signal goes out and its process group id cannot have been
            // recycled. Signals go to the whole group so that grandchildren
            // holding the pipes open are stopped too.
            loop {
                tokio::select! {
                    biased;
                    res = &mut communicate => break res?,
                    _ = &mut deadline, if phase != Deadline::Disarmed => {
                        if phase == Deadline::Term {
                            log::debug!("Testcase {} timed out, sending SIGTERM", testcase.name);
                            self.send_signal(signaller, Signal::SIGTERM);
                            timed_out = true;
                            phase = Deadline::Kill;
                            deadline.as_mut().reset(Instant::now() + self.kill_grace);
                        } else {
                            log::debug!("Testcase {} ignored SIGTERM, sending SIGKILL", testcase.name);
                            self.send_signal(signaller, Signal::SIGKILL);
                            phase = Deadline::Disarmed;
                        }
                    }
                }
            }
        };

        let (outcome, status) = match exit {
            Ok(()) => {
                let passed = compare::matches(&stdout_buf, &testcase.output, testcase.digits);
                let outcome = if passed {
                    Outcome::Passed
                } else {
                    Outcome::Failed
                };
                (outcome, Some(0))
            }
            Err(ExitError::Io(e)) => return Err(RunError::Io(e)),
            Err(e) if timed_out => {
                log::debug!("Testcase {}: {}", testcase.name, e);
                (Outcome::Timeout, exit_code(&e))
            }
            Err(e) => (Outcome::Error, exit_code(&e)),
        };

        Ok(TestResult {
            outcome,
            stdout: stdout_buf,
            stderr: stderr_buf,
            status,
            fault: None,
        })
    }

    fn send_signal(&self, signaller: Signaller, sig: Signal) {
        signaller
            .signal(sig)
            .unwrap_or_else(|e| log::warn!("Failed to send {} to '{}': {:#}", sig, self.argv[0], e));
    }
}

fn exit_code(e: &ExitError) -> Option<i32> {
    match e {
        ExitError::Code(code) => Some(*code),
        _ => None,
    }
}
