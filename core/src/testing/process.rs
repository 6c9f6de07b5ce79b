//! A spawned command whose standard streams are piped to the harness.

use std::{io, process::Stdio};

use nix::{sys::signal, unistd::Pid};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};

pub use nix::sys::signal::Signal;

#[derive(Debug, thiserror::Error)]
pub enum ExitError {
    #[error("exited with status {0}")]
    Code(i32),

    #[error("terminated by signal {0}")]
    Signal(i32),

    #[error("failed to wait for process: {0}")]
    Io(#[source] io::Error),
}

#[derive(Debug)]
pub struct Process {
    child: Child,
    pid: Pid,
    program: String,
}

/// Sends signals to the process group of a [`Process`] without borrowing it.
///
/// Only valid while the process is not reaped yet, i.e. until [`Process::wait`]
/// returned.
#[derive(Debug, Clone, Copy)]
pub struct Signaller {
    pid: Pid,
}

impl Process {
    /// Spawns `argv[0]` with the remaining elements as arguments, as the leader
    /// of a new process group.
    pub fn start<S: AsRef<str>>(argv: &[S]) -> io::Result<Self> {
        let Some((program, args)) = argv.split_first() else {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty command"));
        };
        let program = program.as_ref();
        let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();

        let child = Command::new(program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .kill_on_drop(true)
            .spawn()?;

        let pid = child
            .id()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "process exited at spawn"))?;
        log::debug!("Spawned '{}' (pid={})", program, pid);

        Ok(Self {
            child,
            pid: Pid::from_raw(pid as i32),
            program: program.to_owned(),
        })
    }

    pub fn take_stdin(&mut self) -> io::Result<ChildStdin> {
        self.child.stdin.take().ok_or_else(|| taken("stdin"))
    }

    pub fn take_stdout(&mut self) -> io::Result<ChildStdout> {
        self.child.stdout.take().ok_or_else(|| taken("stdout"))
    }

    pub fn take_stderr(&mut self) -> io::Result<ChildStderr> {
        self.child.stderr.take().ok_or_else(|| taken("stderr"))
    }

    pub fn signaller(&self) -> Signaller {
        Signaller { pid: self.pid }
    }

    pub fn signal(&self, sig: Signal) -> io::Result<()> {
        self.signaller().signal(sig)
    }

    /// Waits until the process exits. Close stdin and drain stdout/stderr
    /// before calling this, or a chatty child may block forever.
    pub async fn wait(&mut self) -> Result<(), ExitError> {
        let status = self.child.wait().await.map_err(ExitError::Io)?;
        log::debug!("'{}' (pid={}) {}", self.program, self.pid, status);

        if status.success() {
            return Ok(());
        }
        match status.code() {
            Some(code) => Err(ExitError::Code(code)),
            None => Err(ExitError::Signal(signal_of(&status))),
        }
    }
}

impl Signaller {
    pub fn signal(self, sig: Signal) -> io::Result<()> {
        signal::killpg(self.pid, sig).map_err(io::Error::from)
    }
}

fn taken(stream: &str) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{} is already taken", stream))
}

fn signal_of(status: &std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().unwrap_or(0)
}

#[cfg(test)]
mod test {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    #[tokio::test]
    async fn cat_echoes_binary_input() {
        let mut cat = Process::start(&["cat"]).unwrap();
        let sequence: Vec<u8> = vec![
            109, 112, 199, 223, 57, 115, 237, 11, 168, 210, 219, 63, 249, 235, 19, 164, 157, 153,
            5, 104,
        ];

        let mut stdin = cat.take_stdin().unwrap();
        stdin.write_all(&sequence).await.unwrap();
        drop(stdin);

        let mut output = Vec::new();
        cat.take_stdout()
            .unwrap()
            .read_to_end(&mut output)
            .await
            .unwrap();
        assert_eq!(output, sequence);

        cat.wait().await.unwrap();
    }

    #[tokio::test]
    async fn stdout_and_stderr_are_independent() {
        let mut p = Process::start(&["sh", "-c", "echo out; echo err >&2"]).unwrap();
        drop(p.take_stdin().unwrap());

        let (mut out, mut err) = (Vec::new(), Vec::new());
        let mut stdout = p.take_stdout().unwrap();
        let mut stderr = p.take_stderr().unwrap();
        let (r1, r2) = tokio::join!(stdout.read_to_end(&mut out), stderr.read_to_end(&mut err));
        r1.unwrap();
        r2.unwrap();

        assert_eq!(out, b"out\n");
        assert_eq!(err, b"err\n");
        p.wait().await.unwrap();
    }

    #[tokio::test]
    async fn streams_can_be_taken_once() {
        let mut p = Process::start(&["true"]).unwrap();
        assert!(p.take_stdin().is_ok());
        assert!(p.take_stdin().is_err());
        p.wait().await.unwrap();
    }

    #[tokio::test]
    async fn nonzero_exit_is_error() {
        let mut p = Process::start(&["sh", "-c", "exit 3"]).unwrap();
        assert!(matches!(p.wait().await, Err(ExitError::Code(3))));
    }

    #[tokio::test]
    async fn signalled_process_reports_signal() {
        let mut p = Process::start(&["sleep", "5"]).unwrap();
        p.signal(Signal::SIGTERM).unwrap();
        match p.wait().await {
            Err(ExitError::Signal(sig)) => assert_eq!(sig, Signal::SIGTERM as i32),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn signal_reaches_grandchildren() {
        let mut p = Process::start(&["sh", "-c", "sleep 5; echo late"]).unwrap();
        drop(p.take_stdin().unwrap());
        let mut stdout = p.take_stdout().unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        p.signal(Signal::SIGKILL).unwrap();

        // The pipe closes only once `sleep` is gone as well.
        let mut out = Vec::new();
        tokio::time::timeout(std::time::Duration::from_secs(2), stdout.read_to_end(&mut out))
            .await
            .expect("grandchild still holds stdout")
            .unwrap();
        assert_eq!(out, b"");
        assert!(matches!(p.wait().await, Err(ExitError::Signal(_))));
    }

    #[tokio::test]
    async fn missing_program_fails_to_start() {
        let err = Process::start(&["./definitely-not-a-program"]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        let empty: [&str; 0] = [];
        let err = Process::start(&empty).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
