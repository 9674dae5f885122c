//! Running a converter process with piped input and a deadline

use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

const INITIAL_POLL_MS: u64 = 5;
const MAX_POLL_MS: u64 = 100;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("failed to start '{}': {source}", .binary.display())]
    Spawn {
        binary: std::path::PathBuf,
        source: io::Error,
    },

    #[error("timed out after {}s, process killed", .timeout.as_secs())]
    TimedOut { timeout: Duration },

    #[error("process I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Captured result of a finished process
#[derive(Debug)]
pub struct ExecOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Run `binary args...`, feed `input` on stdin and collect both output streams
///
/// The child is killed once `timeout` elapses. On Unix the child leads its own
/// process group and the whole group is killed, so helpers it started cannot
/// keep the pipes open past the deadline.
pub fn run_with_input(
    binary: &Path,
    args: &[String],
    input: &[u8],
    timeout: Duration,
) -> Result<ExecOutput, ExecError> {
    let mut command = Command::new(binary);
    command
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    let mut child = command.spawn().map_err(|source| ExecError::Spawn {
        binary: binary.to_path_buf(),
        source,
    })?;

    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    // Detached so a descendant holding a pipe cannot block past the deadline
    let input = input.to_vec();
    let writer = thread::spawn(move || -> io::Result<()> {
        if let Some(mut stdin) = stdin {
            match stdin.write_all(&input) {
                // The child may exit without reading everything
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                other => other?,
            }
        }
        Ok(())
    });
    let out_reader = thread::spawn(move || read_all(stdout));
    let err_reader = thread::spawn(move || read_all(stderr));

    let Some(status) = wait_with_timeout(&mut child, timeout)? else {
        return Err(ExecError::TimedOut { timeout });
    };

    let written = joined(writer, "stdin writer");
    let stdout = joined(out_reader, "stdout reader");
    let stderr = joined(err_reader, "stderr reader");
    written?;

    Ok(ExecOutput {
        status,
        stdout: stdout?,
        stderr: stderr?,
    })
}

fn joined<T>(handle: JoinHandle<io::Result<T>>, what: &str) -> io::Result<T> {
    handle
        .join()
        .unwrap_or_else(|_| Err(io::Error::other(format!("{what} panicked"))))
}

fn read_all<R: Read>(stream: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        stream.read_to_end(&mut buf)?;
    }
    Ok(buf)
}

/// `Ok(None)` when the deadline passed and the child was killed
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> io::Result<Option<ExitStatus>> {
    let started = Instant::now();
    let mut poll = Duration::from_millis(INITIAL_POLL_MS);

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let elapsed = started.elapsed();
        if elapsed >= timeout {
            kill_tree(child);
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(poll.min(timeout - elapsed));
        poll = (poll * 2).min(Duration::from_millis(MAX_POLL_MS));
    }
}

/// Kill the child and, on Unix, every process in its group
fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        let group = format!("-{}", child.id());
        match Command::new("kill")
            .args(["-KILL", "--", &group])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) if status.success() => {}
            Ok(status) => tracing::debug!(%status, "process group kill did not succeed"),
            Err(e) => tracing::debug!(error = %e, "failed to run kill for process group"),
        }
    }
    // Already exited between the checks is fine
    let _ = child.kill();
}
