//! Stream capture engine.
//!
//! Owns one child process and its pipes. Feeding standard input and draining
//! both output pipes are separate futures joined together, so a child that
//! fills one pipe while we are busy with another never stalls the pipeline.

use std::io;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command as TokioCommand};

use super::command::{Command, ExecutionOptions};
use super::result::ExecutionResult;
use crate::error::SubcallError;

/// Buffer size for a single pipe read.
const READ_BUFFER_SIZE: usize = 8192;

/// A running child together with everything captured from it so far.
#[derive(Debug)]
pub(crate) struct StreamCapture {
    child: Child,
    pid: Option<u32>,
    detached: bool,
    stdin: Option<ChildStdin>,
    stdout: ChildStdout,
    stderr: Option<ChildStderr>,
    stdout_buf: Vec<u8>,
    stderr_buf: Vec<u8>,
}

impl StreamCapture {
    /// Start the child with its standard streams wired for capture.
    pub(crate) fn spawn(
        command: &Command,
        options: &ExecutionOptions,
    ) -> Result<Self, SubcallError> {
        let argv = command.spawn_argv(options.shell);
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;

        let mut cmd = TokioCommand::new(program);
        cmd.args(args)
            .stdin(if options.input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(if options.merge_stderr {
                Stdio::null()
            } else {
                Stdio::piped()
            })
            .kill_on_drop(true);

        if options.env_clear {
            cmd.env_clear();
        }
        cmd.envs(&options.env);
        if let Some(dir) = &options.working_dir {
            cmd.current_dir(dir);
        }
        configure_child(&mut cmd, options.detach, options.merge_stderr);

        let mut child = cmd.spawn().map_err(|source| SubcallError::Launch {
            command: command.clone(),
            source,
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("stdout pipe missing"))?;

        Ok(Self {
            pid: child.id(),
            detached: options.detach && cfg!(unix),
            stdin: child.stdin.take(),
            stdout,
            stderr: child.stderr.take(),
            stdout_buf: Vec::new(),
            stderr_buf: Vec::new(),
            child,
        })
    }

    /// Feed `input`, drain both pipes and wait for the child to exit.
    ///
    /// Dropping the returned future keeps whatever was read so far in the
    /// capture buffers.
    pub(crate) async fn run_to_completion(
        &mut self,
        input: Option<&[u8]>,
    ) -> io::Result<ExitStatus> {
        let stdin = self.stdin.take();
        let (fed, out, err, status) = tokio::join!(
            feed(stdin, input.unwrap_or_default()),
            drain(&mut self.stdout, &mut self.stdout_buf),
            drain_optional(self.stderr.as_mut(), &mut self.stderr_buf),
            self.child.wait(),
        );
        fed?;
        out?;
        err?;
        status
    }

    /// Forcefully terminate the child, and its whole session when detached.
    ///
    /// Failures are ignored: the child may already be gone.
    pub(crate) fn kill(&mut self) {
        self.stdin = None;
        #[cfg(unix)]
        {
            let pgid = self.pid.and_then(|pid| libc::pid_t::try_from(pid).ok());
            if let (true, Some(pgid)) = (self.detached, pgid) {
                // SAFETY: killpg has no memory-safety preconditions.
                unsafe {
                    libc::killpg(pgid, libc::SIGKILL);
                }
            }
        }
        // Already exited or reaped; nothing left to kill.
        let _ = self.child.start_kill();
    }

    /// Read whatever is still buffered in the pipes and reap the child.
    ///
    /// Only meaningful after [`StreamCapture::kill`]; callers bound it with a
    /// deadline since a surviving descendant can hold the pipes open.
    pub(crate) async fn drain_remaining(&mut self) {
        let _ = tokio::join!(
            drain(&mut self.stdout, &mut self.stdout_buf),
            drain_optional(self.stderr.as_mut(), &mut self.stderr_buf),
            self.child.wait(),
        );
    }

    /// Captured bytes, consuming the capture and closing the pipes.
    pub(crate) fn into_output(self) -> (Vec<u8>, Vec<u8>) {
        (self.stdout_buf, self.stderr_buf)
    }

    /// Build the result for a child that exited on its own.
    pub(crate) fn into_result(self, command: &Command, status: ExitStatus) -> ExecutionResult {
        let exit_code = exit_code(status);
        let (stdout, stderr) = self.into_output();
        ExecutionResult::new(command.clone(), exit_code, stdout, stderr)
    }
}

/// Write `input` to the child's standard input, then close it.
async fn feed(stdin: Option<ChildStdin>, input: &[u8]) -> io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };
    match stdin.write_all(input).await {
        // The child stopped reading; whatever it did print is still captured.
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

async fn drain<R: AsyncRead + Unpin>(reader: &mut R, sink: &mut Vec<u8>) -> io::Result<()> {
    let mut buf = [0u8; READ_BUFFER_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        sink.extend_from_slice(&buf[..n]);
    }
}

async fn drain_optional<R: AsyncRead + Unpin>(
    reader: Option<&mut R>,
    sink: &mut Vec<u8>,
) -> io::Result<()> {
    match reader {
        Some(reader) => drain(reader, sink).await,
        None => Ok(()),
    }
}

/// Start a new session and/or point stderr at the stdout pipe in the child.
#[cfg(unix)]
fn configure_child(cmd: &mut TokioCommand, detach: bool, merge_stderr: bool) {
    if !detach && !merge_stderr {
        return;
    }
    // SAFETY: setsid and dup2 are async-signal-safe and touch no memory
    // shared with the parent. The standard streams are already in place when
    // this runs.
    unsafe {
        cmd.pre_exec(move || {
            if detach && libc::setsid() == -1 {
                return Err(io::Error::last_os_error());
            }
            if merge_stderr && libc::dup2(libc::STDOUT_FILENO, libc::STDERR_FILENO) == -1 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[cfg(not(unix))]
fn configure_child(_cmd: &mut TokioCommand, _detach: bool, _merge_stderr: bool) {}

/// Exit code of a finished child; `-N` when it was killed by signal `N`.
fn exit_code(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    status.code().unwrap_or(-1)
}
