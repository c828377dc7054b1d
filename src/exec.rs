//! Process execution: launch an external process, drain its output and error
//! streams concurrently, and map the result into a [`ProcessResult`].
use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::thread;

use anyhow::{Context, Result};

/// Instructions for launching one external process.
///
/// Immutable once handed to a [`ProcessRunner`]. `run_as_admin` changes both
/// the launch mechanism (OS elevation) and the I/O mode: an elevated process
/// runs in its own console, so its streams cannot be captured and only the
/// exit code is reliable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInstructions {
    /// Executable to launch (resolved via `PATH` by the OS).
    pub executable: String,
    /// Arguments passed verbatim, one per element (no shell quoting).
    pub arguments: Vec<String>,
    /// Launch through the OS elevation mechanism instead of capturing streams.
    pub run_as_admin: bool,
}

/// Result of a completed process execution.
///
/// Owned exclusively by one [`ProcessRunner::execute`] call; all fields are
/// final by the time the caller sees the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// Exit code reported by the OS; `-1` until (or unless) the process exits
    /// with a real code (e.g. when killed by a signal).
    pub exit_code: i32,
    /// The last stdout line produced, if any. Always equals the final element
    /// of `all_output`.
    pub last_output: Option<String>,
    /// Every stdout line in emission order.
    pub all_output: Vec<String>,
    /// Every stderr line in emission order, sanitized of ANSI escapes.
    pub errors: Vec<String>,
}

impl Default for ProcessResult {
    fn default() -> Self {
        Self {
            exit_code: -1,
            last_output: None,
            all_output: Vec::new(),
            errors: Vec::new(),
        }
    }
}

/// Launches external processes (injectable for testing).
pub trait ProcessRunner: Send + Sync {
    /// Execute the process described by `instructions` to completion.
    ///
    /// An ordinary child-process failure is reported through
    /// [`ProcessResult::exit_code`], not as an error. There is no timeout: a
    /// hung child hangs the caller.
    ///
    /// # Errors
    ///
    /// Returns an error only when the process cannot be launched or waited on
    /// at all (missing executable, OS-level failure).
    fn execute(&self, instructions: &ProcessInstructions) -> Result<ProcessResult>;
}

/// [`ProcessRunner`] backed by `std::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn execute(&self, instructions: &ProcessInstructions) -> Result<ProcessResult> {
        if instructions.run_as_admin {
            execute_elevated(instructions)
        } else {
            execute_captured(instructions)
        }
    }
}

/// Run with piped stdout/stderr, draining both streams line-by-line while
/// waiting for the process to exit.
///
/// Three concurrent activities run against the one child: an output pump, an
/// error pump, and this thread's exit wait. The wait is authoritative for the
/// exit code; the pumps are joined only after it resolves, so the final
/// buffered lines of a just-exited process are still drained. Each mutable
/// field of the result is written by exactly one owner, so no locks are
/// needed.
fn execute_captured(instructions: &ProcessInstructions) -> Result<ProcessResult> {
    let mut child = Command::new(&instructions.executable)
        .args(&instructions.arguments)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to launch: {}", instructions.executable))?;

    let stdout = child.stdout.take().context("child stdout was not piped")?;
    let stderr = child.stderr.take().context("child stderr was not piped")?;

    let output_pump = thread::spawn(move || {
        pump_lines(stdout, |line| {
            tracing::debug!(target: "machina::stdout", "{line}");
            line.to_string()
        })
    });
    let error_pump = thread::spawn(move || {
        pump_lines(stderr, |line| {
            tracing::debug!(target: "machina::stderr", "{line}");
            sanitize_line(line)
        })
    });

    let status = child.wait().context("waiting for child process")?;

    let all_output = output_pump
        .join()
        .map_err(|_| anyhow::anyhow!("stdout pump panicked"))?;
    let errors = error_pump
        .join()
        .map_err(|_| anyhow::anyhow!("stderr pump panicked"))?;

    Ok(ProcessResult {
        exit_code: status.code().unwrap_or(-1),
        last_output: all_output.last().cloned(),
        all_output,
        errors,
    })
}

/// Read lines from a child stream until end-of-stream, applying `map` to each.
///
/// Lines arrive incrementally, so long-running scripts can be observed while
/// they run. A read error (e.g. invalid UTF-8) stops the pump; everything
/// captured so far is kept.
fn pump_lines<R: Read>(stream: R, map: impl Fn(&str) -> String) -> Vec<String> {
    let mut lines = Vec::new();
    for line in BufReader::new(stream).lines() {
        match line {
            Ok(line) => lines.push(map(&line)),
            Err(_) => break,
        }
    }
    lines
}

/// Strip ANSI escape sequences from a captured stderr line.
///
/// Interpreters decorate error output with color codes (red foreground,
/// reset) that must not leak into structured error text.
pub(crate) fn sanitize_line(line: &str) -> String {
    strip_ansi_escapes::strip_str(line)
}

/// Run through the OS elevation mechanism with no stream capture.
///
/// Elevation detaches the child's console from ours, so `all_output` and
/// `errors` are necessarily empty; only the exit code is reliable.
fn execute_elevated(instructions: &ProcessInstructions) -> Result<ProcessResult> {
    let status = elevated_command(instructions)
        .status()
        .with_context(|| format!("failed to launch elevated: {}", instructions.executable))?;

    Ok(ProcessResult {
        exit_code: status.code().unwrap_or(-1),
        ..ProcessResult::default()
    })
}

#[cfg(windows)]
fn elevated_command(instructions: &ProcessInstructions) -> Command {
    // `Start-Process -Verb RunAs` is the supported way to trigger UAC from a
    // console program; the wrapper exits with the elevated child's exit code.
    let exe = instructions.executable.replace('\'', "''");
    let mut script = format!("$p = Start-Process -FilePath '{exe}'");
    if !instructions.arguments.is_empty() {
        let list: Vec<String> = instructions
            .arguments
            .iter()
            .map(|a| format!("'{}'", a.replace('\'', "''")))
            .collect();
        script.push_str(" -ArgumentList ");
        script.push_str(&list.join(","));
    }
    script.push_str(" -Verb RunAs -Wait -PassThru; exit $p.ExitCode");

    let mut cmd = Command::new("powershell.exe");
    cmd.args(["-NoProfile", "-Command", &script]);
    cmd
}

#[cfg(not(windows))]
fn elevated_command(instructions: &ProcessInstructions) -> Command {
    let mut cmd = Command::new("sudo");
    cmd.arg(&instructions.executable)
        .args(&instructions.arguments);
    cmd
}

/// Check if a program is available on PATH.
#[must_use]
pub fn which(program: &str) -> bool {
    #[cfg(target_os = "windows")]
    let check = Command::new("where").arg(program).output();

    #[cfg(not(target_os = "windows"))]
    let check = Command::new("which").arg(program).output();

    check.is_ok_and(|o| o.status.success())
}
