//! Script execution: wraps the process runner with interpreter-specific
//! invocation, turns non-zero exits into typed errors, and maps captured
//! output to requested result types.
use std::sync::Arc;

use crate::error::ScriptError;
use crate::exec::{ProcessInstructions, ProcessResult, ProcessRunner};
use crate::logging::Log;

/// A script interpreter invocation shape: the program plus the flags that
/// precede the script text.
///
/// The script itself is always passed as one argument following the flags
/// (`<program> <flags…> <script>`), so no shell quoting is involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shell {
    program: String,
    flags: Vec<String>,
}

impl Shell {
    /// The primary interpreter (PowerShell Core).
    #[must_use]
    pub fn primary() -> Self {
        Self::custom(primary_interpreter(), INTERPRETER_FLAGS)
    }

    /// The forced-legacy interpreter.
    ///
    /// Some verification and installation scripts only function correctly
    /// under Windows PowerShell; on non-Windows hosts there is no legacy
    /// interpreter and the primary one is used instead.
    #[must_use]
    pub fn legacy() -> Self {
        if cfg!(windows) {
            Self::custom("powershell.exe", INTERPRETER_FLAGS)
        } else {
            Self::primary()
        }
    }

    /// An arbitrary interpreter, e.g. `Shell::custom("sh", &["-c"])` in tests.
    #[must_use]
    pub fn custom(program: &str, flags: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            flags: flags.iter().map(|f| (*f).to_string()).collect(),
        }
    }

    /// Interpreter program name.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    fn instructions(&self, script: &str, run_as_admin: bool) -> ProcessInstructions {
        let mut arguments = self.flags.clone();
        arguments.push(script.to_string());
        ProcessInstructions {
            executable: self.program.clone(),
            arguments,
            run_as_admin,
        }
    }
}

/// Flags preceding the script for both PowerShell interpreters.
const INTERPRETER_FLAGS: &[&str] = &["-NoProfile", "-NonInteractive", "-Command"];

fn primary_interpreter() -> &'static str {
    if cfg!(windows) { "pwsh.exe" } else { "pwsh" }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for String {}
    impl Sealed for bool {}
}

/// Conversion from a script's last output line into a typed result.
///
/// Deliberately narrow: only `String` (pass-through) and `bool`
/// (case-insensitive) are supported, and the trait is sealed so requesting
/// any other type is a compile error. Callers needing richer types must
/// serialize through a string themselves. Absent output maps to the type's
/// default value.
pub trait FromScriptOutput: sealed::Sealed + Sized {
    /// Interpret the last output line (if any).
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be interpreted as `Self`.
    fn from_last_output(output: Option<&str>) -> Result<Self, ScriptError>;
}

impl FromScriptOutput for String {
    fn from_last_output(output: Option<&str>) -> Result<Self, ScriptError> {
        Ok(output.unwrap_or_default().to_string())
    }
}

impl FromScriptOutput for bool {
    fn from_last_output(output: Option<&str>) -> Result<Self, ScriptError> {
        match output {
            None => Ok(false),
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(ScriptError::BadBoolOutput {
                    output: raw.to_string(),
                }),
            },
        }
    }
}

/// Executes interpreter scripts through a [`ProcessRunner`].
///
/// Where the runner reports failure as an exit code, this layer converts it
/// into [`ScriptError::NonZeroExit`]; nothing downstream swallows a non-zero
/// exit silently.
pub struct ScriptExecutor {
    runner: Arc<dyn ProcessRunner>,
    log: Arc<dyn Log>,
    shell: Shell,
}

impl std::fmt::Debug for ScriptExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptExecutor")
            .field("shell", &self.shell)
            .finish_non_exhaustive()
    }
}

impl ScriptExecutor {
    /// Create an executor for the given shell.
    #[must_use]
    pub fn new(runner: Arc<dyn ProcessRunner>, log: Arc<dyn Log>, shell: Shell) -> Self {
        Self { runner, log, shell }
    }

    /// Execute a script, discarding its output.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::NonZeroExit`] when the interpreter exits with a
    /// non-zero code, or [`ScriptError::Launch`] when it cannot be started.
    pub fn run(&self, script: &str, run_as_admin: bool) -> Result<(), ScriptError> {
        self.invoke(script, run_as_admin).map(|_| ())
    }

    /// Execute a script and interpret its last output line as `T`.
    ///
    /// Typed execution never elevates: an elevated process cannot have its
    /// output captured, so there would be nothing to interpret.
    ///
    /// # Errors
    ///
    /// Returns an error on non-zero exit, launch failure, or when the output
    /// cannot be interpreted as `T`.
    pub fn run_typed<T: FromScriptOutput>(&self, script: &str) -> Result<T, ScriptError> {
        let result = self.invoke(script, false)?;
        T::from_last_output(result.last_output.as_deref())
    }

    fn invoke(&self, script: &str, run_as_admin: bool) -> Result<ProcessResult, ScriptError> {
        let instructions = self.shell.instructions(script, run_as_admin);
        let result = self.runner.execute(&instructions)?;

        // Interpreters write warnings to stderr even on a successful exit;
        // surface every captured line regardless of the exit code.
        for line in &result.errors {
            self.log.warn(line);
        }

        if result.exit_code != 0 {
            return Err(ScriptError::NonZeroExit {
                code: result.exit_code,
            });
        }
        Ok(result)
    }
}
