use std::process::{Command, Stdio};

/// A program plus its arguments, as handed to a [`CommandExecutor`].
///
/// `quoted` marks the one argument that must reach the program wrapped in
/// double quotes (the group name in detail mode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
    pub quoted: Option<String>,
}

impl CommandLine {
    pub fn new(
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            quoted: None,
        }
    }

    /// Append a trailing argument that is rendered in double quotes.
    #[must_use]
    pub fn with_quoted(mut self, arg: impl Into<String>) -> Self {
        self.quoted = Some(arg.into());
        self
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        if let Some(ref q) = self.quoted {
            write!(f, " \"{q}\"")?;
        }
        Ok(())
    }
}

/// Captured text of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// The external command could not be run or exited non-zero.
#[derive(Debug)]
pub enum ExecutionError {
    Spawn {
        command: String,
        source: std::io::Error,
    },
    Failed {
        command: String,
        exit_code: i32,
        stderr: String,
    },
}

impl ExecutionError {
    /// Captured stderr of a failed run; empty when the process never started.
    pub fn stderr(&self) -> &str {
        match self {
            Self::Spawn { .. } => "",
            Self::Failed { stderr, .. } => stderr,
        }
    }
}

impl std::fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn { command, source } => write!(f, "failed to run `{command}`: {source}"),
            Self::Failed {
                command,
                exit_code,
                stderr,
            } => {
                write!(f, "`{command}` exited with code {exit_code}")?;
                let stderr = stderr.trim();
                if !stderr.is_empty() {
                    write!(f, ": {stderr}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn { source, .. } => Some(source),
            Self::Failed { .. } => None,
        }
    }
}

/// Runs one external command and captures its output.
///
/// Timeouts, if any, belong to the implementation; callers never cancel.
pub trait CommandExecutor {
    /// # Errors
    ///
    /// Returns [`ExecutionError`] if the program cannot be started or exits
    /// with a non-zero status.
    fn execute(&self, command: &CommandLine) -> Result<CommandOutput, ExecutionError>;
}

/// Extract an exit code from a process status, mapping signals to 128+N on Unix.
fn exit_code_from_status(status: std::process::ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        status
            .code()
            .unwrap_or_else(|| status.signal().map_or(1, |s| 128 + s))
    }
    #[cfg(not(unix))]
    {
        status.code().unwrap_or(1)
    }
}

/// Spawns the program directly with `std::process::Command` (no shell).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl SystemExecutor {
    fn build(command: &CommandLine) -> Command {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ref q) = command.quoted {
            #[cfg(windows)]
            {
                use std::os::windows::process::CommandExt;
                cmd.raw_arg(format!("\"{q}\""));
            }
            #[cfg(not(windows))]
            {
                cmd.arg(q);
            }
        }
        cmd
    }
}

impl CommandExecutor for SystemExecutor {
    fn execute(&self, command: &CommandLine) -> Result<CommandOutput, ExecutionError> {
        let rendered = command.to_string();
        tracing::debug!(command = %rendered, "running");
        let output = Self::build(command)
            .output()
            .map_err(|source| ExecutionError::Spawn {
                command: rendered.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let exit_code = exit_code_from_status(output.status);
        tracing::debug!(command = %rendered, exit_code, "finished");

        if exit_code != 0 {
            return Err(ExecutionError::Failed {
                command: rendered,
                exit_code,
                stderr,
            });
        }
        Ok(CommandOutput { stdout, stderr })
    }
}
