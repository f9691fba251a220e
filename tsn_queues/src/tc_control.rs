use std::fmt;
use thiserror::Error;
use tracing::{debug, error};

/// Errors raised while running `tc`/`ip` commands.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The command could not be spawned at all.
    #[error("unable to run '{command}': {source}")]
    Exec {
        /// The command line that failed.
        command: String,
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// The command ran and reported failure.
    #[error("'{command}' failed: {stderr}")]
    CommandFailed {
        /// The command line that failed.
        command: String,
        /// Whatever the tool printed on stderr.
        stderr: String,
    },
}

/// One external command, program plus arguments. Built pure by the
/// `commands` module, executed here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShellCommand {
    /// Program to run (`tc`, `ip`).
    pub program: &'static str,
    /// Arguments, one token per element.
    pub args: Vec<String>,
}

impl ShellCommand {
    pub(crate) fn new<I, S>(program: &'static str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Self {
            program,
            args: args.into_iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.program, self.args.join(" "))
    }
}

/// Execute one command, failing on non-zero exit status.
pub fn execute(command: &ShellCommand) -> Result<(), QueueError> {
    debug!("{command}");
    let output = std::process::Command::new(command.program)
        .args(&command.args)
        .output()
        .map_err(|e| QueueError::Exec {
            command: command.to_string(),
            source: e,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        error!("'{command}' failed: {stderr}");
        return Err(QueueError::CommandFailed {
            command: command.to_string(),
            stderr,
        });
    }
    Ok(())
}
