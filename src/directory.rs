//! The three public lookups over the host's local groups.
//!
//! Name validation happens before any of these are called: [`get_group`]
//! only takes a [`ValidName`], so a raw string never reaches a command line.
//! Everything that can go wrong afterwards comes back as a [`DirectoryError`].
//!
//! [`get_group`]: GroupDirectory::get_group

use crate::config::Config;
use crate::name::{NameError, ValidName};
use crate::parse::{self, GroupRecord, MalformedOutput};
use crate::runner::{CommandExecutor, CommandLine, ExecutionError};

#[derive(Debug)]
pub enum DirectoryError {
    Execution(ExecutionError),
    Malformed(MalformedOutput),
    /// The tool listed a name the naming policy rejects.
    InvalidListedName(NameError),
    /// A listed group was gone by the time its details were requested.
    Vanished(String),
}

impl std::fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Execution(e) => e.fmt(f),
            Self::Malformed(e) => e.fmt(f),
            Self::InvalidListedName(e) => write!(f, "group listing contains an invalid name: {e}"),
            Self::Vanished(name) => {
                write!(f, "group \"{name}\" was listed but no longer exists")
            }
        }
    }
}

impl std::error::Error for DirectoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Execution(e) => Some(e),
            Self::Malformed(e) => Some(e),
            Self::InvalidListedName(e) => Some(e),
            Self::Vanished(_) => None,
        }
    }
}

impl From<ExecutionError> for DirectoryError {
    fn from(e: ExecutionError) -> Self {
        Self::Execution(e)
    }
}

impl From<MalformedOutput> for DirectoryError {
    fn from(e: MalformedOutput) -> Self {
        Self::Malformed(e)
    }
}

/// Reads local groups through a [`CommandExecutor`].
///
/// Holds no state between calls beyond the executor and config.
pub struct GroupDirectory<E> {
    executor: E,
    config: Config,
}

impl<E: CommandExecutor> GroupDirectory<E> {
    pub fn new(executor: E) -> Self {
        Self::with_config(executor, Config::default())
    }

    pub const fn with_config(executor: E, config: Config) -> Self {
        Self { executor, config }
    }

    /// Validate a name against the configured naming policy.
    ///
    /// # Errors
    ///
    /// Returns a [`NameError`] if the name breaks the naming policy.
    pub fn validate(&self, candidate: &str) -> Result<ValidName, NameError> {
        self.config.policy.validate(candidate)
    }

    fn list_command(&self) -> CommandLine {
        CommandLine::new(&self.config.command.program, [&self.config.command.subcommand])
    }

    fn detail_command(&self, name: &ValidName) -> CommandLine {
        self.list_command().with_quoted(name.as_str())
    }

    /// Names of all local groups, in the order the tool prints them.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Execution`] if the tool fails and
    /// [`DirectoryError::Malformed`] if its output does not parse.
    pub fn list_names(&self) -> Result<Vec<String>, DirectoryError> {
        let output = self.executor.execute(&self.list_command())?;
        parse::parse_names(&output.stdout).map_err(|e| {
            tracing::warn!(error = %e, "unexpected group listing");
            e.into()
        })
    }

    /// Details of one group, or `None` if no such group exists.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Execution`] for any failure other than
    /// "group does not exist", and [`DirectoryError::Malformed`] if the
    /// output does not parse.
    pub fn get_group(&self, name: &ValidName) -> Result<Option<GroupRecord>, DirectoryError> {
        let output = match self.executor.execute(&self.detail_command(name)) {
            Ok(output) => output,
            Err(e) if self.is_not_found(&e) => {
                tracing::debug!(group = %name, "group does not exist");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let record = parse::parse_detail(&output.stdout).map_err(|e| {
            tracing::warn!(group = %name, error = %e, "unexpected group details");
            DirectoryError::from(e)
        })?;
        Ok(Some(record))
    }

    /// Details of every group, in listing order.
    ///
    /// Groups are fetched one at a time; the first failure aborts the whole
    /// call and no partial result is returned.
    ///
    /// # Errors
    ///
    /// Returns the first error from listing or from any detail lookup.
    pub fn get_all_groups(&self) -> Result<Vec<GroupRecord>, DirectoryError> {
        let names = self.list_names()?;
        let mut records = Vec::with_capacity(names.len());
        for raw in names {
            let name = self
                .validate(&raw)
                .map_err(DirectoryError::InvalidListedName)?;
            match self.get_group(&name)? {
                Some(record) => records.push(record),
                None => {
                    tracing::warn!(group = %name, "listed group vanished");
                    return Err(DirectoryError::Vanished(name.into_inner()));
                }
            }
        }
        Ok(records)
    }

    fn is_not_found(&self, err: &ExecutionError) -> bool {
        matches!(err, ExecutionError::Failed { .. })
            && err.stderr().contains(&self.config.command.not_found_marker)
    }
}

#[cfg(test)]
mod tests;
