//! CLI-specific error types and exit code mapping

use phonelab_logfile::LogfileError;

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// Some files or directories could not be processed.
    #[error("{failed} of {total} items failed")]
    Partial {
        /// Failed items (files plus directory tasks).
        failed: usize,
        /// Items attempted.
        total: usize,
    },

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from phonelab-logfile.
    #[error("{0}")]
    Logfile(LogfileError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                  |
    /// |------|------------------------------------------|
    /// | 0    | Success                                  |
    /// | 1    | General / command error, partial failure |
    /// | 2    | Configuration error                      |
    /// | 3    | Log file rejected (format or integrity)  |
    /// | 10   | IO error                                 |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Logfile(e) if e.is_parse_failure() => 3,
            Self::Logfile(LogfileError::Io { .. }) | Self::Io(_) => 10,
            Self::Logfile(_) | Self::JsonSerialize(_) | Self::Command(_) | Self::Partial { .. } => 1,
        }
    }
}

impl From<LogfileError> for CliError {
    fn from(e: LogfileError) -> Self {
        match e {
            LogfileError::Config { .. } => Self::Config(e.to_string()),
            other => Self::Logfile(other),
        }
    }
}
