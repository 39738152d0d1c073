use thiserror::Error;

/// Why a command line did not produce a [`crate::config::DiagnosticConfig`].
///
/// `HelpRequested` is not a mistake by the user; check [`ParseFailure::is_help`]
/// before treating a failure as an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    #[error("{usage}")]
    HelpRequested { usage: String },

    #[error("option {option} requires a non-empty value")]
    MissingRequiredOption { option: String },

    #[error("invalid value '{value}' for {option}: expected a value matching {pattern}")]
    PatternMismatch {
        option: String,
        value: String,
        pattern: String,
    },

    #[error("unknown option '{token}'")]
    UnknownOption { token: String },

    #[error("short option -{short} is claimed by both {first} and {second}")]
    AmbiguousShortOption {
        short: char,
        first: String,
        second: String,
    },

    #[error("option {option} may only be given once")]
    RepeatedOption { option: String },

    #[error("value '{value}' for {option} is too large")]
    ValueOutOfRange { option: String, value: String },

    #[error("{message}")]
    Invalid { message: String },
}

impl ParseFailure {
    pub fn is_help(&self) -> bool {
        matches!(self, ParseFailure::HelpRequested { .. })
    }

    /// Process exit status for this outcome: 0 for help, 2 for usage errors.
    pub fn exit_code(&self) -> i32 {
        if self.is_help() { 0 } else { 2 }
    }
}

/// Configuration that parsed cleanly but cannot be turned into a collection plan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("port in '{host_port}' is outside 1-65535")]
    InvalidPort { host_port: String },

    #[error("unknown authentication type '{0}', expected 'basic' or 'cookie'")]
    UnknownAuthType(String),

    #[error("--auth-type {0} requires --auth-creds")]
    MissingAuthCreds(String),

    #[error("--auth-creds requires --auth-type")]
    MissingAuthType,
}
