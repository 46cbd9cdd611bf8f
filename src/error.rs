//! Structured errors raised by parsing and dispatch.
//!
//! Every user-visible failure carries an exit code, a stable string code, and
//! a display message. Under an exit override the error is returned to the
//! caller instead of terminating the process.

/// Stable string codes carried by [`CliError`].
///
/// The codes are part of the public contract; match on these rather than on
/// message text.
pub mod codes {
    pub const INVALID_ARGUMENT: &str = "commander.invalidArgument";
    pub const MISSING_ARGUMENT: &str = "commander.missingArgument";
    pub const EXCESS_ARGUMENTS: &str = "commander.excessArguments";
    pub const UNKNOWN_OPTION: &str = "commander.unknownOption";
    pub const UNKNOWN_COMMAND: &str = "commander.unknownCommand";
    pub const OPTION_MISSING_ARGUMENT: &str = "commander.optionMissingArgument";
    pub const MISSING_MANDATORY_OPTION_VALUE: &str = "commander.missingMandatoryOptionValue";
    pub const CONFLICTING_OPTION: &str = "commander.conflictingOption";
    pub const HELP: &str = "commander.help";
    pub const HELP_DISPLAYED: &str = "commander.helpDisplayed";
    pub const VERSION: &str = "commander.version";
    pub const EXECUTE_SUBCOMMAND_ASYNC: &str = "commander.executeSubCommandAsync";
    pub const ERROR: &str = "commander.error";
}

/// Structured parse/dispatch error.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct CliError {
    /// Suggested process exit code.
    pub exit_code: i32,
    /// One of the stable codes in [`codes`].
    pub code: String,
    /// Message as written to the error sink (without trailing newline).
    pub message: String,
    /// Underlying failure, when one exists (e.g. a coercion error).
    #[source]
    pub cause: Option<Box<dyn std::error::Error>>,
}

impl CliError {
    pub fn new(exit_code: i32, code: &str, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            code: code.to_string(),
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// True for the control-flow codes that signal a normal exit rather than
    /// a failure (help display and version display).
    pub fn is_display_exit(&self) -> bool {
        matches!(
            self.code.as_str(),
            codes::HELP | codes::HELP_DISPLAYED | codes::VERSION
        )
    }
}
