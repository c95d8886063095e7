//! Error types surfaced by the lexer, splitter and expansion engine.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// The construct that was still open when the input source ran dry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Pending {
    SingleQuote,
    DoubleQuote,
    Subshell,
    ParamExpansion,
    Escape,
    /// A command list ending in `&&`, `||` or `|`.
    Command,
}

impl fmt::Display for Pending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self {
            Pending::SingleQuote => "matching `''",
            Pending::DoubleQuote => "matching `\"'",
            Pending::Subshell => "matching `)'",
            Pending::ParamExpansion => "matching `}'",
            Pending::Escape => "escaped character",
            Pending::Command => "command",
        };
        f.write_str(what)
    }
}

/// Every error the pipeline can raise. All of them are recoverable at the
/// interactive loop: print the message, read the next line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    /// A token sits where the grammar cannot accept it. Carries the
    /// token's source text.
    #[error("syntax error near unexpected token `{0}'")]
    UnexpectedToken(String),

    /// A `${...}` construct that cannot be evaluated.
    #[error("{0}: bad substitution")]
    BadSubstitution(String),

    /// A `!` history designator that matched nothing.
    #[error("{0}: event not found")]
    EventNotFound(String),

    /// Raised by `${name:?message}` / `${name?message}`.
    #[error("{name}: {message}")]
    ParameterNotSet { name: String, message: String },

    /// The input source returned end-of-input while a construct was open.
    #[error("unexpected EOF while looking for {0}")]
    Incomplete(Pending),
}

impl ShellError {
    pub(crate) fn parameter_not_set(name: &str, message: &str) -> Self {
        let message = if message.is_empty() {
            "parameter null or not set".to_string()
        } else {
            message.to_string()
        };
        ShellError::ParameterNotSet {
            name: name.to_string(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_token_message() {
        let e = ShellError::UnexpectedToken(";".into());
        assert_eq!(e.to_string(), "syntax error near unexpected token `;'");
    }

    #[test]
    fn parameter_not_set_default_message() {
        let e = ShellError::parameter_not_set("x", "");
        assert_eq!(e.to_string(), "x: parameter null or not set");
    }

    #[test]
    fn parameter_not_set_custom_message() {
        let e = ShellError::parameter_not_set("x", "need x");
        assert_eq!(e.to_string(), "x: need x");
    }

    #[test]
    fn incomplete_names_construct() {
        let e = ShellError::Incomplete(Pending::DoubleQuote);
        assert_eq!(e.to_string(), "unexpected EOF while looking for matching `\"'");
    }
}
