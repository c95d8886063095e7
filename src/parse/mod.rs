//! Lexing and command splitting: one input line in, command trees out.

pub mod lexer;
pub mod split;
pub mod token;
pub mod types;

pub use lexer::{DEFAULT_EVENT_WINDOW, Lexer, tokenize};
pub use split::split_commands;
pub use token::{Operator, ParamExpansion, ParamOp, ParamValue, Token};
pub use types::{Binary, Command, CommandTree, Connector, Redirection};

use serde::Serialize;

use crate::error::ShellError;
use crate::history::HistoryLog;
use crate::input::InputSource;

/// A fully split input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parsed {
    /// One tree per `;`-separated entry.
    pub commands: Vec<CommandTree<Command>>,
    /// The line after history splicing and continuation appends.
    pub text: String,
    /// Whether any `!` event was substituted.
    pub history_expanded: bool,
}

/// Lex `line`, pulling continuation lines from `input` while a construct
/// or a trailing `&&`, `||` or `|` is open, then split it into trees.
pub fn parse(
    line: &str,
    input: &mut dyn InputSource,
    history: &dyn HistoryLog,
    event_window: usize,
) -> Result<Parsed, ShellError> {
    let mut lexer = Lexer::new(line, input, history).with_event_window(event_window);
    let tokens = lexer.tokenize()?;
    log::debug!("tokens: {tokens:?}");
    let commands = split_commands(tokens, &mut || lexer.extend())?;
    Ok(Parsed {
        commands,
        text: lexer.text(),
        history_expanded: lexer.history_expanded(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{NoInput, Scripted};

    #[test]
    fn parse_reports_final_text() {
        let history = vec!["ls -l".to_string()];
        let parsed = parse("!! | wc", &mut NoInput, &history, DEFAULT_EVENT_WINDOW).unwrap();
        assert_eq!(parsed.text, "ls -l | wc");
        assert!(parsed.history_expanded);
        assert_eq!(parsed.commands[0].to_string(), "Pipe(ls -l, wc)");
    }

    #[test]
    fn parse_includes_continuations_in_text() {
        let history: Vec<String> = Vec::new();
        let mut input = Scripted::new(["b"]);
        let parsed = parse("a ||", &mut input, &history, DEFAULT_EVENT_WINDOW).unwrap();
        assert_eq!(parsed.text, "a ||\nb");
        assert!(!parsed.history_expanded);
        assert_eq!(parsed.commands[0].to_string(), "Or(a, b)");
    }

    #[test]
    fn parse_serializes() {
        let history: Vec<String> = Vec::new();
        let parsed = parse("ls", &mut NoInput, &history, DEFAULT_EVENT_WINDOW).unwrap();
        let json = serde_json::to_value(&parsed).unwrap();
        assert_eq!(json["text"], "ls");
        assert_eq!(
            json["commands"][0]["Simple"]["tokens"][0]["content"],
            "ls"
        );
    }
}
