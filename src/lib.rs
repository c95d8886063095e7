//! shellfront: the front end of an interactive POSIX-like shell.
//!
//! Turns a raw input line into command trees whose leaves carry final
//! argument lists and resolved redirection targets. Constructs left open
//! at the end of a line (quotes, subshells, `${`, trailing `\`, trailing
//! `&&` / `||` / `|`) pull continuation lines from an [`input::InputSource`].
//!
//! # Architecture
//!
//! - **[`parse`]**: lexer (quoting, `$name`, `${...}`, subshells, `!` history
//!   events) and the splitter building `;` / `&&` / `||` / `|` trees with
//!   redirections lifted out.
//! - **[`expand`]**: variable and parameter expansion, tilde, globbing and
//!   argument assembly.
//! - **[`session`]**: config, history and variables for one shell run.
//! - **[`exec`]**: the executor seam and a dry-run executor.
//! - **[`config`]**: embedded defaults + user overlay merge.
//! - **[`logging`]**: file logging to `~/.local/share/shellfront/shellfront.log`.

/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Error types shared by every stage.
pub mod error;
/// Executor trait and the dry-run renderer.
pub mod exec;
/// Word expansion: parameters, tilde, globbing, argument assembly.
pub mod expand;
/// History log consulted by `!` events.
pub mod history;
/// Continuation input sources.
pub mod input;
/// File-based logging setup.
pub mod logging;
/// Lexer, token model and command splitting.
pub mod parse;
/// Per-line pipeline driver.
pub mod session;
/// Shell variable table.
pub mod vars;

pub use error::ShellError;
pub use expand::ResolvedCommand;
pub use parse::CommandTree;
pub use session::{Processed, Session};

/// Process one line with default configuration and no variables,
/// history or continuation input.
///
/// This is the main entry point for tests and simple usage.
pub fn process(line: &str) -> Result<Processed, ShellError> {
    let mut session = Session::with_vars(config::Config::default_config(), vars::ShellVars::new());
    session.process(line, &mut input::NoInput)
}
