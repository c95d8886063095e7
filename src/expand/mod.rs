//! Word expansion: turns split command trees into argument lists.
//!
//! Per token:
//! - `Word`: tilde (at the start of an argument) then pathname expansion
//! - `SingleQuote`: literal
//! - `DoubleQuote`: children concatenated, no globbing
//! - `Variable`: table lookup, empty if unset
//! - `ParamExpand`: the `${...}` operators in `param.rs`
//! - `Subshell`: collected for the executor, never expanded here
//!
//! Whitespace between tokens ends an argument; adjacent tokens join into
//! one. Expansion results are never split again.

pub mod glob;
mod param;

pub use param::{remove_prefix, remove_suffix, substring};

use std::fmt;

use serde::Serialize;

use crate::error::ShellError;
use crate::parse::{Command, CommandTree, Operator, Redirection, Token};
use crate::vars::Variables;

/// Switches for the optional expansions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpandOptions {
    pub glob: bool,
    pub tilde: bool,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            glob: true,
            tilde: true,
        }
    }
}

/// A redirection with its target expanded to a single string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRedirect {
    pub operator: Operator,
    pub target: String,
}

/// A leaf ready for the executor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedCommand {
    pub args: Vec<String>,
    /// Raw text of each `( ... )` group, in order.
    pub subshells: Vec<String>,
    pub stdin: Option<ResolvedRedirect>,
    pub stdout: Option<ResolvedRedirect>,
}

fn quoted(text: &str) -> String {
    shlex::try_quote(text)
        .map(|quoted| quoted.into_owned())
        .unwrap_or_else(|_| text.to_string())
}

/// Renders as shell input that would produce the same arguments.
impl fmt::Display for ResolvedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self.args.iter().map(|arg| quoted(arg)).collect();
        parts.extend(self.subshells.iter().map(|raw| format!("({raw})")));
        for redirect in [&self.stdin, &self.stdout].into_iter().flatten() {
            parts.push(format!("{}{}", redirect.operator, quoted(&redirect.target)));
        }
        f.write_str(&parts.join(" "))
    }
}

/// Expands commands against a variable table. `${name=...}` writes back
/// into the table, so one expander should see the entries of a line in
/// order.
pub struct Expander<'v> {
    vars: &'v mut dyn Variables,
    options: ExpandOptions,
}

impl<'v> Expander<'v> {
    pub fn new(vars: &'v mut dyn Variables) -> Self {
        Self {
            vars,
            options: ExpandOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExpandOptions) -> Self {
        self.options = options;
        self
    }

    pub fn expand_tree(
        &mut self,
        tree: CommandTree<Command>,
    ) -> Result<CommandTree<ResolvedCommand>, ShellError> {
        tree.try_map(&mut |command| self.expand_command(&command).map(CommandTree::Simple))
    }

    pub fn expand_command(&mut self, command: &Command) -> Result<ResolvedCommand, ShellError> {
        let mut fields = Fields::default();
        let mut subshells = Vec::new();

        for token in &command.tokens {
            match token {
                Token::Separator(_) => fields.split(),
                Token::Word(text) => {
                    let words = self.word(text, !fields.started);
                    for (i, word) in words.iter().enumerate() {
                        if i > 0 {
                            fields.split();
                        }
                        fields.push(word, false);
                    }
                }
                Token::Subshell(raw) => subshells.push(raw.clone()),
                other => {
                    let is_quoted = matches!(other, Token::SingleQuote(_) | Token::DoubleQuote(_));
                    let text = self.expand_token(other)?;
                    fields.push(&text, is_quoted);
                }
            }
        }

        let resolved = ResolvedCommand {
            args: fields.finish(),
            subshells,
            stdin: self.redirect(command.stdin.as_ref())?,
            stdout: self.redirect(command.stdout.as_ref())?,
        };
        log::debug!("expanded: {resolved}");
        Ok(resolved)
    }

    /// Expand one unquoted token to a single string. Bare words are taken
    /// literally and globbed only at argument assembly; the operand of a
    /// `${...}` is globbed here.
    pub fn expand_token(&mut self, token: &Token) -> Result<String, ShellError> {
        self.token(token, false)
    }

    fn token(&mut self, token: &Token, in_quotes: bool) -> Result<String, ShellError> {
        match token {
            Token::Word(text) | Token::SingleQuote(text) => Ok(text.clone()),
            Token::Operator(op) => Ok(op.as_str().to_string()),
            Token::Separator(c) => Ok(c.to_string()),
            Token::DoubleQuote(children) => {
                let mut out = String::new();
                for child in children {
                    out.push_str(&self.token(child, true)?);
                }
                Ok(out)
            }
            Token::Variable(name) => Ok(self.vars.get(name).unwrap_or_default()),
            Token::ParamExpand(param) => self.expand_param(param, in_quotes),
            Token::Subshell(_) => Ok(token.original_string()),
        }
    }

    /// An unquoted word after tilde and pathname expansion.
    fn word(&self, text: &str, at_start: bool) -> Vec<String> {
        let text = if self.options.tilde && at_start && text.starts_with('~') {
            shellexpand::tilde_with_context(text, || self.vars.get("HOME")).into_owned()
        } else {
            text.to_string()
        };
        if self.options.glob {
            glob::expand(&text)
        } else {
            vec![text]
        }
    }

    fn redirect(
        &mut self,
        redirection: Option<&Redirection>,
    ) -> Result<Option<ResolvedRedirect>, ShellError> {
        let Some(redirection) = redirection else {
            return Ok(None);
        };
        let target = match &redirection.target {
            Token::Word(text) => self.word(text, true).join(" "),
            other => self.expand_token(other)?,
        };
        Ok(Some(ResolvedRedirect {
            operator: redirection.operator,
            target,
        }))
    }
}

/// Argument accumulator. An argument exists once it received a quoted
/// token or any non-empty text.
#[derive(Default)]
struct Fields {
    done: Vec<String>,
    current: String,
    started: bool,
}

impl Fields {
    fn push(&mut self, text: &str, is_quoted: bool) {
        self.current.push_str(text);
        self.started |= is_quoted || !text.is_empty();
    }

    fn split(&mut self) {
        if self.started {
            self.done.push(std::mem::take(&mut self.current));
            self.started = false;
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.split();
        self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::NoInput;
    use crate::parse::{DEFAULT_EVENT_WINDOW, parse};
    use crate::vars::ShellVars;

    fn resolve_with(line: &str, vars: &mut ShellVars, options: ExpandOptions) -> ResolvedCommand {
        let history: Vec<String> = Vec::new();
        let parsed = parse(line, &mut NoInput, &history, DEFAULT_EVENT_WINDOW).unwrap();
        let tree = parsed.commands.into_iter().next().unwrap();
        let mut expander = Expander::new(vars).with_options(options);
        let tree = expander.expand_tree(tree).unwrap();
        tree.leaves()[0].clone()
    }

    fn resolve(line: &str, vars: &mut ShellVars) -> ResolvedCommand {
        resolve_with(line, vars, ExpandOptions::default())
    }

    fn args(line: &str, vars: &mut ShellVars) -> Vec<String> {
        resolve(line, vars).args
    }

    #[test]
    fn single_quotes_are_literal() {
        let mut vars = ShellVars::new().with("x", "1");
        assert_eq!(args("echo '$x * ${x}'", &mut vars), vec!["echo", "$x * ${x}"]);
    }

    #[test]
    fn variable_same_in_and_out_of_quotes() {
        let mut vars = ShellVars::new().with("x", "a  b");
        assert_eq!(args("echo $x \"$x\"", &mut vars), vec!["echo", "a  b", "a  b"]);
    }

    #[test]
    fn unset_variable() {
        let mut vars = ShellVars::new();
        assert_eq!(args("echo $nope", &mut vars), vec!["echo"]);
        assert_eq!(args("echo \"$nope\"", &mut vars), vec!["echo", ""]);
        assert_eq!(args("echo ''", &mut vars), vec!["echo", ""]);
    }

    #[test]
    fn adjacent_tokens_join() {
        let mut vars = ShellVars::new().with("x", "post");
        assert_eq!(args("echo pre\"mid\"$x", &mut vars), vec!["echo", "premidpost"]);
        assert_eq!(args("echo a'b'\"c\"", &mut vars), vec!["echo", "abc"]);
    }

    #[test]
    fn double_quotes_keep_whitespace() {
        let mut vars = ShellVars::new();
        assert_eq!(args("echo \"a   b\"", &mut vars), vec!["echo", "a   b"]);
    }

    #[test]
    fn escaped_glob_char_is_literal() {
        let mut vars = ShellVars::new();
        assert_eq!(args(r"echo \*", &mut vars), vec!["echo", "*"]);
    }

    #[test]
    fn tilde_uses_home_from_table() {
        let mut vars = ShellVars::new().with("HOME", "/home/u");
        assert_eq!(args("ls ~/src ~", &mut vars), vec!["ls", "/home/u/src", "/home/u"]);
        assert_eq!(args("echo a~ '~'", &mut vars), vec!["echo", "a~", "~"]);
        assert_eq!(args(r"echo \~", &mut vars), vec!["echo", "~"]);
    }

    #[test]
    fn tilde_can_be_disabled() {
        let mut vars = ShellVars::new().with("HOME", "/home/u");
        let options = ExpandOptions {
            glob: true,
            tilde: false,
        };
        assert_eq!(resolve_with("ls ~", &mut vars, options).args, vec!["ls", "~"]);
    }

    #[test]
    fn redirect_targets_resolved() {
        let mut vars = ShellVars::new().with("in", "a.txt").with("out", "b c.txt");
        let command = resolve("sort < $in > \"$out\"", &mut vars);
        assert_eq!(command.args, vec!["sort"]);
        let stdin = command.stdin.unwrap();
        assert_eq!(stdin.operator, Operator::Less);
        assert_eq!(stdin.target, "a.txt");
        assert_eq!(command.stdout.unwrap().target, "b c.txt");
    }

    #[test]
    fn subshells_collected() {
        let mut vars = ShellVars::new();
        let command = resolve("(ls -l)", &mut vars);
        assert!(command.args.is_empty());
        assert_eq!(command.subshells, vec!["ls -l"]);
    }

    #[test]
    fn glob_matches_become_arguments() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();
        std::fs::write(dir.path().join("b.txt"), "").unwrap();
        let base = dir.path().display().to_string();
        let mut vars = ShellVars::new();
        assert_eq!(
            args(&format!("ls {base}/*.txt"), &mut vars),
            vec!["ls".to_string(), format!("{base}/a.txt"), format!("{base}/b.txt")]
        );
        assert_eq!(
            args(&format!("ls \"{base}/*.txt\""), &mut vars),
            vec!["ls".to_string(), format!("{base}/*.txt")]
        );
    }

    #[test]
    fn glob_target_space_joined() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.log"), "").unwrap();
        std::fs::write(dir.path().join("b.log"), "").unwrap();
        let base = dir.path().display().to_string();
        let command = resolve(&format!("cat < {base}/*.log"), &mut ShellVars::new());
        assert_eq!(
            command.stdin.unwrap().target,
            format!("{base}/a.log {base}/b.log")
        );
    }

    #[test]
    fn glob_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();
        let pattern = format!("{}/*.txt", dir.path().display());
        let options = ExpandOptions {
            glob: false,
            tilde: true,
        };
        let command = resolve_with(&format!("ls {pattern}"), &mut ShellVars::new(), options);
        assert_eq!(command.args, vec!["ls".to_string(), pattern]);
    }

    #[test]
    fn assignment_visible_to_later_entries() {
        let history: Vec<String> = Vec::new();
        let parsed = parse("echo ${x:=1}; echo $x", &mut NoInput, &history, DEFAULT_EVENT_WINDOW).unwrap();
        let mut vars = ShellVars::new();
        let mut expander = Expander::new(&mut vars);
        let trees: Vec<_> = parsed
            .commands
            .into_iter()
            .map(|tree| expander.expand_tree(tree).unwrap())
            .collect();
        assert_eq!(trees[1].leaves()[0].args, vec!["echo", "1"]);
    }

    #[test]
    fn display_quotes_arguments() {
        let command = ResolvedCommand {
            args: vec!["echo".into(), "a b".into(), String::new()],
            subshells: Vec::new(),
            stdin: None,
            stdout: Some(ResolvedRedirect {
                operator: Operator::DoubleGreat,
                target: "out log".into(),
            }),
        };
        assert_eq!(command.to_string(), "echo 'a b' '' >>'out log'");
    }
}
