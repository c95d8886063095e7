//! Turns the flat token stream into command trees.
//!
//! Four passes, in order:
//! 1. split on `;`, `&&` and `||` into left-associative logical trees,
//!    asking for more input while a trailing `&&`, `||` or `|` is open;
//! 2. split every leaf on `|` into left-associative pipe trees;
//! 3. lift redirections out of every leaf into `stdin` / `stdout`;
//! 4. reject leaves that mix a subshell with ordinary words.

use std::collections::VecDeque;

use crate::error::{Pending, ShellError};

use super::token::{Operator, Token};
use super::types::{Command, CommandTree, Connector, Redirection};

/// Source of extra tokens when the list ends on an open operator.
/// `Ok(None)` means the input is exhausted.
pub type MoreTokens<'a> = dyn FnMut() -> Result<Option<Vec<Token>>, ShellError> + 'a;

/// Run all four passes over one line's tokens.
pub fn split_commands(
    tokens: Vec<Token>,
    more: &mut MoreTokens<'_>,
) -> Result<Vec<CommandTree<Command>>, ShellError> {
    let list = split_logical(tokens, more)?;
    let list = list
        .into_iter()
        .map(|tree| {
            let tree = tree.try_map(&mut split_pipes)?;
            let tree =
                tree.try_map(&mut |command| extract_redirections(command).map(CommandTree::Simple))?;
            tree.try_for_each(&mut check_subshell)?;
            Ok(tree)
        })
        .collect::<Result<Vec<_>, ShellError>>()?;

    for tree in &list {
        log::debug!("split: {tree}");
    }
    Ok(list)
}

/// Pass 1: `;`, `&&`, `||`. End of input counts as a trailing `;`.
pub fn split_logical(
    tokens: Vec<Token>,
    more: &mut MoreTokens<'_>,
) -> Result<Vec<CommandTree<Command>>, ShellError> {
    let mut list = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    let mut pending: Option<(CommandTree<Command>, Connector)> = None;
    let mut queue: VecDeque<Token> = tokens.into();

    loop {
        while let Some(token) = queue.pop_front() {
            match token {
                Token::Operator(op @ (Operator::And | Operator::Or)) => {
                    let command = finish(&mut current, op)?;
                    let left = attach(pending.take(), command);
                    let connector = if op == Operator::And {
                        Connector::And
                    } else {
                        Connector::Or
                    };
                    pending = Some((left, connector));
                }
                Token::Operator(Operator::Semi) => {
                    let command = finish(&mut current, Operator::Semi)?;
                    list.push(attach(pending.take(), command));
                }
                // job control is not supported
                Token::Operator(Operator::Background) => {
                    return Err(ShellError::UnexpectedToken(Operator::Background.to_string()));
                }
                other => current.push(other),
            }
        }

        let open = (pending.is_some() && is_blank(&current)) || ends_with_pipe(&current);
        if !open {
            break;
        }
        match more()? {
            Some(tokens) => queue.extend(tokens),
            None => return Err(ShellError::Incomplete(Pending::Command)),
        }
    }

    if !is_blank(&current) {
        let command = Command::new(std::mem::take(&mut current));
        list.push(attach(pending.take(), command));
    }
    Ok(list)
}

/// Pass 2: rebuild a command containing `|` as a left-associative pipe tree.
pub fn split_pipes(command: Command) -> Result<CommandTree<Command>, ShellError> {
    if !command
        .tokens
        .iter()
        .any(|token| token.is_operator(Operator::Pipe))
    {
        return Ok(CommandTree::Simple(command));
    }

    let mut pending: Option<(CommandTree<Command>, Connector)> = None;
    let mut segment = Vec::new();
    for token in command.tokens {
        if token.is_operator(Operator::Pipe) {
            let left = finish(&mut segment, Operator::Pipe)?;
            pending = Some((attach(pending.take(), left), Connector::Pipe));
        } else {
            segment.push(token);
        }
    }
    let last = finish(&mut segment, Operator::Pipe)?;
    Ok(attach(pending, last))
}

/// Pass 3: move `<`/`<<` and `>`/`>>` with their targets out of the token
/// list. A later redirection in the same direction replaces an earlier one.
pub fn extract_redirections(mut command: Command) -> Result<Command, ShellError> {
    let mut i = 0;
    while i < command.tokens.len() {
        let op = match &command.tokens[i] {
            Token::Operator(op) if op.is_redirection() => *op,
            _ => {
                i += 1;
                continue;
            }
        };
        command.tokens.remove(i);
        while command.tokens.get(i).is_some_and(Token::is_separator) {
            command.tokens.remove(i);
        }
        if i >= command.tokens.len() {
            return Err(ShellError::UnexpectedToken("newline".into()));
        }
        let target = command.tokens.remove(i);
        if !is_redirection_target(&target) {
            return Err(ShellError::UnexpectedToken(target.original_string()));
        }
        let redirection = Some(Redirection {
            operator: op,
            target,
        });
        if op.is_stdin_redirection() {
            command.stdin = redirection;
        } else {
            command.stdout = redirection;
        }
    }
    Ok(command)
}

/// Pass 4: a command holding a subshell may hold nothing but subshells,
/// operators and whitespace.
pub fn check_subshell(command: &Command) -> Result<(), ShellError> {
    if !command
        .tokens
        .iter()
        .any(|token| matches!(token, Token::Subshell(_)))
    {
        return Ok(());
    }
    let offending = command.tokens.iter().find(|token| {
        !matches!(
            token,
            Token::Subshell(_) | Token::Operator(_) | Token::Separator(_)
        )
    });
    match offending {
        Some(token) => Err(ShellError::UnexpectedToken(token.original_string())),
        None => Ok(()),
    }
}

fn is_redirection_target(token: &Token) -> bool {
    matches!(
        token,
        Token::Word(_)
            | Token::Variable(_)
            | Token::ParamExpand(_)
            | Token::SingleQuote(_)
            | Token::DoubleQuote(_)
    )
}

fn is_blank(tokens: &[Token]) -> bool {
    tokens.iter().all(Token::is_separator)
}

fn ends_with_pipe(tokens: &[Token]) -> bool {
    tokens
        .iter()
        .rev()
        .find(|token| !token.is_separator())
        .is_some_and(|token| token.is_operator(Operator::Pipe))
}

/// Close the accumulated run as a command; an empty run means `op` has
/// nothing on its left.
fn finish(tokens: &mut Vec<Token>, op: Operator) -> Result<Command, ShellError> {
    if is_blank(tokens) {
        return Err(ShellError::UnexpectedToken(op.to_string()));
    }
    Ok(Command::new(std::mem::take(tokens)))
}

/// Complete the pending node with `command` as its right side, or start a
/// new tree when nothing is pending.
fn attach(pending: Option<(CommandTree<Command>, Connector)>, command: Command) -> CommandTree<Command> {
    match pending {
        Some((left, connector)) => {
            CommandTree::binary(connector, left, CommandTree::Simple(command))
        }
        None => CommandTree::Simple(command),
    }
}
