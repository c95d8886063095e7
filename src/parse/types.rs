//! Command tree types produced by the splitter and consumed by expansion.

use std::fmt;

use serde::Serialize;

use super::token::{Operator, Token};

/// Binary connector between two commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Connector {
    /// `|`: pipe stdout
    Pipe,
    /// `&&`: run right only if left succeeded
    And,
    /// `||`: run right only if left failed
    Or,
}

impl Connector {
    pub fn as_str(&self) -> &'static str {
        match self {
            Connector::Pipe => "|",
            Connector::And => "&&",
            Connector::Or => "||",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Connector::Pipe => "Pipe",
            Connector::And => "And",
            Connector::Or => "Or",
        }
    }
}

/// A redirection lifted out of a command: the operator plus its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirection {
    pub operator: Operator,
    pub target: Token,
}

/// A single command: its remaining tokens plus the redirections the
/// splitter extracted. After splitting, `tokens` holds no pipe or
/// redirection operators.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Command {
    pub tokens: Vec<Token>,
    pub stdin: Option<Redirection>,
    pub stdout: Option<Redirection>,
}

impl Command {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            stdin: None,
            stdout: None,
        }
    }

    /// True when the command has nothing but whitespace.
    pub fn is_empty(&self) -> bool {
        self.tokens.iter().all(Token::is_separator)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text: String = self.tokens.iter().map(Token::to_string).collect();
        f.write_str(text.trim())?;
        for redirect in [&self.stdin, &self.stdout].into_iter().flatten() {
            write!(f, " {}{}", redirect.operator, redirect.target)?;
        }
        Ok(())
    }
}

/// A tree of commands joined by pipes and logical operators.
///
/// Built bottom-up: a `Binary` node only exists once both sides do.
/// The leaf type changes as the pipeline runs: the splitter produces
/// `CommandTree<Command>`, expansion produces
/// `CommandTree<ResolvedCommand>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CommandTree<C> {
    Simple(C),
    Binary(Box<Binary<C>>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binary<C> {
    pub connector: Connector,
    pub left: CommandTree<C>,
    pub right: CommandTree<C>,
}

impl<C> CommandTree<C> {
    pub fn binary(connector: Connector, left: CommandTree<C>, right: CommandTree<C>) -> Self {
        CommandTree::Binary(Box::new(Binary {
            connector,
            left,
            right,
        }))
    }

    /// Rebuild the tree with every leaf transformed by `f`, left to right.
    pub fn try_map<D, E>(
        self,
        f: &mut impl FnMut(C) -> Result<CommandTree<D>, E>,
    ) -> Result<CommandTree<D>, E> {
        match self {
            CommandTree::Simple(leaf) => f(leaf),
            CommandTree::Binary(node) => {
                let Binary {
                    connector,
                    left,
                    right,
                } = *node;
                let left = left.try_map(f)?;
                let right = right.try_map(f)?;
                Ok(CommandTree::binary(connector, left, right))
            }
        }
    }

    /// Visit every leaf, left to right.
    pub fn try_for_each<E>(&self, f: &mut impl FnMut(&C) -> Result<(), E>) -> Result<(), E> {
        match self {
            CommandTree::Simple(leaf) => f(leaf),
            CommandTree::Binary(node) => {
                node.left.try_for_each(f)?;
                node.right.try_for_each(f)
            }
        }
    }

    /// Leaves in left-to-right order.
    pub fn leaves(&self) -> Vec<&C> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a C>) {
        match self {
            CommandTree::Simple(leaf) => out.push(leaf),
            CommandTree::Binary(node) => {
                node.left.collect_leaves(out);
                node.right.collect_leaves(out);
            }
        }
    }
}

/// Renders as `Or(And(Pipe(a, b), c), d)`.
impl<C: fmt::Display> fmt::Display for CommandTree<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandTree::Simple(leaf) => write!(f, "{leaf}"),
            CommandTree::Binary(node) => write!(
                f,
                "{}({}, {})",
                node.connector.label(),
                node.left,
                node.right
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(word: &str) -> CommandTree<Command> {
        CommandTree::Simple(Command::new(vec![Token::word(word)]))
    }

    #[test]
    fn renders_nested_tree() {
        let tree = CommandTree::binary(
            Connector::Or,
            CommandTree::binary(Connector::Pipe, leaf("a"), leaf("b")),
            leaf("c"),
        );
        assert_eq!(tree.to_string(), "Or(Pipe(a, b), c)");
    }

    #[test]
    fn empty_command_ignores_separators() {
        assert!(Command::new(vec![Token::Separator(' ')]).is_empty());
        assert!(!Command::new(vec![Token::word("x")]).is_empty());
    }

    #[test]
    fn leaves_in_order() {
        let tree = CommandTree::binary(Connector::And, leaf("a"), leaf("b"));
        let words: Vec<String> = tree.leaves().iter().map(|c| c.to_string()).collect();
        assert_eq!(words, vec!["a", "b"]);
    }

    #[test]
    fn display_includes_redirections() {
        let mut cmd = Command::new(vec![Token::word("cat")]);
        cmd.stdout = Some(Redirection {
            operator: Operator::Great,
            target: Token::word("out"),
        });
        assert_eq!(cmd.to_string(), "cat >out");
    }

    #[test]
    fn try_map_preserves_shape() {
        let tree = CommandTree::binary(Connector::Pipe, leaf("a"), leaf("b"));
        let mapped: Result<CommandTree<String>, ()> =
            tree.try_map(&mut |c: Command| Ok(CommandTree::Simple(c.to_string())));
        assert_eq!(mapped.unwrap().to_string(), "Pipe(a, b)");
    }
}
