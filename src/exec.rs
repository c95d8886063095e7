//! Hand-off point to whatever runs resolved commands.

use std::io::{self, Write};

use crate::expand::ResolvedCommand;
use crate::parse::CommandTree;

/// Receives each expanded top-level entry in order.
pub trait Executor {
    fn execute(&mut self, tree: &CommandTree<ResolvedCommand>) -> io::Result<()>;
}

/// Writes what would run instead of running it: shell syntax by default,
/// one JSON document per entry with `json`.
pub struct DryRun<W: Write> {
    out: W,
    json: bool,
}

impl<W: Write> DryRun<W> {
    pub fn new(out: W) -> Self {
        Self { out, json: false }
    }

    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Executor for DryRun<W> {
    fn execute(&mut self, tree: &CommandTree<ResolvedCommand>) -> io::Result<()> {
        if self.json {
            serde_json::to_writer(&mut self.out, tree)?;
            writeln!(self.out)
        } else {
            writeln!(self.out, "{}", render(tree))
        }
    }
}

/// Shell syntax for a tree. The splitter builds trees left-associative
/// with `|` binding tighter than `&&`/`||`, so no grouping is needed.
pub fn render(tree: &CommandTree<ResolvedCommand>) -> String {
    match tree {
        CommandTree::Simple(command) => command.to_string(),
        CommandTree::Binary(node) => format!(
            "{} {} {}",
            render(&node.left),
            node.connector.as_str(),
            render(&node.right)
        ),
    }
}
