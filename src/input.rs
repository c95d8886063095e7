//! Sources of continuation input for constructs left open at end of line.

use std::collections::VecDeque;

/// Supplies one more line whenever the lexer or splitter needs it.
/// `None` means end of input.
pub trait InputSource {
    fn next_line(&mut self) -> Option<String>;
}

impl<F> InputSource for F
where
    F: FnMut() -> Option<String>,
{
    fn next_line(&mut self) -> Option<String> {
        self()
    }
}

/// A source that is always exhausted.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInput;

impl InputSource for NoInput {
    fn next_line(&mut self) -> Option<String> {
        None
    }
}

/// Fixed queue of lines; counts how often it was asked.
#[derive(Debug, Default, Clone)]
pub struct Scripted {
    lines: VecDeque<String>,
    calls: usize,
}

impl Scripted {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            calls: 0,
        }
    }

    /// Number of `next_line` calls so far, including ones that hit the end.
    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl InputSource for Scripted {
    fn next_line(&mut self) -> Option<String> {
        self.calls += 1;
        self.lines.pop_front()
    }
}
