//! Character-level scanner: turns one logical input line into tokens.
//!
//! The lexer owns a growable character buffer seeded from the first line.
//! Whenever a construct is still open at the end of the buffer (a quote,
//! a `${`, a subshell, a trailing backslash) it asks its [`InputSource`]
//! for one more line, appends it, and keeps scanning. History events
//! (`!!`, `!N`, `!-N`, `!prefix`) are spliced into the buffer in place and
//! then scanned like typed text.

use crate::error::{Pending, ShellError};
use crate::history::HistoryLog;
use crate::input::InputSource;

use super::token::{Operator, ParamExpansion, ParamOp, ParamValue, Token};

/// Number of most recent history entries numeric events can address.
pub const DEFAULT_EVENT_WINDOW: usize = 1000;

/// Escaped characters that stay literal through globbing and tilde
/// expansion. They are emitted as single-character quoted tokens instead
/// of being folded into the surrounding word.
const GLOB_SPECIAL: &[char] = &['*', '?', '[', ']', '~'];

pub struct Lexer<'a> {
    buf: Vec<char>,
    pos: usize,
    input: &'a mut dyn InputSource,
    history: &'a dyn HistoryLog,
    event_window: usize,
    /// `!` before this index was spliced in from history and is literal.
    literal_until: usize,
    history_expanded: bool,
    continuations: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(line: &str, input: &'a mut dyn InputSource, history: &'a dyn HistoryLog) -> Self {
        Self {
            buf: line.trim_end_matches('\n').chars().collect(),
            pos: 0,
            input,
            history,
            event_window: DEFAULT_EVENT_WINDOW,
            literal_until: 0,
            history_expanded: false,
            continuations: 0,
        }
    }

    pub fn with_event_window(mut self, window: usize) -> Self {
        self.event_window = window;
        self
    }

    /// The logical input after history splicing and continuation appends.
    pub fn text(&self) -> String {
        self.buf.iter().collect()
    }

    /// Whether any `!` event was substituted.
    pub fn history_expanded(&self) -> bool {
        self.history_expanded
    }

    /// Number of extra lines pulled from the input source.
    pub fn continuations(&self) -> usize {
        self.continuations
    }

    /// Scan from the current position to the end of the buffer.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, ShellError> {
        let mut tokens = Vec::new();
        let mut word = String::new();

        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\n' => {
                    flush(&mut word, &mut tokens);
                    tokens.push(Token::Separator(c));
                    self.pos += 1;
                }
                '\\' => {
                    self.pos += 1;
                    match self.peek() {
                        // line continuation
                        Some('\n') => self.pos += 1,
                        Some(next) if GLOB_SPECIAL.contains(&next) => {
                            flush(&mut word, &mut tokens);
                            tokens.push(Token::SingleQuote(next.to_string()));
                            self.pos += 1;
                        }
                        Some(next) => {
                            word.push(next);
                            self.pos += 1;
                        }
                        None => self.pull("", Pending::Escape)?,
                    }
                }
                '\'' => {
                    flush(&mut word, &mut tokens);
                    let token = self.single_quote()?;
                    tokens.push(token);
                }
                '"' => {
                    flush(&mut word, &mut tokens);
                    let token = self.double_quote()?;
                    tokens.push(token);
                }
                '(' => {
                    flush(&mut word, &mut tokens);
                    let token = self.subshell()?;
                    tokens.push(token);
                }
                ')' => return Err(ShellError::UnexpectedToken(")".into())),
                '$' => match self.dollar()? {
                    Some(token) => {
                        flush(&mut word, &mut tokens);
                        tokens.push(token);
                    }
                    None => {
                        word.push('$');
                        self.pos += 1;
                    }
                },
                '!' if self.pos >= self.literal_until => {
                    if !self.history_event()? {
                        word.push('!');
                        self.pos += 1;
                    }
                }
                _ => match Operator::lookup(c, self.peek_at(1)) {
                    Some((op, len)) => {
                        flush(&mut word, &mut tokens);
                        tokens.push(Token::Operator(op));
                        self.pos += len;
                    }
                    None => {
                        word.push(c);
                        self.pos += 1;
                    }
                },
            }
        }
        flush(&mut word, &mut tokens);

        log::debug!("lexed {} token(s) from {:?}", tokens.len(), self.text());
        Ok(tokens)
    }

    /// Pull one more line from the input source, append it after a newline
    /// and scan it. `Ok(None)` when the source is exhausted.
    pub fn extend(&mut self) -> Result<Option<Vec<Token>>, ShellError> {
        let Some(line) = self.input.next_line() else {
            return Ok(None);
        };
        self.continuations += 1;
        self.buf.push('\n');
        self.buf.extend(line.trim_end_matches('\n').chars());
        self.tokenize().map(Some)
    }

    fn peek(&self) -> Option<char> {
        self.buf.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.buf.get(self.pos + offset).copied()
    }

    /// Append a continuation line, or fail naming the open construct.
    fn pull(&mut self, joiner: &str, pending: Pending) -> Result<(), ShellError> {
        let Some(line) = self.input.next_line() else {
            return Err(ShellError::Incomplete(pending));
        };
        self.continuations += 1;
        self.buf.extend(joiner.chars());
        self.buf.extend(line.trim_end_matches('\n').chars());
        Ok(())
    }

    /// Everything up to the next `'` is literal.
    fn single_quote(&mut self) -> Result<Token, ShellError> {
        self.pos += 1;
        let mut text = String::new();
        loop {
            match self.peek() {
                Some('\'') => {
                    self.pos += 1;
                    return Ok(Token::SingleQuote(text));
                }
                Some(c) => {
                    text.push(c);
                    self.pos += 1;
                }
                None => self.pull("\n", Pending::SingleQuote)?,
            }
        }
    }

    /// Inside `"..."` only `$` and `!` stay special. A backslash escapes
    /// `$`, `` ` ``, `"`, `\` and newline; before anything else it is kept.
    fn double_quote(&mut self) -> Result<Token, ShellError> {
        self.pos += 1;
        let mut children = Vec::new();
        let mut word = String::new();
        loop {
            let Some(c) = self.peek() else {
                self.pull("\n", Pending::DoubleQuote)?;
                continue;
            };
            match c {
                '"' => {
                    self.pos += 1;
                    flush(&mut word, &mut children);
                    return Ok(Token::DoubleQuote(children));
                }
                '\\' => {
                    self.pos += 1;
                    match self.peek() {
                        Some('\n') => self.pos += 1,
                        Some(next @ ('$' | '`' | '"' | '\\')) => {
                            word.push(next);
                            self.pos += 1;
                        }
                        Some(next) => {
                            word.push('\\');
                            word.push(next);
                            self.pos += 1;
                        }
                        None => self.pull("", Pending::Escape)?,
                    }
                }
                '$' => match self.dollar()? {
                    Some(token) => {
                        flush(&mut word, &mut children);
                        children.push(token);
                    }
                    None => {
                        word.push('$');
                        self.pos += 1;
                    }
                },
                '!' if self.pos >= self.literal_until => {
                    if !self.history_event()? {
                        word.push('!');
                        self.pos += 1;
                    }
                }
                ' ' | '\t' | '\n' => {
                    flush(&mut word, &mut children);
                    children.push(Token::Separator(c));
                    self.pos += 1;
                }
                _ => {
                    word.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    /// Dispatch on the character after `$`. `None` means the `$` is literal.
    fn dollar(&mut self) -> Result<Option<Token>, ShellError> {
        match self.peek_at(1) {
            Some('{') => self.param_expansion().map(Some),
            Some(c) if c.is_ascii_alphabetic() || c == '_' => Ok(Some(self.variable())),
            _ => Ok(None),
        }
    }

    fn variable(&mut self) -> Token {
        self.pos += 1;
        let mut name = String::new();
        while let Some(c) = self.peek().filter(|c| is_name_char(*c)) {
            name.push(c);
            self.pos += 1;
        }
        Token::Variable(name)
    }

    /// `${name<op>value}`. Malformed pieces are kept as they are; the
    /// expansion engine reports them as bad substitutions.
    fn param_expansion(&mut self) -> Result<Token, ShellError> {
        self.pos += 2;

        let mut name = String::new();
        let first = loop {
            match self.peek() {
                Some(c) if is_name_char(c) => {
                    name.push(c);
                    self.pos += 1;
                }
                Some(c) => break c,
                None => self.pull("\n", Pending::ParamExpansion)?,
            }
        };

        if ParamOp::may_extend(first) && self.peek_at(1).is_none() {
            self.pull("\n", Pending::ParamExpansion)?;
        }
        let op = ParamOp::lookup(first, self.peek_at(1)).map(|(op, len)| {
            self.pos += len;
            op
        });

        let value = if op.is_none() && self.peek() == Some('}') {
            self.pos += 1;
            None
        } else {
            Some(ParamValue(self.param_value()?))
        };

        Ok(Token::ParamExpand(ParamExpansion { name, op, value }))
    }

    /// Operand of a parameter expansion, up to and including the closing `}`.
    fn param_value(&mut self) -> Result<Vec<Token>, ShellError> {
        let mut tokens = Vec::new();
        let mut word = String::new();
        loop {
            let Some(c) = self.peek() else {
                self.pull("\n", Pending::ParamExpansion)?;
                continue;
            };
            match c {
                '}' => {
                    self.pos += 1;
                    flush(&mut word, &mut tokens);
                    return Ok(tokens);
                }
                '\\' => {
                    self.pos += 1;
                    match self.peek() {
                        Some('\n') => self.pos += 1,
                        Some(next) => {
                            // escaped operand characters match literally
                            flush(&mut word, &mut tokens);
                            tokens.push(Token::SingleQuote(next.to_string()));
                            self.pos += 1;
                        }
                        None => self.pull("", Pending::Escape)?,
                    }
                }
                '\'' => {
                    flush(&mut word, &mut tokens);
                    let token = self.single_quote()?;
                    tokens.push(token);
                }
                '"' => {
                    flush(&mut word, &mut tokens);
                    let token = self.double_quote()?;
                    tokens.push(token);
                }
                '$' => match self.dollar()? {
                    Some(token) => {
                        flush(&mut word, &mut tokens);
                        tokens.push(token);
                    }
                    None => {
                        word.push('$');
                        self.pos += 1;
                    }
                },
                ' ' | '\t' | '\n' => {
                    flush(&mut word, &mut tokens);
                    tokens.push(Token::Separator(c));
                    self.pos += 1;
                }
                _ => {
                    word.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    /// Raw text up to the `)` matching the `(` at the cursor. Quotes,
    /// escapes and `${...}` are tracked only so their parentheses do not
    /// count.
    fn subshell(&mut self) -> Result<Token, ShellError> {
        self.pos += 1;
        let mut raw = String::new();
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        // quote state at each open `${`; its `}` closes only in that state
        let mut braces: Vec<Option<char>> = Vec::new();
        let mut escaped = false;
        loop {
            let Some(c) = self.peek() else {
                self.pull("\n", Pending::Subshell)?;
                continue;
            };
            self.pos += 1;
            if escaped {
                escaped = false;
                raw.push(c);
                continue;
            }
            match (quote, c) {
                (Some('\''), '\'') => quote = None,
                (Some('\''), _) => {}
                (_, '$') if self.peek() == Some('{') => {
                    raw.push_str("${");
                    self.pos += 1;
                    braces.push(quote);
                    continue;
                }
                (_, '}') if braces.last() == Some(&quote) => {
                    braces.pop();
                }
                (Some(_), '"') => quote = None,
                (_, '\\') => escaped = true,
                (None, '\'' | '"') => quote = Some(c),
                (None, '(' | ')') if !braces.is_empty() => {}
                (None, '(') => depth += 1,
                (None, ')') if depth == 0 => return Ok(Token::Subshell(raw)),
                (None, ')') => depth -= 1,
                _ => {}
            }
            raw.push(c);
        }
    }

    /// Expand the `!` event at the cursor in place. Returns false when the
    /// `!` is not followed by a designator and should stay literal.
    fn history_event(&mut self) -> Result<bool, ShellError> {
        let start = self.pos;
        let Some(next) = self.peek_at(1) else {
            return Ok(false);
        };

        let relative = next == '-' && self.peek_at(2).is_some_and(|c| c.is_ascii_digit());
        let (end, found) = if next == '!' {
            (start + 2, self.event_from_end(1))
        } else if next.is_ascii_digit() || relative {
            let digits_from = if relative { start + 2 } else { start + 1 };
            let mut end = digits_from;
            while self.buf.get(end).is_some_and(char::is_ascii_digit) {
                end += 1;
            }
            let n: usize = self.buf[digits_from..end]
                .iter()
                .collect::<String>()
                .parse()
                .unwrap_or(usize::MAX);
            let found = if relative {
                self.event_from_end(n)
            } else {
                self.event_from_start(n)
            };
            (end, found)
        } else if is_event_char(next) {
            let mut end = start + 1;
            while self.buf.get(end).copied().is_some_and(is_event_char) {
                end += 1;
            }
            let prefix: String = self.buf[start + 1..end].iter().collect();
            (end, self.event_by_prefix(&prefix))
        } else {
            return Ok(false);
        };

        let designator: String = self.buf[start..end].iter().collect();
        let Some(entry) = found else {
            return Err(ShellError::EventNotFound(designator));
        };
        log::debug!("history event {designator} -> {entry:?}");

        let replacement: Vec<char> = entry.chars().collect();
        let len = replacement.len();
        self.buf.splice(start..end, replacement);
        self.literal_until = start + len;
        self.history_expanded = true;
        Ok(true)
    }

    fn window(&self) -> &[String] {
        let entries = self.history.entries();
        &entries[entries.len().saturating_sub(self.event_window)..]
    }

    /// `!-N`; `!!` is `!-1`.
    fn event_from_end(&self, n: usize) -> Option<String> {
        let window = self.window();
        if n == 0 || n > window.len() {
            return None;
        }
        Some(window[window.len() - n].clone())
    }

    /// `!N`, 1-based within the window.
    fn event_from_start(&self, n: usize) -> Option<String> {
        let window = self.window();
        if n == 0 || n > window.len() {
            return None;
        }
        Some(window[n - 1].clone())
    }

    /// `!prefix`: newest entry starting with `prefix`.
    fn event_by_prefix(&self, prefix: &str) -> Option<String> {
        self.history
            .entries()
            .iter()
            .rev()
            .find(|entry| entry.starts_with(prefix))
            .cloned()
    }
}

/// Tokenize one line, pulling continuation lines from `input` as needed.
pub fn tokenize(
    line: &str,
    input: &mut dyn InputSource,
    history: &dyn HistoryLog,
) -> Result<Vec<Token>, ShellError> {
    Lexer::new(line, input, history).tokenize()
}

fn flush(word: &mut String, tokens: &mut Vec<Token>) {
    if !word.is_empty() {
        tokens.push(Token::Word(std::mem::take(word)));
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Characters that may form a `!prefix` designator.
fn is_event_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, ';' | '|' | '&' | '<' | '>' | '(' | ')' | '"' | '\'' | '=')
}
