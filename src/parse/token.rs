//! Token model produced by the lexer and consumed by the splitter and the
//! expansion engine.

use std::fmt;

use serde::Serialize;

/// Shell operator recognised at the top level of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    /// `|`
    Pipe,
    /// `||`
    Or,
    /// `&`
    Background,
    /// `&&`
    And,
    /// `<`
    Less,
    /// `<<`
    DoubleLess,
    /// `>`
    Great,
    /// `>>`
    DoubleGreat,
    /// `;`
    Semi,
}

impl Operator {
    /// The operator's shell syntax.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Pipe => "|",
            Operator::Or => "||",
            Operator::Background => "&",
            Operator::And => "&&",
            Operator::Less => "<",
            Operator::DoubleLess => "<<",
            Operator::Great => ">",
            Operator::DoubleGreat => ">>",
            Operator::Semi => ";",
        }
    }

    /// Longest-match lookup: `first` alone or combined with `second`.
    /// Returns the operator and how many characters it consumed.
    pub fn lookup(first: char, second: Option<char>) -> Option<(Operator, usize)> {
        let pair = match (first, second) {
            ('|', Some('|')) => Some(Operator::Or),
            ('&', Some('&')) => Some(Operator::And),
            ('<', Some('<')) => Some(Operator::DoubleLess),
            ('>', Some('>')) => Some(Operator::DoubleGreat),
            _ => None,
        };
        if let Some(op) = pair {
            return Some((op, 2));
        }
        let single = match first {
            '|' => Operator::Pipe,
            '&' => Operator::Background,
            '<' => Operator::Less,
            '>' => Operator::Great,
            ';' => Operator::Semi,
            _ => return None,
        };
        Some((single, 1))
    }

    /// `<` and `<<` bind stdin, `>` and `>>` bind stdout.
    pub fn is_redirection(&self) -> bool {
        matches!(
            self,
            Operator::Less | Operator::DoubleLess | Operator::Great | Operator::DoubleGreat
        )
    }

    pub fn is_stdin_redirection(&self) -> bool {
        matches!(self, Operator::Less | Operator::DoubleLess)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator inside `${name<op>value}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParamOp {
    /// `#` shortest prefix removal
    RemovePrefix,
    /// `##` longest prefix removal
    RemoveLongestPrefix,
    /// `%` shortest suffix removal
    RemoveSuffix,
    /// `%%` longest suffix removal
    RemoveLongestSuffix,
    /// `:` substring
    Substring,
    /// `-` / `:-`
    Default { colon: bool },
    /// `=` / `:=`
    Assign { colon: bool },
    /// `?` / `:?`
    Error { colon: bool },
    /// `+` / `:+`
    Alternative { colon: bool },
}

impl ParamOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamOp::RemovePrefix => "#",
            ParamOp::RemoveLongestPrefix => "##",
            ParamOp::RemoveSuffix => "%",
            ParamOp::RemoveLongestSuffix => "%%",
            ParamOp::Substring => ":",
            ParamOp::Default { colon: true } => ":-",
            ParamOp::Default { colon: false } => "-",
            ParamOp::Assign { colon: true } => ":=",
            ParamOp::Assign { colon: false } => "=",
            ParamOp::Error { colon: true } => ":?",
            ParamOp::Error { colon: false } => "?",
            ParamOp::Alternative { colon: true } => ":+",
            ParamOp::Alternative { colon: false } => "+",
        }
    }

    /// Longest-match lookup over the closed operator set.
    /// Returns the operator and how many characters it consumed.
    pub fn lookup(first: char, second: Option<char>) -> Option<(ParamOp, usize)> {
        let pair = match (first, second) {
            (':', Some('-')) => Some(ParamOp::Default { colon: true }),
            (':', Some('=')) => Some(ParamOp::Assign { colon: true }),
            (':', Some('?')) => Some(ParamOp::Error { colon: true }),
            (':', Some('+')) => Some(ParamOp::Alternative { colon: true }),
            ('#', Some('#')) => Some(ParamOp::RemoveLongestPrefix),
            ('%', Some('%')) => Some(ParamOp::RemoveLongestSuffix),
            _ => None,
        };
        if let Some(op) = pair {
            return Some((op, 2));
        }
        let single = match first {
            ':' => ParamOp::Substring,
            '-' => ParamOp::Default { colon: false },
            '=' => ParamOp::Assign { colon: false },
            '?' => ParamOp::Error { colon: false },
            '+' => ParamOp::Alternative { colon: false },
            '#' => ParamOp::RemovePrefix,
            '%' => ParamOp::RemoveSuffix,
            _ => return None,
        };
        Some((single, 1))
    }

    /// Characters that may start an operator (and so need a second
    /// character of lookahead).
    pub fn may_extend(first: char) -> bool {
        matches!(first, ':' | '#' | '%')
    }
}

impl fmt::Display for ParamOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The parts of `${name<op>value}`. Every part may be missing in malformed
/// input; the expansion engine decides whether that is a bad substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamExpansion {
    /// The variable child. Empty for `${}` or `${:-x}`.
    pub name: String,
    /// The operator child.
    pub op: Option<ParamOp>,
    /// The value / pattern operand.
    pub value: Option<ParamValue>,
}

/// Operand of a parameter expansion; may hold quotes, variables and
/// nested expansions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamValue(pub Vec<Token>);

/// A lexical unit. Tokens are never mutated after the lexer builds them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "content")]
pub enum Token {
    /// Unquoted literal run.
    Word(String),
    Operator(Operator),
    /// One whitespace character, kept so argument assembly can tell
    /// `a"b"` from `a "b"`.
    Separator(char),
    /// Payload between `'...'`; never expanded.
    SingleQuote(String),
    /// Children are only `Word`, `Separator`, `Variable` and `ParamExpand`.
    DoubleQuote(Vec<Token>),
    /// `$name`
    Variable(String),
    /// `${...}`
    ParamExpand(ParamExpansion),
    /// Raw text between `(` and `)`.
    Subshell(String),
}

impl Token {
    pub fn word(text: impl Into<String>) -> Self {
        Token::Word(text.into())
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, Token::Separator(_))
    }

    pub fn is_operator(&self, op: Operator) -> bool {
        matches!(self, Token::Operator(o) if *o == op)
    }

    /// The token as it would be written in the source line.
    pub fn original_string(&self) -> String {
        self.to_string()
    }
}

fn write_all(f: &mut fmt::Formatter<'_>, tokens: &[Token]) -> fmt::Result {
    for token in tokens {
        write!(f, "{token}")?;
    }
    Ok(())
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(text) => f.write_str(text),
            Token::Operator(op) => f.write_str(op.as_str()),
            Token::Separator(c) => write!(f, "{c}"),
            Token::SingleQuote(text) => write!(f, "'{text}'"),
            Token::DoubleQuote(children) => {
                f.write_str("\"")?;
                write_all(f, children)?;
                f.write_str("\"")
            }
            Token::Variable(name) => write!(f, "${name}"),
            Token::ParamExpand(param) => write!(f, "{param}"),
            Token::Subshell(raw) => write!(f, "({raw})"),
        }
    }
}

impl fmt::Display for ParamExpansion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{}", self.name)?;
        if let Some(op) = &self.op {
            write!(f, "{op}")?;
        }
        if let Some(ParamValue(tokens)) = &self.value {
            write_all(f, tokens)?;
        }
        f.write_str("}")
    }
}
