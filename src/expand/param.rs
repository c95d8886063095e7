//! `${name<op>value}` evaluation.

use glob::{MatchOptions, Pattern};

use crate::error::ShellError;
use crate::parse::{ParamExpansion, ParamOp, ParamValue, Token};

use super::Expander;

/// `*` may match `/` here: the operand is matched against a string, not
/// a path.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

impl Expander<'_> {
    /// `in_quotes` is set inside `"..."`, where the operand is not globbed.
    pub(super) fn expand_param(
        &mut self,
        param: &ParamExpansion,
        in_quotes: bool,
    ) -> Result<String, ShellError> {
        if param.name.is_empty() {
            return Err(bad_substitution(param));
        }
        let current = self.vars.get(&param.name);

        let Some(op) = param.op else {
            if param.value.is_some() {
                return Err(bad_substitution(param));
            }
            return Ok(current.unwrap_or_default());
        };

        match op {
            ParamOp::Default { colon } => match passing(current, colon) {
                Some(value) => Ok(value),
                None => self.operand(param, in_quotes),
            },
            ParamOp::Assign { colon } => match passing(current, colon) {
                Some(value) => Ok(value),
                None => {
                    let value = self.operand(param, in_quotes)?;
                    log::debug!("assign {}={value:?}", param.name);
                    self.vars.set(&param.name, value.clone());
                    Ok(value)
                }
            },
            ParamOp::Alternative { colon } => match passing(current, colon) {
                Some(_) => self.operand(param, in_quotes),
                None => Ok(String::new()),
            },
            ParamOp::Error { colon } => match passing(current, colon) {
                Some(value) => Ok(value),
                None => {
                    let message = self.operand(param, in_quotes)?;
                    let err = ShellError::parameter_not_set(&param.name, message.trim());
                    log::warn!("{err}");
                    Err(err)
                }
            },
            ParamOp::RemovePrefix
            | ParamOp::RemoveLongestPrefix
            | ParamOp::RemoveSuffix
            | ParamOp::RemoveLongestSuffix => {
                let Some(value) = current else {
                    return Ok(String::new());
                };
                let pattern = self.pattern(param, in_quotes)?;
                Ok(match op {
                    ParamOp::RemovePrefix => remove_prefix(&value, &pattern, false),
                    ParamOp::RemoveLongestPrefix => remove_prefix(&value, &pattern, true),
                    ParamOp::RemoveSuffix => remove_suffix(&value, &pattern, false),
                    _ => remove_suffix(&value, &pattern, true),
                })
            }
            ParamOp::Substring => {
                let range = self.operand(param, true)?;
                substring(&current.unwrap_or_default(), &range).ok_or_else(|| bad_substitution(param))
            }
        }
    }

    /// The operand as text. Unquoted words are globbed, several matches
    /// joined with spaces.
    fn operand(&mut self, param: &ParamExpansion, in_quotes: bool) -> Result<String, ShellError> {
        let mut out = String::new();
        for token in operand_tokens(param) {
            match token {
                Token::Word(text) if !in_quotes => out.push_str(&self.word(text, false).join(" ")),
                _ => out.push_str(&self.token(token, in_quotes)?),
            }
        }
        Ok(out)
    }

    /// The operand as a glob pattern; quoted parts match literally.
    fn pattern(&mut self, param: &ParamExpansion, in_quotes: bool) -> Result<String, ShellError> {
        let mut out = String::new();
        for token in operand_tokens(param) {
            let text = self.token(token, in_quotes)?;
            match token {
                Token::SingleQuote(_) | Token::DoubleQuote(_) => out.push_str(&Pattern::escape(&text)),
                _ => out.push_str(&text),
            }
        }
        Ok(out)
    }
}

fn operand_tokens(param: &ParamExpansion) -> &[Token] {
    match &param.value {
        Some(ParamValue(tokens)) => tokens,
        None => &[],
    }
}

fn bad_substitution(param: &ParamExpansion) -> ShellError {
    ShellError::BadSubstitution(param.to_string())
}

/// The value if it passes the set test: set at all, and non-empty when
/// the operator carries a `:`.
fn passing(value: Option<String>, colon: bool) -> Option<String> {
    value.filter(|value| !colon || !value.is_empty())
}

fn matcher(pattern: &str) -> impl Fn(&str) -> bool + '_ {
    let compiled = Pattern::new(pattern).ok();
    move |candidate: &str| match &compiled {
        Some(compiled) => compiled.matches_with(candidate, MATCH_OPTIONS),
        // unparseable patterns (e.g. a lone `[`) match only themselves
        None => candidate == pattern,
    }
}

/// Strip the shortest (or longest) non-empty prefix matching `pattern`.
pub fn remove_prefix(value: &str, pattern: &str, longest: bool) -> String {
    let is_match = matcher(pattern);
    let ends: Vec<usize> = value.char_indices().map(|(i, c)| i + c.len_utf8()).collect();
    let cut = if longest {
        ends.iter().rev().find(|&&end| is_match(&value[..end]))
    } else {
        ends.iter().find(|&&end| is_match(&value[..end]))
    };
    match cut {
        Some(&end) => value[end..].to_string(),
        None => value.to_string(),
    }
}

/// Strip the shortest (or longest) non-empty suffix matching `pattern`.
pub fn remove_suffix(value: &str, pattern: &str, longest: bool) -> String {
    let is_match = matcher(pattern);
    let starts: Vec<usize> = value.char_indices().map(|(i, _)| i).collect();
    let cut = if longest {
        starts.iter().find(|&&start| is_match(&value[start..]))
    } else {
        starts.iter().rev().find(|&&start| is_match(&value[start..]))
    };
    match cut {
        Some(&start) => value[..start].to_string(),
        None => value.to_string(),
    }
}

/// `offset[:length]` over characters. A negative offset counts from the
/// end, a negative length stops that many characters before the end.
/// `None` when either number does not parse.
pub fn substring(value: &str, range: &str) -> Option<String> {
    let (offset, length) = match range.split_once(':') {
        Some((offset, length)) => (offset, Some(length)),
        None => (range, None),
    };
    let chars: Vec<char> = value.chars().collect();
    let n = chars.len() as i64;

    let offset: i64 = offset.trim().parse().ok()?;
    let start = if offset < 0 {
        n.saturating_add(offset).max(0)
    } else {
        offset.min(n)
    };
    let end = match length {
        None => n,
        Some(length) => {
            let length: i64 = length.trim().parse().ok()?;
            if length < 0 {
                n.saturating_add(length).max(start)
            } else {
                start.saturating_add(length).min(n)
            }
        }
    };
    Some(chars[start as usize..end as usize].iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::Expander;
    use crate::input::NoInput;
    use crate::parse::{DEFAULT_EVENT_WINDOW, parse};
    use crate::vars::{ShellVars, Variables};

    fn eval(line: &str, vars: &mut ShellVars) -> Result<String, ShellError> {
        let history: Vec<String> = Vec::new();
        let parsed = parse(line, &mut NoInput, &history, DEFAULT_EVENT_WINDOW).unwrap();
        let tree = parsed.commands.into_iter().next().unwrap();
        let command = tree.leaves()[0].clone();
        let mut expander = Expander::new(vars);
        let mut out = String::new();
        for token in &command.tokens {
            out.push_str(&expander.expand_token(token)?);
        }
        Ok(out)
    }

    fn vars() -> ShellVars {
        ShellVars::new()
            .with("y", "val")
            .with("e", "")
            .with("p", "/usr/local/bin")
            .with("f", "file.tar.gz")
    }

    #[test]
    fn plain_braces() {
        assert_eq!(eval("${y}", &mut vars()).unwrap(), "val");
        assert_eq!(eval("${x}", &mut vars()).unwrap(), "");
    }

    #[test]
    fn use_default() {
        let mut v = vars();
        assert_eq!(eval("${x:-def}", &mut v).unwrap(), "def");
        assert_eq!(v.get("x"), None);
        assert_eq!(eval("${y:-def}", &mut v).unwrap(), "val");
        assert_eq!(eval("${e:-def}", &mut v).unwrap(), "def");
        assert_eq!(eval("${e-def}", &mut v).unwrap(), "");
        assert_eq!(eval("${x-def}", &mut v).unwrap(), "def");
    }

    #[test]
    fn assign_default() {
        let mut v = vars();
        assert_eq!(eval("${x:=def}", &mut v).unwrap(), "def");
        assert_eq!(v.get("x").as_deref(), Some("def"));
        assert_eq!(eval("${y:=def}", &mut v).unwrap(), "val");
        assert_eq!(eval("${e=def}", &mut v).unwrap(), "");
        assert_eq!(eval("${e:=def}", &mut v).unwrap(), "def");
        assert_eq!(v.get("e").as_deref(), Some("def"));
    }

    #[test]
    fn use_alternative() {
        let mut v = vars();
        assert_eq!(eval("${y:+alt}", &mut v).unwrap(), "alt");
        assert_eq!(eval("${x:+alt}", &mut v).unwrap(), "");
        assert_eq!(eval("${e:+alt}", &mut v).unwrap(), "");
        assert_eq!(eval("${e+alt}", &mut v).unwrap(), "alt");
    }

    #[test]
    fn error_if_unset() {
        let mut v = vars();
        assert_eq!(eval("${y:?msg}", &mut v).unwrap(), "val");
        assert_eq!(
            eval("${x:?msg}", &mut v).unwrap_err(),
            ShellError::ParameterNotSet {
                name: "x".into(),
                message: "msg".into()
            }
        );
        assert_eq!(
            eval("${e:?}", &mut v).unwrap_err().to_string(),
            "e: parameter null or not set"
        );
        assert_eq!(eval("${e?}", &mut v).unwrap(), "");
    }

    #[test]
    fn operand_only_evaluated_when_used() {
        let mut v = vars();
        assert_eq!(eval("${y:-${z:=side}}", &mut v).unwrap(), "val");
        assert_eq!(v.get("z"), None);
    }

    #[test]
    fn operand_expands_variables_and_quotes() {
        let mut v = vars();
        assert_eq!(eval("${x:-\"$y and $f\"}", &mut v).unwrap(), "val and file.tar.gz");
        assert_eq!(eval("${x:-'$y'}", &mut v).unwrap(), "$y");
    }

    #[test]
    fn prefix_removal() {
        let mut v = vars();
        assert_eq!(eval("${p#*/}", &mut v).unwrap(), "usr/local/bin");
        assert_eq!(eval("${p##*/}", &mut v).unwrap(), "bin");
        assert_eq!(eval("${p#nomatch}", &mut v).unwrap(), "/usr/local/bin");
    }

    #[test]
    fn suffix_removal() {
        let mut v = vars();
        assert_eq!(eval("${f%.*}", &mut v).unwrap(), "file.tar");
        assert_eq!(eval("${f%%.*}", &mut v).unwrap(), "file");
        assert_eq!(eval("${f%.zip}", &mut v).unwrap(), "file.tar.gz");
    }

    #[test]
    fn removal_of_unset_is_empty() {
        assert_eq!(eval("${x#a}", &mut vars()).unwrap(), "");
    }

    #[test]
    fn quoted_pattern_is_literal() {
        let mut v = ShellVars::new().with("s", "a*b*c");
        assert_eq!(eval("${s#'a*'}", &mut v).unwrap(), "b*c");
        assert_eq!(eval("${s#a*}", &mut v).unwrap(), "*b*c");
        assert_eq!(eval(r"${s%\*c}", &mut v).unwrap(), "a*b");
    }

    #[test]
    fn substring_forms() {
        let mut v = ShellVars::new().with("s", "abcdef");
        assert_eq!(eval("${s:2}", &mut v).unwrap(), "cdef");
        assert_eq!(eval("${s:1:3}", &mut v).unwrap(), "bcd");
        assert_eq!(eval("${s: -2}", &mut v).unwrap(), "ef");
        assert_eq!(eval("${s:1:-1}", &mut v).unwrap(), "bcde");
        assert_eq!(eval("${s:10}", &mut v).unwrap(), "");
    }

    #[test]
    fn substring_huge_numbers_clamp() {
        assert_eq!(substring("abcdef", "1:9223372036854775807").as_deref(), Some("bcdef"));
        assert_eq!(substring("abcdef", "-9223372036854775808").as_deref(), Some("abcdef"));
        assert_eq!(substring("abcdef", "2:-9223372036854775808").as_deref(), Some(""));
        let mut v = ShellVars::new().with("s", "abcdef");
        assert_eq!(eval("${s:1:9223372036854775807}", &mut v).unwrap(), "bcdef");
    }

    #[test]
    fn unquoted_operand_is_globbed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();
        std::fs::write(dir.path().join("b.txt"), "").unwrap();
        let base = dir.path().display().to_string();
        let mut v = ShellVars::new();

        assert_eq!(
            eval(&format!("${{x:-{base}/*.txt}}"), &mut v).unwrap(),
            format!("{base}/a.txt {base}/b.txt")
        );
        assert_eq!(
            eval(&format!("\"${{x:-{base}/*.txt}}\""), &mut v).unwrap(),
            format!("{base}/*.txt")
        );
        assert_eq!(
            eval(&format!("${{x:-'{base}/*.txt'}}"), &mut v).unwrap(),
            format!("{base}/*.txt")
        );
    }

    #[test]
    fn substring_non_numeric_is_bad_substitution() {
        let err = eval("${s:abc}", &mut ShellVars::new()).unwrap_err();
        assert_eq!(err, ShellError::BadSubstitution("${s:abc}".into()));
    }

    #[test]
    fn empty_braces_are_bad_substitution() {
        let err = eval("${}", &mut vars()).unwrap_err();
        assert_eq!(err, ShellError::BadSubstitution("${}".into()));
        assert_eq!(err.to_string(), "${}: bad substitution");
    }

    #[test]
    fn missing_name_is_bad_substitution() {
        let err = eval("${:-x}", &mut vars()).unwrap_err();
        assert_eq!(err, ShellError::BadSubstitution("${:-x}".into()));
    }

    #[test]
    fn value_without_operator_is_bad_substitution() {
        let err = eval("${y!}", &mut vars()).unwrap_err();
        assert_eq!(err, ShellError::BadSubstitution("${y!}".into()));
    }

    #[test]
    fn helpers_on_plain_strings() {
        assert_eq!(remove_prefix("aaa", "a*", false), "aa");
        assert_eq!(remove_prefix("aaa", "a*", true), "");
        assert_eq!(remove_suffix("x.y.z", ".*", false), "x.y");
        assert_eq!(remove_suffix("héllo", "l*", true), "hé");
        assert_eq!(substring("héllo", "1:2").as_deref(), Some("él"));
        assert_eq!(substring("abc", "x"), None);
    }
}
