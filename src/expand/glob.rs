//! Pathname expansion for unquoted words.
//!
//! Words made only of `[A-Za-z0-9_.,~/]` are never matched against the
//! filesystem. Everything else is split on `/`; the segments `.*` and
//! `..*` are widened to the dot entries a plain pattern would miss, every
//! combination is globbed, and the sorted union of matches is returned.
//! No match at all leaves the word as it was.

use glob::MatchOptions;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

fn is_plain(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ',' | '~' | '/')
}

/// True when `word` contains a character that may carry pattern meaning.
pub fn needs_glob(word: &str) -> bool {
    !word.chars().all(is_plain)
}

fn dot_variants(segment: &str) -> Vec<&str> {
    match segment {
        ".*" => vec![".", "..", ".*"],
        "..*" => vec!["..", "..*"],
        other => vec![other],
    }
}

/// Every pattern to try for `word`, in sorted order.
pub fn candidates(word: &str) -> Vec<String> {
    let mut paths: Vec<Vec<&str>> = vec![Vec::new()];
    for segment in word.split('/') {
        let variants = dot_variants(segment);
        paths = paths
            .into_iter()
            .flat_map(|path| {
                variants.iter().map(move |variant| {
                    let mut next = path.clone();
                    next.push(*variant);
                    next
                })
            })
            .collect();
    }
    let mut out: Vec<String> = paths.iter().map(|path| path.join("/")).collect();
    out.sort();
    out
}

/// Expand `word` against the filesystem.
pub fn expand(word: &str) -> Vec<String> {
    if !needs_glob(word) {
        return vec![word.to_string()];
    }

    let mut matches = Vec::new();
    for candidate in candidates(word) {
        match glob::glob_with(&candidate, MATCH_OPTIONS) {
            Ok(paths) => matches.extend(
                paths
                    .filter_map(Result::ok)
                    .map(|path| path.to_string_lossy().into_owned()),
            ),
            Err(e) => log::debug!("glob: skipping {candidate:?}: {e}"),
        }
    }

    if matches.is_empty() {
        return vec![word.to_string()];
    }
    matches.sort();
    matches.dedup();
    log::debug!("glob: {word:?} -> {} match(es)", matches.len());
    matches
}
