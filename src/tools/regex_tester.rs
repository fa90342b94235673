//! Regular expression tester
//!
//! Flags follow the familiar single-letter set: `i` case-insensitive,
//! `m` multi-line anchors, `s` dot matches newline, `x` verbose mode and
//! `g` global. Without `g` only the first match is reported or replaced.

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::collections::BTreeMap;

use super::{ToolError, ToolResult};

/// Upper bound on reported matches
pub const MAX_MATCHES: usize = 1000;

/// Parsed flag set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    pub case_insensitive: bool,
    pub multi_line: bool,
    pub dot_all: bool,
    pub verbose: bool,
    pub global: bool,
}

impl Flags {
    pub fn parse(flags: &str) -> ToolResult<Self> {
        let mut parsed = Self::default();
        for flag in flags.chars() {
            match flag {
                'i' => parsed.case_insensitive = true,
                'm' => parsed.multi_line = true,
                's' => parsed.dot_all = true,
                'x' => parsed.verbose = true,
                'g' => parsed.global = true,
                c if c.is_whitespace() || c == ',' => {}
                other => {
                    return Err(ToolError::invalid_input(format!("Unknown regex flag '{}'", other)))
                }
            }
        }
        Ok(parsed)
    }
}

/// One match; offsets count characters, not bytes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegexMatch {
    pub start: usize,
    pub end: usize,
    pub text: String,
    /// Numbered capture groups, excluding group 0
    pub groups: Vec<Option<String>>,
    pub named: BTreeMap<String, Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegexReport {
    pub matches: Vec<RegexMatch>,
    /// Set when the match list stopped at [`MAX_MATCHES`]
    pub truncated: bool,
}

fn compile(pattern: &str, flags: &Flags) -> ToolResult<Regex> {
    Ok(RegexBuilder::new(pattern)
        .case_insensitive(flags.case_insensitive)
        .multi_line(flags.multi_line)
        .dot_matches_new_line(flags.dot_all)
        .ignore_whitespace(flags.verbose)
        .build()?)
}

/// Run `pattern` against `text` and report the matches
pub fn test(pattern: &str, flags: &str, text: &str) -> ToolResult<RegexReport> {
    let flags = Flags::parse(flags)?;
    let re = compile(pattern, &flags)?;
    let limit = if flags.global { MAX_MATCHES } else { 1 };
    let names: Vec<(usize, String)> = re
        .capture_names()
        .enumerate()
        .filter_map(|(i, name)| name.map(|n| (i, n.to_string())))
        .collect();

    let mut matches = Vec::new();
    let mut truncated = false;
    // Running byte -> char offset conversion; matches arrive in order
    let (mut byte_pos, mut char_pos) = (0usize, 0usize);

    for caps in re.captures_iter(text) {
        if matches.len() == limit {
            truncated = flags.global;
            break;
        }
        let Some(whole) = caps.get(0) else { continue };

        char_pos += text[byte_pos..whole.start()].chars().count();
        byte_pos = whole.start();
        let start = char_pos;
        let end = start + whole.as_str().chars().count();

        let groups = (1..caps.len())
            .map(|i| caps.get(i).map(|m| m.as_str().to_string()))
            .collect();
        let named = names
            .iter()
            .map(|(i, name)| (name.clone(), caps.get(*i).map(|m| m.as_str().to_string())))
            .collect();

        matches.push(RegexMatch {
            start,
            end,
            text: whole.as_str().to_string(),
            groups,
            named,
        });
    }

    Ok(RegexReport { matches, truncated })
}

/// Replace the first match, or every match with `g`.
///
/// `replacement` may reference groups as `$1` or `${name}`.
pub fn replace(pattern: &str, flags: &str, text: &str, replacement: &str) -> ToolResult<String> {
    let flags = Flags::parse(flags)?;
    let re = compile(pattern, &flags)?;
    let limit = if flags.global { 0 } else { 1 };
    Ok(re.replacen(text, limit, replacement).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_parse() {
        let flags = Flags::parse("gim").unwrap();
        assert!(flags.global && flags.case_insensitive && flags.multi_line);
        assert!(!flags.dot_all);
        assert!(Flags::parse("q").is_err());
    }

    #[test]
    fn test_first_match_only_without_global() {
        let report = test(r"\d+", "", "a1 b22 c333").unwrap();
        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.matches[0].text, "1");
        assert!(!report.truncated);
    }

    #[test]
    fn test_global_matches_with_groups() {
        let report = test(r"(?P<key>\w+)=(\d+)?", "g", "a=1 b= c=3").unwrap();
        assert_eq!(report.matches.len(), 3);

        let second = &report.matches[1];
        assert_eq!(second.text, "b=");
        assert_eq!(second.groups, vec![Some("b".to_string()), None]);
        assert_eq!(second.named.get("key"), Some(&Some("b".to_string())));
    }

    #[test]
    fn test_offsets_are_characters() {
        let report = test("мир", "g", "привет мир").unwrap();
        assert_eq!(report.matches[0].start, 7);
        assert_eq!(report.matches[0].end, 10);
    }

    #[test]
    fn test_case_insensitive_flag() {
        assert!(test("hello", "", "HELLO").unwrap().matches.is_empty());
        assert_eq!(test("hello", "i", "HELLO").unwrap().matches.len(), 1);
    }

    #[test]
    fn test_match_cap() {
        let text = "a".repeat(MAX_MATCHES + 10);
        let report = test("a", "g", &text).unwrap();
        assert_eq!(report.matches.len(), MAX_MATCHES);
        assert!(report.truncated);
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(test("(", "", "x"), Err(ToolError::InvalidRegex(_))));
    }

    #[test]
    fn test_replace() {
        assert_eq!(replace("o", "", "foo boo", "0").unwrap(), "f0o boo");
        assert_eq!(replace("o", "g", "foo boo", "0").unwrap(), "f00 b00");
        assert_eq!(
            replace(r"(?P<first>\w+) (?P<last>\w+)", "", "Ada Lovelace", "${last}, ${first}").unwrap(),
            "Lovelace, Ada"
        );
    }
}
