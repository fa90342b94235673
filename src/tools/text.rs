//! Text utilities: slugs, case conversion and statistics

use serde::{Deserialize, Serialize};

/// Words per minute used for reading time estimates
pub const WORDS_PER_MINUTE: usize = 200;

/// Generate a URL-friendly slug.
///
/// ASCII letters and digits are lowercased, non-ASCII letters are kept,
/// everything else becomes a single hyphen.
pub fn slugify(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_hyphen = false;

    for c in text.to_lowercase().chars() {
        let keep = c.is_ascii_alphanumeric() || (!c.is_ascii() && c.is_alphanumeric());
        if keep {
            result.push(c);
            prev_hyphen = false;
        } else if !prev_hyphen && !result.is_empty() {
            result.push('-');
            prev_hyphen = true;
        }
    }

    result.trim_end_matches('-').to_string()
}

/// Check that a slug only contains characters `slugify` can produce
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug.chars().all(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || (!c.is_ascii() && c.is_alphanumeric())
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Case {
    Lower,
    Upper,
    Title,
    Sentence,
    Camel,
    Pascal,
    Snake,
    Kebab,
    Constant,
}

/// Split into words on separators and lower-to-upper transitions
fn words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev: Option<char> = None;

    for c in text.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev = None;
            continue;
        }
        let boundary = matches!(prev, Some(p) if (p.is_lowercase() || p.is_numeric()) && c.is_uppercase());
        if boundary && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
        prev = Some(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Rewrite `text` in the requested case
pub fn convert_case(text: &str, case: Case) -> String {
    match case {
        Case::Lower => text.to_lowercase(),
        Case::Upper => text.to_uppercase(),
        Case::Title => words(text).iter().map(|w| capitalize(w)).collect::<Vec<_>>().join(" "),
        Case::Sentence => {
            let lower = words(text)
                .iter()
                .map(|w| w.to_lowercase())
                .collect::<Vec<_>>()
                .join(" ");
            capitalize_first(&lower)
        }
        Case::Camel => {
            let pascal = convert_case(text, Case::Pascal);
            let mut chars = pascal.chars();
            match chars.next() {
                Some(first) => first.to_lowercase().chain(chars).collect(),
                None => String::new(),
            }
        }
        Case::Pascal => words(text).iter().map(|w| capitalize(w)).collect(),
        Case::Snake => join_lower(text, "_"),
        Case::Kebab => join_lower(text, "-"),
        Case::Constant => join_lower(text, "_").to_uppercase(),
    }
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn join_lower(text: &str, sep: &str) -> String {
    words(text)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(sep)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextStats {
    pub characters: usize,
    pub characters_no_spaces: usize,
    pub bytes: usize,
    pub words: usize,
    pub lines: usize,
    pub sentences: usize,
    pub paragraphs: usize,
    pub reading_time_minutes: usize,
}

/// Count characters, words, lines, sentences and paragraphs
pub fn stats(text: &str) -> TextStats {
    let word_count = text.split_whitespace().count();
    let sentences = text
        .split(['.', '!', '?'])
        .filter(|s| s.chars().any(char::is_alphanumeric))
        .count();
    let paragraphs = text
        .split("\n\n")
        .filter(|p| !p.trim().is_empty())
        .count();

    TextStats {
        characters: text.chars().count(),
        characters_no_spaces: text.chars().filter(|c| !c.is_whitespace()).count(),
        bytes: text.len(),
        words: word_count,
        lines: if text.is_empty() { 0 } else { text.lines().count() },
        sentences,
        paragraphs,
        reading_time_minutes: word_count.div_ceil(WORDS_PER_MINUTE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Rust & Axum: a Guide!  "), "rust-axum-a-guide");
        assert_eq!(slugify("snake_case_title"), "snake-case-title");
        assert_eq!(slugify("Привет мир"), "привет-мир");
        assert_eq!(slugify("Dash — between"), "dash-between");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_slugify_output_is_valid() {
        for input in ["Hello World", "a--b", "-lead", "Ünïcödé Text", "100% done"] {
            let slug = slugify(input);
            assert!(is_valid_slug(&slug), "{:?} -> {:?}", input, slug);
        }
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("hello-world-2"));
        assert!(is_valid_slug("привет"));
        assert!(!is_valid_slug("Hello"));
        assert!(!is_valid_slug("a b"));
        assert!(!is_valid_slug("-a"));
        assert!(!is_valid_slug("a--b"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn test_convert_case() {
        let input = "hello wonderfulWorld_of-rust";
        assert_eq!(convert_case(input, Case::Snake), "hello_wonderful_world_of_rust");
        assert_eq!(convert_case(input, Case::Kebab), "hello-wonderful-world-of-rust");
        assert_eq!(convert_case(input, Case::Constant), "HELLO_WONDERFUL_WORLD_OF_RUST");
        assert_eq!(convert_case(input, Case::Camel), "helloWonderfulWorldOfRust");
        assert_eq!(convert_case(input, Case::Pascal), "HelloWonderfulWorldOfRust");
        assert_eq!(convert_case(input, Case::Title), "Hello Wonderful World Of Rust");
        assert_eq!(convert_case(input, Case::Sentence), "Hello wonderful world of rust");
        assert_eq!(convert_case("MiXeD", Case::Lower), "mixed");
        assert_eq!(convert_case("MiXeD", Case::Upper), "MIXED");
        assert_eq!(convert_case("", Case::Camel), "");
    }

    #[test]
    fn test_stats() {
        let s = stats("Hello world. How are you?\n\nFine!");
        assert_eq!(s.words, 6);
        assert_eq!(s.sentences, 3);
        assert_eq!(s.paragraphs, 2);
        assert_eq!(s.lines, 3);
        assert_eq!(s.reading_time_minutes, 1);
        assert_eq!(s.characters, 32);
    }

    #[test]
    fn test_stats_empty_and_unicode() {
        let empty = stats("");
        assert_eq!(empty.words, 0);
        assert_eq!(empty.lines, 0);
        assert_eq!(empty.reading_time_minutes, 0);

        let uni = stats("héllo");
        assert_eq!(uni.characters, 5);
        assert_eq!(uni.bytes, 6);
    }
}
