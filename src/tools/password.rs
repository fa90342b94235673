//! Password generator and strength estimator

use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::{ToolError, ToolResult};

pub const MIN_LENGTH: usize = 4;
pub const MAX_LENGTH: usize = 128;

const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
const DIGITS: &str = "0123456789";
const SYMBOLS: &str = "!@#$%^&*()-_=+[]{};:,.<>/?~";
/// Characters easily confused with one another
const AMBIGUOUS: &str = "Il1O0o|`'\"";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordOptions {
    pub length: usize,
    pub uppercase: bool,
    pub lowercase: bool,
    pub digits: bool,
    pub symbols: bool,
    pub exclude_ambiguous: bool,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            length: 16,
            uppercase: true,
            lowercase: true,
            digits: true,
            symbols: true,
            exclude_ambiguous: false,
        }
    }
}

impl PasswordOptions {
    fn classes(&self) -> Vec<Vec<char>> {
        [
            (self.uppercase, UPPER),
            (self.lowercase, LOWER),
            (self.digits, DIGITS),
            (self.symbols, SYMBOLS),
        ]
        .into_iter()
        .filter(|(enabled, _)| *enabled)
        .map(|(_, chars)| {
            chars
                .chars()
                .filter(|c| !self.exclude_ambiguous || !AMBIGUOUS.contains(*c))
                .collect()
        })
        .collect()
    }
}

/// Generate a password containing at least one character of every selected class
pub fn generate(options: &PasswordOptions) -> ToolResult<String> {
    if !(MIN_LENGTH..=MAX_LENGTH).contains(&options.length) {
        return Err(ToolError::out_of_range(format!(
            "length must be between {} and {}",
            MIN_LENGTH, MAX_LENGTH
        )));
    }
    let classes = options.classes();
    if classes.is_empty() {
        return Err(ToolError::invalid_input("select at least one character class"));
    }

    let mut rng = OsRng;
    let pool: Vec<char> = classes.iter().flatten().copied().collect();
    let mut chars: Vec<char> = Vec::with_capacity(options.length);

    for class in &classes {
        if let Some(c) = class.choose(&mut rng) {
            chars.push(*c);
        }
    }
    while chars.len() < options.length {
        if let Some(c) = pool.choose(&mut rng) {
            chars.push(*c);
        }
    }
    chars.shuffle(&mut rng);

    Ok(chars.into_iter().collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthLabel {
    VeryWeak,
    Weak,
    Reasonable,
    Strong,
    VeryStrong,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Strength {
    pub entropy_bits: f64,
    pub label: StrengthLabel,
}

/// Estimate entropy from length and the character classes actually used
pub fn strength(password: &str) -> Strength {
    let mut pool = 0u32;
    let has = |set: &str| password.chars().any(|c| set.contains(c));
    if has(UPPER) {
        pool += 26;
    }
    if has(LOWER) {
        pool += 26;
    }
    if has(DIGITS) {
        pool += 10;
    }
    if password.chars().any(|c| c.is_ascii_punctuation() || c == ' ') {
        pool += 33;
    }
    if password.chars().any(|c| !c.is_ascii()) {
        pool += 100;
    }

    let length = password.chars().count();
    let entropy_bits = if pool == 0 {
        0.0
    } else {
        length as f64 * f64::from(pool).log2()
    };

    let label = match entropy_bits {
        e if e < 28.0 => StrengthLabel::VeryWeak,
        e if e < 36.0 => StrengthLabel::Weak,
        e if e < 60.0 => StrengthLabel::Reasonable,
        e if e < 128.0 => StrengthLabel::Strong,
        _ => StrengthLabel::VeryStrong,
    };

    Strength {
        entropy_bits: (entropy_bits * 100.0).round() / 100.0,
        label,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_generation() {
        let password = generate(&PasswordOptions::default()).unwrap();
        assert_eq!(password.chars().count(), 16);
        assert!(password.chars().any(|c| c.is_ascii_uppercase()));
        assert!(password.chars().any(|c| c.is_ascii_lowercase()));
        assert!(password.chars().any(|c| c.is_ascii_digit()));
        assert!(password.chars().any(|c| SYMBOLS.contains(c)));
    }

    #[test]
    fn test_every_class_present_at_min_length() {
        for _ in 0..50 {
            let password = generate(&PasswordOptions {
                length: 4,
                ..Default::default()
            })
            .unwrap();
            assert!(password.chars().any(|c| c.is_ascii_uppercase()));
            assert!(password.chars().any(|c| c.is_ascii_lowercase()));
            assert!(password.chars().any(|c| c.is_ascii_digit()));
            assert!(password.chars().any(|c| SYMBOLS.contains(c)));
        }
    }

    #[test]
    fn test_exclude_ambiguous() {
        let options = PasswordOptions {
            length: 128,
            exclude_ambiguous: true,
            ..Default::default()
        };
        for _ in 0..10 {
            let password = generate(&options).unwrap();
            assert!(!password.chars().any(|c| AMBIGUOUS.contains(c)));
        }
    }

    #[test]
    fn test_single_class() {
        let password = generate(&PasswordOptions {
            length: 32,
            uppercase: false,
            lowercase: false,
            digits: true,
            symbols: false,
            exclude_ambiguous: false,
        })
        .unwrap();
        assert!(password.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_invalid_options() {
        let too_short = PasswordOptions { length: 3, ..Default::default() };
        assert!(matches!(generate(&too_short), Err(ToolError::OutOfRange(_))));

        let too_long = PasswordOptions { length: 129, ..Default::default() };
        assert!(matches!(generate(&too_long), Err(ToolError::OutOfRange(_))));

        let no_classes = PasswordOptions {
            uppercase: false,
            lowercase: false,
            digits: false,
            symbols: false,
            ..Default::default()
        };
        assert!(matches!(generate(&no_classes), Err(ToolError::InvalidInput(_))));
    }

    #[test]
    fn test_strength_labels() {
        assert_eq!(strength("").label, StrengthLabel::VeryWeak);
        assert_eq!(strength("").entropy_bits, 0.0);
        assert_eq!(strength("abc").label, StrengthLabel::VeryWeak);
        // 12 * log2(62) ~= 71.45
        let s = strength("Abcdefgh1234");
        assert_eq!(s.label, StrengthLabel::Strong);
        assert!((s.entropy_bits - 71.45).abs() < 0.01);
        assert_eq!(strength(&"aB3$".repeat(8)).label, StrengthLabel::VeryStrong);
    }
}
