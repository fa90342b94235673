//! Number base converter (radix 2 to 36)

use serde::Serialize;

use super::{ToolError, ToolResult};

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conversion {
    /// Value written in the target radix
    pub value: String,
    /// Value in decimal, for reference
    pub decimal: String,
}

fn check_radix(radix: u32) -> ToolResult<()> {
    if (2..=36).contains(&radix) {
        Ok(())
    } else {
        Err(ToolError::out_of_range(format!("radix {} is not between 2 and 36", radix)))
    }
}

fn prefix_radix(prefix: &str) -> Option<u32> {
    match prefix {
        "0x" | "0X" => Some(16),
        "0b" | "0B" => Some(2),
        "0o" | "0O" => Some(8),
        _ => None,
    }
}

/// Parse a signed integer written in `radix`.
///
/// A leading `-`/`+`, `_` separators and a `0x`/`0b`/`0o` prefix matching
/// the radix are accepted.
pub fn parse(value: &str, radix: u32) -> ToolResult<i128> {
    check_radix(radix)?;
    let cleaned: String = value.trim().chars().filter(|c| *c != '_').collect();
    let (negative, body) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };

    let body = match body.get(..2).and_then(prefix_radix) {
        // "0b" is also a valid base-16 number, so only strip when it matches
        Some(prefixed) if prefixed == radix => &body[2..],
        _ => body,
    };
    if body.is_empty() {
        return Err(ToolError::invalid_input("no digits"));
    }
    if body.starts_with(|c: char| c == '+' || c == '-') {
        return Err(ToolError::invalid_input(format!(
            "'{}' has more than one sign",
            value.trim()
        )));
    }

    let magnitude = u128::from_str_radix(body, radix).map_err(|e| {
        ToolError::invalid_input(format!("'{}' is not a base-{} number: {}", value.trim(), radix, e))
    })?;

    if negative {
        if magnitude > i128::MAX as u128 + 1 {
            return Err(ToolError::out_of_range("value does not fit in 128 bits"));
        }
        Ok((magnitude as i128).wrapping_neg())
    } else {
        i128::try_from(magnitude).map_err(|_| ToolError::out_of_range("value does not fit in 128 bits"))
    }
}

/// Render `value` in `radix` using lowercase digits
pub fn format(value: i128, radix: u32) -> ToolResult<String> {
    check_radix(radix)?;
    let mut magnitude = value.unsigned_abs();
    if magnitude == 0 {
        return Ok("0".to_string());
    }

    let mut digits = Vec::new();
    while magnitude > 0 {
        digits.push(DIGITS[(magnitude % radix as u128) as usize]);
        magnitude /= radix as u128;
    }
    if value < 0 {
        digits.push(b'-');
    }
    digits.reverse();
    String::from_utf8(digits).map_err(|_| ToolError::InvalidUtf8)
}

/// Convert `value` from one radix to another
pub fn convert(value: &str, from_radix: u32, to_radix: u32) -> ToolResult<Conversion> {
    let parsed = parse(value, from_radix)?;
    Ok(Conversion {
        value: format(parsed, to_radix)?,
        decimal: parsed.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_conversions() {
        assert_eq!(convert("255", 10, 16).unwrap().value, "ff");
        assert_eq!(convert("ff", 16, 2).unwrap().value, "11111111");
        assert_eq!(convert("777", 8, 10).unwrap().value, "511");
        assert_eq!(convert("z", 36, 10).unwrap().value, "35");
        assert_eq!(convert("0", 10, 2).unwrap().value, "0");
    }

    #[test]
    fn test_prefixes_and_separators() {
        assert_eq!(convert("0xFF", 16, 10).unwrap().value, "255");
        assert_eq!(convert("0b1010_1010", 2, 16).unwrap().value, "aa");
        assert_eq!(convert("0o17", 8, 10).unwrap().value, "15");
        // In base 16 "0b" is an ordinary digit pair
        assert_eq!(convert("0b", 16, 10).unwrap().value, "11");
    }

    #[test]
    fn test_negative_values() {
        let result = convert("-0x1f", 16, 10).unwrap();
        assert_eq!(result.value, "-31");
        assert_eq!(result.decimal, "-31");
        assert_eq!(convert("-101", 2, 10).unwrap().value, "-5");
    }

    #[test]
    fn test_single_sign_only() {
        assert_eq!(convert("+5", 10, 10).unwrap().value, "5");
        for input in ["-+5", "+-5", "--5", "++5", "-0x+1f"] {
            assert!(
                matches!(convert(input, 16, 10), Err(ToolError::InvalidInput(_))),
                "{} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_extremes() {
        let min = i128::MIN.to_string();
        assert_eq!(convert(&min, 10, 10).unwrap().value, min);
        let max = i128::MAX.to_string();
        assert_eq!(convert(&max, 10, 10).unwrap().value, max);
        assert!(matches!(
            convert("170141183460469231731687303715884105728", 10, 16),
            Err(ToolError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(convert("12", 1, 10), Err(ToolError::OutOfRange(_))));
        assert!(matches!(convert("12", 10, 37), Err(ToolError::OutOfRange(_))));
        assert!(matches!(convert("2", 2, 10), Err(ToolError::InvalidInput(_))));
        assert!(matches!(convert("-", 10, 2), Err(ToolError::InvalidInput(_))));
        assert!(matches!(convert("0x", 16, 2), Err(ToolError::InvalidInput(_))));
    }
}
