//! UUID generator and inspector

use serde::{Deserialize, Serialize};
use uuid::{Uuid, Variant};

use super::{ToolError, ToolResult};

pub const MAX_COUNT: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UuidOptions {
    pub count: usize,
    pub uppercase: bool,
    pub hyphens: bool,
    pub braces: bool,
}

impl Default for UuidOptions {
    fn default() -> Self {
        Self {
            count: 1,
            uppercase: false,
            hyphens: true,
            braces: false,
        }
    }
}

/// Generate `count` random (version 4) UUIDs
pub fn generate_v4(options: &UuidOptions) -> ToolResult<Vec<String>> {
    if options.count == 0 || options.count > MAX_COUNT {
        return Err(ToolError::out_of_range(format!(
            "count must be between 1 and {}",
            MAX_COUNT
        )));
    }

    Ok((0..options.count)
        .map(|_| render(Uuid::new_v4(), options))
        .collect())
}

fn render(id: Uuid, options: &UuidOptions) -> String {
    let mut text = if options.hyphens {
        id.hyphenated().to_string()
    } else {
        id.simple().to_string()
    };
    if options.uppercase {
        text.make_ascii_uppercase();
    }
    if options.braces {
        text = format!("{{{}}}", text);
    }
    text
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UuidInfo {
    /// Canonical lowercase hyphenated form
    pub canonical: String,
    pub version: Option<usize>,
    pub variant: &'static str,
    pub nil: bool,
}

/// Parse a UUID in any common notation and describe it
pub fn inspect(text: &str) -> ToolResult<UuidInfo> {
    let trimmed = text.trim();
    let id = Uuid::parse_str(trimmed)
        .or_else(|_| Uuid::parse_str(trimmed.trim_start_matches('{').trim_end_matches('}')))
        .map_err(|e| ToolError::invalid_input(format!("not a UUID: {}", e)))?;

    let variant = match id.get_variant() {
        Variant::NCS => "ncs",
        Variant::RFC4122 => "rfc4122",
        Variant::Microsoft => "microsoft",
        Variant::Future => "future",
        _ => "unknown",
    };

    Ok(UuidInfo {
        canonical: id.hyphenated().to_string(),
        version: id.get_version_num().into(),
        variant,
        nil: id.is_nil(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use proptest::prelude::*;
    use regex::Regex;

    static V4_PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$").unwrap()
    });

    #[test]
    fn test_generate_default() {
        let ids = generate_v4(&UuidOptions::default()).unwrap();
        assert_eq!(ids.len(), 1);
        assert!(V4_PATTERN.is_match(&ids[0]));
    }

    #[test]
    fn test_generate_formatting() {
        let ids = generate_v4(&UuidOptions {
            count: 3,
            uppercase: true,
            hyphens: false,
            braces: true,
        })
        .unwrap();
        assert_eq!(ids.len(), 3);
        for id in ids {
            assert_eq!(id.len(), 34);
            assert!(id.starts_with('{') && id.ends_with('}'));
            assert!(!id.contains('-'));
            assert_eq!(id, id.to_ascii_uppercase());
        }
    }

    #[test]
    fn test_count_bounds() {
        assert!(generate_v4(&UuidOptions { count: 0, ..Default::default() }).is_err());
        assert!(generate_v4(&UuidOptions { count: 1001, ..Default::default() }).is_err());
        assert_eq!(
            generate_v4(&UuidOptions { count: 1000, ..Default::default() }).unwrap().len(),
            1000
        );
    }

    #[test]
    fn test_inspect() {
        let info = inspect("{550E8400-E29B-41D4-A716-446655440000}").unwrap();
        assert_eq!(info.canonical, "550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(info.version, Some(4));
        assert_eq!(info.variant, "rfc4122");
        assert!(!info.nil);

        let nil = inspect("00000000-0000-0000-0000-000000000000").unwrap();
        assert!(nil.nil);

        assert!(inspect("not-a-uuid").is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn generated_ids_are_v4(count in 1usize..20) {
            let ids = generate_v4(&UuidOptions { count, ..Default::default() }).unwrap();
            prop_assert_eq!(ids.len(), count);
            for id in &ids {
                prop_assert!(V4_PATTERN.is_match(id), "{} is not a v4 UUID", id);
            }
        }
    }
}
