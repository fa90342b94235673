//! Locale resolution
//!
//! Picks the language a request is served in from an explicit query value
//! and the `Accept-Language` header, restricted to the configured locales.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primary language subtag, lowercased ("en", "ru")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    /// Normalize a language tag: lowercase, region and script stripped.
    ///
    /// Returns `None` for tags that aren't 2-8 ASCII letters.
    pub fn parse(tag: &str) -> Option<Self> {
        let primary = tag.trim().split(['-', '_']).next()?.to_ascii_lowercase();
        let valid = (2..=8).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_lowercase());
        valid.then_some(Self(primary))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Locale {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resolves request locales against the supported set
#[derive(Debug, Clone)]
pub struct LocaleResolver {
    supported: Vec<Locale>,
    default: Locale,
}

impl LocaleResolver {
    /// Build a resolver; unparsable entries are dropped and the default is
    /// always supported.
    pub fn new(supported: &[String], default: &str) -> Self {
        let default = Locale::parse(default).unwrap_or_else(|| Locale("en".to_string()));
        let mut locales: Vec<Locale> = Vec::new();
        for locale in supported.iter().filter_map(|s| Locale::parse(s)) {
            if !locales.contains(&locale) {
                locales.push(locale);
            }
        }
        if !locales.contains(&default) {
            locales.insert(0, default.clone());
        }
        Self {
            supported: locales,
            default,
        }
    }

    pub fn default_locale(&self) -> &Locale {
        &self.default
    }

    pub fn supported(&self) -> &[Locale] {
        &self.supported
    }

    /// Return the supported locale matching `tag`, if any
    pub fn find(&self, tag: &str) -> Option<&Locale> {
        let locale = Locale::parse(tag)?;
        self.supported.iter().find(|l| **l == locale)
    }

    pub fn is_supported(&self, tag: &str) -> bool {
        self.find(tag).is_some()
    }

    /// Pick the locale for a request.
    ///
    /// The query value wins when supported, then `Accept-Language` entries in
    /// q-weight order, then the default.
    pub fn resolve(&self, query: Option<&str>, accept_language: Option<&str>) -> Locale {
        if let Some(locale) = query.and_then(|q| self.find(q)) {
            return locale.clone();
        }

        if let Some(header) = accept_language {
            for tag in parse_accept_language(header) {
                if let Some(locale) = self.find(&tag) {
                    return locale.clone();
                }
            }
        }

        self.default.clone()
    }
}

/// Language tags from an `Accept-Language` header, highest q first.
///
/// Entries with `q=0` and the `*` wildcard are skipped. Equal weights keep
/// header order.
pub fn parse_accept_language(header: &str) -> Vec<String> {
    let mut entries: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|part| {
            let mut pieces = part.split(';');
            let tag = pieces.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }
            let q = pieces
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|v| v.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            (q > 0.0).then(|| (tag.to_string(), q))
        })
        .collect();

    // Stable sort preserves header order among equal weights
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    entries.into_iter().map(|(tag, _)| tag).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> LocaleResolver {
        LocaleResolver::new(&["en".to_string(), "ru".to_string()], "en")
    }

    #[test]
    fn test_locale_parse() {
        assert_eq!(Locale::parse("en-US").unwrap().as_str(), "en");
        assert_eq!(Locale::parse("RU_ru").unwrap().as_str(), "ru");
        assert_eq!(Locale::parse(" de ").unwrap().as_str(), "de");
        assert!(Locale::parse("").is_none());
        assert!(Locale::parse("x").is_none());
        assert!(Locale::parse("e1").is_none());
    }

    #[test]
    fn test_query_wins() {
        let r = resolver();
        assert_eq!(r.resolve(Some("ru"), Some("en")).as_str(), "ru");
        assert_eq!(r.resolve(Some("RU-ru"), None).as_str(), "ru");
    }

    #[test]
    fn test_unsupported_query_falls_through() {
        let r = resolver();
        assert_eq!(r.resolve(Some("fr"), Some("ru,en;q=0.5")).as_str(), "ru");
        assert_eq!(r.resolve(Some("fr"), None).as_str(), "en");
    }

    #[test]
    fn test_accept_language_weights() {
        let r = resolver();
        assert_eq!(
            r.resolve(None, Some("fr-FR, en;q=0.4, ru-RU;q=0.8")).as_str(),
            "ru"
        );
        assert_eq!(r.resolve(None, Some("ru;q=0, en;q=0.1")).as_str(), "en");
        assert_eq!(r.resolve(None, Some("*")).as_str(), "en");
    }

    #[test]
    fn test_parse_accept_language_order() {
        assert_eq!(
            parse_accept_language("da, en-GB;q=0.8, en;q=0.7, *;q=0.1"),
            vec!["da", "en-GB", "en"]
        );
        assert_eq!(parse_accept_language("a;q=0.5, b;q=0.5"), vec!["a", "b"]);
        assert!(parse_accept_language("").is_empty());
    }

    #[test]
    fn test_default_always_supported() {
        let r = LocaleResolver::new(&["ru".to_string()], "en");
        assert!(r.is_supported("en"));
        assert_eq!(r.supported().len(), 2);
        assert_eq!(r.default_locale().as_str(), "en");
    }
}
