//! Locale handling for locale-prefixed page paths (`/he/dashboard`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Locales served by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    He,
    En,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::He => "he",
            Locale::En => "en",
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "he" => Ok(Locale::He),
            "en" => Ok(Locale::En),
            _ => Err(format!("Unsupported locale: {}", s)),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A request path split into its optional locale segment and the remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedPath<'a> {
    /// The two-letter segment that was stripped, if any.
    pub prefix: Option<&'a str>,
    /// The path with the locale segment removed; always starts with `/`.
    pub rest: &'a str,
}

impl LocalizedPath<'_> {
    /// Locale to use for redirects: the stripped prefix when supported,
    /// otherwise the default locale.
    pub fn locale(&self) -> Locale {
        self.prefix
            .and_then(|p| p.parse().ok())
            .unwrap_or_default()
    }
}

/// Strips a leading two-letter lowercase segment from `path`.
///
/// `/he/dashboard` → prefix `he`, rest `/dashboard`; `/en` → rest `/`;
/// `/dashboard` → no prefix.
pub fn split_locale(path: &str) -> LocalizedPath<'_> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let (segment, remainder) = match trimmed.find('/') {
        Some(idx) => (&trimmed[..idx], &trimmed[idx..]),
        None => (trimmed, ""),
    };

    let is_locale = segment.len() == 2 && segment.bytes().all(|b| b.is_ascii_lowercase());
    if !is_locale {
        return LocalizedPath {
            prefix: None,
            rest: if path.is_empty() { "/" } else { path },
        };
    }

    LocalizedPath {
        prefix: Some(segment),
        rest: if remainder.is_empty() { "/" } else { remainder },
    }
}

/// Builds a locale-qualified page path, e.g. `localized(Locale::He, "/login")`.
pub fn localized(locale: Locale, page: &str) -> String {
    format!("/{}{}", locale.as_str(), page)
}
