use std::fmt;

use serde::Serialize;

/// Locale
///
/// The fixed, ordered set of locales the dashboard is translated into.
/// Order matters: when several supported locales share a primary language
/// subtag the first one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Locale {
    #[serde(rename = "pt-br")]
    PtBr,
    #[serde(rename = "en")]
    En,
    #[serde(rename = "bn")]
    Bn,
    #[serde(rename = "ar")]
    Ar,
}

pub const SUPPORTED: [Locale; 4] = [Locale::PtBr, Locale::En, Locale::Bn, Locale::Ar];

pub const DEFAULT_LOCALE: Locale = Locale::PtBr;

impl Locale {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PtBr => "pt-br",
            Self::En => "en",
            Self::Bn => "bn",
            Self::Ar => "ar",
        }
    }

    /// Exact, case-insensitive match of a path segment or language tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        SUPPORTED
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(tag))
    }

    fn primary(self) -> &'static str {
        primary_subtag(self.as_str())
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn primary_subtag(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}

/// A single `Accept-Language` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Preference {
    pub tag: String,
    pub quality: f32,
}

/// parse_accept_language
///
/// Splits the header into preferences ordered by descending quality. Entries
/// with equal quality keep header order. Entries with `q=0` or an unparsable
/// or out-of-range quality are dropped.
pub fn parse_accept_language(header: &str) -> Vec<Preference> {
    let mut preferences: Vec<Preference> = header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let tag = parts.next()?.trim();
            if tag.is_empty() {
                return None;
            }

            let mut quality = 1.0_f32;
            for param in parts {
                let param = param.trim();
                if let Some(q) = param
                    .strip_prefix("q=")
                    .or_else(|| param.strip_prefix("Q="))
                {
                    quality = q.trim().parse::<f32>().ok()?;
                }
            }

            if !(quality > 0.0 && quality <= 1.0) {
                return None;
            }
            Some(Preference {
                tag: tag.to_string(),
                quality,
            })
        })
        .collect();

    // `sort_by` is stable, so ties keep the client's order.
    preferences.sort_by(|a, b| b.quality.total_cmp(&a.quality));
    preferences
}

/// resolve_locale
///
/// Picks the best supported locale for an `Accept-Language` value, falling back
/// to `DEFAULT_LOCALE` when the header is absent or nothing matches.
pub fn resolve_locale(header: Option<&str>) -> Locale {
    let Some(header) = header else {
        return DEFAULT_LOCALE;
    };

    for preference in parse_accept_language(header) {
        if preference.tag == "*" {
            return DEFAULT_LOCALE;
        }
        if let Some(exact) = Locale::from_tag(&preference.tag) {
            return exact;
        }
        let wanted = primary_subtag(&preference.tag);
        if let Some(by_language) = SUPPORTED
            .into_iter()
            .find(|l| l.primary().eq_ignore_ascii_case(wanted))
        {
            return by_language;
        }
    }

    DEFAULT_LOCALE
}
