//! Trigger phrase detection in comment bodies
//!
//! The phrase is matched case-insensitively anywhere in the comment; the
//! first occurrence wins. Everything after it up to the end of that line is
//! the requested environment, with its own case preserved.

use crate::types::InputConfig;

/// Sentence punctuation stripped from the end of a requested environment,
/// so `deploy to production.` asks for `production`.
pub const TRAILING_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':'];

/// Result of scanning one comment body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMatch<'a> {
    /// Phrase absent, or nothing usable after it
    NoMatch,
    /// Phrase found with a non-empty environment after it
    Matched {
        /// Remainder of the line after the phrase, untrimmed
        environment_raw: &'a str,
    },
}

impl<'a> TriggerMatch<'a> {
    /// Whether the comment asked for a deployment
    #[inline]
    pub fn is_match(&self) -> bool {
        matches!(self, TriggerMatch::Matched { .. })
    }

    /// The requested environment name after normalization
    pub fn environment(&self) -> Option<&'a str> {
        match *self {
            TriggerMatch::NoMatch => None,
            TriggerMatch::Matched { environment_raw } => {
                Some(normalize_environment(environment_raw))
            }
        }
    }
}

/// Trim whitespace and trailing sentence punctuation.
pub fn normalize_environment(raw: &str) -> &str {
    raw.trim()
        .trim_end_matches(|c: char| c.is_whitespace() || TRAILING_PUNCTUATION.contains(&c))
}

/// Parser bound to one configured trigger phrase
#[derive(Debug, Clone, Copy)]
pub struct TriggerParser<'a> {
    phrase: &'a str,
}

impl<'a> TriggerParser<'a> {
    /// Create a parser for `phrase`. Surrounding whitespace is ignored.
    pub fn new(phrase: &'a str) -> Self {
        Self {
            phrase: phrase.trim(),
        }
    }

    /// Create a parser from the run configuration
    pub fn from_config(config: &'a InputConfig<'_>) -> Self {
        Self::new(&config.trigger_phrase)
    }

    /// The phrase this parser looks for
    pub fn phrase(&self) -> &'a str {
        self.phrase
    }

    /// Scan a comment body for the trigger phrase.
    pub fn parse<'b>(&self, body: &'b str) -> TriggerMatch<'b> {
        if self.phrase.is_empty() {
            return TriggerMatch::NoMatch;
        }

        let Some((_, end)) = find_ignore_case(body, self.phrase) else {
            return TriggerMatch::NoMatch;
        };

        let environment_raw = body[end..].lines().next().unwrap_or("");
        if normalize_environment(environment_raw).is_empty() {
            return TriggerMatch::NoMatch;
        }

        TriggerMatch::Matched { environment_raw }
    }
}

/// Byte range of the first case-insensitive occurrence of `needle`.
fn find_ignore_case(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    haystack.char_indices().find_map(|(start, _)| {
        prefix_len_ignore_case(&haystack[start..], needle).map(|len| (start, start + len))
    })
}

/// Length in bytes of the prefix of `s` matching `needle`, if any.
fn prefix_len_ignore_case(s: &str, needle: &str) -> Option<usize> {
    let mut hay = s.char_indices();
    for n in needle.chars() {
        let (_, h) = hay.next()?;
        if !chars_eq_ignore_case(h, n) {
            return None;
        }
    }
    Some(hay.next().map_or(s.len(), |(i, _)| i))
}

#[inline]
fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}
