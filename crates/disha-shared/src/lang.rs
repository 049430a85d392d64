//! Language tags for the pipeline.
//!
//! Detection and normalization happen upstream; this module only
//! models the tag the client sends and the supported set the
//! language guard checks against.

use serde::{Deserialize, Serialize};

/// Language of an incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LanguageTag {
    En,
    Hi,
    HiEn,
    Other,
}

impl LanguageTag {
    /// Parse a client-supplied tag. Anything outside the known set
    /// maps to `Other` so the language guard can reject it.
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "en" => Self::En,
            "hi" => Self::Hi,
            "hi-en" | "hien" | "hinglish" => Self::HiEn,
            _ => Self::Other,
        }
    }

    /// Supported set: English, Hindi, and Hinglish.
    pub fn is_supported(self) -> bool {
        !matches!(self, Self::Other)
    }
}

impl Default for LanguageTag {
    fn default() -> Self {
        Self::En
    }
}

impl std::fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::En => "en",
            Self::Hi => "hi",
            Self::HiEn => "hi-en",
            Self::Other => "other",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_tags() {
        assert_eq!(LanguageTag::parse("en"), LanguageTag::En);
        assert_eq!(LanguageTag::parse("HI"), LanguageTag::Hi);
        assert_eq!(LanguageTag::parse("hi-en"), LanguageTag::HiEn);
        assert_eq!(LanguageTag::parse("hinglish"), LanguageTag::HiEn);
    }

    #[test]
    fn unknown_tags_are_unsupported() {
        assert_eq!(LanguageTag::parse("fr"), LanguageTag::Other);
        assert!(!LanguageTag::parse("fr").is_supported());
        assert!(LanguageTag::parse("hi").is_supported());
    }
}
