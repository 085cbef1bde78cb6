//! Profanity masking for free-text comment content.
//!
//! The filter never rejects input. Every whole-word, case-insensitive match
//! against the word list is replaced by `*` repeated once per character, so
//! the masked text keeps the original character count.

use std::sync::LazyLock;

use regex::Regex;

/// Words masked by [`ContentFilter::default`].
pub const DEFAULT_WORDS: &[&str] = &[
    "arse",
    "arsehole",
    "ass",
    "asshole",
    "bastard",
    "bitch",
    "bollocks",
    "bullshit",
    "crap",
    "cunt",
    "damn",
    "dick",
    "dickhead",
    "fuck",
    "fucked",
    "fucker",
    "fucking",
    "motherfucker",
    "piss",
    "prick",
    "shit",
    "shitty",
    "slut",
    "twat",
    "wanker",
    "whore",
];

static DEFAULT_FILTER: LazyLock<ContentFilter> = LazyLock::new(|| {
    ContentFilter::with_words(DEFAULT_WORDS).expect("default word list compiles")
});

#[derive(Debug, Clone)]
pub struct ContentFilter {
    pattern: Option<Regex>,
}

impl ContentFilter {
    /// Build a filter over a custom word list. Words are matched literally.
    pub fn with_words<S: AsRef<str>>(words: &[S]) -> Result<Self, regex::Error> {
        let alternation = words
            .iter()
            .map(|w| w.as_ref().trim())
            .filter(|w| !w.is_empty())
            .map(regex::escape)
            .collect::<Vec<_>>();

        if alternation.is_empty() {
            return Ok(Self { pattern: None });
        }

        let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", alternation.join("|")))?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    /// Mask every listed word in `text`. Pure; never fails.
    pub fn clean(&self, text: &str) -> String {
        match &self.pattern {
            Some(pattern) => pattern
                .replace_all(text, |caps: &regex::Captures<'_>| {
                    "*".repeat(caps[0].chars().count())
                })
                .into_owned(),
            None => text.to_string(),
        }
    }
}

impl Default for ContentFilter {
    fn default() -> Self {
        DEFAULT_FILTER.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_is_unchanged() {
        let filter = ContentFilter::default();
        assert_eq!(filter.clean("Hi there, nice post!"), "Hi there, nice post!");
    }

    #[test]
    fn profanity_is_masked_per_character() {
        let filter = ContentFilter::default();
        assert_eq!(filter.clean("well shit happens"), "well **** happens");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let filter = ContentFilter::default();
        assert_eq!(filter.clean("DAMN it"), "**** it");
    }

    #[test]
    fn only_whole_words_are_masked() {
        let filter = ContentFilter::default();
        assert_eq!(filter.clean("classic assessment"), "classic assessment");
        assert_eq!(filter.clean("Scunthorpe"), "Scunthorpe");
    }

    #[test]
    fn custom_words_are_escaped() {
        let filter = ContentFilter::with_words(&["a.b"]).unwrap();
        assert_eq!(filter.clean("a.b axb"), "*** axb");
    }

    #[test]
    fn empty_word_list_masks_nothing() {
        let filter = ContentFilter::with_words::<&str>(&[]).unwrap();
        assert_eq!(filter.clean("shit"), "shit");
    }
}
