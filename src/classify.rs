use std::collections::BTreeSet;

use crate::domain::{ClassifiedHaplogroup, HaplogroupCode};

/// Placeholder values that never count as a haplogroup call.
pub const DEFAULT_EXCLUDED_TOKENS: [&str; 5] = ["", "..", "n/a", "N/A", "Neanderthal"];

#[derive(Debug, Clone)]
pub struct HaplogroupClassifier {
    excluded: BTreeSet<String>,
}

impl Default for HaplogroupClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_TOKENS)
    }
}

impl HaplogroupClassifier {
    pub fn new<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded: excluded.into_iter().map(Into::into).collect(),
        }
    }

    /// A code is valid when it is a single character, or when its second
    /// character is a decimal digit. Excluded tokens are never valid.
    pub fn is_valid(&self, raw: &str) -> bool {
        let code = raw.trim();
        if code.is_empty() || self.excluded.contains(code) {
            return false;
        }
        let mut chars = code.chars().skip(1);
        match chars.next() {
            None => true,
            Some(second) => second.is_ascii_digit(),
        }
    }

    pub fn classify(&self, raw: &str) -> Option<ClassifiedHaplogroup> {
        if !self.is_valid(raw) {
            return None;
        }
        let mut chars = raw.trim().chars();
        let letter = chars.next()?.to_ascii_uppercase();
        let subclade = chars
            .next()
            .filter(char::is_ascii_digit)
            .map(|digit| HaplogroupCode::subclade(letter, digit));
        Some(ClassifiedHaplogroup {
            basal: HaplogroupCode::basal(letter),
            subclade,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_first_digit_forms_the_subclade() {
        let classifier = HaplogroupClassifier::default();
        let classified = classifier.classify("a12b").unwrap();
        assert_eq!(classified.basal.to_string(), "A");
        assert_eq!(classified.subclade.unwrap().to_string(), "A1");
    }

    #[test]
    fn placeholders_are_rejected() {
        let classifier = HaplogroupClassifier::default();
        for token in ["", "  ", "..", "n/a", "N/A", "Neanderthal", "HV0", "R1b"] {
            let expected = matches!(token, "R1b");
            assert_eq!(classifier.is_valid(token), expected, "token {token:?}");
        }
    }

    #[test]
    fn custom_exclusions() {
        let classifier = HaplogroupClassifier::new(["?"]);
        assert!(classifier.classify("?").is_none());
        assert!(classifier.classify("..").is_none());
        assert!(classifier.classify("h").is_some());
    }
}
