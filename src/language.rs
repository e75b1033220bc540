//! Dual-language text and the active-language projection.

use serde::{Deserialize, Serialize};

/// The two supported display languages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    English,
    Farsi,
}

impl Language {
    /// Returns the other language.
    pub fn toggled(self) -> Self {
        match self {
            Language::English => Language::Farsi,
            Language::Farsi => Language::English,
        }
    }

    /// Layout direction, derived purely from the language.
    pub fn direction(self) -> Direction {
        match self {
            Language::English => Direction::Ltr,
            Language::Farsi => Direction::Rtl,
        }
    }
}

/// Text layout direction for the active language.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Ltr,
    Rtl,
}

/// Per-language text as authored in the story JSON.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub english: String,
    pub farsi: String,
}

impl LocalizedText {
    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::English => &self.english,
            Language::Farsi => &self.farsi,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_is_an_involution() {
        assert_eq!(Language::English.toggled(), Language::Farsi);
        assert_eq!(Language::English.toggled().toggled(), Language::English);
    }

    #[test]
    fn direction_follows_language() {
        assert_eq!(Language::English.direction(), Direction::Ltr);
        assert_eq!(Language::Farsi.direction(), Direction::Rtl);
    }
}
