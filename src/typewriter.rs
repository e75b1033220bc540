//! Incremental character-by-character text reveal.
//!
//! The typewriter is a short-lived sub-state of the engine: one character
//! per host-scheduled tick, with the tick interval derived from the node's
//! typing speed. Skipping completes the reveal immediately.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Authored typing speed tag for a dialog node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypingSpeed {
    Slow,
    #[default]
    Normal,
    Excited,
    Instant,
}

impl TypingSpeed {
    /// Milliseconds between reveal ticks. `Instant` collapses to a single tick.
    pub fn interval(self) -> Duration {
        let millis = match self {
            TypingSpeed::Slow => 100,
            TypingSpeed::Normal => 50,
            TypingSpeed::Excited => 30,
            TypingSpeed::Instant => 0,
        };
        Duration::from_millis(millis)
    }
}

/// Typewriter reveal state for the currently displayed text.
#[derive(Clone, Debug)]
pub struct Typewriter {
    chars: Vec<char>,
    revealed: usize,
    interval: Duration,
}

impl Default for Typewriter {
    fn default() -> Self {
        Self {
            chars: Vec::new(),
            revealed: 0,
            interval: Duration::ZERO,
        }
    }
}

impl Typewriter {
    /// Begins revealing `text` at the given speed. `Instant` finishes at once.
    pub fn start(&mut self, text: &str, speed: TypingSpeed) {
        self.chars = text.chars().collect();
        self.interval = speed.interval();
        self.revealed = if speed == TypingSpeed::Instant {
            self.chars.len()
        } else {
            0
        };
    }

    /// Reveals one more character. Returns true once the full text is shown.
    pub fn tick(&mut self) -> bool {
        if self.revealed < self.chars.len() {
            self.revealed += 1;
        }
        self.is_finished()
    }

    /// Forces the reveal to completion.
    pub fn skip(&mut self) {
        self.revealed = self.chars.len();
    }

    pub fn is_finished(&self) -> bool {
        self.revealed >= self.chars.len()
    }

    /// Swaps the text without restarting the reveal.
    ///
    /// Used by the language toggle: finished text stays finished, and an
    /// in-flight reveal keeps its character position in the new text.
    pub fn replace_text(&mut self, text: &str) {
        let was_finished = self.is_finished();
        self.chars = text.chars().collect();
        self.revealed = if was_finished {
            self.chars.len()
        } else {
            self.revealed.min(self.chars.len())
        };
    }

    /// The portion of the text revealed so far.
    pub fn revealed_text(&self) -> String {
        self.chars[..self.revealed].iter().collect()
    }

    /// Host-facing tick interval for scheduling.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reveals_one_char_per_tick() {
        let mut tw = Typewriter::default();
        tw.start("abc", TypingSpeed::Normal);
        assert!(!tw.is_finished());
        tw.tick();
        assert_eq!(tw.revealed_text(), "a");
        tw.tick();
        tw.tick();
        assert!(tw.is_finished());
        assert_eq!(tw.revealed_text(), "abc");
    }

    #[test]
    fn instant_speed_finishes_on_start() {
        let mut tw = Typewriter::default();
        tw.start("hello", TypingSpeed::Instant);
        assert!(tw.is_finished());
        assert_eq!(tw.revealed_text(), "hello");
    }

    #[test]
    fn skip_completes_regardless_of_progress() {
        let mut tw = Typewriter::default();
        tw.start("typewriter", TypingSpeed::Slow);
        tw.tick();
        tw.skip();
        assert!(tw.is_finished());
        assert_eq!(tw.revealed_text(), "typewriter");
    }

    #[test]
    fn replace_preserves_finished_state() {
        let mut tw = Typewriter::default();
        tw.start("hi", TypingSpeed::Instant);
        tw.replace_text("a longer line");
        assert!(tw.is_finished());
        assert_eq!(tw.revealed_text(), "a longer line");
    }

    #[test]
    fn replace_keeps_partial_progress() {
        let mut tw = Typewriter::default();
        tw.start("abcdef", TypingSpeed::Normal);
        tw.tick();
        tw.tick();
        tw.replace_text("xyz9876");
        assert!(!tw.is_finished());
        assert_eq!(tw.revealed_text(), "xy");
    }

    #[test]
    fn ticks_past_the_end_are_harmless() {
        let mut tw = Typewriter::default();
        tw.start("a", TypingSpeed::Normal);
        tw.tick();
        tw.tick();
        assert_eq!(tw.revealed_text(), "a");
    }
}
