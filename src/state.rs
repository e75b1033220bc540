//! The mutable playback cursor owned by the engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::language::Language;

/// A named flag value set by a choice.
///
/// Flags are write-only today: choices accumulate them and they survive
/// save/load, but no dialog node branches on one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// Runtime playback state: scene, node, language, and accumulated flags.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    pub scene: String,
    pub node: String,
    pub language: Language,
    pub flags: BTreeMap<String, FlagValue>,
}

impl EngineState {
    /// Merges flag assignments, last write per key winning.
    pub fn merge_flags<'a, I>(&mut self, assignments: I)
    where
        I: IntoIterator<Item = (&'a String, &'a FlagValue)>,
    {
        for (key, value) in assignments {
            self.flags.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_flags_last_write_wins() {
        let mut state = EngineState::default();
        let first = BTreeMap::from([("met_alex".to_string(), FlagValue::Bool(true))]);
        let second = BTreeMap::from([("met_alex".to_string(), FlagValue::Bool(false))]);
        state.merge_flags(&first);
        state.merge_flags(&second);
        assert_eq!(state.flags.get("met_alex"), Some(&FlagValue::Bool(false)));
    }
}
