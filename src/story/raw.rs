use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{VnError, VnResult};
use crate::language::LocalizedText;
use crate::state::FlagValue;
use crate::typewriter::TypingSpeed;
use crate::version::STORY_SCHEMA_VERSION;

/// JSON-facing story: scenes plus the speaker display-name table.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StoryRaw {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    pub scenes: BTreeMap<String, SceneRaw>,
    #[serde(default)]
    pub characters: BTreeMap<String, LocalizedText>,
}

/// A named unit of the story with presentation defaults and its dialog map.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SceneRaw {
    #[serde(default)]
    pub title: String,
    pub location_id: String,
    pub character_id: String,
    #[serde(default)]
    pub bgm: Option<String>,
    #[serde(default = "default_entry")]
    pub entry: String,
    pub dialog: BTreeMap<String, NodeRaw>,
}

fn default_entry() -> String {
    "0".to_string()
}

/// One displayable beat of dialogue in authored form.
///
/// Exactly one of `default_next_id`, `next_scene_id`, and `choices` may be
/// present; a node with none of them is terminal. The compile step turns
/// this implicit union into an explicit [`super::Continuation`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeRaw {
    pub speaker: String,
    pub english: String,
    pub farsi: String,
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub typing_speed: TypingSpeed,
    #[serde(default)]
    pub sfx: Option<String>,
    #[serde(default)]
    pub default_next_id: Option<String>,
    #[serde(default)]
    pub next_scene_id: Option<String>,
    #[serde(default)]
    pub choices: Option<Vec<ChoiceRaw>>,
}

/// A player-selectable branch attached to a dialog node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChoiceRaw {
    pub english: String,
    pub farsi: String,
    #[serde(default)]
    pub response: Option<ResponseRaw>,
    #[serde(default)]
    pub next_id: Option<String>,
    #[serde(default)]
    pub next_scene_id: Option<String>,
    #[serde(default)]
    pub set_flags: BTreeMap<String, FlagValue>,
}

/// Node-shaped payload shown right after a choice, before advancing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResponseRaw {
    pub speaker: String,
    pub english: String,
    pub farsi: String,
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub typing_speed: TypingSpeed,
}

impl StoryRaw {
    /// Parses a JSON story, rejecting incompatible schema versions.
    pub fn from_json(input: &str) -> VnResult<Self> {
        let story: StoryRaw = serde_json::from_str(input)
            .map_err(|err| VnError::Serialization(err.to_string()))?;
        match story.schema_version.as_deref() {
            None => Ok(story),
            Some(version) if version == STORY_SCHEMA_VERSION => Ok(story),
            Some(version) => Err(VnError::InvalidStory(format!(
                "schema incompatible: found {version}, expected {STORY_SCHEMA_VERSION}"
            ))),
        }
    }

    /// Serializes the story to a JSON string with the current schema version.
    pub fn to_json(&self) -> VnResult<String> {
        let mut story = self.clone();
        story.schema_version = Some(STORY_SCHEMA_VERSION.to_string());
        serde_json::to_string_pretty(&story).map_err(|err| VnError::Serialization(err.to_string()))
    }
}
