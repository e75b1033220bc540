use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::error::{VnError, VnResult};
use crate::language::Language;
use crate::state::FlagValue;
use crate::typewriter::TypingSpeed;

use super::raw::{ChoiceRaw, NodeRaw, ResponseRaw, SceneRaw, StoryRaw};

/// Shared string storage used by compiled stories.
pub type SharedStr = Arc<str>;

/// Per-language text with interned storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalizedLine {
    pub english: SharedStr,
    pub farsi: SharedStr,
}

impl LocalizedLine {
    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::English => &self.english,
            Language::Farsi => &self.farsi,
        }
    }
}

/// Runtime-ready story keyed by scene id.
#[derive(Clone, Debug)]
pub struct StoryCompiled {
    scenes: BTreeMap<String, SceneCompiled>,
    characters: BTreeMap<String, LocalizedLine>,
}

#[derive(Clone, Debug)]
pub struct SceneCompiled {
    pub title: SharedStr,
    pub location_id: SharedStr,
    pub character_id: SharedStr,
    pub bgm: Option<SharedStr>,
    pub entry: SharedStr,
    pub nodes: BTreeMap<String, NodeCompiled>,
}

#[derive(Clone, Debug)]
pub struct NodeCompiled {
    pub speaker: SharedStr,
    pub text: LocalizedLine,
    pub emotion: Option<SharedStr>,
    pub speed: TypingSpeed,
    pub sfx: Option<SharedStr>,
    pub continuation: Continuation,
}

/// The single continuation mechanism of a node, decided at compile time.
#[derive(Clone, Debug)]
pub enum Continuation {
    AutoAdvance { next: SharedStr },
    SceneChange { scene: SharedStr },
    Branch { choices: Vec<ChoiceCompiled> },
    Terminal,
}

#[derive(Clone, Debug)]
pub struct ChoiceCompiled {
    pub label: LocalizedLine,
    pub response: Option<ResponseCompiled>,
    pub target: ChoiceTarget,
    pub set_flags: BTreeMap<String, FlagValue>,
}

/// Where a choice continues after selection (and after its response, if any).
#[derive(Clone, Debug)]
pub enum ChoiceTarget {
    Node(SharedStr),
    Scene(SharedStr),
}

#[derive(Clone, Debug)]
pub struct ResponseCompiled {
    pub speaker: SharedStr,
    pub text: LocalizedLine,
    pub emotion: Option<SharedStr>,
    pub speed: TypingSpeed,
}

impl StoryCompiled {
    pub fn scene(&self, scene_id: &str) -> Option<&SceneCompiled> {
        self.scenes.get(scene_id)
    }

    pub fn node(&self, scene_id: &str, node_id: &str) -> Option<&NodeCompiled> {
        self.scenes.get(scene_id)?.nodes.get(node_id)
    }

    /// Localized display name for a speaker id, if the story defines one.
    pub fn display_name(&self, speaker: &str, language: Language) -> Option<&str> {
        self.characters
            .get(speaker)
            .map(|name| name.get(language))
    }

    pub fn scene_ids(&self) -> impl Iterator<Item = &str> {
        self.scenes.keys().map(String::as_str)
    }
}

impl StoryRaw {
    /// Compiles the story, failing with every validation issue at once.
    pub fn compile(&self) -> VnResult<StoryCompiled> {
        let (story, issues) = self.compile_inner();
        if issues.is_empty() {
            Ok(story)
        } else {
            Err(VnError::InvalidStory(issues.join("\n")))
        }
    }

    /// Compiles without failing on dangling references.
    ///
    /// The engine defends against unresolved targets at runtime, so a
    /// story that fails strict validation can still be played for
    /// diagnosis. Structural issues are logged instead of returned.
    pub fn compile_unchecked(&self) -> StoryCompiled {
        let (story, issues) = self.compile_inner();
        for issue in issues {
            log::warn!("story issue ignored: {issue}");
        }
        story
    }

    fn compile_inner(&self) -> (StoryCompiled, Vec<String>) {
        let mut pool = StringPool::default();
        let mut issues = Vec::new();
        let mut scenes = BTreeMap::new();

        for (scene_id, scene) in &self.scenes {
            scenes.insert(
                scene_id.clone(),
                compile_scene(scene_id, scene, &mut pool, &mut issues),
            );
        }

        let characters = self
            .characters
            .iter()
            .map(|(speaker, name)| {
                (
                    speaker.clone(),
                    LocalizedLine {
                        english: pool.intern(&name.english),
                        farsi: pool.intern(&name.farsi),
                    },
                )
            })
            .collect();

        // Reference resolution runs over the whole graph so that every
        // broken target is reported together.
        for (scene_id, scene) in &self.scenes {
            check_scene_references(scene_id, scene, &self.scenes, &mut issues);
        }

        (StoryCompiled { scenes, characters }, issues)
    }
}

fn compile_scene(
    scene_id: &str,
    scene: &SceneRaw,
    pool: &mut StringPool,
    issues: &mut Vec<String>,
) -> SceneCompiled {
    let mut nodes = BTreeMap::new();
    for (node_id, node) in &scene.dialog {
        nodes.insert(
            node_id.clone(),
            compile_node(scene_id, node_id, node, pool, issues),
        );
    }
    SceneCompiled {
        title: pool.intern(&scene.title),
        location_id: pool.intern(&scene.location_id),
        character_id: pool.intern(&scene.character_id),
        bgm: scene.bgm.as_deref().map(|value| pool.intern(value)),
        entry: pool.intern(&scene.entry),
        nodes,
    }
}

fn compile_node(
    scene_id: &str,
    node_id: &str,
    node: &NodeRaw,
    pool: &mut StringPool,
    issues: &mut Vec<String>,
) -> NodeCompiled {
    let mechanisms = usize::from(node.default_next_id.is_some())
        + usize::from(node.next_scene_id.is_some())
        + usize::from(node.choices.is_some());
    if mechanisms > 1 {
        issues.push(format!(
            "scene '{scene_id}' node '{node_id}': more than one continuation mechanism"
        ));
    }

    let continuation = if let Some(next) = &node.default_next_id {
        Continuation::AutoAdvance {
            next: pool.intern(next),
        }
    } else if let Some(scene) = &node.next_scene_id {
        Continuation::SceneChange {
            scene: pool.intern(scene),
        }
    } else if let Some(choices) = &node.choices {
        if choices.is_empty() {
            issues.push(format!(
                "scene '{scene_id}' node '{node_id}': empty choice list"
            ));
        }
        Continuation::Branch {
            choices: choices
                .iter()
                .enumerate()
                .map(|(index, choice)| {
                    compile_choice(scene_id, node_id, index, choice, pool, issues)
                })
                .collect(),
        }
    } else {
        Continuation::Terminal
    };

    NodeCompiled {
        speaker: pool.intern(&node.speaker),
        text: LocalizedLine {
            english: pool.intern(&node.english),
            farsi: pool.intern(&node.farsi),
        },
        emotion: node.emotion.as_deref().map(|value| pool.intern(value)),
        speed: node.typing_speed,
        sfx: node.sfx.as_deref().map(|value| pool.intern(value)),
        continuation,
    }
}

fn compile_choice(
    scene_id: &str,
    node_id: &str,
    index: usize,
    choice: &ChoiceRaw,
    pool: &mut StringPool,
    issues: &mut Vec<String>,
) -> ChoiceCompiled {
    let target = match (&choice.next_id, &choice.next_scene_id) {
        (Some(next), None) => ChoiceTarget::Node(pool.intern(next)),
        (None, Some(scene)) => ChoiceTarget::Scene(pool.intern(scene)),
        (Some(next), Some(_)) => {
            issues.push(format!(
                "scene '{scene_id}' node '{node_id}' choice {index}: both next_id and next_scene_id"
            ));
            ChoiceTarget::Node(pool.intern(next))
        }
        (None, None) => {
            issues.push(format!(
                "scene '{scene_id}' node '{node_id}' choice {index}: no continuation target"
            ));
            ChoiceTarget::Node(pool.intern(node_id))
        }
    };

    ChoiceCompiled {
        label: LocalizedLine {
            english: pool.intern(&choice.english),
            farsi: pool.intern(&choice.farsi),
        },
        response: choice.response.as_ref().map(|response| {
            compile_response(response, pool)
        }),
        target,
        set_flags: choice.set_flags.clone(),
    }
}

fn compile_response(response: &ResponseRaw, pool: &mut StringPool) -> ResponseCompiled {
    ResponseCompiled {
        speaker: pool.intern(&response.speaker),
        text: LocalizedLine {
            english: pool.intern(&response.english),
            farsi: pool.intern(&response.farsi),
        },
        emotion: response.emotion.as_deref().map(|value| pool.intern(value)),
        speed: response.typing_speed,
    }
}

fn check_scene_references(
    scene_id: &str,
    scene: &SceneRaw,
    scenes: &BTreeMap<String, SceneRaw>,
    issues: &mut Vec<String>,
) {
    if !scene.dialog.contains_key(&scene.entry) {
        issues.push(format!(
            "scene '{scene_id}': entry node '{}' not found",
            scene.entry
        ));
    }

    for (node_id, node) in &scene.dialog {
        if let Some(next) = &node.default_next_id {
            if !scene.dialog.contains_key(next) {
                issues.push(format!(
                    "scene '{scene_id}' node '{node_id}': default_next_id '{next}' not found"
                ));
            }
        }
        if let Some(target) = &node.next_scene_id {
            if !scenes.contains_key(target) {
                issues.push(format!(
                    "scene '{scene_id}' node '{node_id}': next_scene_id '{target}' not found"
                ));
            }
        }
        for (index, choice) in node.choices.iter().flatten().enumerate() {
            if let Some(next) = &choice.next_id {
                if !scene.dialog.contains_key(next) {
                    issues.push(format!(
                        "scene '{scene_id}' node '{node_id}' choice {index}: next_id '{next}' not found"
                    ));
                }
            }
            if let Some(target) = &choice.next_scene_id {
                if !scenes.contains_key(target) {
                    issues.push(format!(
                        "scene '{scene_id}' node '{node_id}' choice {index}: next_scene_id '{target}' not found"
                    ));
                }
            }
        }
    }
}

#[derive(Default)]
struct StringPool {
    cache: HashMap<String, SharedStr>,
}

impl StringPool {
    fn intern(&mut self, value: &str) -> SharedStr {
        if let Some(existing) = self.cache.get(value) {
            return existing.clone();
        }
        let shared: SharedStr = Arc::from(value);
        self.cache.insert(value.to_string(), shared.clone());
        shared
    }
}
