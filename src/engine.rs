//! The dialogue engine: playback position, transitions, and coordination
//! of the audio and save collaborators.
//!
//! The engine runs on a single-threaded, event-driven model. Every entry
//! point runs to completion before the next event is processed; the host
//! calls [`Engine::tick`] to drive the typewriter reveal and audio fades.
//!
//! Clicks during a reveal always resolve to skip-typing, never to an
//! advance, enforcing a strict two-click cadence: reveal fully, then
//! advance.

use log::{debug, error, warn};

use crate::audio::{AudioBackend, AudioCoordinator, Channel, VoiceCue};
use crate::error::{VnError, VnResult};
use crate::language::{Direction, Language};
use crate::save::{SaveCoordinator, SaveRecord, SlotKey, SlotStore, SlotSummary};
use crate::state::EngineState;
use crate::story::{ChoiceTarget, Continuation, LocalizedLine, NodeCompiled, SharedStr, StoryCompiled};
use crate::typewriter::Typewriter;

const TRANSITION_SFX: &str = "transition";
const BUTTON_CLICK_SFX: &str = "button_click";

/// Where the engine is within the current node's lifecycle.
#[derive(Clone, Debug)]
enum Phase {
    /// Text fully revealed, waiting for an advance.
    Idle,
    /// Typewriter reveal in progress.
    Typing,
    /// Choices exposed, waiting for a selection.
    ChoicePending,
    /// A choice's response is on screen; the next advance follows `target`.
    ShowingResponse {
        speaker: SharedStr,
        text: LocalizedLine,
        emotion: Option<SharedStr>,
        target: ChoiceTarget,
    },
}

/// What the next advance would do from the current node.
enum Step {
    Node(SharedStr),
    Scene(SharedStr),
    Branch,
    Terminal,
}

/// UI-facing snapshot of the current display.
#[derive(Clone, Debug, PartialEq)]
pub struct DialogueView {
    pub scene: String,
    pub node: String,
    pub scene_title: String,
    pub background: String,
    pub character: String,
    pub speaker: String,
    /// Localized display name, empty for speakers without a table entry.
    pub speaker_name: String,
    /// The portion of the text revealed so far in the active language.
    pub text: String,
    pub text_complete: bool,
    pub language: Language,
    pub direction: Direction,
    pub emotion: Option<String>,
    /// Choice labels in the active language; empty unless choices are
    /// exposed (only after the reveal completes).
    pub choices: Vec<String>,
}

/// Drives a compiled story. The audio and save collaborators are
/// constructed by the host and passed in; the engine never reaches for
/// them through any ambient state.
#[derive(Debug)]
pub struct Engine<A: AudioBackend, S: SlotStore> {
    story: StoryCompiled,
    state: EngineState,
    phase: Phase,
    typewriter: Typewriter,
    audio: AudioCoordinator<A>,
    saves: SaveCoordinator<S>,
    started: bool,
}

impl<A: AudioBackend, S: SlotStore> Engine<A, S> {
    pub fn new(
        story: StoryCompiled,
        audio: AudioCoordinator<A>,
        saves: SaveCoordinator<S>,
    ) -> Self {
        Self {
            story,
            state: EngineState::default(),
            phase: Phase::Idle,
            typewriter: Typewriter::default(),
            audio,
            saves,
            started: false,
        }
    }

    /// Begins playback at the named scene's entry node with a fresh flag set.
    pub fn start(&mut self, initial_scene_id: &str) {
        self.state.flags.clear();
        self.enter_scene(initial_scene_id, None, true);
    }

    /// Moves playback forward one beat.
    ///
    /// During a reveal this skips to the full text instead. With choices
    /// pending or on a terminal node it is a no-op.
    pub fn advance(&mut self) {
        if !self.typewriter.is_finished() {
            self.skip_typing();
            return;
        }
        if let Phase::ShowingResponse { target, .. } = &self.phase {
            let target = target.clone();
            self.phase = Phase::Idle;
            self.follow_target(&target);
            return;
        }
        if matches!(self.phase, Phase::ChoicePending) {
            return;
        }
        let step = match self.current_node().map(|node| &node.continuation) {
            Some(Continuation::AutoAdvance { next }) => Step::Node(next.clone()),
            Some(Continuation::SceneChange { scene }) => Step::Scene(scene.clone()),
            Some(Continuation::Branch { .. }) => Step::Branch,
            Some(Continuation::Terminal) | None => Step::Terminal,
        };
        match step {
            Step::Node(next) => self.show_node(&next),
            Step::Scene(scene) => self.enter_scene(&scene, None, true),
            Step::Branch => self.phase = Phase::ChoicePending,
            Step::Terminal => {}
        }
    }

    /// Forces the current reveal to completion.
    pub fn skip_typing(&mut self) {
        self.typewriter.skip();
        self.on_typing_complete();
    }

    /// Resolves an exposed choice by index.
    ///
    /// Valid only while choices are exposed; the phase change on the
    /// first call makes a double-submission a no-op. An out-of-range
    /// index has no observable effect.
    pub fn select_choice(&mut self, index: usize) {
        if !matches!(self.phase, Phase::ChoicePending) {
            return;
        }
        let choice = {
            let Some(node) = self.current_node() else {
                return;
            };
            let Continuation::Branch { choices } = &node.continuation else {
                return;
            };
            match choices.get(index) {
                Some(choice) => choice.clone(),
                None => {
                    debug!("choice index {index} out of range, ignoring");
                    return;
                }
            }
        };

        self.state.merge_flags(&choice.set_flags);
        self.audio.play_sfx(BUTTON_CLICK_SFX);

        match choice.response {
            Some(response) => {
                self.audio.play_voice(
                    &self.state.scene,
                    &self.state.node,
                    VoiceCue::Response(index),
                );
                self.typewriter
                    .start(response.text.get(self.state.language), response.speed);
                self.phase = Phase::ShowingResponse {
                    speaker: response.speaker,
                    text: response.text,
                    emotion: response.emotion,
                    target: choice.target,
                };
            }
            None => {
                self.audio
                    .play_voice(&self.state.scene, &self.state.node, VoiceCue::Choice(index));
                self.follow_target(&choice.target);
            }
        }
    }

    /// Re-renders the current display in the other language.
    ///
    /// A projection, not a transition: scene, node, and typewriter
    /// progress are untouched; already-typed text is replaced wholesale.
    pub fn toggle_language(&mut self) {
        self.state.language = self.state.language.toggled();
        let text = match &self.phase {
            Phase::ShowingResponse { text, .. } => text.clone(),
            _ => match self.current_node() {
                Some(node) => node.text.clone(),
                None => return,
            },
        };
        self.typewriter.replace_text(text.get(self.state.language));
    }

    /// Drives the typewriter one reveal step and the audio fades one ramp
    /// step. The host schedules calls at the typewriter's interval.
    pub fn tick(&mut self) {
        self.audio.tick();
        if !self.typewriter.is_finished() && self.typewriter.tick() {
            self.on_typing_complete();
        }
    }

    /// Captures the current state to a slot. Numbered slots may carry a
    /// screenshot; the auto slot never does.
    pub fn save(&mut self, slot: SlotKey) -> VnResult<()> {
        self.save_with_screenshot(slot, None)
    }

    pub fn save_with_screenshot(
        &mut self,
        slot: SlotKey,
        screenshot: Option<Vec<u8>>,
    ) -> VnResult<()> {
        let title = self
            .story
            .scene(&self.state.scene)
            .map(|scene| scene.title.to_string())
            .ok_or_else(|| VnError::UnknownScene(self.state.scene.clone()))?;
        let screenshot = if slot == SlotKey::Auto { None } else { screenshot };
        let record = SaveRecord::capture(self.state.clone(), title, screenshot);
        self.saves.save(slot, &record).map_err(VnError::from)
    }

    /// Restores from a slot. `Ok(false)` means the slot is empty, its
    /// record was corrupt, or the saved position no longer exists in the
    /// story. All three are normal outcomes, not errors.
    pub fn load(&mut self, slot: SlotKey) -> VnResult<bool> {
        let Some(record) = self.saves.load(slot)? else {
            return Ok(false);
        };
        match self.restore(record) {
            Ok(()) => Ok(true),
            Err(err) => {
                warn!("slot {slot}: stale save record treated as empty: {err}");
                Ok(false)
            }
        }
    }

    pub fn list_slots(&self) -> impl Iterator<Item = SlotSummary> + '_ {
        self.saves.list_slots()
    }

    pub fn delete_slot(&mut self, slot: SlotKey) -> VnResult<()> {
        self.saves.delete(slot).map_err(VnError::from)
    }

    pub fn set_volume(&mut self, channel: Channel, value: f32) {
        self.audio.set_volume(channel, value);
    }

    /// Forwarded to the audio gate; the host calls this on the first
    /// click/keypress so a latched BGM request can start.
    pub fn notify_interaction(&mut self) {
        self.audio.notify_interaction();
    }

    pub fn stop_all_audio(&mut self) {
        self.audio.stop_all();
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn audio(&self) -> &AudioCoordinator<A> {
        &self.audio
    }

    pub fn is_typing(&self) -> bool {
        !self.typewriter.is_finished()
    }

    /// The UI-facing snapshot, or `None` before a successful start.
    pub fn view(&self) -> Option<DialogueView> {
        if !self.started {
            return None;
        }
        let scene = self.story.scene(&self.state.scene)?;
        let language = self.state.language;
        let (speaker, emotion) = match &self.phase {
            Phase::ShowingResponse {
                speaker, emotion, ..
            } => (speaker.clone(), emotion.clone()),
            _ => {
                let node = self.current_node()?;
                (node.speaker.clone(), node.emotion.clone())
            }
        };
        let speaker_name = self
            .story
            .display_name(&speaker, language)
            .unwrap_or("")
            .to_string();
        let choices = if matches!(self.phase, Phase::ChoicePending) {
            match self.current_node().map(|node| &node.continuation) {
                Some(Continuation::Branch { choices }) => choices
                    .iter()
                    .map(|choice| choice.label.get(language).to_string())
                    .collect(),
                _ => Vec::new(),
            }
        } else {
            Vec::new()
        };
        Some(DialogueView {
            scene: self.state.scene.clone(),
            node: self.state.node.clone(),
            scene_title: scene.title.to_string(),
            background: scene.location_id.to_string(),
            character: scene.character_id.to_string(),
            speaker: speaker.to_string(),
            speaker_name,
            text: self.typewriter.revealed_text(),
            text_complete: self.typewriter.is_finished(),
            language,
            direction: language.direction(),
            emotion: emotion.map(|value| value.to_string()),
            choices,
        })
    }

    fn current_node(&self) -> Option<&NodeCompiled> {
        self.story.node(&self.state.scene, &self.state.node)
    }

    fn on_typing_complete(&mut self) {
        if matches!(self.phase, Phase::Typing) {
            let is_branch = matches!(
                self.current_node().map(|node| &node.continuation),
                Some(Continuation::Branch { .. })
            );
            self.phase = if is_branch {
                Phase::ChoicePending
            } else {
                Phase::Idle
            };
        }
    }

    fn follow_target(&mut self, target: &ChoiceTarget) {
        match target {
            ChoiceTarget::Node(node_id) => self.show_node(node_id),
            ChoiceTarget::Scene(scene_id) => self.enter_scene(scene_id, None, true),
        }
    }

    /// Scene transition: applies presentation defaults, swaps the music,
    /// shows the entry node, and autosaves.
    fn enter_scene(&mut self, scene_id: &str, entry_override: Option<&str>, autosave: bool) {
        let Some(scene) = self.story.scene(scene_id) else {
            error!("scene '{scene_id}' not found; playback held at current node");
            return;
        };
        let entry = entry_override.unwrap_or(&scene.entry).to_string();
        let bgm = scene.bgm.clone();
        if self.story.node(scene_id, &entry).is_none() {
            error!("scene '{scene_id}': entry node '{entry}' not found; playback held at current node");
            return;
        }
        self.state.scene = scene_id.to_string();
        self.started = true;
        self.audio.play_bgm(bgm.as_deref());
        self.audio.play_sfx(TRANSITION_SFX);
        self.show_node(&entry);
        if autosave {
            if let Err(err) = self.save(SlotKey::Auto) {
                warn!("autosave failed: {err}");
            }
        }
    }

    /// Displays a node in the current scene. An unresolved id (authoring
    /// bug surviving a lenient compile) is logged and leaves playback at
    /// the current node.
    fn show_node(&mut self, node_id: &str) {
        let Some(node) = self.story.node(&self.state.scene, node_id) else {
            error!(
                "dialog node '{node_id}' not found in scene '{}'; playback held at current node",
                self.state.scene
            );
            return;
        };
        let sfx = node.sfx.clone();
        let speed = node.speed;
        let is_branch = matches!(node.continuation, Continuation::Branch { .. });
        let text = node.text.clone();

        self.state.node = node_id.to_string();
        if let Some(sfx) = sfx {
            self.audio.play_sfx(&sfx);
        }
        self.audio
            .play_voice(&self.state.scene, node_id, VoiceCue::Node);
        self.typewriter.start(text.get(self.state.language), speed);
        self.phase = if self.typewriter.is_finished() {
            if is_branch {
                Phase::ChoicePending
            } else {
                Phase::Idle
            }
        } else {
            Phase::Typing
        };
    }

    fn restore(&mut self, record: SaveRecord) -> VnResult<()> {
        let EngineState {
            scene,
            node,
            language,
            flags,
        } = record.state;
        if self.story.scene(&scene).is_none() {
            return Err(VnError::UnknownScene(scene));
        }
        if self.story.node(&scene, &node).is_none() {
            return Err(VnError::UnknownNode { scene, node });
        }
        self.state.language = language;
        self.state.flags = flags;
        self.enter_scene(&scene, Some(&node), false);
        Ok(())
    }
}
