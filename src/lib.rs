//! Branching-dialogue engine for a dual-language visual novel.
//!
//! The crate drives a static, pre-authored story graph: scenes holding
//! dialog nodes, each node with exactly one continuation mechanism
//! (auto-advance, scene transition, choices, or terminal). The engine
//! owns the playback cursor and the typewriter reveal, and coordinates
//! two injected collaborators: an [`AudioCoordinator`] for music, sound
//! effects, and voice lines, and a [`SaveCoordinator`] for slot-addressed
//! snapshots.
//!
//! Hosts parse a [`StoryRaw`] from JSON, compile it (validation reports
//! every broken reference at once), and hand the compiled story plus the
//! collaborators to [`Engine::new`]. All entry points are synchronous;
//! the host's event loop calls [`Engine::tick`] to drive the reveal and
//! any audio fade in flight.

mod audio;
mod engine;
mod error;
mod language;
mod save;
mod state;
mod story;
mod typewriter;
mod version;

pub use audio::{
    voice_asset_id, AudioBackend, AudioCoordinator, AudioError, Channel, NullBackend, VoiceCue,
    FADE_DURATION, FADE_STEPS,
};
pub use engine::{DialogueView, Engine};
pub use error::{VnError, VnResult};
pub use language::{Direction, Language, LocalizedText};
pub use save::{
    FsSlotStore, MemorySlotStore, SaveCoordinator, SaveError, SaveRecord, SaveStoreError, SlotKey,
    SlotStore, SlotSummary, MAX_NUMBERED_SLOTS,
};
pub use state::{EngineState, FlagValue};
pub use story::{
    ChoiceCompiled, ChoiceRaw, ChoiceTarget, Continuation, LocalizedLine, NodeCompiled, NodeRaw,
    ResponseCompiled, ResponseRaw, SceneCompiled, SceneRaw, SharedStr, StoryCompiled, StoryRaw,
};
pub use typewriter::{Typewriter, TypingSpeed};
pub use version::{SAVE_BINARY_MAGIC, SAVE_FORMAT_VERSION, STORY_SCHEMA_VERSION};
