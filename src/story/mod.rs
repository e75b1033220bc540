//! The static story graph: raw authored form and compiled runtime form.
//!
//! `StoryRaw` is the JSON-facing shape, a mapping of scenes each holding a
//! mapping of dialog nodes. Compiling decides every node's continuation
//! mechanism once, interns repeated strings, and resolves every
//! `next_id`/`next_scene_id` reference, reporting all broken references
//! at the same time instead of discovering them during play.

mod compiled;
mod raw;

pub use compiled::{
    ChoiceCompiled, ChoiceTarget, Continuation, LocalizedLine, NodeCompiled, ResponseCompiled,
    SceneCompiled, SharedStr, StoryCompiled,
};
pub use raw::{ChoiceRaw, NodeRaw, ResponseRaw, SceneRaw, StoryRaw};
