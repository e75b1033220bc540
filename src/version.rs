//! Format versioning constants for stories and saves.
//!
//! Every serialized format carries an explicit version so that
//! incompatible data is rejected up front instead of misparsed.

/// Current schema version for JSON stories.
/// Increment MINOR for compatible changes, MAJOR for breaking changes.
pub const STORY_SCHEMA_VERSION: &str = "1.0";

/// Current format version for save records.
/// Increment when `EngineState` or `SaveRecord` serialization changes.
pub const SAVE_FORMAT_VERSION: u16 = 1;

/// Magic bytes for save records.
pub const SAVE_BINARY_MAGIC: [u8; 4] = *b"VNDS";
