//! Durable snapshots of engine state, addressed by slot.
//!
//! A [`SaveRecord`] is framed as magic bytes, a format version, a crc32
//! checksum, a payload length, and a postcard payload. Any record that
//! fails framing or decoding is treated as absent rather than surfacing a
//! parse failure into playback.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::state::EngineState;
use crate::version::{SAVE_BINARY_MAGIC, SAVE_FORMAT_VERSION};

/// Numbered slots available in addition to the reserved auto slot.
pub const MAX_NUMBERED_SLOTS: u8 = 5;

/// Address of a save record. Slot `auto` is reserved for the engine's
/// autosave cadence and is silently overwritten.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SlotKey {
    Auto,
    Numbered(u8),
}

impl SlotKey {
    /// A numbered slot, if `n` is within `1..=MAX_NUMBERED_SLOTS`.
    pub fn numbered(n: u8) -> Option<SlotKey> {
        (1..=MAX_NUMBERED_SLOTS)
            .contains(&n)
            .then_some(SlotKey::Numbered(n))
    }

    /// Every slot in stable presentation order: auto first, then 1..=5.
    pub fn all() -> impl Iterator<Item = SlotKey> {
        std::iter::once(SlotKey::Auto)
            .chain((1..=MAX_NUMBERED_SLOTS).map(SlotKey::Numbered))
    }

    fn file_stem(self) -> String {
        match self {
            SlotKey::Auto => "autosave".to_string(),
            SlotKey::Numbered(n) => format!("slot_{n:03}"),
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotKey::Auto => write!(f, "auto"),
            SlotKey::Numbered(n) => write!(f, "{n}"),
        }
    }
}

/// A snapshot of engine state plus metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveRecord {
    pub timestamp_unix_ms: u64,
    pub scene_title: String,
    pub state: EngineState,
    #[serde(default)]
    pub screenshot: Option<Vec<u8>>,
}

impl SaveRecord {
    /// Captures `state` with the current wall-clock timestamp.
    pub fn capture(state: EngineState, scene_title: String, screenshot: Option<Vec<u8>>) -> Self {
        Self {
            timestamp_unix_ms: now_unix_ms(),
            scene_title,
            state,
            screenshot,
        }
    }

    /// Serializes to the framed binary format.
    pub fn to_binary(&self) -> Result<Vec<u8>, SaveError> {
        let payload =
            postcard::to_allocvec(self).map_err(|e| SaveError::Serialization(e.to_string()))?;
        let checksum = crc32fast::hash(&payload);
        let payload_len = u32::try_from(payload.len()).map_err(|_| SaveError::TooLarge)?;

        let mut output = Vec::with_capacity(4 + 2 + 4 + 4 + payload.len());
        output.extend_from_slice(&SAVE_BINARY_MAGIC);
        output.extend_from_slice(&SAVE_FORMAT_VERSION.to_le_bytes());
        output.extend_from_slice(&checksum.to_le_bytes());
        output.extend_from_slice(&payload_len.to_le_bytes());
        output.extend_from_slice(&payload);
        Ok(output)
    }

    /// Deserializes from the framed binary format, validating magic,
    /// version, and checksum.
    pub fn from_binary(input: &[u8]) -> Result<Self, SaveError> {
        if input.len() < 14 {
            return Err(SaveError::TooSmall);
        }
        if input[0..4] != SAVE_BINARY_MAGIC {
            return Err(SaveError::InvalidMagic);
        }
        let version = u16::from_le_bytes([input[4], input[5]]);
        if version != SAVE_FORMAT_VERSION {
            return Err(SaveError::IncompatibleVersion {
                found: version,
                expected: SAVE_FORMAT_VERSION,
            });
        }
        let checksum = u32::from_le_bytes([input[6], input[7], input[8], input[9]]);
        let payload_len = u32::from_le_bytes([input[10], input[11], input[12], input[13]]) as usize;
        let payload = input.get(14..).ok_or(SaveError::MissingPayload)?;
        if payload.len() != payload_len {
            return Err(SaveError::LengthMismatch);
        }
        if crc32fast::hash(payload) != checksum {
            return Err(SaveError::ChecksumMismatch);
        }
        postcard::from_bytes(payload).map_err(|e| SaveError::Serialization(e.to_string()))
    }
}

/// Errors in the save record format itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveError {
    TooSmall,
    TooLarge,
    InvalidMagic,
    IncompatibleVersion { found: u16, expected: u16 },
    ChecksumMismatch,
    LengthMismatch,
    MissingPayload,
    Serialization(String),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooSmall => write!(f, "save record too small"),
            Self::TooLarge => write!(f, "save record too large"),
            Self::InvalidMagic => write!(f, "invalid save record magic bytes"),
            Self::IncompatibleVersion { found, expected } => {
                write!(
                    f,
                    "incompatible save version: found {found}, expected {expected}"
                )
            }
            Self::ChecksumMismatch => write!(f, "save record checksum mismatch"),
            Self::LengthMismatch => write!(f, "save record length mismatch"),
            Self::MissingPayload => write!(f, "save record missing payload"),
            Self::Serialization(msg) => write!(f, "serialization error: {msg}"),
        }
    }
}

impl std::error::Error for SaveError {}

/// Errors from the backing slot store.
#[derive(Debug)]
pub enum SaveStoreError {
    Io(std::io::Error),
    Save(SaveError),
}

impl fmt::Display for SaveStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveStoreError::Io(err) => write!(f, "save store io error: {err}"),
            SaveStoreError::Save(err) => write!(f, "save store serialization error: {err}"),
        }
    }
}

impl std::error::Error for SaveStoreError {}

impl From<std::io::Error> for SaveStoreError {
    fn from(value: std::io::Error) -> Self {
        SaveStoreError::Io(value)
    }
}

impl From<SaveError> for SaveStoreError {
    fn from(value: SaveError) -> Self {
        SaveStoreError::Save(value)
    }
}

/// Key-value storage addressed by slot. Any durable KV store satisfies
/// the contract; values are opaque framed records.
pub trait SlotStore {
    fn get(&self, slot: SlotKey) -> Result<Option<Vec<u8>>, SaveStoreError>;
    fn put(&mut self, slot: SlotKey, bytes: &[u8]) -> Result<(), SaveStoreError>;
    fn delete(&mut self, slot: SlotKey) -> Result<(), SaveStoreError>;
}

/// In-memory store, the browser-local-storage analogue.
#[derive(Debug, Default)]
pub struct MemorySlotStore {
    slots: BTreeMap<SlotKey, Vec<u8>>,
}

impl SlotStore for MemorySlotStore {
    fn get(&self, slot: SlotKey) -> Result<Option<Vec<u8>>, SaveStoreError> {
        Ok(self.slots.get(&slot).cloned())
    }

    fn put(&mut self, slot: SlotKey, bytes: &[u8]) -> Result<(), SaveStoreError> {
        self.slots.insert(slot, bytes.to_vec());
        Ok(())
    }

    fn delete(&mut self, slot: SlotKey) -> Result<(), SaveStoreError> {
        self.slots.remove(&slot);
        Ok(())
    }
}

/// Filesystem store with atomic temp-file-then-rename writes.
#[derive(Debug)]
pub struct FsSlotStore {
    root: PathBuf,
}

impl FsSlotStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, slot: SlotKey) -> PathBuf {
        self.root.join(format!("{}.vnsav", slot.file_stem()))
    }
}

impl SlotStore for FsSlotStore {
    fn get(&self, slot: SlotKey) -> Result<Option<Vec<u8>>, SaveStoreError> {
        match fs::read(self.slot_path(slot)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(SaveStoreError::Io(err)),
        }
    }

    fn put(&mut self, slot: SlotKey, bytes: &[u8]) -> Result<(), SaveStoreError> {
        fs::create_dir_all(&self.root)?;
        let path = self.slot_path(slot);
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, bytes)?;
        if path.exists() {
            fs::remove_file(&path)?;
        }
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn delete(&mut self, slot: SlotKey) -> Result<(), SaveStoreError> {
        let path = self.slot_path(slot);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Summary of a slot for the save/load menu. Empty slots are reported as
/// empty rather than omitted, preserving stable slot indexing.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotSummary {
    pub slot: SlotKey,
    pub timestamp_unix_ms: Option<u64>,
    pub scene_title: Option<String>,
    pub has_screenshot: bool,
}

impl SlotSummary {
    pub fn is_empty(&self) -> bool {
        self.timestamp_unix_ms.is_none()
    }
}

/// Serializes and restores save records over a [`SlotStore`].
#[derive(Debug)]
pub struct SaveCoordinator<S: SlotStore> {
    store: S,
}

impl<S: SlotStore> SaveCoordinator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn save(&mut self, slot: SlotKey, record: &SaveRecord) -> Result<(), SaveStoreError> {
        let bytes = record.to_binary()?;
        self.store.put(slot, &bytes)
    }

    /// Loads a slot. Absent and corrupt records both come back as `None`;
    /// a corrupt record is logged.
    pub fn load(&self, slot: SlotKey) -> Result<Option<SaveRecord>, SaveStoreError> {
        let Some(bytes) = self.store.get(slot)? else {
            return Ok(None);
        };
        match SaveRecord::from_binary(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(err) => {
                warn!("slot {slot}: corrupt save record treated as empty: {err}");
                Ok(None)
            }
        }
    }

    pub fn delete(&mut self, slot: SlotKey) -> Result<(), SaveStoreError> {
        self.store.delete(slot)
    }

    /// Lazy, restartable sequence of slot summaries in stable order.
    pub fn list_slots(&self) -> impl Iterator<Item = SlotSummary> + '_ {
        SlotKey::all().map(move |slot| match self.load(slot) {
            Ok(Some(record)) => SlotSummary {
                slot,
                timestamp_unix_ms: Some(record.timestamp_unix_ms),
                scene_title: Some(record.scene_title),
                has_screenshot: record.screenshot.is_some(),
            },
            _ => SlotSummary {
                slot,
                timestamp_unix_ms: None,
                scene_title: None,
                has_screenshot: false,
            },
        })
    }
}

pub(crate) fn now_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}
