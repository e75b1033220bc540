//! Audio coordination: one background-music channel, one voice channel,
//! and fire-and-forget sound effects.
//!
//! Playback is best-effort. Every backend failure is logged and absorbed
//! here; nothing audio-related ever blocks a dialogue transition.
//!
//! Fades are stepped ramps advanced by [`AudioCoordinator::tick`]. Each
//! `play_bgm` call establishes a new generation token, and a ramp whose
//! captured token no longer matches the coordinator's current one drops
//! itself instead of touching the channel. This keeps a superseded
//! fade-out from clobbering the track that replaced it.

use std::time::Duration;

use log::{debug, warn};
use thiserror::Error;

/// Number of volume steps in a fade ramp.
pub const FADE_STEPS: u32 = 20;

/// Total duration of a fade ramp.
pub const FADE_DURATION: Duration = Duration::from_millis(1000);

/// Default channel volumes.
const DEFAULT_BGM_VOLUME: f32 = 0.3;
const DEFAULT_SFX_VOLUME: f32 = 0.5;
const DEFAULT_VOICE_VOLUME: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Bgm,
    Sfx,
    Voice,
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("missing audio asset '{0}'")]
    MissingAsset(String),
    #[error("playback failed for '{asset}': {reason}")]
    Playback { asset: String, reason: String },
}

/// Playback backend behind the coordinator.
///
/// `Sfx` starts are independent and may overlap each other; `Bgm` and
/// `Voice` starts replace whatever the channel was playing.
pub trait AudioBackend {
    fn start(
        &mut self,
        channel: Channel,
        asset: &str,
        volume: f32,
        looped: bool,
    ) -> Result<(), AudioError>;
    fn stop(&mut self, channel: Channel);
    fn set_channel_volume(&mut self, channel: Channel, volume: f32);
}

/// Backend that plays nothing, for headless hosts and tests.
#[derive(Debug, Default)]
pub struct NullBackend;

impl AudioBackend for NullBackend {
    fn start(
        &mut self,
        _channel: Channel,
        _asset: &str,
        _volume: f32,
        _looped: bool,
    ) -> Result<(), AudioError> {
        Ok(())
    }

    fn stop(&mut self, _channel: Channel) {}

    fn set_channel_volume(&mut self, _channel: Channel, _volume: f32) {}
}

/// Which voice asset a node coordinate resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoiceCue {
    Node,
    Choice(usize),
    Response(usize),
}

/// Deterministic voice asset id for a node coordinate.
pub fn voice_asset_id(scene_id: &str, node_id: &str, cue: VoiceCue) -> String {
    let base = format!("{scene_id}_{node_id:0>3}");
    match cue {
        VoiceCue::Node => base,
        VoiceCue::Choice(index) => format!("{base}_choice_{index}"),
        VoiceCue::Response(index) => format!("{base}_response_{index}"),
    }
}

#[derive(Clone, Debug)]
struct Fade {
    generation: u64,
    step: u32,
    stage: FadeStage,
}

#[derive(Clone, Debug)]
enum FadeStage {
    /// Ramp down; optionally start another track once silent.
    Out { then: Option<String> },
    /// Ramp up to the configured BGM volume.
    In,
}

/// Owns the BGM, SFX, and voice channels and their fade sequencing.
#[derive(Debug)]
pub struct AudioCoordinator<A: AudioBackend> {
    backend: A,
    bgm_volume: f32,
    sfx_volume: f32,
    voice_volume: f32,
    current_bgm: Option<String>,
    generation: u64,
    fade: Option<Fade>,
    interacted: bool,
    pending_bgm: Option<String>,
}

impl<A: AudioBackend> AudioCoordinator<A> {
    pub fn new(backend: A) -> Self {
        Self {
            backend,
            bgm_volume: DEFAULT_BGM_VOLUME,
            sfx_volume: DEFAULT_SFX_VOLUME,
            voice_volume: DEFAULT_VOICE_VOLUME,
            current_bgm: None,
            generation: 0,
            fade: None,
            interacted: false,
            pending_bgm: None,
        }
    }

    /// Switches the background track with a fade-out/fade-in sequence.
    ///
    /// A request for the already-playing track is a no-op. Before the
    /// first user interaction the request is latched and replayed exactly
    /// once by [`Self::notify_interaction`]; each call overwrites the
    /// latch, so a later `None` cancels it. After the gate opens, `None`
    /// fades out and stops.
    pub fn play_bgm(&mut self, track: Option<&str>) {
        if !self.interacted {
            // Nothing plays before the gate opens, so the latch always
            // mirrors the most recent request: a later `None` cancels an
            // earlier latched track.
            match track {
                Some(track) => debug!("audio gate closed, latching bgm '{track}' as pending"),
                None => debug!("audio gate closed, clearing pending bgm"),
            }
            self.pending_bgm = track.map(str::to_string);
            return;
        }
        if self.current_bgm.as_deref() == track {
            return;
        }
        self.generation += 1;
        let generation = self.generation;
        if self.current_bgm.is_some() {
            self.fade = Some(Fade {
                generation,
                step: 0,
                stage: FadeStage::Out {
                    then: track.map(str::to_string),
                },
            });
        } else if let Some(track) = track {
            self.begin_track(track.to_string(), generation);
        } else {
            self.fade = None;
        }
    }

    fn begin_track(&mut self, track: String, generation: u64) {
        if let Err(err) = self.backend.start(Channel::Bgm, &track, 0.0, true) {
            warn!("bgm '{track}' failed to start: {err}");
            self.current_bgm = None;
            self.fade = None;
            return;
        }
        self.current_bgm = Some(track);
        self.fade = Some(Fade {
            generation,
            step: 0,
            stage: FadeStage::In,
        });
    }

    /// Records the first user interaction and replays a latched BGM request.
    pub fn notify_interaction(&mut self) {
        if self.interacted {
            return;
        }
        self.interacted = true;
        if let Some(track) = self.pending_bgm.take() {
            debug!("audio gate opened, replaying pending bgm '{track}'");
            self.play_bgm(Some(&track));
        }
    }

    /// Plays a sound effect at the configured SFX volume.
    pub fn play_sfx(&mut self, effect: &str) {
        if let Err(err) = self.backend.start(Channel::Sfx, effect, self.sfx_volume, false) {
            warn!("sfx '{effect}' failed: {err}");
        }
    }

    /// Plays the voice line for a node coordinate, preempting the
    /// previous one. Missing assets are flavor, not failures.
    pub fn play_voice(&mut self, scene_id: &str, node_id: &str, cue: VoiceCue) {
        self.backend.stop(Channel::Voice);
        let asset = voice_asset_id(scene_id, node_id, cue);
        if let Err(err) = self
            .backend
            .start(Channel::Voice, &asset, self.voice_volume, false)
        {
            warn!("voice line '{asset}' unavailable: {err}");
        }
    }

    /// Clamps and stores a channel volume, applying it to current playback.
    pub fn set_volume(&mut self, channel: Channel, value: f32) {
        let value = value.clamp(0.0, 1.0);
        match channel {
            Channel::Bgm => self.bgm_volume = value,
            Channel::Sfx => self.sfx_volume = value,
            Channel::Voice => self.voice_volume = value,
        }
        // A ramp in flight owns the BGM volume until it completes.
        if !(channel == Channel::Bgm && self.fade.is_some()) {
            self.backend.set_channel_volume(channel, value);
        }
    }

    /// Advances an in-flight fade one step.
    pub fn tick(&mut self) {
        let Some(fade) = self.fade.take() else {
            return;
        };
        if fade.generation != self.generation {
            // Superseded by a newer play request; drop without touching
            // the channel.
            return;
        }
        let step = fade.step + 1;
        let fraction = step as f32 / FADE_STEPS as f32;
        match fade.stage {
            FadeStage::Out { then } => {
                self.backend
                    .set_channel_volume(Channel::Bgm, self.bgm_volume * (1.0 - fraction));
                if step >= FADE_STEPS {
                    self.backend.stop(Channel::Bgm);
                    self.current_bgm = None;
                    if let Some(track) = then {
                        self.begin_track(track, fade.generation);
                    }
                } else {
                    self.fade = Some(Fade {
                        generation: fade.generation,
                        step,
                        stage: FadeStage::Out { then },
                    });
                }
            }
            FadeStage::In => {
                self.backend
                    .set_channel_volume(Channel::Bgm, self.bgm_volume * fraction);
                if step < FADE_STEPS {
                    self.fade = Some(Fade {
                        generation: fade.generation,
                        step,
                        stage: FadeStage::In,
                    });
                }
            }
        }
    }

    /// Silences every channel and clears any pending request.
    pub fn stop_all(&mut self) {
        self.backend.stop(Channel::Bgm);
        self.backend.stop(Channel::Voice);
        self.backend.stop(Channel::Sfx);
        self.current_bgm = None;
        self.pending_bgm = None;
        self.fade = None;
    }

    pub fn current_bgm(&self) -> Option<&str> {
        self.current_bgm.as_deref()
    }

    pub fn volume(&self, channel: Channel) -> f32 {
        match channel {
            Channel::Bgm => self.bgm_volume,
            Channel::Sfx => self.sfx_volume,
            Channel::Voice => self.voice_volume,
        }
    }

    pub fn has_interacted(&self) -> bool {
        self.interacted
    }

    pub fn fade_in_progress(&self) -> bool {
        self.fade.is_some()
    }
}
