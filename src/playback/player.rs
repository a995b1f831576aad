use std::collections::BTreeMap;

use image::Rgba32FImage;

use crate::document::model::{Document, TimelineId};
use crate::eval::evaluator::{EvalOpts, Evaluator};
use crate::eval::mask::ClipItem;
use crate::foundation::core::{Affine, FrameSpan};
use crate::foundation::error::{XflError, XflResult};
use crate::playback::overrides::{FrameOverrides, TrackTime};
use crate::playback::track::{ClipTrack, PlayCursor, TrackStatus, resolve_clip};
use crate::render::batch::Batch;
use crate::render::clip_texture::build_clip_texture;
use crate::render::fingerprint::BatchFingerprint;

/// Player options.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlayerOpts {
    /// Playback rate in frames per second; the document's rate when `None`.
    pub frame_rate: Option<f64>,
    /// Loop the playback window instead of stopping at its end.
    pub looping: bool,
    /// Deepest nested-symbol level evaluated.
    pub max_depth: usize,
}

impl Default for PlayerOpts {
    fn default() -> Self {
        Self {
            frame_rate: None,
            looping: false,
            max_depth: EvalOpts::default().max_depth,
        }
    }
}

impl PlayerOpts {
    /// Parse options from JSON; absent fields keep their defaults.
    pub fn from_json_str(s: &str) -> XflResult<Self> {
        serde_json::from_str(s).map_err(|e| XflError::serde(e.to_string()))
    }
}

/// Whether the main frame pointer moves on [`Player::advance`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub enum PlayState {
    /// Only seeks move the pointer.
    #[default]
    Stopped,
    /// Every advance moves the pointer.
    Playing,
}

/// What one [`Player::advance`] produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Advance {
    /// Completion signals from the main window.
    pub completed: u32,
    /// Events fired by the evaluation pass, in order.
    pub events: Vec<String>,
    /// Whether the batch differs from the previous pass.
    pub changed: bool,
}

/// Snapshot of the main playback window.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PlaybackStatus {
    /// Play state.
    pub state: PlayState,
    /// Token of the active timeline.
    pub timeline: String,
    /// Selected clip, if any.
    pub clip: Option<String>,
    /// Current frame.
    pub frame: f64,
    /// Window start frame.
    pub playback_start: f64,
    /// Window end frame.
    pub playback_end: f64,
    /// Elapsed and remaining seconds.
    pub time: TrackStatus,
}

/// Playback driver for one document.
///
/// Owns the frame pointer, clip tracks, and override table, and coalesces state changes into at
/// most one evaluation pass per [`Player::evaluate`] call.
#[derive(Debug)]
pub struct Player {
    doc: Document,
    evaluator: Evaluator,
    overrides: FrameOverrides,
    state: PlayState,
    frame_rate: f64,
    active: TimelineId,
    clip: Option<String>,
    cursor: PlayCursor,
    tracks: BTreeMap<String, ClipTrack>,
    batch: Batch,
    events: Vec<String>,
    fingerprint: Option<BatchFingerprint>,
    batched_frame: Option<f64>,
    pending_delta: f64,
    dirty: bool,
}

impl Player {
    /// Build a player on the document's main timeline.
    pub fn new(doc: Document, opts: &PlayerOpts) -> XflResult<Self> {
        let active = doc
            .main_timeline()
            .ok_or_else(|| XflError::validation("document has no timeline"))?;
        let span = doc
            .timeline(active)
            .map(|t| t.full_span())
            .unwrap_or(FrameSpan::new(0, 0));
        let frame_rate = opts.frame_rate.unwrap_or(doc.frame_rate());
        if frame_rate.is_nan() || frame_rate <= 0.0 {
            return Err(XflError::validation(format!(
                "frame rate must be positive, got {frame_rate}"
            )));
        }
        Ok(Self {
            overrides: FrameOverrides::with_slots(doc.variation_slot_count()),
            evaluator: Evaluator::new(EvalOpts {
                max_depth: opts.max_depth,
            }),
            doc,
            state: PlayState::Stopped,
            frame_rate,
            active,
            clip: None,
            cursor: PlayCursor::new(span, opts.looping),
            tracks: BTreeMap::new(),
            batch: Batch::new(),
            events: Vec::new(),
            fingerprint: None,
            batched_frame: None,
            pending_delta: 0.0,
            dirty: true,
        })
    }

    /// The played document.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Frames per second.
    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Start moving the pointer on advance.
    pub fn play(&mut self) {
        self.state = PlayState::Playing;
    }

    /// Stop moving the pointer on advance.
    pub fn stop(&mut self) {
        self.state = PlayState::Stopped;
    }

    /// Current play state.
    pub fn state(&self) -> PlayState {
        self.state
    }

    /// Loop or clamp at the window end.
    pub fn set_looping(&mut self, looping: bool) {
        self.cursor.looping = looping;
    }

    /// Current main frame.
    pub fn frame(&self) -> f64 {
        self.cursor.frame
    }

    /// Active timeline id.
    pub fn active_timeline(&self) -> TimelineId {
        self.active
    }

    /// Switch to a symbol by token, or back to the main timeline with `None`.
    ///
    /// Unknown tokens fall back to the main timeline. Resets the window and clears the clip.
    pub fn set_active_timeline(&mut self, token: Option<&str>) {
        let main = self.doc.main_timeline().unwrap_or(self.active);
        self.active = match token {
            Some(t) => self.doc.find_timeline(t).unwrap_or_else(|| {
                tracing::warn!(timeline = %t, "unknown timeline, using main");
                main
            }),
            None => main,
        };
        self.clip = None;
        self.rewind();
    }

    /// Select a named clip of the active timeline; `None` or an unknown name plays it whole.
    pub fn set_clip(&mut self, clip: Option<&str>) {
        self.clip = clip.map(str::to_owned);
        self.rewind();
    }

    fn rewind(&mut self) {
        let span = match self.doc.timeline(self.active) {
            Some(tl) => {
                let (clip, span) = resolve_clip(tl, self.clip.as_deref());
                self.clip = clip;
                span
            }
            None => FrameSpan::new(0, 0),
        };
        self.cursor.reset(span);
        self.batched_frame = None;
        self.pending_delta = 0.0;
        self.dirty = true;
    }

    /// Pin every instance of `symbol` to one of its variants (anchor labels); `None` clears it.
    ///
    /// Unknown symbols, symbols without variants, and unknown variant names clear the override.
    pub fn set_variant(&mut self, symbol: &str, variant: Option<&str>) {
        let Some(tl) = self.doc.symbol(symbol).and_then(|id| self.doc.timeline(id)) else {
            tracing::warn!(symbol = %symbol, "set_variant on unknown symbol");
            return;
        };
        let Some(slot) = tl.variation_slot else {
            tracing::warn!(symbol = %symbol, "symbol has no variants");
            return;
        };
        let frame = variant.and_then(|v| {
            let f = tl.variant(v);
            if f.is_none() {
                tracing::warn!(symbol = %symbol, variant = %v, "unknown variant");
            }
            f
        });
        self.overrides.set_slot(slot, frame.map(f64::from));
        self.dirty = true;
    }

    /// Pin every instance of `symbol` to a raw frame; `None` clears it.
    pub fn override_frame(&mut self, symbol: &str, frame: Option<f64>) {
        let slot = self
            .doc
            .symbol(symbol)
            .and_then(|id| self.doc.timeline(id))
            .and_then(|t| t.variation_slot);
        match slot {
            Some(slot) => {
                self.overrides.set_slot(slot, frame);
                self.dirty = true;
            }
            None => tracing::warn!(symbol = %symbol, "frame override needs a symbol with variants"),
        }
    }

    /// Override table consulted by evaluation.
    pub fn overrides(&self) -> &FrameOverrides {
        &self.overrides
    }

    /// Start or re-target the clip track driving `symbol`. Elapsed time restarts at zero.
    ///
    /// Returns `false` when the symbol is unknown.
    pub fn set_track_clip(&mut self, symbol: &str, clip: Option<&str>, looping: bool) -> bool {
        let Some(id) = self.doc.symbol(symbol) else {
            tracing::warn!(symbol = %symbol, "clip track on unknown symbol");
            return false;
        };
        let Some(tl) = self.doc.timeline(id) else {
            return false;
        };
        match self.tracks.get_mut(symbol) {
            Some(track) => {
                track.select(tl, clip);
                track.cursor.looping = looping;
            }
            None => {
                self.tracks
                    .insert(symbol.to_owned(), ClipTrack::new(id, tl, clip, looping));
            }
        }
        if let Some(track) = self.tracks.get(symbol) {
            self.overrides.set_track(
                id,
                TrackTime {
                    time: track.time(),
                    delta: 0.0,
                },
            );
        }
        self.dirty = true;
        true
    }

    /// Stop the clip track driving `symbol`.
    pub fn remove_track(&mut self, symbol: &str) {
        if let Some(track) = self.tracks.remove(symbol) {
            self.overrides.clear_track(track.timeline);
            self.dirty = true;
        }
    }

    /// Track state, if the track exists.
    pub fn track(&self, symbol: &str) -> Option<&ClipTrack> {
        self.tracks.get(symbol)
    }

    /// Advance one clip track by `dt` seconds independently of the main pointer.
    pub fn advance_track(&mut self, symbol: &str, dt: f64, seek: bool) -> Option<TrackStatus> {
        let fps = self.frame_rate;
        let track = self.tracks.get_mut(symbol)?;
        let step = track.cursor.advance(dt * fps, seek);
        self.overrides.set_track(
            track.timeline,
            TrackTime {
                time: track.time(),
                delta: step.delta,
            },
        );
        self.dirty = true;
        Some(TrackStatus::of(&track.cursor, fps))
    }

    /// Advance the main pointer and every clip track by `dt` seconds, then evaluate.
    ///
    /// While stopped only a seek moves the main pointer.
    pub fn advance(&mut self, dt: f64, seek: bool) -> XflResult<Advance> {
        let frames = dt * self.frame_rate;
        let mut completed = 0;
        if seek || self.state == PlayState::Playing {
            let step = self.cursor.advance(frames, seek);
            completed = step.completed;
            if seek {
                self.pending_delta = 0.0;
            } else {
                self.pending_delta += step.delta;
            }
            self.dirty = true;
        }
        if self.state == PlayState::Playing && !seek {
            let symbols: Vec<String> = self.tracks.keys().cloned().collect();
            for s in symbols {
                self.advance_track(&s, dt, false);
            }
        }
        let changed = self.evaluate()?;
        Ok(Advance {
            completed,
            events: std::mem::take(&mut self.events),
            changed,
        })
    }

    /// Run one evaluation pass if anything changed since the last one.
    ///
    /// Returns whether the resulting batch differs from the previous one.
    pub fn evaluate(&mut self) -> XflResult<bool> {
        if !self.dirty && self.batched_frame == Some(self.cursor.frame) {
            return Ok(false);
        }
        let eval = self.evaluator.evaluate(
            &self.doc,
            self.active,
            self.cursor.frame,
            self.pending_delta,
            &self.overrides,
        )?;
        self.events.extend(eval.events);
        self.batch = eval.batch;
        self.batched_frame = Some(self.cursor.frame);
        self.pending_delta = 0.0;
        self.dirty = false;
        for track in self.tracks.values() {
            self.overrides.set_track(
                track.timeline,
                TrackTime {
                    time: track.time(),
                    delta: 0.0,
                },
            );
        }

        let fp = self.batch.fingerprint();
        let changed = self.fingerprint != Some(fp);
        self.fingerprint = Some(fp);
        Ok(changed)
    }

    /// Events produced by evaluation passes not yet returned from [`Player::advance`].
    pub fn take_events(&mut self) -> Vec<String> {
        std::mem::take(&mut self.events)
    }

    /// Geometry of the last pass.
    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    /// Clip chain snapshots referenced by the last batch.
    pub fn clip_items(&self) -> &[ClipItem] {
        self.evaluator.mask_stack().clipping_cache()
    }

    /// Clip encoding image for the last pass, with `world` mapping document space to screen.
    pub fn clip_texture(&self, world: Affine) -> Rgba32FImage {
        build_clip_texture(self.clip_items(), world)
    }

    /// Main window status.
    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            state: self.state,
            timeline: self
                .doc
                .timeline(self.active)
                .map(|t| t.token.clone())
                .unwrap_or_default(),
            clip: self.clip.clone(),
            frame: self.cursor.frame,
            playback_start: self.cursor.start,
            playback_end: self.cursor.end,
            time: TrackStatus::of(&self.cursor, self.frame_rate),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/player.rs"]
mod tests;
