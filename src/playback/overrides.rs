use std::collections::BTreeMap;

use crate::document::model::{Timeline, TimelineId};

/// Time source driving one symbol from outside the document.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct TrackTime {
    /// Frame the symbol renders at.
    pub time: f64,
    /// Frames advanced since the previous pass (0 after a seek).
    pub delta: f64,
}

/// Host-owned instance-time overrides consulted by the evaluator.
///
/// Variation slots pin every instance of an anchored symbol to a frame; clip tracks drive a
/// symbol's instances from an independent clock. A slot override wins over a track.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameOverrides {
    slots: Vec<Option<f64>>,
    tracks: BTreeMap<TimelineId, TrackTime>,
}

impl FrameOverrides {
    /// Create a table sized for `slots` variation slots.
    pub fn with_slots(slots: u32) -> Self {
        Self {
            slots: vec![None; slots as usize],
            tracks: BTreeMap::new(),
        }
    }

    /// Number of variation slots.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Set or clear the frame override for a slot. Out-of-range slots grow the table.
    pub fn set_slot(&mut self, slot: u32, frame: Option<f64>) {
        let i = slot as usize;
        if i >= self.slots.len() {
            if frame.is_none() {
                return;
            }
            self.slots.resize(i + 1, None);
        }
        self.slots[i] = frame;
    }

    /// Frame override for a slot.
    pub fn slot(&self, slot: u32) -> Option<f64> {
        self.slots.get(slot as usize).copied().flatten()
    }

    /// Drive `timeline`'s instances from a track clock.
    pub fn set_track(&mut self, timeline: TimelineId, time: TrackTime) {
        self.tracks.insert(timeline, time);
    }

    /// Stop driving `timeline` from a track.
    pub fn clear_track(&mut self, timeline: TimelineId) {
        self.tracks.remove(&timeline);
    }

    /// Current track time for `timeline`.
    pub fn track(&self, timeline: TimelineId) -> Option<TrackTime> {
        self.tracks.get(&timeline).copied()
    }

    /// Drop every override.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
        self.tracks.clear();
    }

    /// Instance time and delta after applying overrides for the referenced timeline.
    pub fn resolve(&self, id: TimelineId, tl: &Timeline, time: f64, delta: f64) -> (f64, f64) {
        if let Some(frame) = tl.variation_slot.and_then(|s| self.slot(s)) {
            return (frame, 0.0);
        }
        match self.track(id) {
            Some(t) => (t.time, t.delta),
            None => (time, delta),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/overrides.rs"]
mod tests;
