use crate::document::model::{Timeline, TimelineId};
use crate::foundation::core::FrameSpan;
use crate::foundation::math::FRAME_EPSILON;

/// Result of moving a cursor.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Step {
    /// Times the end of the window was reached (wraps when looping, at most one clamp otherwise).
    pub completed: u32,
    /// Frames swept, `0` for a seek.
    pub delta: f64,
}

/// A frame pointer moving through a `[start, end)` playback window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayCursor {
    /// Window start frame.
    pub start: f64,
    /// Window end frame.
    pub end: f64,
    /// Current frame.
    pub frame: f64,
    /// Wrap at the end instead of clamping.
    pub looping: bool,
    clamped: bool,
}

impl PlayCursor {
    /// Cursor at the start of `span`.
    pub fn new(span: FrameSpan, looping: bool) -> Self {
        Self {
            start: f64::from(span.start),
            end: f64::from(span.end),
            frame: f64::from(span.start),
            looping,
            clamped: false,
        }
    }

    /// Replace the window and rewind to its start.
    pub fn reset(&mut self, span: FrameSpan) {
        *self = Self::new(span, self.looping);
    }

    /// Frames since the window start.
    pub fn elapsed(&self) -> f64 {
        self.frame - self.start
    }

    /// Frames left before the window end.
    pub fn remaining(&self) -> f64 {
        (self.end - self.frame).max(0.0)
    }

    /// Move by `frames`. A seek places the cursor at `start + frames` and sweeps nothing.
    ///
    /// Without looping, passing the end clamps just below it and reports completion once until
    /// the cursor is rewound. With looping, each wrap reports one completion.
    pub fn advance(&mut self, frames: f64, seek: bool) -> Step {
        let delta = if seek {
            self.frame = self.start + frames;
            self.clamped = false;
            0.0
        } else {
            self.frame += frames;
            frames
        };

        let mut completed = 0;
        if !self.looping {
            if self.frame > self.end {
                self.frame = (self.end - FRAME_EPSILON).max(self.start);
                if !self.clamped {
                    completed = 1;
                    self.clamped = true;
                }
            }
        } else {
            let len = self.end - self.start;
            if len <= 0.0 {
                self.frame = self.start;
            } else if self.frame > self.end {
                let wraps = ((self.frame - self.end) / len).ceil();
                self.frame -= wraps * len;
                completed = wraps as u32;
            }
        }
        Step { completed, delta }
    }
}

/// Elapsed and remaining time of a cursor, in seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct TrackStatus {
    /// Seconds since the window start.
    pub elapsed: f64,
    /// Seconds until the window end.
    pub remaining: f64,
}

impl TrackStatus {
    /// Convert a cursor's frame counts at `fps`.
    pub fn of(cursor: &PlayCursor, fps: f64) -> Self {
        if fps <= 0.0 {
            return Self::default();
        }
        Self {
            elapsed: cursor.elapsed() / fps,
            remaining: cursor.remaining() / fps,
        }
    }
}

/// Independently clocked playback of one symbol's named clip.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipTrack {
    /// Symbol the track drives.
    pub timeline: TimelineId,
    /// Selected clip; `None` plays the whole timeline.
    pub clip: Option<String>,
    /// Frame pointer inside the clip window.
    pub cursor: PlayCursor,
}

impl ClipTrack {
    /// Create a track on `tl` playing `clip`.
    pub fn new(id: TimelineId, tl: &Timeline, clip: Option<&str>, looping: bool) -> Self {
        let (clip, span) = resolve_clip(tl, clip);
        Self {
            timeline: id,
            clip,
            cursor: PlayCursor::new(span, looping),
        }
    }

    /// Switch clip: rewinds elapsed time to zero and re-resolves the window.
    pub fn select(&mut self, tl: &Timeline, clip: Option<&str>) {
        let (clip, span) = resolve_clip(tl, clip);
        self.clip = clip;
        self.cursor.reset(span);
    }

    /// Frame the driven symbol renders at.
    pub fn time(&self) -> f64 {
        self.cursor.frame
    }
}

/// Window for `clip` on `tl`; an unknown or absent name selects the whole timeline.
pub fn resolve_clip(tl: &Timeline, clip: Option<&str>) -> (Option<String>, FrameSpan) {
    match clip {
        Some(name) => match tl.clip(name) {
            Some(span) => (Some(name.to_owned()), span),
            None => {
                tracing::warn!(timeline = %tl.token, clip = %name, "unknown clip, playing full range");
                (None, tl.full_span())
            }
        },
        None => (None, tl.full_span()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/track.rs"]
mod tests;
