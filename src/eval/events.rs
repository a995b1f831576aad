use crate::document::model::Timeline;
use crate::foundation::math::wrap_time;

/// Frame indices swept by a step that ended at `time` after advancing `delta` frames.
///
/// Both ends are wrapped into the timeline. A forward step covers `(prev, cur]`; a step whose
/// end wrapped below its start covers `[cur, prev)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Crossing {
    /// No frame boundary crossed.
    None,
    /// `(from, to]`.
    Forward {
        /// Frame the step started in.
        from: u32,
        /// Frame the step ended in.
        to: u32,
    },
    /// `[to, from)` after wrapping past the end.
    Wrapped {
        /// Frame the step started in.
        from: u32,
        /// Frame the step ended in, after wrapping.
        to: u32,
    },
    /// A whole loop or more was swept.
    All,
}

impl Crossing {
    /// Compute the crossing for a timeline of `duration` frames.
    pub fn of(time: f64, delta: f64, duration: u32) -> Self {
        if delta <= 0.0 || duration == 0 {
            return Self::None;
        }
        let d = f64::from(duration);
        if delta >= d {
            return Self::All;
        }
        let prev = wrap_time(time - delta, d).floor() as u32;
        let cur = wrap_time(time, d).floor() as u32;
        if cur > prev {
            Self::Forward { from: prev, to: cur }
        } else if cur < prev {
            Self::Wrapped { from: prev, to: cur }
        } else {
            Self::None
        }
    }

    /// Return `true` when `frame` lies in the swept span.
    pub fn covers(self, frame: u32) -> bool {
        match self {
            Self::None => false,
            Self::Forward { from, to } => from < frame && frame <= to,
            Self::Wrapped { from, to } => to <= frame && frame < from,
            Self::All => true,
        }
    }
}

/// Queue every event of `tl` crossed by the step, in declaration order, skipping names already
/// in `out`.
pub fn collect_crossed(tl: &Timeline, time: f64, delta: f64, out: &mut Vec<String>) {
    if !tl.has_events() {
        return;
    }
    let crossing = Crossing::of(time, delta, tl.duration);
    if crossing == Crossing::None {
        return;
    }
    for ev in &tl.events {
        if out.iter().any(|n| *n == ev.name) {
            continue;
        }
        if ev.frames.iter().any(|&f| crossing.covers(f)) {
            out.push(ev.name.clone());
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/eval/events.rs"]
mod tests;
