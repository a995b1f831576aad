use super::*;
use crate::document::model::{FrameLabel, LabelKind};

fn timeline_with_clip(duration: u32, name: &str, start: u32, len: u32) -> Timeline {
    let mut tl = Timeline::new("t");
    tl.duration = duration;
    tl.register_label(
        &FrameLabel {
            name: name.to_owned(),
            kind: LabelKind::Name,
        },
        start,
        len,
    );
    tl
}

#[test]
fn clip_window_tracks_elapsed_and_remaining() {
    let tl = timeline_with_clip(24, "jump", 10, 10);
    let mut track = ClipTrack::new(TimelineId(0), &tl, Some("jump"), false);
    assert_eq!(track.cursor.start, 10.0);
    let step = track.cursor.advance(5.0, false);
    assert_eq!(step, Step { completed: 0, delta: 5.0 });
    assert_eq!(track.cursor.elapsed(), 5.0);
    assert_eq!(track.cursor.remaining(), 5.0);
    assert_eq!(track.time(), 15.0);
}

#[test]
fn clamp_completes_once() {
    let mut c = PlayCursor::new(FrameSpan::new(0, 10), false);
    assert_eq!(c.advance(12.0, false).completed, 1);
    assert_eq!(c.frame, 10.0 - FRAME_EPSILON);
    assert_eq!(c.advance(1.0, false).completed, 0);
    assert_eq!(c.advance(1.0, false).completed, 0);
    assert!(c.frame < 10.0);

    c.advance(0.0, true);
    assert_eq!(c.advance(11.0, false).completed, 1);
}

#[test]
fn reaching_end_exactly_does_not_complete() {
    let mut c = PlayCursor::new(FrameSpan::new(0, 10), false);
    assert_eq!(c.advance(10.0, false).completed, 0);
    assert_eq!(c.frame, 10.0);
}

#[test]
fn loop_wraps_and_counts_each_pass() {
    let mut c = PlayCursor::new(FrameSpan::new(10, 20), true);
    let step = c.advance(25.0, false);
    assert_eq!(step.completed, 2);
    assert_eq!(c.frame, 15.0);
    assert!(c.frame >= c.start && c.frame <= c.end);
}

#[test]
fn empty_loop_window_pins_to_start() {
    let mut c = PlayCursor::new(FrameSpan::new(3, 3), true);
    c.advance(7.0, false);
    assert_eq!(c.frame, 3.0);
}

#[test]
fn seek_teleports_without_sweep() {
    let mut c = PlayCursor::new(FrameSpan::new(10, 20), false);
    c.advance(3.0, false);
    let step = c.advance(4.0, true);
    assert_eq!(step.delta, 0.0);
    assert_eq!(c.frame, 14.0);
}

#[test]
fn reselecting_resets_elapsed() {
    let mut tl = timeline_with_clip(30, "a", 0, 10);
    tl.register_label(
        &FrameLabel {
            name: "b".into(),
            kind: LabelKind::Name,
        },
        20,
        5,
    );
    let mut track = ClipTrack::new(TimelineId(1), &tl, Some("a"), true);
    track.cursor.advance(4.0, false);
    track.select(&tl, Some("b"));
    assert_eq!(track.clip.as_deref(), Some("b"));
    assert_eq!(track.cursor.elapsed(), 0.0);
    assert_eq!((track.cursor.start, track.cursor.end), (20.0, 25.0));
    assert!(track.cursor.looping);
}

#[test]
fn unknown_clip_plays_whole_timeline() {
    let tl = timeline_with_clip(24, "jump", 10, 10);
    let (clip, span) = resolve_clip(&tl, Some("nope"));
    assert_eq!(clip, None);
    assert_eq!(span, FrameSpan::new(0, 24));
}

#[test]
fn status_converts_frames_to_seconds() {
    let mut c = PlayCursor::new(FrameSpan::new(0, 24), false);
    c.advance(6.0, false);
    let s = TrackStatus::of(&c, 12.0);
    assert_eq!(s.elapsed, 0.5);
    assert_eq!(s.remaining, 1.5);
    assert_eq!(TrackStatus::of(&c, 0.0), TrackStatus::default());
}
