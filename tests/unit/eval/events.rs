use super::*;
use crate::document::model::{FrameLabel, LabelKind};

fn timeline_with_events(duration: u32, events: &[(&str, u32)]) -> Timeline {
    let mut tl = Timeline::new("t");
    tl.duration = duration;
    for (name, frame) in events {
        let label = FrameLabel {
            name: (*name).to_owned(),
            kind: LabelKind::Comment,
        };
        tl.register_label(&label, *frame, 1);
    }
    tl
}

#[test]
fn forward_step_covers_half_open_span() {
    let c = Crossing::of(7.5, 1.0, 10);
    assert_eq!(c, Crossing::Forward { from: 6, to: 7 });
    assert!(c.covers(7));
    assert!(!c.covers(6));
    assert!(!c.covers(8));
}

#[test]
fn wrapped_step_reports_wrap() {
    let c = Crossing::of(10.5, 1.0, 10);
    assert_eq!(c, Crossing::Wrapped { from: 9, to: 0 });
    assert!(c.covers(0));
    assert!(!c.covers(9));
}

#[test]
fn last_frame_event_fires_once_per_loop() {
    let tl = timeline_with_events(10, &[("tail", 9)]);
    let mut fired = 0;
    let mut time = 0.5;
    for _ in 0..10 {
        time += 1.0;
        let mut out = Vec::new();
        collect_crossed(&tl, time, 1.0, &mut out);
        fired += out.len();
    }
    assert_eq!(fired, 1);
}

#[test]
fn long_sweep_covers_everything_even_when_ends_differ() {
    assert_eq!(Crossing::of(17.0, 15.0, 10), Crossing::All);

    let tl = timeline_with_events(10, &[("a", 1), ("b", 4), ("c", 8)]);
    let mut out = Vec::new();
    collect_crossed(&tl, 17.0, 15.0, &mut out);
    assert_eq!(out, vec!["a", "b", "c"]);
}

#[test]
fn no_step_no_crossing() {
    assert_eq!(Crossing::of(5.0, 0.0, 10), Crossing::None);
    assert_eq!(Crossing::of(5.0, -1.0, 10), Crossing::None);
    assert_eq!(Crossing::of(5.0, 1.0, 0), Crossing::None);
    assert_eq!(Crossing::of(5.6, 0.5, 10), Crossing::None);
}

#[test]
fn full_loop_covers_everything() {
    let c = Crossing::of(5.2, 10.0, 10);
    assert_eq!(c, Crossing::All);
    assert!(c.covers(3));
}

#[test]
fn comment_fires_once_on_forward_and_wrapped_steps() {
    let tl = timeline_with_events(10, &[("step", 7)]);

    let mut out = Vec::new();
    collect_crossed(&tl, 7.5, 1.0, &mut out);
    assert_eq!(out, vec!["step".to_owned()]);

    let mut out = Vec::new();
    collect_crossed(&tl, 10.5, 1.0, &mut out);
    assert_eq!(out, vec!["step".to_owned()]);

    let mut out = Vec::new();
    collect_crossed(&tl, 8.5, 1.0, &mut out);
    assert!(out.is_empty());
}

#[test]
fn events_keep_declaration_order_and_dedupe() {
    let tl = timeline_with_events(10, &[("b", 3), ("a", 2), ("b", 4)]);
    let mut out = vec!["x".to_owned()];
    collect_crossed(&tl, 5.0, 4.0, &mut out);
    assert_eq!(out, vec!["x", "b", "a"]);

    collect_crossed(&tl, 5.0, 4.0, &mut out);
    assert_eq!(out.len(), 3);
}
