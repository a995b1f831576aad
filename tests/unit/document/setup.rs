use super::*;
use crate::document::model::{
    BitmapInstance, BitmapItem, Frame, FrameLabel, LabelKind, Layer, SymbolInstance,
};
use crate::foundation::core::{Affine, Rect};

fn layer_with(doc: &mut Document, index: u32, kind: LayerKind, parent: Option<u32>) -> Layer {
    let mut layer = Layer::new(doc.next_layer_uid(), index, kind);
    layer.parent_index = parent;
    layer.push_frame(Frame::new(0, 1));
    layer
}

fn symbol_with_anchor(doc: &mut Document, token: &str) -> TimelineId {
    let mut tl = Timeline::new(token);
    let label = FrameLabel {
        name: "pose".to_owned(),
        kind: LabelKind::Anchor,
    };
    tl.register_label(&label, 2, 1);
    let id = doc.add_timeline(tl);
    doc.insert_symbol(token, id);
    id
}

#[test]
fn mask_parent_resolves_to_sibling_uid() {
    let mut doc = Document::new("/tmp");
    let mut tl = Timeline::new("root");
    let mask = layer_with(&mut doc, 0, LayerKind::Mask, None);
    let mask_uid = mask.uid;
    tl.push_layer(mask);
    tl.push_layer(layer_with(&mut doc, 1, LayerKind::Normal, Some(0)));
    tl.push_layer(layer_with(&mut doc, 2, LayerKind::Normal, None));
    let id = doc.add_timeline(tl);
    doc.push_root(id);

    let report = doc.setup();
    assert_eq!(report.clipped_layers, 1);
    assert_eq!(report.bad_mask_refs, 0);
    let tl = doc.timeline(id).unwrap();
    assert_eq!(tl.layers[1].clip, Some(mask_uid));
    assert_eq!(tl.layers[2].clip, None);
}

#[test]
fn folder_parent_does_not_clip() {
    let mut doc = Document::new("/tmp");
    let mut tl = Timeline::new("root");
    tl.push_layer(layer_with(&mut doc, 0, LayerKind::Folder, None));
    tl.push_layer(layer_with(&mut doc, 1, LayerKind::Normal, Some(0)));
    let id = doc.add_timeline(tl);

    let report = doc.setup();
    assert_eq!(report.clipped_layers, 0);
    assert_eq!(report.bad_mask_refs, 0);
    assert_eq!(doc.timeline(id).unwrap().layers[1].clip, None);
}

#[test]
fn dangling_parent_is_counted_not_fatal() {
    let mut doc = Document::new("/tmp");
    let mut tl = Timeline::new("root");
    tl.push_layer(layer_with(&mut doc, 0, LayerKind::Normal, Some(9)));
    doc.add_timeline(tl);

    let report = doc.setup();
    assert_eq!(report.bad_mask_refs, 1);
}

#[test]
fn instances_and_bitmaps_are_memoized() {
    let mut doc = Document::new("/tmp");
    let child = doc.add_timeline(Timeline::new("child"));
    doc.insert_symbol("child", child);
    let region = AtlasRegion {
        rect: Rect::new(0.0, 0.0, 8.0, 8.0),
        layer: 0,
        original_size: kurbo::Size::new(8.0, 8.0),
    };
    doc.insert_bitmap(BitmapItem {
        name: "pic.png".into(),
        href: "pic.png".into(),
        region: Some(region),
    });

    let mut frame = Frame::new(0, 1);
    frame.elements.push(Drawing::new(
        Affine::IDENTITY,
        DrawingKind::Instance(SymbolInstance::new("child")),
    ));
    frame.elements.push(Drawing::new(
        Affine::IDENTITY,
        DrawingKind::Group(vec![
            Drawing::new(
                Affine::IDENTITY,
                DrawingKind::Bitmap(BitmapInstance::new("pic.png")),
            ),
            Drawing::new(
                Affine::IDENTITY,
                DrawingKind::Instance(SymbolInstance::new("missing")),
            ),
            Drawing::new(
                Affine::IDENTITY,
                DrawingKind::Bitmap(BitmapInstance::new("nowhere.png")),
            ),
        ]),
    ));
    let mut layer = Layer::new(doc.next_layer_uid(), 0, LayerKind::Normal);
    layer.push_frame(frame);
    let mut root = Timeline::new("root");
    root.push_layer(layer);
    let root_id = doc.add_timeline(root);
    doc.push_root(root_id);

    let report = doc.setup();
    assert_eq!(report.unresolved_instances, 1);
    assert_eq!(report.unresolved_bitmaps, 1);

    let elements = &doc.timeline(root_id).unwrap().layers[0].frames[0].elements;
    match &elements[0].kind {
        DrawingKind::Instance(inst) => assert_eq!(inst.resolved, Some(child)),
        other => panic!("unexpected {other:?}"),
    }
    let leaves = elements[1].leaves();
    match &leaves[0].kind {
        DrawingKind::Bitmap(b) => assert_eq!(b.region, Some(region)),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn variation_slots_follow_token_order() {
    let mut doc = Document::new("/tmp");
    let zeta = symbol_with_anchor(&mut doc, "zeta");
    let plain = doc.add_timeline(Timeline::new("plain"));
    doc.insert_symbol("plain", plain);
    let alpha = symbol_with_anchor(&mut doc, "alpha");

    let report = doc.setup();
    assert_eq!(report.variation_slots, 2);
    assert_eq!(doc.variation_slot_count(), 2);
    assert_eq!(doc.timeline(alpha).unwrap().variation_slot, Some(0));
    assert_eq!(doc.timeline(zeta).unwrap().variation_slot, Some(1));
    assert_eq!(doc.timeline(plain).unwrap().variation_slot, None);
    assert_eq!(doc.timeline_for_slot(1), Some(zeta));
    assert_eq!(doc.timeline_for_slot(2), None);
}

#[test]
fn setup_is_idempotent() {
    let mut doc = Document::new("/tmp");
    symbol_with_anchor(&mut doc, "b");
    symbol_with_anchor(&mut doc, "a");
    let first = doc.setup();
    let slots: Vec<Option<u32>> = doc.timelines.iter().map(|t| t.variation_slot).collect();
    let second = doc.setup();
    let again: Vec<Option<u32>> = doc.timelines.iter().map(|t| t.variation_slot).collect();
    assert_eq!(first, second);
    assert_eq!(slots, again);
}

#[test]
fn root_timelines_never_get_slots() {
    let mut doc = Document::new("/tmp");
    let mut root = Timeline::new("Scene 1");
    root.register_label(
        &FrameLabel {
            name: "x".into(),
            kind: LabelKind::Anchor,
        },
        0,
        1,
    );
    let id = doc.add_timeline(root);
    doc.push_root(id);
    assert_eq!(doc.setup().variation_slots, 0);
    assert_eq!(doc.timeline(id).unwrap().variation_slot, None);
}
