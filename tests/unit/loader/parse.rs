use super::*;

const WALK: &str = r#"<DOMSymbolItem name="walk">
  <timeline>
    <DOMTimeline name="walk">
      <layers>
        <DOMLayer name="mask" layerType="mask">
          <frames><DOMFrame index="0" duration="10"><elements/></DOMFrame></frames>
        </DOMLayer>
        <DOMLayer name="body" parentLayerIndex="0">
          <frames>
            <DOMFrame index="0" duration="4" name="idle" tweenType="motion" acceleration="-50">
              <elements>
                <DOMBitmapInstance libraryItemName="body.png">
                  <matrix><Matrix tx="5" ty="6"/></matrix>
                </DOMBitmapInstance>
              </elements>
            </DOMFrame>
            <DOMFrame index="4" duration="6" name="step" labelType="comment">
              <tweens>
                <Ease target="position" method="quadIn"/>
                <CustomEase target="all">
                  <Point x="0" y="0"/><Point x="0.3" y="0"/><Point x="0.7" y="1"/><Point x="1" y="1"/>
                </CustomEase>
              </tweens>
              <elements>
                <DOMGroup>
                  <members>
                    <DOMSymbolInstance libraryItemName="arm" loop="play once" firstFrame="3">
                      <matrix><Matrix a="2" d="2"/></matrix>
                      <color><Color alphaMultiplier="0.5"/></color>
                    </DOMSymbolInstance>
                  </members>
                </DOMGroup>
                <DOMStaticText><textRuns/></DOMStaticText>
              </elements>
            </DOMFrame>
          </frames>
        </DOMLayer>
        <DOMLayer name="guide" layerType="guide">
          <frames><DOMFrame index="0"><elements><DOMShape/></elements></DOMFrame></frames>
        </DOMLayer>
      </layers>
    </DOMTimeline>
  </timeline>
</DOMSymbolItem>"#;

fn element_from(xml: &str) -> Element {
    let mut s = XmlStream::from_str(xml, "inline.xml");
    match s.root().unwrap() {
        Node::Open(e) | Node::Leaf(e) => e,
        Node::Close(_) => unreachable!(),
    }
}

#[test]
fn symbol_layers_frames_and_labels() {
    let mut doc = Document::new("/tmp");
    let id = parse_symbol_str(&mut doc, "walk", WALK).unwrap();
    assert_eq!(doc.symbol("walk"), Some(id));

    let tl = doc.timeline(id).unwrap();
    assert_eq!(tl.token, "walk");
    assert_eq!(tl.layers.len(), 3);
    assert_eq!(tl.duration, 10);
    assert_eq!(tl.layers[0].kind, LayerKind::Mask);
    assert_eq!(tl.layers[1].parent_index, Some(0));
    assert_eq!(tl.layers[2].kind, LayerKind::Guide);
    assert!(tl.layers[2].frames.is_empty());

    assert_eq!(tl.clip("idle").map(|s| (s.start, s.end)), Some((0, 4)));
    assert_eq!(tl.events.len(), 1);
    assert_eq!(tl.events[0].frames, vec![4]);
}

#[test]
fn drawings_carry_matrix_loop_and_color() {
    let mut doc = Document::new("/tmp");
    let id = parse_symbol_str(&mut doc, "walk", WALK).unwrap();
    let body = &doc.timeline(id).unwrap().layers[1];

    let first = &body.frames[0].elements[0];
    assert_eq!(first.transform, Affine::translate((5.0, 6.0)));
    assert!(matches!(&first.kind, DrawingKind::Bitmap(b) if b.item == "body.png"));

    let second = &body.frames[1];
    assert_eq!(second.elements.len(), 1, "static text must be skipped");
    let leaves = second.elements[0].leaves();
    let DrawingKind::Instance(inst) = &leaves[0].kind else {
        panic!("expected instance");
    };
    assert_eq!(inst.token, "arm");
    assert_eq!(inst.first_frame, 3);
    assert_eq!(inst.looping, LoopMode::PlayOnce);
    assert_eq!(inst.color_effect.mult.a, 0.5);
    assert_eq!(leaves[0].transform, Affine::scale(2.0));
}

#[test]
fn tweens_prefer_all_target_and_fall_back_to_classic() {
    let mut doc = Document::new("/tmp");
    let id = parse_symbol_str(&mut doc, "walk", WALK).unwrap();
    let body = &doc.timeline(id).unwrap().layers[1];
    assert_eq!(
        body.frames[0].tween,
        Some(Tween::Ease(Ease::Classic { intensity: -50.0 }))
    );
    assert!(matches!(body.frames[1].tween, Some(Tween::Custom(ref b)) if b.points.len() == 4));
}

#[test]
fn vector_shape_is_fatal_with_context() {
    let xml = r#"<DOMSymbolItem><timeline><DOMTimeline name="s"><layers>
      <DOMLayer name="art"><frames><DOMFrame index="2"><elements>
        <DOMShape><fills/></DOMShape>
      </elements></DOMFrame></frames></DOMLayer>
    </layers></DOMTimeline></timeline></DOMSymbolItem>"#;
    let mut doc = Document::new("/tmp");
    let err = parse_symbol_str(&mut doc, "s", xml).unwrap_err();
    let msg = err.to_string();
    assert!(matches!(err, XflError::Parse(_)));
    assert!(msg.contains("DOMShape"), "{msg}");
    assert!(msg.contains("'art'"), "{msg}");
    assert!(msg.contains("frame 2"), "{msg}");
}

#[test]
fn symbol_without_timeline_is_rejected() {
    let mut doc = Document::new("/tmp");
    assert!(parse_symbol_str(&mut doc, "x", "<DOMSymbolItem/>").is_err());
}

#[test]
fn frame_duration_defaults_to_one() {
    let xml = r#"<DOMTimeline name="t"><layers><DOMLayer name="l"><frames>
      <DOMFrame index="0"/><DOMFrame index="1" duration="0"/>
    </frames></DOMLayer></layers></DOMTimeline>"#;
    let mut doc = Document::new("/tmp");
    let id = parse_symbol_str(&mut doc, "t", xml).unwrap();
    let layer = &doc.timeline(id).unwrap().layers[0];
    assert_eq!(layer.frames[0].duration, 1);
    assert_eq!(layer.frames[1].duration, 1);
    assert_eq!(layer.duration, 2);
}

#[test]
fn huge_frame_attributes_saturate() {
    let xml = r#"<DOMTimeline name="t"><layers><DOMLayer name="l"><frames>
      <DOMFrame index="4294967000" duration="4294967000" name="far"/>
    </frames></DOMLayer></layers></DOMTimeline>"#;
    let mut doc = Document::new("/tmp");
    let id = parse_symbol_str(&mut doc, "t", xml).unwrap();
    let tl = doc.timeline(id).unwrap();
    assert_eq!(tl.layers[0].duration, u32::MAX);
    assert_eq!(tl.layers[0].frames[0].span().end, u32::MAX);
    assert_eq!(tl.clip("far").unwrap().end, u32::MAX);
}

#[test]
fn matrix_defaults_to_identity() {
    assert_eq!(parse_matrix(&element_from("<Matrix/>")), Affine::IDENTITY);
    let m = parse_matrix(&element_from(r#"<Matrix a="0.5" b="1" c="-1" d="0.5" tx="3" ty="4"/>"#));
    assert_eq!(m.as_coeffs(), [0.5, 1.0, -1.0, 0.5, 3.0, 4.0]);
}

#[test]
fn color_tint_blends_toward_tint() {
    let fx = parse_color(&element_from(
        r##"<Color tintColor="#FF0000" tintMultiplier="0.25"/>"##,
    ));
    assert_eq!(fx.mult, Rgba::new(0.75, 0.75, 0.75, 1.0));
    assert_eq!(fx.add, Rgba::new(0.25, 0.0, 0.0, 0.0));
}

#[test]
fn color_channel_offsets_are_normalized() {
    let fx = parse_color(&element_from(
        r#"<Color redMultiplier="0.5" greenOffset="255" alphaOffset="-51"/>"#,
    ));
    assert_eq!(fx.mult, Rgba::new(0.5, 1.0, 1.0, 1.0));
    assert_eq!(fx.add.g, 1.0);
    assert!((fx.add.a + 0.2).abs() < 1e-6);
}

#[test]
fn color_brightness_darkens_or_lightens() {
    let dark = parse_color(&element_from(r#"<Color brightness="-0.25"/>"#));
    assert_eq!(dark.mult, Rgba::new(0.75, 0.75, 0.75, 1.0));
    assert_eq!(dark.add, Rgba::ZERO);

    let light = parse_color(&element_from(r#"<Color brightness="0.25"/>"#));
    assert_eq!(light.mult, Rgba::new(0.75, 0.75, 0.75, 1.0));
    assert_eq!(light.add, Rgba::new(0.25, 0.25, 0.25, 0.0));
}

#[test]
fn plain_color_is_identity() {
    assert!(parse_color(&element_from("<Color/>")).is_identity());
}

#[test]
fn include_tokens_drop_xml_extension() {
    assert_eq!(symbol_token("hero/walk.xml"), "hero/walk");
    assert_eq!(symbol_token("plain"), "plain");
}
