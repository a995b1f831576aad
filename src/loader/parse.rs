use std::collections::VecDeque;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::animation::ease::Ease;
use crate::animation::tween::{BezierEase, Tween};
use crate::document::model::{
    BitmapInstance, BitmapItem, Document, Drawing, DrawingKind, Frame, FrameLabel, LabelKind,
    Layer, LayerKind, LoopMode, SymbolInstance, Timeline, TimelineId,
};
use crate::foundation::core::{Affine, ColorEffect, Point, Rgba};
use crate::foundation::error::{XflError, XflResult};
use crate::loader::atlas::Atlas;
use crate::loader::xml::{Element, Node, XmlStream};

/// Root XML file of an exported document directory.
pub const DOCUMENT_FILE: &str = "DOMDocument.xml";
/// Subdirectory holding one XML file per library symbol.
pub const LIBRARY_DIR: &str = "LIBRARY";

const SHAPE_TAGS: &[&str] = &["DOMShape", "DOMRectangleObject", "DOMOvalObject"];
const TEXT_TAGS: &[&str] = &["DOMStaticText", "DOMDynamicText", "DOMInputText"];

/// Loader options.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoadOpts {
    /// Atlas down-scale steps: 0 keeps sheets as exported, each step halves them.
    pub downscale: u32,
    /// Fail when the document directory has no sprite-sheet list.
    pub strict_atlas: bool,
}

/// Load a document from its directory or from the path of its root XML file.
///
/// Parses the root file, every `Include`d symbol, and every symbol referenced by an instance,
/// then attaches the atlas and runs [`Document::setup`]. Any failure aborts the whole load.
#[tracing::instrument(skip(opts), fields(path = %path.as_ref().display()))]
pub fn load(path: impl AsRef<Path>, opts: &LoadOpts) -> XflResult<Document> {
    load_inner(path.as_ref(), opts).map_err(|e| match e {
        XflError::Other(err) => XflError::parse(format!("{err:#}")),
        e => e,
    })
}

fn load_inner(path: &Path, opts: &LoadOpts) -> XflResult<Document> {
    let (dir, file) = if path.is_dir() {
        (path.to_path_buf(), path.join(DOCUMENT_FILE))
    } else {
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        (dir, path.to_path_buf())
    };

    let mut parser = Parser::new(Document::new(&dir));
    let mut stream = XmlStream::open(&file)?;
    parser.parse_document(&mut stream)?;
    parser.drain_referenced()?;
    let mut doc = parser.finish();

    match Atlas::load(&dir, opts.downscale)? {
        Some(atlas) => {
            for item in doc.bitmaps.values_mut() {
                item.region = atlas.region_for(&item.name, &item.href);
            }
            doc.set_atlas(atlas);
        }
        None if opts.strict_atlas => {
            return Err(XflError::parse(format!(
                "{}: no sprite-sheet list",
                dir.display()
            )));
        }
        None => tracing::warn!(dir = %dir.display(), "document has no sprite-sheet atlas"),
    }

    let report = doc.setup();
    tracing::debug!(
        timelines = doc.timelines.len(),
        symbols = doc.symbols.len(),
        bitmaps = doc.bitmaps.len(),
        slots = report.variation_slots,
        "document loaded"
    );
    Ok(doc)
}

/// Parse a single timeline from an in-memory XML string into `doc`.
///
/// The first `DOMTimeline` element found is parsed and registered as the symbol `token`. Symbols
/// it references are not loaded; run [`Document::setup`] once every symbol is present.
pub fn parse_symbol_str(doc: &mut Document, token: &str, xml: &str) -> XflResult<TimelineId> {
    let mut parser = Parser::new(std::mem::replace(doc, Document::new(PathBuf::new())));
    let mut stream = XmlStream::from_str(xml, format!("{token}.xml"));
    let res = parser.parse_symbol_stream(&mut stream, token);
    *doc = parser.finish();
    res
}

/// Library-relative token of an `Include` href: the path without its `.xml` extension.
pub fn symbol_token(href: &str) -> &str {
    href.strip_suffix(".xml").unwrap_or(href)
}

struct Ctx<'a> {
    file: &'a Path,
    timeline: &'a str,
    layer: &'a str,
    frame: u32,
}

impl Ctx<'_> {
    fn shape_error(&self, tag: &str) -> XflError {
        XflError::parse(format!(
            "{}: vector shape <{tag}> in timeline '{}', layer '{}', frame {} is not supported",
            self.file.display(),
            self.timeline,
            self.layer,
            self.frame
        ))
    }
}

struct Parser {
    doc: Document,
    referenced: VecDeque<String>,
}

impl Parser {
    fn new(doc: Document) -> Self {
        Self {
            doc,
            referenced: VecDeque::new(),
        }
    }

    fn finish(self) -> Document {
        self.doc
    }

    fn parse_document<R: BufRead>(&mut self, s: &mut XmlStream<R>) -> XflResult<()> {
        let root = match s.root()? {
            Node::Open(el) if el.name == "DOMDocument" => el,
            Node::Leaf(el) if el.name == "DOMDocument" => {
                self.set_frame_rate(&el);
                return Ok(());
            }
            other => {
                return Err(XflError::parse(format!(
                    "{}: expected <DOMDocument>, found {other:?}",
                    s.origin().display()
                )));
            }
        };
        self.set_frame_rate(&root);

        loop {
            match s.expect_node()? {
                Node::Close(name) if name == "DOMDocument" => return Ok(()),
                Node::Open(el) | Node::Leaf(el) if el.name == "Include" => {
                    if let Some(href) = el.attr("href") {
                        self.load_symbol(symbol_token(href), true)?;
                    }
                }
                Node::Open(el) if el.name == "DOMTimeline" => {
                    let name = el.attr_or("name", "").to_owned();
                    let tl = self.parse_timeline(s, &name)?;
                    let id = self.doc.add_timeline(tl);
                    self.doc.push_root(id);
                }
                Node::Leaf(el) if el.name == "DOMTimeline" => {
                    let id = self.doc.add_timeline(Timeline::new(el.attr_or("name", "")));
                    self.doc.push_root(id);
                }
                Node::Open(el) if el.name == "DOMBitmapItem" => {
                    self.add_bitmap(&el);
                    s.skip(&el)?;
                }
                Node::Leaf(el) if el.name == "DOMBitmapItem" => self.add_bitmap(&el),
                _ => {}
            }
        }
    }

    fn set_frame_rate(&mut self, el: &Element) {
        let fps = el.attr_f64("frameRate", Document::DEFAULT_FRAME_RATE);
        if fps > 0.0 {
            self.doc.set_frame_rate(fps);
        }
    }

    fn add_bitmap(&mut self, el: &Element) {
        match (el.attr("name"), el.attr("href")) {
            (Some(name), Some(href)) => self.doc.insert_bitmap(BitmapItem {
                name: name.to_owned(),
                href: href.to_owned(),
                region: None,
            }),
            _ => tracing::warn!("DOMBitmapItem without name or href ignored"),
        }
    }

    /// Load `LIBRARY/<token>.xml` unless the token is already in the symbol table.
    fn load_symbol(&mut self, token: &str, required: bool) -> XflResult<()> {
        if self.doc.symbol(token).is_some() {
            return Ok(());
        }
        let path = self
            .doc
            .base_dir()
            .join(LIBRARY_DIR)
            .join(format!("{token}.xml"));
        if !path.is_file() {
            if required {
                return Err(XflError::parse(format!(
                    "include '{token}': missing {}",
                    path.display()
                )));
            }
            tracing::warn!(symbol = %token, path = %path.display(), "referenced symbol file missing");
            return Ok(());
        }
        let mut stream = XmlStream::open(&path)?;
        self.parse_symbol_stream(&mut stream, token)?;
        tracing::debug!(symbol = %token, "symbol loaded");
        Ok(())
    }

    fn parse_symbol_stream<R: BufRead>(
        &mut self,
        s: &mut XmlStream<R>,
        token: &str,
    ) -> XflResult<TimelineId> {
        // Reserve the slot first so a self-reference resolves to this timeline.
        let id = match self.doc.symbol(token) {
            Some(id) => id,
            None => {
                let id = self.doc.add_timeline(Timeline::new(token));
                self.doc.insert_symbol(token, id)
            }
        };
        loop {
            match s.next_node()? {
                None => {
                    return Err(XflError::parse(format!(
                        "{}: no <DOMTimeline> in symbol '{token}'",
                        s.origin().display()
                    )));
                }
                Some(Node::Open(el)) if el.name == "DOMTimeline" => {
                    let tl = self.parse_timeline(s, token)?;
                    if let Some(slot) = self.doc.timeline_mut(id) {
                        *slot = tl;
                    }
                    return Ok(id);
                }
                Some(Node::Leaf(el)) if el.name == "DOMTimeline" => return Ok(id),
                Some(_) => {}
            }
        }
    }

    fn drain_referenced(&mut self) -> XflResult<()> {
        while let Some(token) = self.referenced.pop_front() {
            self.load_symbol(&token, false)?;
        }
        Ok(())
    }

    fn parse_timeline<R: BufRead>(
        &mut self,
        s: &mut XmlStream<R>,
        token: &str,
    ) -> XflResult<Timeline> {
        let mut tl = Timeline::new(token);
        let mut index = 0u32;
        loop {
            match s.expect_node()? {
                Node::Close(name) if name == "DOMTimeline" => return Ok(tl),
                Node::Open(el) if el.name == "DOMLayer" => {
                    let layer = self.parse_layer(s, &el, true, index, &mut tl)?;
                    tl.push_layer(layer);
                    index += 1;
                }
                Node::Leaf(el) if el.name == "DOMLayer" => {
                    let layer = self.parse_layer(s, &el, false, index, &mut tl)?;
                    tl.push_layer(layer);
                    index += 1;
                }
                _ => {}
            }
        }
    }

    fn parse_layer<R: BufRead>(
        &mut self,
        s: &mut XmlStream<R>,
        el: &Element,
        is_open: bool,
        index: u32,
        tl: &mut Timeline,
    ) -> XflResult<Layer> {
        let uid = self.doc.next_layer_uid();
        let kind = LayerKind::from_attr(el.attr_or("layerType", "normal"));
        let mut layer = Layer::new(uid, index, kind);
        layer.name = el.attr_or("name", "").to_owned();
        layer.parent_index = el.attr("parentLayerIndex").and_then(|v| v.parse().ok());

        if !is_open {
            return Ok(layer);
        }
        if kind == LayerKind::Guide {
            s.skip(el)?;
            return Ok(layer);
        }

        let file = s.origin().to_path_buf();
        loop {
            match s.expect_node()? {
                Node::Close(name) if name == "DOMLayer" => return Ok(layer),
                Node::Open(fel) if fel.name == "DOMFrame" => {
                    let frame = self.parse_frame(s, &fel, true, &file, tl, &layer.name)?;
                    layer.push_frame(frame);
                }
                Node::Leaf(fel) if fel.name == "DOMFrame" => {
                    let frame = self.parse_frame(s, &fel, false, &file, tl, &layer.name)?;
                    layer.push_frame(frame);
                }
                _ => {}
            }
        }
    }

    fn parse_frame<R: BufRead>(
        &mut self,
        s: &mut XmlStream<R>,
        el: &Element,
        is_open: bool,
        file: &Path,
        tl: &mut Timeline,
        layer_name: &str,
    ) -> XflResult<Frame> {
        let mut frame = Frame::new(el.attr_u32("index", 0), el.attr_u32("duration", 1).max(1));
        if let Some(name) = el.attr("name").filter(|n| !n.is_empty()) {
            let label = FrameLabel {
                name: name.to_owned(),
                kind: LabelKind::from_attr(el.attr_or("labelType", "name")),
            };
            tl.register_label(&label, frame.index, frame.duration);
            frame.label = Some(label);
        }
        let motion = el.attr("tweenType") == Some("motion");
        let acceleration = el.attr_f64("acceleration", 0.0);

        let mut eases: Vec<(String, Tween)> = Vec::new();
        if is_open {
            let ctx = Ctx {
                file,
                timeline: &tl.token,
                layer: layer_name,
                frame: frame.index,
            };
            loop {
                match s.expect_node()? {
                    Node::Close(name) if name == "DOMFrame" => break,
                    Node::Open(e) => {
                        if e.name == "Ease" || e.name == "CustomEase" {
                            eases.push(parse_ease(s, &e, true)?);
                        } else if let Some(d) = self.parse_drawing(s, &e, true, &ctx)? {
                            frame.elements.push(d);
                        }
                    }
                    Node::Leaf(e) => {
                        if e.name == "Ease" || e.name == "CustomEase" {
                            eases.push(parse_ease(s, &e, false)?);
                        } else if let Some(d) = self.parse_drawing(s, &e, false, &ctx)? {
                            frame.elements.push(d);
                        }
                    }
                    Node::Close(_) => {}
                }
            }
        }

        frame.tween = pick_tween(eases).or_else(|| {
            motion.then_some(Tween::Ease(Ease::Classic {
                intensity: acceleration,
            }))
        });
        Ok(frame)
    }

    /// Parse one drawing element. Returns `None` for tags that are not drawings.
    fn parse_drawing<R: BufRead>(
        &mut self,
        s: &mut XmlStream<R>,
        el: &Element,
        is_open: bool,
        ctx: &Ctx<'_>,
    ) -> XflResult<Option<Drawing>> {
        let name = el.name.as_str();
        if SHAPE_TAGS.contains(&name) {
            return Err(ctx.shape_error(name));
        }
        if TEXT_TAGS.contains(&name) {
            tracing::warn!(
                timeline = %ctx.timeline,
                layer = %ctx.layer,
                frame = ctx.frame,
                tag = %name,
                "text element skipped"
            );
            if is_open {
                s.skip(el)?;
            }
            return Ok(None);
        }
        let drawing = match name {
            "DOMGroup" => self.parse_group(s, is_open, ctx)?,
            "DOMSymbolInstance" => self.parse_instance(s, el, is_open)?,
            "DOMBitmapInstance" => parse_bitmap(s, el, is_open)?,
            _ => return Ok(None),
        };
        Ok(Some(drawing))
    }

    fn parse_group<R: BufRead>(
        &mut self,
        s: &mut XmlStream<R>,
        is_open: bool,
        ctx: &Ctx<'_>,
    ) -> XflResult<Drawing> {
        let mut transform = Affine::IDENTITY;
        let mut members = Vec::new();
        if is_open {
            loop {
                match s.expect_node()? {
                    Node::Close(name) if name == "DOMGroup" => break,
                    Node::Open(e) | Node::Leaf(e) if e.name == "Matrix" => {
                        transform = parse_matrix(&e);
                    }
                    Node::Open(e) => {
                        if let Some(d) = self.parse_drawing(s, &e, true, ctx)? {
                            members.push(d);
                        }
                    }
                    Node::Leaf(e) => {
                        if let Some(d) = self.parse_drawing(s, &e, false, ctx)? {
                            members.push(d);
                        }
                    }
                    Node::Close(_) => {}
                }
            }
        }
        Ok(Drawing::new(transform, DrawingKind::Group(members)))
    }

    fn parse_instance<R: BufRead>(
        &mut self,
        s: &mut XmlStream<R>,
        el: &Element,
        is_open: bool,
    ) -> XflResult<Drawing> {
        let token = el.attr_or("libraryItemName", "").to_owned();
        let mut inst = SymbolInstance::new(token.clone());
        inst.first_frame = el.attr_u32("firstFrame", 0);
        inst.looping = LoopMode::from_attr(el.attr_or("loop", "loop"));

        let mut transform = Affine::IDENTITY;
        if is_open {
            loop {
                match s.expect_node()? {
                    Node::Close(name) if name == "DOMSymbolInstance" => break,
                    Node::Open(e) | Node::Leaf(e) if e.name == "Matrix" => {
                        transform = parse_matrix(&e);
                    }
                    Node::Open(e) | Node::Leaf(e) if e.name == "Color" => {
                        inst.color_effect = parse_color(&e);
                    }
                    _ => {}
                }
            }
        }

        if !token.is_empty() && self.doc.symbol(&token).is_none() {
            self.referenced.push_back(token);
        }
        Ok(Drawing::new(transform, DrawingKind::Instance(inst)))
    }
}

fn parse_bitmap<R: BufRead>(
    s: &mut XmlStream<R>,
    el: &Element,
    is_open: bool,
) -> XflResult<Drawing> {
    let bmp = BitmapInstance::new(el.attr_or("libraryItemName", ""));
    let mut transform = Affine::IDENTITY;
    if is_open {
        loop {
            match s.expect_node()? {
                Node::Close(name) if name == "DOMBitmapInstance" => break,
                Node::Open(e) | Node::Leaf(e) if e.name == "Matrix" => {
                    transform = parse_matrix(&e);
                }
                _ => {}
            }
        }
    }
    Ok(Drawing::new(transform, DrawingKind::Bitmap(bmp)))
}

fn parse_ease<R: BufRead>(
    s: &mut XmlStream<R>,
    el: &Element,
    is_open: bool,
) -> XflResult<(String, Tween)> {
    let target = el.attr_or("target", "all").to_owned();
    let mut points = Vec::new();
    if is_open {
        loop {
            match s.expect_node()? {
                Node::Close(name) if name == el.name => break,
                Node::Open(e) | Node::Leaf(e) if e.name == "Point" => {
                    points.push(Point::new(e.attr_f64("x", 0.0), e.attr_f64("y", 0.0)));
                }
                _ => {}
            }
        }
    }

    let tween = if el.name == "CustomEase" {
        Tween::Custom(BezierEase::new(points))
    } else {
        let method = el.attr_or("method", "classic");
        let intensity = el.attr_f64("intensity", 0.0);
        match Ease::from_method(method, intensity) {
            Some(ease) => Tween::Ease(ease),
            None => {
                tracing::warn!(method = %method, "unknown ease method, using linear");
                Tween::Ease(Ease::Linear)
            }
        }
    };
    Ok((target, tween))
}

/// Prefer the ease targeting every property, else the first listed.
fn pick_tween(eases: Vec<(String, Tween)>) -> Option<Tween> {
    let all = eases.iter().position(|(target, _)| target == "all");
    let idx = all.unwrap_or(0);
    eases.into_iter().nth(idx).map(|(_, t)| t)
}

/// `<Matrix a b c d tx ty>` with identity defaults.
pub fn parse_matrix(el: &Element) -> Affine {
    Affine::new([
        el.attr_f64("a", 1.0),
        el.attr_f64("b", 0.0),
        el.attr_f64("c", 0.0),
        el.attr_f64("d", 1.0),
        el.attr_f64("tx", 0.0),
        el.attr_f64("ty", 0.0),
    ])
}

/// `<Color>` attributes as a color effect: tint, multipliers/offsets, or brightness.
pub fn parse_color(el: &Element) -> ColorEffect {
    let mut fx = ColorEffect::IDENTITY;
    if let Some(tint) = el.attr("tintColor").and_then(Rgba::from_hex) {
        let amount = el.attr_f64("tintMultiplier", 0.0) as f32;
        fx.mult = Rgba::new(1.0 - amount, 1.0 - amount, 1.0 - amount, 1.0);
        fx.add = Rgba::new(tint.r * amount, tint.g * amount, tint.b * amount, 0.0);
        return fx;
    }

    const CHANNELS: [&str; 4] = ["red", "green", "blue", "alpha"];
    let has_channels = CHANNELS.iter().any(|c| {
        el.attr(&format!("{c}Multiplier")).is_some() || el.attr(&format!("{c}Offset")).is_some()
    });
    if has_channels {
        let m = |c: &str| el.attr_f64(&format!("{c}Multiplier"), 1.0) as f32;
        let o = |c: &str| (el.attr_f64(&format!("{c}Offset"), 0.0) / 255.0) as f32;
        fx.mult = Rgba::new(m("red"), m("green"), m("blue"), m("alpha"));
        fx.add = Rgba::new(o("red"), o("green"), o("blue"), o("alpha"));
        return fx;
    }

    if el.attr("brightness").is_some() {
        let b = el.attr_f64("brightness", 0.0) as f32;
        if b < 0.0 {
            fx.mult = Rgba::new(1.0 + b, 1.0 + b, 1.0 + b, 1.0);
        } else {
            fx.mult = Rgba::new(1.0 - b, 1.0 - b, 1.0 - b, 1.0);
            fx.add = Rgba::new(b, b, b, 0.0);
        }
    }
    fx
}

#[cfg(test)]
#[path = "../../tests/unit/loader/parse.rs"]
mod tests;
