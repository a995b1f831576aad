use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::animation::tween::Tween;
use crate::loader::atlas::{Atlas, AtlasRegion};
use crate::foundation::core::{Affine, ColorEffect, FrameSpan};

/// Arena index of a [`Timeline`] inside its [`Document`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct TimelineId(pub u32);

/// Document-unique layer id. `0` is reserved for "no layer".
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct LayerUid(pub u32);

/// A loaded animation document.
///
/// Built once by the loader, then read-only during evaluation. Timelines live in an arena and
/// refer to each other by [`TimelineId`]; instances name their symbol by token and are resolved
/// by [`Document::setup`].
#[derive(Clone, Debug)]
pub struct Document {
    pub(crate) base_dir: PathBuf,
    pub(crate) frame_rate: f64,
    pub(crate) timelines: Vec<Timeline>,
    pub(crate) roots: Vec<TimelineId>,
    pub(crate) symbols: BTreeMap<String, TimelineId>,
    pub(crate) bitmaps: BTreeMap<String, BitmapItem>,
    pub(crate) atlas: Option<Atlas>,
    pub(crate) variation_slots: u32,
    pub(crate) next_layer_uid: u32,
}

impl Document {
    /// Default frame rate when the document does not declare one.
    pub const DEFAULT_FRAME_RATE: f64 = 24.0;

    /// Create an empty document rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            frame_rate: Self::DEFAULT_FRAME_RATE,
            timelines: Vec::new(),
            roots: Vec::new(),
            symbols: BTreeMap::new(),
            bitmaps: BTreeMap::new(),
            atlas: None,
            variation_slots: 0,
            next_layer_uid: 1,
        }
    }

    /// Directory the document (and its `LIBRARY/`) was loaded from.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Authoring frame rate in frames per second.
    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Override the authoring frame rate.
    pub fn set_frame_rate(&mut self, fps: f64) {
        self.frame_rate = fps;
    }

    /// Allocate a fresh, document-unique layer id.
    pub fn next_layer_uid(&mut self) -> LayerUid {
        let uid = LayerUid(self.next_layer_uid);
        self.next_layer_uid += 1;
        uid
    }

    /// Move a timeline into the arena and return its id.
    pub fn add_timeline(&mut self, timeline: Timeline) -> TimelineId {
        let id = TimelineId(self.timelines.len() as u32);
        self.timelines.push(timeline);
        id
    }

    /// Register a timeline as a root (document-level) timeline. The first root is the main one.
    pub fn push_root(&mut self, id: TimelineId) {
        self.roots.push(id);
    }

    /// Register a library symbol. The first registration of a token wins.
    pub fn insert_symbol(&mut self, token: impl Into<String>, id: TimelineId) -> TimelineId {
        *self.symbols.entry(token.into()).or_insert(id)
    }

    /// Register a bitmap library item.
    pub fn insert_bitmap(&mut self, item: BitmapItem) {
        self.bitmaps.insert(item.name.clone(), item);
    }

    /// Attach the texture atlas.
    pub fn set_atlas(&mut self, atlas: Atlas) {
        self.atlas = Some(atlas);
    }

    /// Borrow a timeline by id.
    pub fn timeline(&self, id: TimelineId) -> Option<&Timeline> {
        self.timelines.get(id.0 as usize)
    }

    pub(crate) fn timeline_mut(&mut self, id: TimelineId) -> Option<&mut Timeline> {
        self.timelines.get_mut(id.0 as usize)
    }

    /// The main timeline (first root), if any.
    pub fn main_timeline(&self) -> Option<TimelineId> {
        self.roots.first().copied()
    }

    /// All root timelines in declaration order.
    pub fn roots(&self) -> &[TimelineId] {
        &self.roots
    }

    /// Look up a library symbol by token.
    pub fn symbol(&self, token: &str) -> Option<TimelineId> {
        self.symbols.get(token).copied()
    }

    /// Library symbols in ascending token order.
    pub fn symbols(&self) -> impl Iterator<Item = (&str, TimelineId)> {
        self.symbols.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Look up a bitmap item by library name.
    pub fn bitmap(&self, name: &str) -> Option<&BitmapItem> {
        self.bitmaps.get(name)
    }

    /// Bitmap items in ascending name order.
    pub fn bitmaps(&self) -> impl Iterator<Item = &BitmapItem> {
        self.bitmaps.values()
    }

    /// The texture atlas, when one was loaded.
    pub fn atlas(&self) -> Option<&Atlas> {
        self.atlas.as_ref()
    }

    /// Number of distinct variation slots assigned by [`Document::setup`].
    pub fn variation_slot_count(&self) -> u32 {
        self.variation_slots
    }

    /// Resolve the timeline an instance points to.
    pub fn resolve_instance(&self, instance: &SymbolInstance) -> Option<TimelineId> {
        instance.resolved.or_else(|| self.symbol(&instance.token))
    }

    /// Find a timeline by root name or symbol token.
    pub fn find_timeline(&self, name: &str) -> Option<TimelineId> {
        self.symbol(name).or_else(|| {
            self.roots
                .iter()
                .copied()
                .find(|id| self.timeline(*id).is_some_and(|t| t.token == name))
        })
    }
}

/// One reusable animation clip ("symbol"), or a document root timeline.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    /// Unique token (library item name, or the scene name for roots).
    pub token: String,
    /// Frame count: maximum over the layers' durations.
    pub duration: u32,
    /// Layers in declaration order (index 0 is the topmost in the authoring tool).
    pub layers: Vec<Layer>,
    /// Named playable sub-ranges.
    pub clips: BTreeMap<String, FrameSpan>,
    /// Anchor labels: pose name to frame index.
    pub variants: BTreeMap<String, u32>,
    /// Comment labels in declaration order.
    pub events: Vec<EventLabel>,
    /// Dense slot index for timelines that own at least one anchor label.
    pub variation_slot: Option<u32>,
}

/// A named event and every frame index it is attached to.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct EventLabel {
    /// Event name.
    pub name: String,
    /// Frame indices, in declaration order.
    pub frames: Vec<u32>,
}

impl Timeline {
    /// Create an empty timeline.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    /// Append a layer, growing the timeline duration as needed.
    pub fn push_layer(&mut self, layer: Layer) {
        self.duration = self.duration.max(layer.duration);
        self.layers.push(layer);
    }

    /// Masking layers, in declaration order. They are composited first and never drawn.
    pub fn mask_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(|l| l.kind == LayerKind::Mask)
    }

    /// Drawable layers in evaluation order: last-declared first.
    pub fn content_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().rev().filter(|l| l.kind == LayerKind::Normal)
    }

    /// Return `true` when at least one comment label exists.
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// The `[start, end)` range of a named clip.
    pub fn clip(&self, name: &str) -> Option<FrameSpan> {
        self.clips.get(name).copied()
    }

    /// The frame index of a named variant (anchor label).
    pub fn variant(&self, name: &str) -> Option<u32> {
        self.variants.get(name).copied()
    }

    /// The full `[0, duration)` span.
    pub fn full_span(&self) -> FrameSpan {
        FrameSpan::new(0, self.duration)
    }
}

/// Layer role.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LayerKind {
    /// Drawn content.
    #[default]
    Normal,
    /// Authoring guide; never drawn.
    Guide,
    /// Mask source; composited, never drawn.
    Mask,
    /// Folder; never drawn.
    Folder,
}

impl LayerKind {
    /// Map an exported `layerType` attribute.
    pub fn from_attr(s: &str) -> Self {
        match s {
            "guide" => Self::Guide,
            "mask" => Self::Mask,
            "folder" => Self::Folder,
            _ => Self::Normal,
        }
    }
}

/// An ordered sequence of keyframes.
#[derive(Clone, Debug)]
pub struct Layer {
    /// Document-unique id; also the mask scope id for mask layers.
    pub uid: LayerUid,
    /// Declaration index within the owning timeline.
    pub index: u32,
    /// Display name.
    pub name: String,
    /// Role of the layer.
    pub kind: LayerKind,
    /// Declaration index of the parent layer (mask, guide, or folder), if any.
    pub parent_index: Option<u32>,
    /// Mask layer clipping this layer, resolved by [`Document::setup`].
    pub clip: Option<LayerUid>,
    /// Keyframes in non-decreasing `index` order.
    pub frames: Vec<Frame>,
    /// Total frame count.
    pub duration: u32,
}

impl Layer {
    /// Create an empty layer.
    pub fn new(uid: LayerUid, index: u32, kind: LayerKind) -> Self {
        Self {
            uid,
            index,
            name: String::new(),
            kind,
            parent_index: None,
            clip: None,
            frames: Vec::new(),
            duration: 0,
        }
    }

    /// Append a keyframe, growing the layer duration to cover it.
    pub fn push_frame(&mut self, frame: Frame) {
        self.duration = self.duration.max(frame.index.saturating_add(frame.duration));
        self.frames.push(frame);
    }

    /// Index of the last keyframe whose `index <= frame`.
    pub fn keyframe_at(&self, frame: u32) -> Option<usize> {
        let n = self.frames.partition_point(|f| f.index <= frame);
        n.checked_sub(1)
    }
}

/// Label kinds attached to keyframes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LabelKind {
    /// Plain name: a playable clip `[index, index + duration)`.
    Name,
    /// Anchor: a single-frame pose selector.
    Anchor,
    /// Comment: an event fired when playback crosses the frame.
    Comment,
}

impl LabelKind {
    /// Map an exported `labelType` attribute.
    pub fn from_attr(s: &str) -> Self {
        match s {
            "anchor" => Self::Anchor,
            "comment" => Self::Comment,
            _ => Self::Name,
        }
    }
}

/// Keyframe label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameLabel {
    /// Label text.
    pub name: String,
    /// Label classification.
    pub kind: LabelKind,
}

/// A keyframe: the half-open interval `[index, index + duration)`.
#[derive(Clone, Debug)]
pub struct Frame {
    /// First frame covered.
    pub index: u32,
    /// Number of frames covered.
    pub duration: u32,
    /// Drawing elements in declaration order.
    pub elements: Vec<Drawing>,
    /// Ease applied while blending toward the next keyframe.
    pub tween: Option<Tween>,
    /// Optional label.
    pub label: Option<FrameLabel>,
}

impl Frame {
    /// Create an empty keyframe.
    pub fn new(index: u32, duration: u32) -> Self {
        Self {
            index,
            duration,
            elements: Vec::new(),
            tween: None,
            label: None,
        }
    }

    /// Frame span covered by this keyframe.
    pub fn span(&self) -> FrameSpan {
        FrameSpan::new(self.index, self.index.saturating_add(self.duration))
    }
}

/// A placed drawing element with its own transform.
#[derive(Clone, Debug)]
pub struct Drawing {
    /// Local transform.
    pub transform: Affine,
    /// Variant payload.
    pub kind: DrawingKind,
}

/// Closed set of drawing variants.
#[derive(Clone, Debug)]
pub enum DrawingKind {
    /// Nested elements drawn together.
    Group(Vec<Drawing>),
    /// Placed reference to another timeline.
    Instance(SymbolInstance),
    /// Placed atlas bitmap.
    Bitmap(BitmapInstance),
    /// Vector shape. Never produced by the loader; rejected at parse time.
    Shape,
}

impl Drawing {
    /// Build a drawing with the given transform.
    pub fn new(transform: Affine, kind: DrawingKind) -> Self {
        Self { transform, kind }
    }

    /// Instance color effect, or identity for other variants.
    pub fn color_effect(&self) -> ColorEffect {
        match &self.kind {
            DrawingKind::Instance(inst) => inst.color_effect,
            _ => ColorEffect::IDENTITY,
        }
    }

    /// Non-group descendants, depth-first in declaration order.
    pub fn leaves(&self) -> Vec<&Drawing> {
        let mut out = Vec::new();
        collect_leaves(self, &mut out);
        out
    }
}

fn collect_leaves<'a>(d: &'a Drawing, out: &mut Vec<&'a Drawing>) {
    match &d.kind {
        DrawingKind::Group(members) => {
            for m in members {
                collect_leaves(m, out);
            }
        }
        _ => out.push(d),
    }
}

/// How an instance maps its parent's local time to its own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LoopMode {
    /// `first_frame + local_time`, wrapped by the nested timeline.
    #[default]
    Loop,
    /// `first_frame + local_time`, clamped just below the nested duration.
    PlayOnce,
    /// Always `first_frame`.
    SingleFrame,
}

impl LoopMode {
    /// Map an exported `loop` attribute.
    pub fn from_attr(s: &str) -> Self {
        match s {
            "play once" => Self::PlayOnce,
            "single frame" => Self::SingleFrame,
            _ => Self::Loop,
        }
    }
}

/// Placed reference to a library symbol.
#[derive(Clone, Debug)]
pub struct SymbolInstance {
    /// Library token of the referenced timeline.
    pub token: String,
    /// Frame offset into the referenced timeline.
    pub first_frame: u32,
    /// Time mapping mode.
    pub looping: LoopMode,
    /// Instance color effect.
    pub color_effect: ColorEffect,
    /// Memoized token lookup, filled by [`Document::setup`].
    pub resolved: Option<TimelineId>,
}

impl SymbolInstance {
    /// Create an unresolved instance of `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            first_frame: 0,
            looping: LoopMode::Loop,
            color_effect: ColorEffect::IDENTITY,
            resolved: None,
        }
    }
}

/// Placed reference to a bitmap library item.
#[derive(Clone, Debug)]
pub struct BitmapInstance {
    /// Library item name.
    pub item: String,
    /// Atlas placement, filled by [`Document::setup`].
    pub region: Option<AtlasRegion>,
}

impl BitmapInstance {
    /// Create an unresolved bitmap instance.
    pub fn new(item: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            region: None,
        }
    }
}

/// Bitmap library item and its atlas placement.
#[derive(Clone, Debug, serde::Serialize)]
pub struct BitmapItem {
    /// Library name.
    pub name: String,
    /// Source href relative to `LIBRARY/`.
    pub href: String,
    /// Placement inside the atlas, if the atlas lists it.
    pub region: Option<AtlasRegion>,
}

#[cfg(test)]
#[path = "../../tests/unit/document/model.rs"]
mod tests;
