//! xfl-player loads exported XFL animation documents and evaluates them into triangle batches.
//!
//! The flow is load once, evaluate every tick:
//!
//! - [`load`] a document directory into a [`Document`]
//! - drive it with a [`Player`] (`advance`, `set_clip`, `set_variant`, clip tracks)
//! - hand [`Player::batch`] and [`Player::clip_texture`] to a renderer
//!
//! [`Evaluator`] exposes a single evaluation pass for hosts that manage time themselves.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod animation;
pub(crate) mod document;
pub(crate) mod eval;
pub(crate) mod loader;
pub(crate) mod playback;
pub(crate) mod render;

pub use crate::foundation::core::{Affine, ColorEffect, FrameSpan, Lerp, Point, Rect, Rgba, Vec2};
pub use crate::foundation::error::{XflError, XflResult};
pub use crate::foundation::math::{FRAME_EPSILON, wrap_time};

pub use crate::animation::ease::{Curve, Ease};
pub use crate::animation::tween::{BezierEase, Tween};

pub use crate::document::model::{
    BitmapInstance, BitmapItem, Document, Drawing, DrawingKind, EventLabel, Frame, FrameLabel,
    LabelKind, Layer, LayerKind, LayerUid, LoopMode, SymbolInstance, Timeline, TimelineId,
};
pub use crate::document::setup::SetupReport;

pub use crate::loader::atlas::{Atlas, AtlasLayer, AtlasRegion};
pub use crate::loader::parse::{LoadOpts, load, parse_symbol_str};

pub use crate::eval::evaluator::{
    EvalOpts, Evaluation, Evaluator, LayerSample, instance_time, sample_layer,
};
pub use crate::eval::events::Crossing;
pub use crate::eval::mask::{ClipItem, ClipRef, MAX_CLIP_CHAIN, MaskDepth, MaskStack};

pub use crate::render::batch::{Batch, pack_color, pack_uv, unpack_color, unpack_uv};
pub use crate::render::clip_texture::{CLIP_TEXTURE_SIZE, MAX_CLIP_ENTRIES, build_clip_texture};
pub use crate::render::fingerprint::BatchFingerprint;

pub use crate::playback::overrides::{FrameOverrides, TrackTime};
pub use crate::playback::player::{Advance, PlayState, PlaybackStatus, Player, PlayerOpts};
pub use crate::playback::track::{ClipTrack, PlayCursor, Step, TrackStatus};
