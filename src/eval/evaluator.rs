use crate::document::model::{
    Document, Drawing, DrawingKind, Frame, Layer, LoopMode, SymbolInstance, TimelineId,
};
use crate::eval::events::collect_crossed;
use crate::eval::mask::MaskStack;
use crate::foundation::core::{Affine, ColorEffect, Lerp};
use crate::foundation::error::{XflError, XflResult};
use crate::foundation::math::{FRAME_EPSILON, wrap_time};
use crate::playback::overrides::FrameOverrides;
use crate::render::batch::Batch;

/// Evaluation settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EvalOpts {
    /// Deepest nested-symbol level evaluated; deeper instances contribute nothing.
    pub max_depth: usize,
}

impl Default for EvalOpts {
    fn default() -> Self {
        Self { max_depth: 64 }
    }
}

/// Output of one evaluation pass.
#[derive(Clone, Debug, Default)]
pub struct Evaluation {
    /// Emitted geometry.
    pub batch: Batch,
    /// Events crossed during the pass, de-duplicated by name.
    pub events: Vec<String>,
}

/// Which keyframe of a layer is active at a given time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerSample {
    /// Position of the active keyframe in the layer.
    pub keyframe: usize,
    /// `time` wrapped into the layer, minus the keyframe start.
    pub local_time: f64,
    /// Tween progress toward the next keyframe (0 without a tween).
    pub progress: f64,
}

/// Select the active keyframe of `layer` at `time`.
///
/// `time` is wrapped into `[0, duration)` first; an empty layer or a time before the first
/// keyframe yields `None`.
pub fn sample_layer(layer: &Layer, time: f64) -> Option<LayerSample> {
    let t = wrap_time(time, f64::from(layer.duration));
    let keyframe = layer.keyframe_at(t.floor() as u32)?;
    let frame = &layer.frames[keyframe];
    let local_time = t - f64::from(frame.index);
    let progress = frame.tween.as_ref().map_or(0.0, |tw| {
        tw.interpolate(local_time / f64::from(frame.duration.max(1)))
    });
    Some(LayerSample {
        keyframe,
        local_time,
        progress,
    })
}

/// Map a parent's local time to the time of an instanced timeline of `duration` frames.
pub fn instance_time(inst: &SymbolInstance, duration: u32, local_time: f64) -> f64 {
    let first = f64::from(inst.first_frame);
    match inst.looping {
        LoopMode::SingleFrame => first,
        LoopMode::PlayOnce => (first + local_time).min(f64::from(duration) - FRAME_EPSILON).max(0.0),
        LoopMode::Loop => first + local_time,
    }
}

/// Frames a nested timeline advanced during a parent step of `delta` frames.
///
/// Looping instances run with the parent clock, so they see the full step even when the parent
/// layer just entered a new keyframe and `local_time` restarted. Play-once instances report only
/// their clamped advance.
fn nested_step(inst: &SymbolInstance, duration: u32, local_time: f64, delta: f64) -> f64 {
    match inst.looping {
        LoopMode::SingleFrame => 0.0,
        LoopMode::Loop => delta,
        LoopMode::PlayOnce => {
            let now = instance_time(inst, duration, local_time);
            let prev = instance_time(inst, duration, (local_time - delta).max(0.0));
            (now - prev).max(0.0)
        }
    }
}

/// Reusable evaluation engine.
///
/// Walks a timeline tree at a point in time, composing transforms and color effects down the
/// nesting, routing mask-layer bitmaps into the [`MaskStack`], and emitting every other bitmap
/// into a [`Batch`].
#[derive(Debug, Default)]
pub struct Evaluator {
    opts: EvalOpts,
    masks: MaskStack,
}

impl Evaluator {
    /// Create an evaluator.
    pub fn new(opts: EvalOpts) -> Self {
        Self {
            opts,
            masks: MaskStack::new(),
        }
    }

    /// Mask state left by the last pass; its clip cache backs the packed clip ids.
    pub fn mask_stack(&self) -> &MaskStack {
        &self.masks
    }

    /// Evaluate `timeline` at `time` frames, `delta` frames after the previous pass.
    ///
    /// A zero `delta` (a seek) suppresses event detection.
    #[tracing::instrument(
        level = "debug",
        skip(self, doc, overrides, timeline),
        fields(timeline = timeline.0)
    )]
    pub fn evaluate(
        &mut self,
        doc: &Document,
        timeline: TimelineId,
        time: f64,
        delta: f64,
        overrides: &FrameOverrides,
    ) -> XflResult<Evaluation> {
        self.masks.reset();
        let mut out = Evaluation::default();
        let mut walk = Walk {
            doc,
            overrides,
            masks: &mut self.masks,
            out: &mut out,
            max_depth: self.opts.max_depth,
            atlas_size: doc.atlas().map_or((0, 0), |a| a.size()),
            depth_warned: false,
        };
        walk.timeline(
            timeline,
            time,
            delta,
            Affine::IDENTITY,
            ColorEffect::IDENTITY,
            0,
        )?;
        tracing::debug!(
            vertices = out.batch.vertex_count(),
            events = out.events.len(),
            "evaluation pass done"
        );
        Ok(out)
    }
}

struct Walk<'a> {
    doc: &'a Document,
    overrides: &'a FrameOverrides,
    masks: &'a mut MaskStack,
    out: &'a mut Evaluation,
    max_depth: usize,
    atlas_size: (u32, u32),
    depth_warned: bool,
}

impl Walk<'_> {
    fn timeline(
        &mut self,
        id: TimelineId,
        time: f64,
        delta: f64,
        tr: Affine,
        fx: ColorEffect,
        depth: usize,
    ) -> XflResult<()> {
        if depth > self.max_depth {
            if !self.depth_warned {
                tracing::warn!(timeline = id.0, max_depth = self.max_depth, "nesting too deep");
                self.depth_warned = true;
            }
            return Ok(());
        }
        let doc = self.doc;
        let Some(tl) = doc.timeline(id) else {
            return Ok(());
        };

        if delta > 0.0 {
            collect_crossed(tl, time, delta, &mut self.out.events);
        }

        for layer in tl.mask_layers() {
            self.masks.mask_begin(layer.uid);
            let res = self.layer(layer, time, delta, tr, fx, depth);
            self.masks.mask_end();
            res?;
        }

        for layer in tl.content_layers() {
            if let Some(mask) = layer.clip {
                self.masks.clip_begin(mask);
            }
            let res = self.layer(layer, time, delta, tr, fx, depth);
            if layer.clip.is_some() {
                self.masks.clip_end();
            }
            res?;
        }
        Ok(())
    }

    fn layer(
        &mut self,
        layer: &Layer,
        time: f64,
        delta: f64,
        tr: Affine,
        fx: ColorEffect,
        depth: usize,
    ) -> XflResult<()> {
        let Some(sample) = sample_layer(layer, time) else {
            return Ok(());
        };
        let current = &layer.frames[sample.keyframe];
        let next = layer.frames.get(sample.keyframe + 1);
        let p = sample.progress;

        for (i, el) in current.elements.iter().enumerate() {
            let (el_tr, el_fx) = blend_element(el, next, i, p);
            self.drawing(
                el,
                tr * el_tr,
                fx * el_fx,
                sample.local_time,
                delta,
                depth,
            )?;
        }
        Ok(())
    }

    fn drawing(
        &mut self,
        d: &Drawing,
        tr: Affine,
        fx: ColorEffect,
        local_time: f64,
        delta: f64,
        depth: usize,
    ) -> XflResult<()> {
        match &d.kind {
            DrawingKind::Group(members) => {
                for m in members {
                    self.drawing(m, tr * m.transform, fx, local_time, delta, depth)?;
                }
                Ok(())
            }
            DrawingKind::Instance(inst) => {
                let doc = self.doc;
                let Some(id) = doc.resolve_instance(inst) else {
                    return Ok(());
                };
                let Some(tl) = doc.timeline(id) else {
                    return Ok(());
                };
                let t = instance_time(inst, tl.duration, local_time);
                let nested_delta = nested_step(inst, tl.duration, local_time, delta);
                let (t, nested_delta) = self.overrides.resolve(id, tl, t, nested_delta);
                self.timeline(id, t, nested_delta, tr, fx, depth + 1)
            }
            DrawingKind::Bitmap(bmp) => {
                let Some(region) = bmp.region else {
                    return Ok(());
                };
                if self.masks.is_masking() {
                    self.masks.mask_add(tr, &region);
                } else {
                    let clip = self.masks.clip_ref();
                    self.out
                        .batch
                        .push_bitmap(tr, &region, self.atlas_size, fx, clip);
                }
                Ok(())
            }
            DrawingKind::Shape => Err(XflError::evaluation(
                "vector shape reached evaluation; documents with shapes fail to load",
            )),
        }
    }
}

/// Transform and effect of element `i`, blended toward the same position in `next`.
fn blend_element(el: &Drawing, next: Option<&Frame>, i: usize, p: f64) -> (Affine, ColorEffect) {
    let own_fx = el.color_effect();
    match next.and_then(|n| n.elements.get(i)) {
        Some(n) if p > 0.0 => (
            <Affine as Lerp>::lerp(&el.transform, &n.transform, p),
            ColorEffect::lerp(&own_fx, &n.color_effect(), p),
        ),
        _ => (el.transform, own_fx),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/eval/evaluator.rs"]
mod tests;
