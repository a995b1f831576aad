use std::collections::HashMap;

use smallvec::SmallVec;

use crate::document::model::LayerUid;
use crate::foundation::core::{Affine, Rect};
use crate::loader::atlas::AtlasRegion;

/// Most clip-chain entries a single vertex can reference.
pub const MAX_CLIP_CHAIN: usize = 4;

/// One mask shape: a bitmap region placed by a transform.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct ClipItem {
    /// Maps region-local pixels to document space.
    pub transform: Affine,
    /// Pixel rectangle inside the atlas layer.
    pub region: Rect,
    /// Atlas layer index.
    pub layer: u32,
}

/// Clip chain reference packed into emitted vertices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
pub struct ClipRef {
    /// Offset of the chain inside the finalized clip cache.
    pub id: u32,
    /// Number of chain entries, at most [`MAX_CLIP_CHAIN`]. `0` means unmasked.
    pub len: u32,
}

/// Nesting depths, for checking that scopes are balanced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MaskDepth {
    /// Open mask scopes.
    pub masks: usize,
    /// Open clip scopes.
    pub clips: usize,
    /// Active clip items.
    pub items: usize,
}

/// Mask and clip state of one evaluation pass.
///
/// Mask layers collect bitmap shapes into per-mask lists; content layers clipped by a mask push
/// that list onto the active chain. Every scope change appends a snapshot of the active chain to
/// the clip cache, and geometry emitted in between points at the next snapshot slot.
#[derive(Clone, Debug, Default)]
pub struct MaskStack {
    stack: SmallVec<[LayerUid; 4]>,
    masks: HashMap<LayerUid, Vec<ClipItem>>,
    clipping_items: Vec<ClipItem>,
    clipping_cache: Vec<ClipItem>,
    clip_counts: SmallVec<[usize; 4]>,
    truncated: bool,
}

impl MaskStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all state from a previous pass.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.masks.clear();
        self.clipping_items.clear();
        self.clipping_cache.clear();
        self.clip_counts.clear();
        self.truncated = false;
    }

    /// Mask currently collecting shapes: the outermost open mask scope.
    pub fn current_mask(&self) -> Option<LayerUid> {
        self.stack.first().copied()
    }

    /// Return `true` while inside a mask layer.
    pub fn is_masking(&self) -> bool {
        !self.stack.is_empty()
    }

    /// Enter a mask layer.
    pub fn mask_begin(&mut self, mask: LayerUid) {
        if self.stack.is_empty() {
            self.masks.insert(mask, Vec::new());
        }
        self.stack.push(mask);
    }

    /// Leave the innermost mask layer.
    pub fn mask_end(&mut self) {
        self.stack.pop();
    }

    /// Record a bitmap as a shape of the current mask.
    ///
    /// `transform` places the bitmap's authored (unscaled) rectangle; it is rescaled so the item
    /// maps region pixels instead.
    pub fn mask_add(&mut self, transform: Affine, region: &AtlasRegion) {
        let Some(mask) = self.current_mask() else {
            return;
        };
        let s = region.unscale();
        self.masks.entry(mask).or_default().push(ClipItem {
            transform: transform * Affine::scale_non_uniform(s.x, s.y),
            region: region.rect,
            layer: region.layer,
        });
    }

    /// Shapes collected so far for `mask`.
    pub fn mask_items(&self, mask: LayerUid) -> &[ClipItem] {
        self.masks.get(&mask).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Enter a content layer clipped by `mask`.
    pub fn clip_begin(&mut self, mask: LayerUid) {
        self.clipping_cache.extend_from_slice(&self.clipping_items);
        let items = self.masks.get(&mask).map(Vec::as_slice).unwrap_or(&[]);
        self.clipping_items.extend_from_slice(items);
        self.clip_counts.push(items.len());
    }

    /// Leave the innermost clipped content layer.
    pub fn clip_end(&mut self) {
        self.clipping_cache.extend_from_slice(&self.clipping_items);
        let n = self.clip_counts.pop().unwrap_or(0);
        let keep = self.clipping_items.len().saturating_sub(n);
        self.clipping_items.truncate(keep);
    }

    /// Chain reference for geometry emitted now.
    pub fn clip_ref(&mut self) -> ClipRef {
        let mut len = self.clipping_items.len();
        if len > MAX_CLIP_CHAIN {
            if !self.truncated {
                tracing::warn!(len, max = MAX_CLIP_CHAIN, "clip chain truncated");
                self.truncated = true;
            }
            len = MAX_CLIP_CHAIN;
        }
        ClipRef {
            id: self.clipping_cache.len() as u32,
            len: len as u32,
        }
    }

    /// Active clip chain.
    pub fn clipping_items(&self) -> &[ClipItem] {
        &self.clipping_items
    }

    /// Finalized chain snapshots referenced by [`ClipRef::id`].
    pub fn clipping_cache(&self) -> &[ClipItem] {
        &self.clipping_cache
    }

    /// Current nesting depths.
    pub fn depth(&self) -> MaskDepth {
        MaskDepth {
            masks: self.stack.len(),
            clips: self.clip_counts.len(),
            items: self.clipping_items.len(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/eval/mask.rs"]
mod tests;
