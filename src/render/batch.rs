use crate::eval::mask::ClipRef;
use crate::foundation::core::{Affine, ColorEffect, Point};
use crate::loader::atlas::AtlasRegion;

/// Layer stride in the integer part of a packed `v` coordinate; clip lengths stay below it.
pub const LAYER_STRIDE: u32 = 8;

/// Triangle geometry accumulated by one evaluation pass.
///
/// Parallel per-vertex arrays plus a triangle index list, ready to hand to a renderer.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Batch {
    /// Vertex positions in document space.
    pub positions: Vec<[f32; 2]>,
    /// Triangle list into the vertex arrays.
    pub indices: Vec<u32>,
    /// Packed color effects, see [`pack_color`].
    pub colors: Vec<[f32; 4]>,
    /// Packed atlas UVs with clip chain and layer, see [`pack_uv`].
    pub uvs: Vec<[f32; 2]>,
}

impl Batch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all geometry, keeping allocations.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.indices.clear();
        self.colors.clear();
        self.uvs.clear();
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Return `true` when nothing was emitted.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Emit one bitmap quad.
    ///
    /// Corners are the bitmap's authored rectangle `(0,0)-(w,h)` mapped by `transform`. UVs are
    /// normalized by `atlas_size`; when it is zero the quad spans the whole `[0, 1]` range.
    pub fn push_bitmap(
        &mut self,
        transform: Affine,
        region: &AtlasRegion,
        atlas_size: (u32, u32),
        effect: ColorEffect,
        clip: ClipRef,
    ) {
        let w = region.original_size.width;
        let h = region.original_size.height;
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(w, h),
            Point::new(0.0, h),
        ];

        let r = region.rect;
        let uv = if atlas_size.0 == 0 || atlas_size.1 == 0 {
            [
                Point::new(0.0, 0.0),
                Point::new(1.0, 0.0),
                Point::new(1.0, 1.0),
                Point::new(0.0, 1.0),
            ]
        } else {
            let (aw, ah) = (f64::from(atlas_size.0), f64::from(atlas_size.1));
            [
                Point::new(r.x0 / aw, r.y0 / ah),
                Point::new(r.x1 / aw, r.y0 / ah),
                Point::new(r.x1 / aw, r.y1 / ah),
                Point::new(r.x0 / aw, r.y1 / ah),
            ]
        };

        let base = self.positions.len() as u32;
        let color = pack_color(effect);
        for (corner, uv) in corners.iter().zip(uv) {
            let p = transform * *corner;
            self.positions.push([p.x as f32, p.y as f32]);
            self.colors.push(color);
            self.uvs.push(pack_uv(uv, clip, region.layer));
        }
        self.indices
            .extend([0, 1, 2, 0, 2, 3].into_iter().map(|i| base + i));
    }
}

/// Pack a color effect into one vertex color.
///
/// Per channel: `floor(add * 255) + clamp(mult, 0, 1) * 0.5`. The integer part carries the
/// offset, the fraction (always below one) the multiplier.
pub fn pack_color(effect: ColorEffect) -> [f32; 4] {
    let m = effect.mult.to_array();
    let a = effect.add.to_array();
    std::array::from_fn(|i| (a[i] * 255.0).floor() + m[i].clamp(0.0, 1.0) * 0.5)
}

/// Inverse of [`pack_color`]: `(mult, add)` per channel, `add` quantized to 1/255.
pub fn unpack_color(packed: [f32; 4]) -> ([f32; 4], [f32; 4]) {
    let mult = packed.map(|v| (v - v.floor()) * 2.0);
    let add = packed.map(|v| v.floor() / 255.0);
    (mult, add)
}

/// Pack an atlas UV with its clip chain and texture layer.
///
/// `u = uv.x * 0.5 + clip.id`, `v = uv.y * 0.5 + clip.len + LAYER_STRIDE * layer`.
pub fn pack_uv(uv: Point, clip: ClipRef, layer: u32) -> [f32; 2] {
    let u = uv.x * 0.5 + f64::from(clip.id);
    let v = uv.y * 0.5 + f64::from(clip.len) + f64::from(LAYER_STRIDE * layer);
    [u as f32, v as f32]
}

/// Inverse of [`pack_uv`]: `(uv, clip, layer)`.
pub fn unpack_uv(packed: [f32; 2]) -> (Point, ClipRef, u32) {
    let [u, v] = packed.map(f64::from);
    let (iu, iv) = (u.floor(), v.floor());
    let iv = iv as u32;
    (
        Point::new((u - iu) * 2.0, (v - f64::from(iv)) * 2.0),
        ClipRef {
            id: iu as u32,
            len: iv % LAYER_STRIDE,
        },
        iv / LAYER_STRIDE,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/render/batch.rs"]
mod tests;
