use image::{Rgba, Rgba32FImage};

use crate::eval::mask::ClipItem;
use crate::foundation::core::Affine;

/// Edge length of the square clip encoding image.
pub const CLIP_TEXTURE_SIZE: u32 = 32;
/// Horizontal pixels reserved per clip entry (three used).
pub const CLIP_ENTRY_STRIDE: u32 = 4;
/// Entries that fit in the image.
pub const MAX_CLIP_ENTRIES: usize =
    ((CLIP_TEXTURE_SIZE / CLIP_ENTRY_STRIDE) * CLIP_TEXTURE_SIZE) as usize;

/// Encode the clip cache as an RGBA f32 image for the shader.
///
/// Entry `i` sits at `x = (i % 8) * 4`, `y = i / 8` and occupies three pixels:
/// the inverse 2x2 part `(a, b, c, d)`, the inverse translation plus layer `(e, f, layer, 0)`,
/// and the atlas region `(x, y, w, h)`. The inverse maps screen space, given by `world`, back to
/// region pixels. Entries past [`MAX_CLIP_ENTRIES`] are dropped.
pub fn build_clip_texture(items: &[ClipItem], world: Affine) -> Rgba32FImage {
    let mut img = Rgba32FImage::new(CLIP_TEXTURE_SIZE, CLIP_TEXTURE_SIZE);
    if items.len() > MAX_CLIP_ENTRIES {
        tracing::warn!(
            entries = items.len(),
            max = MAX_CLIP_ENTRIES,
            "clip texture overflow"
        );
    }
    for (i, item) in items.iter().take(MAX_CLIP_ENTRIES).enumerate() {
        let (x, y) = entry_origin(i);
        let full = world * item.transform;
        let c = if full.determinant().abs() > f64::EPSILON {
            full.inverse().as_coeffs()
        } else {
            [0.0; 6]
        };
        let r = item.region;
        img.put_pixel(
            x,
            y,
            Rgba([c[0] as f32, c[1] as f32, c[2] as f32, c[3] as f32]),
        );
        img.put_pixel(
            x + 1,
            y,
            Rgba([c[4] as f32, c[5] as f32, item.layer as f32, 0.0]),
        );
        img.put_pixel(
            x + 2,
            y,
            Rgba([
                r.x0 as f32,
                r.y0 as f32,
                r.width() as f32,
                r.height() as f32,
            ]),
        );
    }
    img
}

/// Pixel position of entry `i`.
pub fn entry_origin(i: usize) -> (u32, u32) {
    let per_row = (CLIP_TEXTURE_SIZE / CLIP_ENTRY_STRIDE) as usize;
    (
        (i % per_row) as u32 * CLIP_ENTRY_STRIDE,
        (i / per_row) as u32,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/render/clip_texture.rs"]
mod tests;
