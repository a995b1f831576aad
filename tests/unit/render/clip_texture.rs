use super::*;
use crate::foundation::core::Rect;

fn item(tx: f64, layer: u32) -> ClipItem {
    ClipItem {
        transform: Affine::translate((tx, 0.0)) * Affine::scale(2.0),
        region: Rect::new(4.0, 8.0, 20.0, 40.0),
        layer,
    }
}

#[test]
fn entries_are_laid_out_eight_per_row() {
    assert_eq!(entry_origin(0), (0, 0));
    assert_eq!(entry_origin(1), (4, 0));
    assert_eq!(entry_origin(7), (28, 0));
    assert_eq!(entry_origin(8), (0, 1));
    assert_eq!(MAX_CLIP_ENTRIES, 256);
}

#[test]
fn entry_holds_inverse_layer_and_region() {
    let img = build_clip_texture(&[item(0.0, 0), item(10.0, 3)], Affine::IDENTITY);
    assert_eq!(img.dimensions(), (CLIP_TEXTURE_SIZE, CLIP_TEXTURE_SIZE));

    let (x, y) = entry_origin(1);
    assert_eq!(img.get_pixel(x, y).0, [0.5, 0.0, 0.0, 0.5]);
    assert_eq!(img.get_pixel(x + 1, y).0, [-5.0, 0.0, 3.0, 0.0]);
    assert_eq!(img.get_pixel(x + 2, y).0, [4.0, 8.0, 16.0, 32.0]);
    assert_eq!(img.get_pixel(x + 3, y).0, [0.0; 4]);
}

#[test]
fn world_transform_is_folded_into_inverse() {
    let img = build_clip_texture(&[item(0.0, 0)], Affine::translate((0.0, 6.0)));
    assert_eq!(img.get_pixel(1, 0).0, [0.0, -3.0, 0.0, 0.0]);
}

#[test]
fn singular_transform_encodes_zeros() {
    let flat = ClipItem {
        transform: Affine::scale_non_uniform(1.0, 0.0),
        region: Rect::new(0.0, 0.0, 1.0, 1.0),
        layer: 1,
    };
    let img = build_clip_texture(&[flat], Affine::IDENTITY);
    assert_eq!(img.get_pixel(0, 0).0, [0.0; 4]);
    assert_eq!(img.get_pixel(1, 0).0, [0.0, 0.0, 1.0, 0.0]);
}

#[test]
fn overflow_is_dropped() {
    let items = vec![item(1.0, 0); MAX_CLIP_ENTRIES + 3];
    let img = build_clip_texture(&items, Affine::IDENTITY);
    let (x, y) = entry_origin(MAX_CLIP_ENTRIES - 1);
    assert_eq!(img.get_pixel(x + 2, y).0, [4.0, 8.0, 16.0, 32.0]);
}
