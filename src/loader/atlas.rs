use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::core::Rect;
use crate::foundation::error::{XflError, XflResult};

/// File in the document directory naming one sprite sheet per line.
pub const SHEET_LIST_FILE: &str = "spritesheets.list";

const EXPORT_PREFIX: &str = "gdexp/";

/// Placement of one bitmap inside the layered atlas.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AtlasRegion {
    /// Pixel rectangle inside its layer, after down-scaling.
    pub rect: Rect,
    /// Atlas layer (sprite sheet) index.
    pub layer: u32,
    /// Unscaled bitmap size, as authored.
    pub original_size: kurbo::Size,
}

impl AtlasRegion {
    /// Factor mapping region pixels back to authored pixels on each axis.
    pub fn unscale(&self) -> kurbo::Vec2 {
        let w = self.rect.width();
        let h = self.rect.height();
        kurbo::Vec2::new(
            if w > 0.0 { self.original_size.width / w } else { 1.0 },
            if h > 0.0 { self.original_size.height / h } else { 1.0 },
        )
    }
}

/// One sprite sheet: a layer of the atlas texture array.
#[derive(Clone, Debug, serde::Serialize)]
pub struct AtlasLayer {
    /// Sheet base name, as listed.
    pub name: String,
    /// PNG path on disk.
    pub image_path: PathBuf,
    /// Layer width in pixels, after down-scaling.
    pub width: u32,
    /// Layer height in pixels, after down-scaling.
    pub height: u32,
}

/// Layered texture atlas assembled from exported sprite sheets.
#[derive(Clone, Debug, Default)]
pub struct Atlas {
    layers: Vec<AtlasLayer>,
    frames: BTreeMap<String, AtlasRegion>,
    downscale: u32,
}

#[derive(serde::Deserialize)]
struct SheetJson {
    frames: BTreeMap<String, SheetFrame>,
}

#[derive(serde::Deserialize)]
struct SheetFrame {
    frame: SheetRect,
}

#[derive(serde::Deserialize)]
struct SheetRect {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl Atlas {
    /// Load every sheet named in `dir/spritesheets.list`.
    ///
    /// Returns `Ok(None)` when the list file is absent. Each `downscale` step halves regions and
    /// layer dimensions; original sizes stay unscaled.
    pub fn load(dir: &Path, downscale: u32) -> XflResult<Option<Self>> {
        let list_path = dir.join(SHEET_LIST_FILE);
        if !list_path.is_file() {
            return Ok(None);
        }
        let list = std::fs::read_to_string(&list_path)
            .with_context(|| format!("read {}", list_path.display()))?;

        let mut atlas = Self {
            downscale,
            ..Self::default()
        };
        for name in list.lines().map(str::trim).filter(|l| !l.is_empty()) {
            atlas.add_sheet(dir, name)?;
        }
        tracing::debug!(
            layers = atlas.layers.len(),
            frames = atlas.frames.len(),
            "atlas loaded"
        );
        Ok(Some(atlas))
    }

    fn add_sheet(&mut self, dir: &Path, name: &str) -> XflResult<()> {
        let json_path = dir.join(format!("{name}.json"));
        let image_path = dir.join(format!("{name}.png"));
        let text = std::fs::read_to_string(&json_path)
            .with_context(|| format!("read {}", json_path.display()))?;
        let sheet: SheetJson = serde_json::from_str(&text)
            .map_err(|e| XflError::parse(format!("{}: {e}", json_path.display())))?;
        let (w, h) = image::image_dimensions(&image_path)
            .with_context(|| format!("read image header {}", image_path.display()))?;

        let layer = self.layers.len() as u32;
        let scale = self.scale();
        for (key, f) in sheet.frames {
            let r = f.frame;
            let region = AtlasRegion {
                rect: Rect::new(r.x, r.y, r.x + r.w, r.y + r.h).scale_from_origin(scale),
                layer,
                original_size: kurbo::Size::new(r.w, r.h),
            };
            self.frames.entry(key).or_insert(region);
        }
        self.layers.push(AtlasLayer {
            name: name.to_owned(),
            image_path,
            width: scaled_dim(w, self.downscale),
            height: scaled_dim(h, self.downscale),
        });
        Ok(())
    }

    /// Build an atlas from already-known parts (tests and hosts with custom packing).
    pub fn from_parts(
        layers: Vec<AtlasLayer>,
        frames: BTreeMap<String, AtlasRegion>,
        downscale: u32,
    ) -> Self {
        Self {
            layers,
            frames,
            downscale,
        }
    }

    fn scale(&self) -> f64 {
        0.5f64.powi(self.downscale as i32)
    }

    /// Down-scale steps applied (0 = none).
    pub fn downscale(&self) -> u32 {
        self.downscale
    }

    /// Atlas layers in index order.
    pub fn layers(&self) -> &[AtlasLayer] {
        &self.layers
    }

    /// Pixel size shared by the texture array: the largest layer on each axis.
    pub fn size(&self) -> (u32, u32) {
        self.layers
            .iter()
            .fold((0, 0), |(w, h), l| (w.max(l.width), h.max(l.height)))
    }

    /// Region for a sheet frame key.
    pub fn frame(&self, key: &str) -> Option<AtlasRegion> {
        self.frames.get(key).copied()
    }

    /// Find the region of a bitmap item: by name, then href, then the href's file name.
    pub fn region_for(&self, name: &str, href: &str) -> Option<AtlasRegion> {
        let file_name = Path::new(href)
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(href);
        [name, href, file_name]
            .into_iter()
            .map(|k| k.strip_prefix(EXPORT_PREFIX).unwrap_or(k))
            .find_map(|k| self.frame(k))
    }

    /// Decode one layer as RGBA8, down-scaled to the atlas resolution.
    pub fn load_layer_rgba(&self, index: usize) -> XflResult<image::RgbaImage> {
        let layer = self
            .layers
            .get(index)
            .ok_or_else(|| XflError::validation(format!("atlas layer {index} out of range")))?;
        let img = image::open(&layer.image_path)
            .with_context(|| format!("decode {}", layer.image_path.display()))?
            .to_rgba8();
        if self.downscale == 0 {
            return Ok(img);
        }
        Ok(image::imageops::resize(
            &img,
            layer.width.max(1),
            layer.height.max(1),
            image::imageops::FilterType::Triangle,
        ))
    }
}

fn scaled_dim(v: u32, steps: u32) -> u32 {
    (0..steps).fold(v, |acc, _| (acc / 2).max(1))
}

#[cfg(test)]
#[path = "../../tests/unit/loader/atlas.rs"]
mod tests;
