use std::collections::BTreeMap;

use crate::document::model::{
    Document, Drawing, DrawingKind, LayerKind, LayerUid, Timeline, TimelineId,
};
use crate::loader::atlas::AtlasRegion;

/// Outcome counters of a [`Document::setup`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SetupReport {
    /// Layers whose clip reference was resolved to a sibling mask.
    pub clipped_layers: usize,
    /// Parent references that did not name a sibling layer.
    pub bad_mask_refs: usize,
    /// Instances whose token is not in the symbol table.
    pub unresolved_instances: usize,
    /// Bitmap instances with no atlas placement.
    pub unresolved_bitmaps: usize,
    /// Distinct variation slots assigned.
    pub variation_slots: u32,
}

impl Document {
    /// Post-parse pass: resolve mask parents, memoize instance and bitmap lookups, then assign
    /// variation slots.
    ///
    /// Idempotent: running it again on an unchanged document yields the same assignments.
    pub fn setup(&mut self) -> SetupReport {
        let mut report = SetupReport::default();

        for tl in &mut self.timelines {
            resolve_clips(tl, &mut report);
        }

        let symbols = &self.symbols;
        let bitmaps: BTreeMap<&str, Option<AtlasRegion>> = self
            .bitmaps
            .values()
            .map(|b| (b.name.as_str(), b.region))
            .collect();
        for tl in &mut self.timelines {
            for layer in &mut tl.layers {
                for frame in &mut layer.frames {
                    for d in &mut frame.elements {
                        resolve_drawing(d, &tl.token, symbols, &bitmaps, &mut report);
                    }
                }
            }
        }

        report.variation_slots = self.assign_variation_slots();
        report
    }

    /// Give every library symbol that owns an anchor label a dense slot in `[0, N)`, in ascending
    /// token order. Returns `N`.
    pub fn assign_variation_slots(&mut self) -> u32 {
        for tl in &mut self.timelines {
            tl.variation_slot = None;
        }
        let mut next = 0u32;
        let ids: Vec<(String, TimelineId)> = self
            .symbols
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        for (token, id) in ids {
            let Some(tl) = self.timeline_mut(id) else {
                continue;
            };
            if tl.variants.is_empty() || tl.variation_slot.is_some() {
                continue;
            }
            tl.variation_slot = Some(next);
            tracing::debug!(token = %token, slot = next, "variation slot assigned");
            next += 1;
        }
        self.variation_slots = next;
        next
    }

    /// Timeline owning a variation slot, if any.
    pub fn timeline_for_slot(&self, slot: u32) -> Option<TimelineId> {
        self.symbols
            .values()
            .copied()
            .find(|id| self.timeline(*id).and_then(|t| t.variation_slot) == Some(slot))
    }
}

fn resolve_clips(tl: &mut Timeline, report: &mut SetupReport) {
    let by_index: BTreeMap<u32, (LayerUid, LayerKind)> =
        tl.layers.iter().map(|l| (l.index, (l.uid, l.kind))).collect();
    for layer in &mut tl.layers {
        layer.clip = None;
        let Some(parent) = layer.parent_index else {
            continue;
        };
        match by_index.get(&parent) {
            Some((uid, LayerKind::Mask)) if *uid != layer.uid => {
                layer.clip = Some(*uid);
                report.clipped_layers += 1;
            }
            // Guided or foldered layers: the parent is not a mask, nothing to clip.
            Some(_) => {}
            None => {
                report.bad_mask_refs += 1;
                tracing::warn!(
                    timeline = %tl.token,
                    layer = %layer.name,
                    parent,
                    "layer parent index names no sibling layer"
                );
            }
        }
    }
}

fn resolve_drawing(
    d: &mut Drawing,
    owner: &str,
    symbols: &BTreeMap<String, TimelineId>,
    bitmaps: &BTreeMap<&str, Option<AtlasRegion>>,
    report: &mut SetupReport,
) {
    match &mut d.kind {
        DrawingKind::Group(members) => {
            for m in members {
                resolve_drawing(m, owner, symbols, bitmaps, report);
            }
        }
        DrawingKind::Instance(inst) => {
            inst.resolved = symbols.get(&inst.token).copied();
            if inst.resolved.is_none() {
                report.unresolved_instances += 1;
                tracing::warn!(timeline = %owner, symbol = %inst.token, "unresolved symbol");
            }
        }
        DrawingKind::Bitmap(bmp) => {
            bmp.region = bitmaps.get(bmp.item.as_str()).copied().flatten();
            if bmp.region.is_none() {
                report.unresolved_bitmaps += 1;
                tracing::warn!(timeline = %owner, bitmap = %bmp.item, "bitmap has no atlas region");
            }
        }
        DrawingKind::Shape => {}
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/setup.rs"]
mod tests;
