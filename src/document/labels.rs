use crate::document::model::{EventLabel, Frame, FrameLabel, LabelKind, Timeline};
use crate::foundation::core::FrameSpan;

impl Timeline {
    /// Record a keyframe label in the map its kind selects.
    ///
    /// Anchors become variants (`name -> index`), comments append `index` to the event list for
    /// `name`, and plain names become playable clips `[index, index + duration)`. Empty names are
    /// ignored.
    pub fn register_label(&mut self, label: &FrameLabel, index: u32, duration: u32) {
        if label.name.is_empty() {
            return;
        }
        match label.kind {
            LabelKind::Anchor => {
                self.variants.insert(label.name.clone(), index);
            }
            LabelKind::Comment => match self.events.iter_mut().find(|e| e.name == label.name) {
                Some(ev) => ev.frames.push(index),
                None => self.events.push(EventLabel {
                    name: label.name.clone(),
                    frames: vec![index],
                }),
            },
            LabelKind::Name => {
                let span = FrameSpan::new(index, index.saturating_add(duration));
                self.clips.insert(label.name.clone(), span);
            }
        }
    }

    /// Rebuild all three label maps from the keyframes currently held by the layers.
    pub fn index_labels(&mut self) {
        self.clips.clear();
        self.variants.clear();
        self.events.clear();
        let labelled: Vec<(FrameLabel, u32, u32)> = self
            .layers
            .iter()
            .flat_map(|l| l.frames.iter())
            .filter_map(|f: &Frame| f.label.clone().map(|l| (l, f.index, f.duration)))
            .collect();
        for (label, index, duration) in &labelled {
            self.register_label(label, *index, *duration);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/labels.rs"]
mod tests;
