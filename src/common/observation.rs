use std::hash::{Hash, Hasher};
use serde::{Deserialize, Serialize};
use crate::common::bounding_rect::identity_bits;
use crate::common::BoundingRect;
use crate::detection_runners::nms::Nms;

/// One class that survived the confidence threshold for a decoded cell.
#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationItem {
    pub class_index: usize,
    /// `objectness * class confidence`.
    pub score: f32,
}

impl ObservationItem {
    pub fn new(class_index: usize, score: f32) -> Self {
        Self { class_index, score }
    }
}

/// A decoded detection in canvas space.
///
/// Two observations are equal when they cover the same rectangle with the same
/// objectness score; the class list does not take part in the comparison.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// 1-based position in the final result, 0 until assembled.
    pub detection_index: usize,
    pub rect: BoundingRect,
    /// Objectness confidence of the cell.
    pub score: f32,
    pub objects: Vec<ObservationItem>,
}

impl Observation {
    pub fn new(rect: BoundingRect, score: f32, objects: Vec<ObservationItem>) -> Self {
        Self {
            detection_index: 0,
            rect,
            score,
            objects,
        }
    }

    /// Sets the detection index.
    ///
    /// # Arguments
    ///
    /// * `detection_index` - The 1-based index to be set.
    ///
    /// # Returns
    ///
    /// An `Observation` instance with the updated index.
    pub fn with_detection_index(mut self, detection_index: usize) -> Self {
        self.detection_index = detection_index;
        self
    }

    pub fn with_objects(mut self, objects: Vec<ObservationItem>) -> Self {
        self.objects = objects;
        self
    }

    /// Returns the class with the highest score, if any.
    pub fn top_item(&self) -> Option<&ObservationItem> {
        self.objects
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
    }

    /// Returns the classes ordered by descending score.
    pub fn sorted_objects(&self) -> Vec<ObservationItem> {
        let mut objects = self.objects.clone();
        objects.sort_by(|a, b| b.score.total_cmp(&a.score));
        objects
    }

}

impl Nms for Observation {
    fn iou(&self, other: &Self) -> f32 {
        self.rect.iou(&other.rect)
    }

    fn confidence(&self) -> f32 {
        self.score
    }
}

// Compared on `identity_bits` so that `Eq` and `Hash` agree.
impl PartialEq for Observation {
    fn eq(&self, other: &Self) -> bool {
        self.rect.to_bits() == other.rect.to_bits() && identity_bits(self.score) == identity_bits(other.score)
    }
}

impl Eq for Observation {}

impl Hash for Observation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        identity_bits(self.score).hash(state);
        self.rect.to_bits().hash(state);
    }
}
