use serde::{Deserialize, Serialize};

pub const ANCHORS_PER_LAYER: usize = 3;

/// Reference box size in model input pixels.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorPair {
    pub width: f32,
    pub height: f32,
}

impl AnchorPair {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Per layer anchors, ordered like the network's output layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorTable([[AnchorPair; ANCHORS_PER_LAYER]; 3]);

/// Anchors of the YOLOv5 detection head the breed model is trained with.
pub const ANCHORS: AnchorTable = AnchorTable([
    [AnchorPair::new(10., 13.), AnchorPair::new(16., 30.), AnchorPair::new(33., 23.)],
    [AnchorPair::new(30., 61.), AnchorPair::new(62., 45.), AnchorPair::new(59., 119.)],
    [AnchorPair::new(116., 90.), AnchorPair::new(156., 198.), AnchorPair::new(373., 326.)],
]);

impl AnchorTable {
    /// Anchors of the given layer, `None` past the last layer.
    pub fn layer(&self, index: usize) -> Option<&[AnchorPair; ANCHORS_PER_LAYER]> {
        self.0.get(index)
    }

    pub fn layer_count(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_detection_head() {
        assert_eq!(ANCHORS.layer_count(), 3);
        assert_eq!(ANCHORS.layer(0).unwrap()[1], AnchorPair::new(16., 30.));
        assert_eq!(ANCHORS.layer(2).unwrap()[2], AnchorPair::new(373., 326.));
        assert!(ANCHORS.layer(3).is_none());
    }
}
