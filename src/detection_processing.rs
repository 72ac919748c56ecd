use std::collections::HashMap;
use crate::common::{BoundingRect, Observation, ObservationItem};
use crate::data::{AnchorPair, LayerGeometry, RawLayerOutput, ANCHORS, ANCHORS_PER_LAYER, CONFIDENCE_THRESHOLD};
use crate::detection_runners::frame_decoder::{FrameDecoder, RawBox, ScaleFactors};
use crate::utils::sigmoid;

/// Resolves a layer's geometry together with its anchors.
///
/// Layers that cannot be decoded are logged and skipped by every backend.
pub(crate) fn resolve_layer(layer: &RawLayerOutput, index: usize,
                            input_width: u32, input_height: u32) -> Option<(LayerGeometry, [AnchorPair; ANCHORS_PER_LAYER])> {
    let Some(anchors) = ANCHORS.layer(index) else {
        log::debug!("Skipping layer {index}: no anchors for this layer");
        return None;
    };
    let Some(geometry) = LayerGeometry::resolve(layer, input_width, input_height) else {
        log::debug!("Skipping layer {index}: unsupported tensor shape {:?}", layer.shape());
        return None;
    };
    if geometry.boxes > ANCHORS_PER_LAYER {
        log::debug!("Skipping layer {index}: {} boxes per cell but {ANCHORS_PER_LAYER} anchors", geometry.boxes);
        return None;
    }
    Some((geometry, *anchors))
}

/// YOLOv5 box transform of the four raw box logits of one cell.
pub(crate) fn decode_raw_box(logits: [f32; 4], col: usize, row: usize,
                             horizontal_block_size: f32, vertical_block_size: f32,
                             anchor: AnchorPair) -> RawBox {
    let [tx, ty, tw, th] = logits;
    RawBox {
        x: (sigmoid(tx) * 2. - 0.5 + col as f32) * horizontal_block_size,
        y: (sigmoid(ty) * 2. - 0.5 + row as f32) * vertical_block_size,
        width: (sigmoid(tw) * 2.).powi(2) * anchor.width,
        height: (sigmoid(th) * 2.).powi(2) * anchor.height,
    }
}

/// Cells at or under the confidence threshold never produce an observation.
#[inline]
pub(crate) fn passes_objectness(objectness: f32) -> bool {
    objectness > CONFIDENCE_THRESHOLD
}

/// Per class score, if it reaches the confidence threshold.
#[inline]
pub(crate) fn class_score(objectness: f32, class_confidence: f32) -> Option<f32> {
    let score = objectness * class_confidence;
    (score >= CONFIDENCE_THRESHOLD).then_some(score)
}

/// Items for every class whose activated confidence survives the threshold.
pub(crate) fn class_items<I>(objectness: f32, class_confidences: I) -> Vec<ObservationItem>
where
    I: IntoIterator<Item = f32>,
{
    class_confidences
        .into_iter()
        .enumerate()
        .filter_map(|(class_index, confidence)| {
            class_score(objectness, confidence).map(|score| ObservationItem::new(class_index, score))
        })
        .collect()
}

/// Decodes one cell of an un-activated tensor, steps 1 to 4 in one go.
pub(crate) fn decode_cell(data: &[f32], geometry: &LayerGeometry, anchor: AnchorPair,
                          bx: usize, row: usize, col: usize,
                          frame_decoder: &FrameDecoder, scale: ScaleFactors) -> Option<Observation> {
    let base = geometry.base_index(bx, row, col);
    let objectness = sigmoid(data[base + 4]);
    if !passes_objectness(objectness) {
        return None;
    }

    let classes = &data[base + 5..base + 5 + geometry.class_count];
    let objects = class_items(objectness, classes.iter().map(|&logit| sigmoid(logit)));
    if objects.is_empty() {
        return None;
    }

    let logits = [data[base], data[base + 1], data[base + 2], data[base + 3]];
    let raw = decode_raw_box(logits, col, row, geometry.horizontal_block_size, geometry.vertical_block_size, anchor);
    Some(Observation::new(frame_decoder.decode(&raw, scale), objectness, objects))
}

/// Groups per class results back into one observation per `(rect, score)`.
///
/// Observations come out in first-seen order, so sorted input gives a
/// deterministic result.
pub(crate) fn group_observations<I>(entries: I) -> Vec<Observation>
where
    I: IntoIterator<Item = (BoundingRect, f32, ObservationItem)>,
{
    let mut observations: Vec<Observation> = Vec::new();
    let mut positions: HashMap<Observation, usize> = HashMap::new();

    for (rect, score, item) in entries {
        let key = Observation::new(rect, score, vec![]);
        match positions.get(&key) {
            Some(&position) => observations[position].objects.push(item),
            None => {
                positions.insert(key.clone(), observations.len());
                observations.push(key.with_objects(vec![item]));
            }
        }
    }
    observations
}
