pub trait Nms {
    fn iou(&self, other: &Self) -> f32;
    fn confidence(&self) -> f32;
}

/// Greedy non-maximum suppression.
///
/// Candidates are visited by descending confidence, ties keeping their input order.
/// Every visited candidate that is still active is selected and deactivates all
/// later active candidates overlapping it by more than `iou_threshold`. Stops once
/// `limit` candidates are selected or none are left active.
pub fn non_max_suppression<T: Nms + Clone>(boxes: &[T], limit: usize, iou_threshold: f32) -> Vec<T> {
    if limit == 0 || boxes.is_empty() {
        return vec![];
    }

    let mut sorted_indices = (0..boxes.len()).collect::<Vec<usize>>();
    sorted_indices.sort_by(|&a, &b| boxes[b].confidence().total_cmp(&boxes[a].confidence()));

    let mut selected = Vec::with_capacity(limit.min(boxes.len()));
    let mut active = vec![true; boxes.len()];
    let mut active_left = boxes.len();

    'outer: for i in 0..sorted_indices.len() {
        if !active[i] {
            continue;
        }
        let box_a = &boxes[sorted_indices[i]];
        selected.push(box_a.clone());
        active[i] = false;
        active_left -= 1;
        if selected.len() >= limit || active_left == 0 {
            break;
        }

        for j in i + 1..sorted_indices.len() {
            if active[j] && box_a.iou(&boxes[sorted_indices[j]]) > iou_threshold {
                active[j] = false;
                active_left -= 1;
                if active_left == 0 {
                    break 'outer;
                }
            }
        }
    }
    selected
}
