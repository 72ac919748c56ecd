use crate::detection_processing::decode_raw_box;
use crate::detection_runners::compute::buffer::DetectionRecord;
use crate::detection_runners::compute::device::{GridPosition, KernelArgs};
use crate::utils::sigmoid;

pub const DECODE_KERNEL: &str = "decode_yolo5";
pub const HYBRID_DECODE_KERNEL: &str = "decode_yolo5_hybrid";

fn box_logits(args: &KernelArgs, base: usize) -> [f32; 4] {
    [
        args.data.load_f32(base),
        args.data.load_f32(base + 1),
        args.data.load_f32(base + 2),
        args.data.load_f32(base + 3),
    ]
}

/// Full decode of one cell: appends a record per class passing the threshold.
pub fn decode_yolo5(args: &KernelArgs, position: GridPosition) {
    let setup = &args.setup;
    if !setup.contains(position) {
        return;
    }
    let Some(output) = args.output.as_deref() else {
        return;
    };

    let base = setup.base_index(position);
    let objectness = sigmoid(args.data.load_f32(base + 4));
    if objectness <= setup.confidence_threshold {
        return;
    }

    let raw = decode_raw_box(
        box_logits(args, base),
        position.x,
        position.y,
        setup.horizontal_block_size,
        setup.vertical_block_size,
        args.anchors[position.z],
    );
    let cell = setup.cell_index(position);

    for class_id in 0..setup.class_count {
        let score = objectness * sigmoid(args.data.load_f32(base + 5 + class_id as usize));
        if score < setup.confidence_threshold {
            continue;
        }
        let record = DetectionRecord {
            cell,
            class_id,
            objectness,
            score,
            x: raw.x,
            y: raw.y,
            width: raw.width,
            height: raw.height,
        };
        if !output.append(&record) {
            return;
        }
    }
}

/// Activation only: rewrites the cell in place with the decoded box in model
/// input pixels, the activated objectness and the activated class confidences.
/// Thresholding is left to the host.
pub fn decode_yolo5_hybrid(args: &KernelArgs, position: GridPosition) {
    let setup = &args.setup;
    if !setup.contains(position) {
        return;
    }

    let base = setup.base_index(position);
    let raw = decode_raw_box(
        box_logits(args, base),
        position.x,
        position.y,
        setup.horizontal_block_size,
        setup.vertical_block_size,
        args.anchors[position.z],
    );
    args.data.store_f32(base, raw.x);
    args.data.store_f32(base + 1, raw.y);
    args.data.store_f32(base + 2, raw.width);
    args.data.store_f32(base + 3, raw.height);

    for channel in 4..5 + setup.class_count as usize {
        let activated = sigmoid(args.data.load_f32(base + channel));
        args.data.store_f32(base + channel, activated);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use super::*;
    use crate::data::{AnchorPair, LayerGeometry, RawLayerOutput, ANCHORS, CONFIDENCE_THRESHOLD};
    use crate::detection_runners::compute::buffer::{DeviceBuffer, ResultBuffer};
    use crate::detection_runners::compute::device::{GridSize, LayerSetup};

    /// 1 box on a 1x2 grid, 3 classes; cell (0, 1) is hot for classes 0 and 2.
    fn hot_layer() -> (LayerGeometry, Vec<f32>) {
        let mut data = vec![-10.; 2 * 8];
        data[8..12].copy_from_slice(&[0., 0., 0., 0.]);
        data[12] = 10.;
        data[13] = 10.;
        data[15] = 10.;
        let layer = RawLayerOutput::from_shape_vec(&[1, 1, 1, 2, 8], data.clone()).unwrap();
        (LayerGeometry::resolve(&layer, 64, 32).unwrap(), data)
    }

    fn args(geometry: &LayerGeometry, data: &[f32], with_output: bool) -> KernelArgs {
        KernelArgs {
            data: Arc::new(DeviceBuffer::from_f32(data)),
            setup: LayerSetup::from_geometry(geometry, CONFIDENCE_THRESHOLD).unwrap(),
            anchors: *ANCHORS.layer(0).unwrap(),
            output: with_output.then(|| Arc::new(ResultBuffer::with_capacity(geometry.max_records()))),
        }
    }

    fn run_grid(kernel: fn(&KernelArgs, GridPosition), args: &KernelArgs, grid: GridSize) {
        for index in 0..grid.len() {
            kernel(args, grid.position(index));
        }
    }

    #[test]
    fn full_kernel_appends_one_record_per_class() {
        let (geometry, data) = hot_layer();
        let args = args(&geometry, &data, true);
        run_grid(decode_yolo5, &args, GridSize::for_layer(&geometry));

        let records = args.output.as_ref().unwrap().read_records();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|record| record.cell == 1));
        let classes: Vec<u32> = records.iter().map(|record| record.class_id).collect();
        assert!(classes.contains(&0) && classes.contains(&2));
        // column 1 of 32 pixel blocks, centre 1.5 blocks in
        assert_eq!(records[0].x, 48.);
        assert_eq!(records[0].y, 16.);
        assert_eq!(records[0].width, AnchorPair::new(10., 13.).width);
    }

    #[test]
    fn full_kernel_ignores_positions_outside_layer() {
        let (geometry, data) = hot_layer();
        let args = args(&geometry, &data, true);
        decode_yolo5(&args, GridPosition { x: 2, y: 0, z: 0 });
        assert_eq!(args.output.as_ref().unwrap().count(), 0);
    }

    #[test]
    fn hybrid_kernel_activates_in_place() {
        let (geometry, data) = hot_layer();
        let args = args(&geometry, &data, false);
        run_grid(decode_yolo5_hybrid, &args, GridSize::for_layer(&geometry));

        let activated = args.data.read_f32();
        assert_eq!(&activated[8..12], &[48., 16., 10., 13.]);
        assert!(activated[12] > 0.99);
        assert!(activated[14] < 0.01);
        assert!(activated[4] < 0.01);
    }
}
