extern crate breed_detect;

use std::sync::Arc;
use breed_detect::common::{BoundingRect, DecoderType, Orientation};
use breed_detect::data::{DetectorConfig, RawLayerOutput};
use breed_detect::detection_runners::compute::{ComputeDevice, FeatureTier, HostComputeDevice, KernelLibrary};
use breed_detect::{detect, init_detector};
use synthetic::{quiet_layers, random_layers, MODEL_SIZE};


fn bounds() -> BoundingRect {
    BoundingRect::from_size(1920., 1080.)
}

#[test]
fn no_layers() {
    assert!(detect(&[], MODEL_SIZE, MODEL_SIZE, bounds(), Orientation::Portrait).is_empty());
}

#[test]
fn quiet_frame() {
    assert!(detect(&quiet_layers(), MODEL_SIZE, MODEL_SIZE, bounds(), Orientation::Portrait).is_empty());
}

#[test]
fn malformed_layers_only() {
    let layers = vec![
        RawLayerOutput::from_shape_vec(&[3, 4, 9], vec![1.; 108]).unwrap(),
        RawLayerOutput::from_shape_vec(&[1, 3, 2, 2, 4], vec![1.; 48]).unwrap(),
        RawLayerOutput::from_shape_vec(&[1, 0, 2, 2, 9], vec![]).unwrap(),
    ];
    assert!(detect(&layers, MODEL_SIZE, MODEL_SIZE, bounds(), Orientation::Portrait).is_empty());
}

#[test]
fn zero_model_size() {
    assert!(detect(&random_layers(7), 0, MODEL_SIZE, bounds(), Orientation::Portrait).is_empty());
    let config = DetectorConfig::new().with_model_height(MODEL_SIZE);
    assert!(init_detector(&config, None).is_err());
}

#[test]
fn layers_past_anchor_table_are_skipped() {
    let mut layers = quiet_layers();
    layers.extend(random_layers(42));
    // only the first three layers have anchors, and they are quiet
    assert!(detect(&layers, MODEL_SIZE, MODEL_SIZE, bounds(), Orientation::Portrait).is_empty());
}

#[test]
fn missing_kernels_yield_nothing() {
    for (decoder, tier) in [(DecoderType::Parallel, FeatureTier::Tier2), (DecoderType::Hybrid, FeatureTier::Tier1)] {
        let device: Arc<dyn ComputeDevice> = Arc::new(
            HostComputeDevice::new(2)
                .unwrap()
                .with_feature_tier(tier)
                .with_library(KernelLibrary::empty()),
        );
        let config = DetectorConfig::new()
            .with_model_size(MODEL_SIZE, MODEL_SIZE)
            .with_decoder(decoder);
        let detector = init_detector(&config, Some(device)).unwrap();
        assert_eq!(detector.decoder_type(), decoder);
        assert!(detector.detect(&random_layers(42), bounds(), Orientation::Portrait).is_empty());
    }
}
