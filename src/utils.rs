use std::time::{Duration, Instant};

/// Logistic activation.
#[inline]
pub(crate) fn sigmoid(value: f32) -> f32 {
    1.0 / (1.0 + (-value).exp())
}

pub(crate) fn trace(l_type: &str, l_step: &str, detect: Instant, detect_elapsed: Duration) -> Duration {
    log::trace!("{} | Total={:.2?} | {}={:.2?}", l_type, detect.elapsed(), l_step, detect.elapsed() - detect_elapsed);
    detect.elapsed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_is_centred_and_bounded() {
        assert_eq!(sigmoid(0.), 0.5);
        assert!(sigmoid(20.) <= 1.);
        assert!(sigmoid(-20.) >= 0.);
        assert!((sigmoid(2.) + sigmoid(-2.) - 1.).abs() < 1e-6);
    }
}
