use crate::common::Observation;

/// Numbers the final observations 1..N in their current order.
pub fn enumerate_observations(observations: Vec<Observation>) -> Vec<Observation> {
    observations
        .into_iter()
        .enumerate()
        .map(|(index, observation)| observation.with_detection_index(index + 1))
        .collect()
}
