use anyhow::Context;
use crossbeam_channel::{Receiver, Sender};
use crate::common::{BoundingRect, Observation, Orientation};
use crate::data::RawLayerOutput;

/// One frame's worth of decode work.
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    pub layers: Vec<RawLayerOutput>,
    pub bounds: BoundingRect,
    pub orientation: Orientation,
}

impl DetectionRequest {
    pub fn new(layers: Vec<RawLayerOutput>, bounds: BoundingRect, orientation: Orientation) -> Self {
        Self { layers, bounds, orientation }
    }
}

/// A request on the detection queue together with the channel its caller waits on.
#[derive(Debug)]
pub struct QueuedRequest {
    pub request: DetectionRequest,
    pub det_tx: Sender<Vec<Observation>>,
}

/// Worker side of the detection queue.
#[derive(Debug)]
pub struct DetectionState {
    pub req_rx: Receiver<Box<QueuedRequest>>,
}

/// Caller side of the detection queue. Can be shared between threads; every
/// call gets its own reply.
#[derive(Debug, Clone)]
pub struct SendState {
    pub req_tx: Sender<Box<QueuedRequest>>,
}

impl SendState {
    /// Queues a request and blocks until its observations come back.
    pub fn detect(&self, request: DetectionRequest) -> anyhow::Result<Vec<Observation>> {
        let (det_tx, det_rx) = crossbeam_channel::bounded(1);
        self.req_tx
            .send(Box::new(QueuedRequest { request, det_tx }))
            .context("Detection queue is closed")?;
        det_rx
            .recv()
            .context("Detection worker stopped before replying")
    }
}

/// Creates a connected pair of queue ends.
pub fn detection_channels() -> (SendState, DetectionState) {
    let (req_tx, req_rx) = crossbeam_channel::unbounded();
    (SendState { req_tx }, DetectionState { req_rx })
}
