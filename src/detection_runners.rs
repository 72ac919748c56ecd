pub mod assembler;
pub mod compute;
pub mod cpu_decoder;
pub mod decode_process;
pub mod frame_decoder;
pub mod hybrid_decoder;
pub mod nms;
pub mod parallel_decoder;

pub use assembler::enumerate_observations;
pub use cpu_decoder::CpuDecoder;
pub use decode_process::DecodeProcess;
pub use frame_decoder::{FrameDecoder, RawBox, ScaleFactors};
pub use hybrid_decoder::HybridDecoder;
pub use nms::{non_max_suppression, Nms};
pub use parallel_decoder::ParallelDecoder;
