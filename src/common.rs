mod bounding_rect;
mod decoder_type;
mod observation;
mod orientation;

pub use bounding_rect::*;
pub use decoder_type::*;
pub use observation::*;
pub use orientation::*;
