//! Frame source resolution for animated items.
//!
//! Some animations store full frames, others store deltas that only make
//! sense when drawn over the previous frame. The resolver decodes both
//! renderings and keeps whichever matches what a viewer would see, by
//! comparing a few leading frames pixel by pixel.

mod config;
mod decode;
mod error;
mod select;
mod types;

pub use config::ResolverConfig;
pub use decode::{composite, decode_frames, frame_count};
pub use error::ResolveError;
pub use select::{changed_ratio, FrameSourceResolver};
pub use types::{Frame, FrameSet, Rendering};
