//! Source gallery client.
//!
//! The gallery serves asset metadata (title plus an ordered list of frame
//! references) and the raw frame files.

mod error;
mod http;
mod traits;
mod types;

pub use error::GalleryError;
pub use http::{GalleryConfig, HttpGallery};
pub use traits::Gallery;
pub use types::{AssetMetadata, FrameRef};
