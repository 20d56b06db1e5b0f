//! Size-bounded PNG output for static stickers.
//!
//! A still is written losslessly when it fits the budget. Otherwise its
//! color depth is reduced step by step, starting from a high quality, until
//! the PNG fits.

mod compress;

pub use compress::{
    compress_still, encode_png, posterize, CompressError, CompressedStill, CompressionPolicy,
};
