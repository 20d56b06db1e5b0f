//! HTTP control surface for the sticker pipeline.

pub mod api;
pub mod metrics;
pub mod state;
