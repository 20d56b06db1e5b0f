//! Publishing finished stickers.
//!
//! [`SetPublisher`] uploads a completed job as a new sticker set through a
//! [`StickerPublisher`] (the Telegram Bot API in production) after picking
//! a set name unknown to the [`StickerRegistry`].

mod error;
mod registry;
mod set;
mod telegram;
mod traits;

pub use error::{PublishError, RegistryError};
pub use registry::{HttpRegistry, RegistryConfig, StickerRecord, StickerRegistry};
pub use set::{
    random_set_name, set_url, PublishedSet, SetPublisher, MAX_STICKERS_PER_CREATE, NAME_ATTEMPTS,
};
pub use telegram::{TelegramClient, TelegramConfig};
pub use traits::{StickerFormat, StickerInput, StickerPublisher};
