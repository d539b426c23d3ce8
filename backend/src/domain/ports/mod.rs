//! Driven ports at the edge of the card domain.
//!
//! Each trait exposes a typed error enum so adapters map their failures into
//! predictable variants.

mod macros;
pub(crate) use macros::define_port_error;

mod card_repository;
mod wechat_api;

#[cfg(test)]
pub use card_repository::MockCardRepository;
pub use card_repository::{CardPersistenceError, CardRepository};
#[cfg(test)]
pub use wechat_api::MockWeChatApi;
pub use wechat_api::{
    DEFAULT_QR_CONTENT_TYPE, QrCodeImage, QrCodeRequest, WeChatApi, WeChatApiError,
};
