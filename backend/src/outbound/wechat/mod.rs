//! WeChat open platform adapter implementing the `WeChatApi` port.

mod dto;
mod http_client;

pub use http_client::{
    DEFAULT_API_BASE_URL, WeChatClientBuildError, WeChatCredentials, WeChatHttpClient,
};
