//! Domain primitives, ports and services for the business card backend.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - OpenId, LoginPayload, SessionExchange: WeChat identity types.
//! - UserId, CardProfile, ProfilePatch, UserRecord: card records.
//! - SessionRegistry, ProfileResolver, TokenRefresher, CardService: the
//!   use-cases driven by the HTTP adapter and the background tasks.

pub mod access_token;
pub mod card;
pub mod card_service;
pub mod error;
pub mod identity;
pub mod ports;
pub mod profile_resolver;
pub mod session;
pub mod token_refresher;

pub use self::access_token::{AccessTokenCell, PlatformAccessToken};
pub use self::card::{CardProfile, CardValidationError, NewUserRecord, ProfilePatch, UserId, UserRecord};
pub use self::card_service::{CardService, DEFAULT_CARD_PAGE_PATH};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::identity::{IdentityValidationError, JsCode, LoginPayload, OpenId, SessionExchange};
pub use self::ports::{QrCodeImage, QrCodeRequest};
pub use self::profile_resolver::{ProfileResolver, UserBinding};
pub use self::session::{SessionError, SessionRegistry, SessionToken};
pub use self::token_refresher::TokenRefresher;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<u32> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
