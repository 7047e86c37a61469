//! Wire protocol for the Spendwise auth API.
//!
//! This crate defines what the client and the backend exchange:
//!
//! - **Types** ([`LoginResponse`], [`RefreshResponse`], [`UserRecord`], etc.):
//!   the JSON bodies of the auth endpoints.
//! - **Routes** ([`ApiUrl`], [`LOGIN_PATH`], ...): where those endpoints live.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how bodies are converted
//!   to and from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong while encoding or
//!   decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw requests) and session
//! (who is logged in). It knows nothing about tokens being valid or
//! expired; it only knows their shape on the wire.
//!
//! ```text
//! Transport (HttpRequest/HttpResponse) → Protocol (bodies) → Session
//! ```

mod codec;
mod error;
mod routes;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::{error_message, JsonCodec};
pub use error::ProtocolError;
pub use routes::{ApiUrl, LOGIN_PATH, REFRESH_PATH, REGISTER_PATH};
pub use types::{
    CredentialsBody, ErrorBody, LoginResponse, RefreshResponse,
    RegisterResponse, UserId, UserRecord,
};
