//! Authentication method negotiation for SOCKS5, usable from both ends of the connection.
//!
//! The entry points are the [`ClientAuthenticator`] and [`ServerAuthenticator`] capability
//! traits, both implemented by [`Authenticator`]. They are invoked once the method code has
//! been agreed upon and perform the method-specific continuation: nothing for
//! [`AuthMethod::NoAuth`], an [RFC 1929] exchange for [`AuthMethod::UserPass`].
//!
//! [RFC 1929]: https://datatracker.ietf.org/doc/html/rfc1929

#[macro_use]
extern crate tracing;

mod credentials;
mod error;
mod handshake;
mod method;
mod negotiator;
mod userpass;

pub use credentials::{Credential, CredentialStore};
pub use error::AuthError;
pub use handshake::{client_handshake, server_handshake};
pub use method::AuthMethod;
pub use negotiator::{
    Authenticator, ClientAuthenticator, ServerAuthenticator, client_subnegotiate, server_subnegotiate,
};
pub use userpass::{USER_PASS_VERSION, UserPassRequest, UserPassResponse, UserPassStatus};

use tokio::io::{AsyncRead, AsyncWrite};

/// Byte stream the negotiation runs on.
///
/// This is a super-trait so that it can be used as a trait object (`&mut dyn AuthStream`):
/// the negotiation code is then compiled once instead of once per stream type.
pub trait AuthStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<S> AuthStream for S where S: AsyncRead + AsyncWrite + Unpin + Send {}
