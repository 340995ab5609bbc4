use std::io;

/// Failure of an authentication negotiation.
///
/// None of these are recovered from locally: the connection attempt is over and the caller
/// should close the stream.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The agreed method is `NO_ACCEPTABLE` or a code this crate does not support.
    #[error("bad authentication method (0x{0:02X})")]
    BadMethod(u8),

    /// Credentials were exchanged and rejected.
    #[error("authentication failed")]
    AuthFailure,

    /// Transport or framing failure, surfaced unchanged.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl AuthError {
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, AuthError::AuthFailure)
    }

    pub fn is_bad_method(&self) -> bool {
        matches!(self, AuthError::BadMethod(_))
    }
}

impl From<AuthError> for io::Error {
    fn from(e: AuthError) -> io::Error {
        match e {
            AuthError::BadMethod(_) => io::Error::new(io::ErrorKind::InvalidData, e),
            AuthError::AuthFailure => io::Error::new(io::ErrorKind::PermissionDenied, e),
            AuthError::Io(e) => e,
        }
    }
}
