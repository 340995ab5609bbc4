use core::fmt;

use crate::AuthError;

/// Authentication methods this crate knows how to carry out.
///
/// The set is closed on purpose: any other code, including [`AuthMethod::NO_ACCEPTABLE`],
/// is rejected with [`AuthError::BadMethod`] when converting from the wire value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AuthMethod {
    NoAuth = 0x00,
    UserPass = 0x02,
}

impl AuthMethod {
    pub const NO_AUTH: u8 = 0x00;
    pub const USER_PASS: u8 = 0x02;
    /// Sentinel sent by a server when none of the offered methods is acceptable.
    pub const NO_ACCEPTABLE: u8 = 0xFF;

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            Self::NO_AUTH => Some(Self::NoAuth),
            Self::USER_PASS => Some(Self::UserPass),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for AuthMethod {
    type Error = AuthError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(AuthError::BadMethod(code))
    }
}

impl From<AuthMethod> for u8 {
    fn from(method: AuthMethod) -> u8 {
        method.code()
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::NoAuth => write!(f, "no authentication required"),
            AuthMethod::UserPass => write!(f, "username/password"),
        }
    }
}
