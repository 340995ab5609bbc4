mod cov_mark;

pub use cov_mark::{CovMarkHandle, CovMarkLayer, init_cov_mark};

use proptest::prelude::*;

/// Username/password subnegotiation fields are at most 255 bytes long.
pub const FIELD_MAX_LEN: usize = 255;

/// A credential field that fits in the username/password wire format.
///
/// ASCII only, so that the byte length equals the character count.
pub fn field() -> impl Strategy<Value = String> {
    "[ -~]{0,64}"
}

pub fn non_empty_field() -> impl Strategy<Value = String> {
    "[ -~]{1,64}"
}

/// A field exceeding what the wire format can carry.
pub fn oversized_field() -> impl Strategy<Value = String> {
    (FIELD_MAX_LEN + 1..FIELD_MAX_LEN + 64).prop_map(|len| "x".repeat(len))
}

/// `(username, password)`
pub fn credential() -> impl Strategy<Value = (String, String)> {
    (field(), field())
}

/// `(username, password)` with both fields set.
pub fn strict_credential() -> impl Strategy<Value = (String, String)> {
    (non_empty_field(), non_empty_field())
}

pub fn credential_list() -> impl Strategy<Value = Vec<(String, String)>> {
    proptest::collection::vec(credential(), 1..8)
}

/// A method offer as sent in a client greeting.
pub fn offered_methods() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..=16)
}

/// Any method code but the supported ones (0x00 and 0x02).
pub fn unsupported_method() -> impl Strategy<Value = u8> {
    any::<u8>().prop_filter("supported method", |&code| code != 0x00 && code != 0x02)
}
