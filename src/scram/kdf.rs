//! Purpose-scoped key derivation.
//!
//! `salted = PBKDF2-HMAC-SHA256(password, salt, iterations)`, then
//! `key = HMAC-SHA256(salted, label)` where the label scopes the key to the
//! client or server side of the exchange.

use crate::error::{Error, Result};
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

pub const CLIENT_KEY_LABEL: &str = "Client Key";
pub const SERVER_KEY_LABEL: &str = "Server Key";

/// Length of the salted secret and every derived key (8 x 32-bit words).
pub const KEY_LEN: usize = 32;

/// Derive a purpose-scoped key from the shared password.
///
/// Pure and deterministic: identical inputs always yield identical outputs.
///
/// # Errors
/// Returns `Error::Crypto` if the salt is not valid hex or the iteration
/// count is zero.
pub fn derive_key(
    password: &str,
    salt_hex: &str,
    iterations: u32,
    label: &str,
) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    if iterations == 0 {
        return Err(Error::Crypto("iteration count must be positive".into()));
    }

    let salt = hex::decode(salt_hex).map_err(|_| Error::Crypto("salt is not valid hex".into()))?;

    let mut salted = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut *salted);

    Ok(Zeroizing::new(hmac_sha256(&*salted, label.as_bytes())))
}

pub(crate) fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; KEY_LEN] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}
