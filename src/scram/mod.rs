//! SCRAM proof material for the device login protocol.
//!
//! The device follows the RFC 5802 shape — PBKDF2-salted secret, labelled
//! client/server keys, proof = key XOR signature — but exchanges hex-encoded
//! values over XML instead of the SASL message syntax.

pub mod kdf;
pub mod proof;

use rand::{rngs::OsRng, RngCore};
use secrecy::SecretString;

/// Bytes of entropy per client nonce (256 bits).
const NONCE_LEN: usize = 32;

/// Generate a fresh client nonce, hex-encoded.
#[must_use]
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Account credentials for one login attempt.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

/// Challenge parameters for one login attempt. All four fields are set
/// together by the constructor; a partially-populated value cannot exist.
#[derive(Debug, Clone)]
pub struct AuthParameters {
    client_nonce: String,
    server_nonce: String,
    salt_hex: String,
    iterations: u32,
}

impl AuthParameters {
    #[must_use]
    pub fn new(
        client_nonce: impl Into<String>,
        server_nonce: impl Into<String>,
        salt_hex: impl Into<String>,
        iterations: u32,
    ) -> Self {
        Self {
            client_nonce: client_nonce.into(),
            server_nonce: server_nonce.into(),
            salt_hex: salt_hex.into(),
            iterations,
        }
    }

    #[must_use]
    pub fn client_nonce(&self) -> &str {
        &self.client_nonce
    }

    #[must_use]
    pub fn server_nonce(&self) -> &str {
        &self.server_nonce
    }

    #[must_use]
    pub fn salt_hex(&self) -> &str {
        &self.salt_hex
    }

    #[must_use]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// HMAC message shared by the client and server proof signatures.
    /// The server nonce appears twice, per the device's protocol.
    #[must_use]
    pub fn auth_message(&self) -> String {
        format!(
            "{}{}{}",
            self.client_nonce, self.server_nonce, self.server_nonce
        )
    }
}
