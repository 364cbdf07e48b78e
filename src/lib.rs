//! SCRAM login client for web-managed network devices.
//!
//! The device exposes its administrative interface over HTTP and guards it
//! with a salted challenge/response login: the client proves knowledge of
//! the password without transmitting it, and the device proves its identity
//! back, including a derived-key signature over its advertised RSA public
//! key. [`device::login::Login`] drives the protocol; [`scram`] holds the
//! key derivation and proof computation it feeds on.

pub mod cli;
pub mod device;
pub mod error;
pub mod scram;
