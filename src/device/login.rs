//! Login state machine.
//!
//! One attempt is a strictly sequential chain of awaited exchanges: every
//! phase's inputs depend on the previous phase's outputs, so the whole
//! attempt is a single suspending [`Login::run`] call that resolves only
//! once the machine reaches `Verified` or fails. Nothing is retried here;
//! the device's lockout counter can be cumulative and retries would worsen
//! it.

use crate::device::trust::{TrustStore, TrustedDeviceKey};
use crate::device::{xml, DeviceClient, DeviceResponse, VERIFICATION_TOKEN, VERIFICATION_TOKEN_ALT};
use crate::error::{Error, Result};
use crate::scram::proof::{self, ProofSet};
use crate::scram::{self, AuthParameters, Credentials};
use reqwest::Method;
use secrecy::ExposeSecret;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, info};

/// Length of the anti-forgery prefix on the token document, protocol noise
/// discarded before the remainder is used as a header value.
const TOKEN_PREFIX_LEN: usize = 32;

/// Protocol phases, linear. `Failed` is reachable from any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    SessionInit,
    TokenFetch,
    PhaseOneSent,
    PhaseOneReceived,
    ProofComputed,
    PhaseTwoSent,
    PhaseTwoReceived,
    Verified,
    Failed,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutcome {
    /// Verification token authenticating the established session.
    pub session_token: String,
    /// Device key persisted to the trust store.
    pub device_key: TrustedDeviceKey,
}

/// One login attempt against a device.
pub struct Login<'a> {
    device: &'a DeviceClient,
    trust: &'a dyn TrustStore,
    credentials: &'a Credentials,
    client_nonce: String,
    cancel: Option<Arc<AtomicBool>>,
    state: State,
}

impl<'a> Login<'a> {
    #[must_use]
    pub fn new(
        device: &'a DeviceClient,
        trust: &'a dyn TrustStore,
        credentials: &'a Credentials,
    ) -> Self {
        Self {
            device,
            trust,
            credentials,
            client_nonce: scram::generate_nonce(),
            cancel: None,
            state: State::Idle,
        }
    }

    /// Pin the client nonce instead of drawing a fresh one, for reproducing
    /// a recorded exchange.
    #[must_use]
    pub fn with_client_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.client_nonce = nonce.into();
        self
    }

    /// Cooperative cancellation flag, checked between phases (never
    /// mid-derivation).
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// Run the attempt to completion.
    ///
    /// # Errors
    /// Returns the failure that aborted the attempt; no partial retries are
    /// performed.
    pub async fn run(&mut self) -> Result<LoginOutcome> {
        info!(username = %self.credentials.username, "starting device login");

        let result = self.drive().await;
        if result.is_err() {
            self.state = State::Failed;
        }
        result
    }

    async fn drive(&mut self) -> Result<LoginOutcome> {
        self.device.open_session().await?;
        self.state = State::SessionInit;
        self.checkpoint()?;

        let token = self.fetch_token().await?;
        self.checkpoint()?;

        let challenge = self.send_challenge(&token).await?;
        let (token, params) = self.read_challenge(&challenge)?;
        self.checkpoint()?;

        let proofs = self.compute_proofs(&params)?;

        let reply = self.send_proof(&token, &params, &proofs.client_proof).await?;
        let (token, auth) = self.read_auth_reply(&reply, token)?;
        self.checkpoint()?;

        let device_key = self.verify_identity(&params, &proofs, auth)?;

        info!("device login verified");
        Ok(LoginOutcome {
            session_token: token,
            device_key,
        })
    }

    /// Fetch the anti-forgery token and strip its fixed-length prefix.
    async fn fetch_token(&mut self) -> Result<String> {
        let response = self
            .device
            .request(Method::GET, &self.device.endpoints().token, None, None)
            .await?;
        ensure_success(&response)?;

        let doc: xml::TokenDoc = xml::parse(&response.body)?;
        let token = strip_token(&doc.token)?;

        self.state = State::TokenFetch;
        Ok(token.to_string())
    }

    async fn send_challenge(&mut self, token: &str) -> Result<DeviceResponse> {
        let body = xml::request_body(&[
            ("username", &self.credentials.username),
            ("firstnonce", &self.client_nonce),
            ("mode", "1"),
        ]);

        let response = self
            .device
            .request(
                Method::POST,
                &self.device.endpoints().challenge,
                Some(token),
                Some(body),
            )
            .await?;

        self.state = State::PhaseOneSent;
        Ok(response)
    }

    /// Read the rotated verification token and the challenge parameters.
    fn read_challenge(&mut self, response: &DeviceResponse) -> Result<(String, AuthParameters)> {
        ensure_success(response)?;

        let token = response
            .header(VERIFICATION_TOKEN)
            .ok_or_else(|| Error::Protocol("missing verification token".to_string()))?;

        let doc = parse_challenge_body(&response.body)?;
        debug!(iterations = doc.iterations, "challenge accepted");

        let params = AuthParameters::new(
            self.client_nonce.clone(),
            doc.servernonce,
            doc.salt,
            doc.iterations,
        );

        self.state = State::PhaseOneReceived;
        Ok((token, params))
    }

    fn compute_proofs(&mut self, params: &AuthParameters) -> Result<ProofSet> {
        let proofs = ProofSet::compute(params, self.credentials.password.expose_secret())?;
        self.state = State::ProofComputed;
        Ok(proofs)
    }

    async fn send_proof(
        &mut self,
        token: &str,
        params: &AuthParameters,
        client_proof: &str,
    ) -> Result<DeviceResponse> {
        let body = xml::request_body(&[
            ("clientproof", client_proof),
            ("finalnonce", params.server_nonce()),
        ]);

        let response = self
            .device
            .request(
                Method::POST,
                &self.device.endpoints().authentication,
                Some(token),
                Some(body),
            )
            .await?;

        self.state = State::PhaseTwoSent;
        Ok(response)
    }

    /// Read the alternate token variant, which replaces the current token
    /// when present, and the device's identity material.
    fn read_auth_reply(
        &mut self,
        response: &DeviceResponse,
        prior_token: String,
    ) -> Result<(String, xml::AuthDoc)> {
        ensure_success(response)?;

        let token = match response.header(VERIFICATION_TOKEN_ALT) {
            Some(rotated) => rotated,
            None if !prior_token.is_empty() => prior_token,
            None => return Err(Error::Protocol("missing verification token".to_string())),
        };

        let doc: xml::AuthDoc = xml::parse(&response.body)?;

        self.state = State::PhaseTwoReceived;
        Ok((token, doc))
    }

    /// Verify the device's proofs and persist its key on success.
    fn verify_identity(
        &mut self,
        params: &AuthParameters,
        proofs: &ProofSet,
        auth: xml::AuthDoc,
    ) -> Result<TrustedDeviceKey> {
        if !digests_match(&proofs.server_proof, &auth.serversignature)? {
            return Err(Error::Identity("server identity unverified"));
        }

        let expected = proof::public_key_signature(
            params,
            self.credentials.password.expose_secret(),
            &auth.rsan,
        )?;
        if !digests_match(&expected, &auth.rsapubkeysignature)? {
            return Err(Error::Identity("invalid public key"));
        }

        let device_key = TrustedDeviceKey {
            modulus: auth.rsan,
            exponent: auth.rsae,
        };
        self.trust.store(device_key.clone());

        self.state = State::Verified;
        Ok(device_key)
    }

    fn checkpoint(&self) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }
}

fn ensure_success(response: &DeviceResponse) -> Result<()> {
    if response.status.is_success() {
        Ok(())
    } else {
        Err(Error::Protocol(format!(
            "{} - {}",
            response.url, response.status
        )))
    }
}

fn strip_token(raw: &str) -> Result<&str> {
    match raw.get(TOKEN_PREFIX_LEN..) {
        Some(rest) if !rest.is_empty() => Ok(rest),
        _ => Err(Error::Protocol("token document too short".to_string())),
    }
}

/// Dispatch a phase-one body: a rejection document carries the lockout wait
/// time, anything else must be a challenge.
fn parse_challenge_body(body: &str) -> Result<xml::ChallengeDoc> {
    if xml::root_name(body)? == "error" {
        let doc: xml::ErrorDoc = xml::parse(body)?;
        return Err(match doc.waittime {
            Some(minutes) => Error::RateLimited(minutes),
            None => Error::Protocol("device rejected the challenge".to_string()),
        });
    }

    xml::parse(body)
}

/// Constant-time comparison of two hex-encoded digests.
fn digests_match(expected_hex: &str, received_hex: &str) -> Result<bool> {
    let expected = hex::decode(expected_hex)
        .map_err(|_| Error::Crypto("expected digest is not valid hex".to_string()))?;
    let received = hex::decode(received_hex)
        .map_err(|_| Error::Crypto("received digest is not valid hex".to_string()))?;

    Ok(expected.ct_eq(&received).into())
}
