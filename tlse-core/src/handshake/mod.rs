//! TLS 1.2 handshake state machine.
//!
//! Handlers take the decoded message, mutate [`ConnectionState`], and return
//! a [`Flight`]: the envelopes to write and the state to enter once they
//! are written. Envelopes in a flight are already in the transcript (except
//! Finished, which closes it).
//!
//! Only the server side is implemented. In the client role every handshake
//! message is rejected.

use core::fmt;

use tlse_crypto::CryptoProvider;

use crate::error::{Error, Result};
use crate::messages::HandshakeMessage;
use crate::protocol::Role;
use crate::state::{ConnectionState, HandshakeState};
use crate::Config;

pub mod server;

/// The only valid ChangeCipherSpec body.
pub const CHANGE_CIPHER_SPEC_BODY: [u8; 1] = [0x01];

/// What the engine needs from outside the connection state.
#[derive(Clone, Copy)]
pub struct HandshakeContext<'a> {
    /// Engine configuration
    pub config: &'a Config,
    /// Crypto provider
    pub provider: &'a dyn CryptoProvider,
}

impl fmt::Debug for HandshakeContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandshakeContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Outbound result of one handshake step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flight {
    /// Encoded envelopes, in send order
    pub envelopes: Vec<Vec<u8>>,
    /// State to enter after the envelopes are written
    pub next: HandshakeState,
}

impl Flight {
    /// A transition with nothing to send.
    pub fn empty(next: HandshakeState) -> Self {
        Self {
            envelopes: Vec::new(),
            next,
        }
    }
}

/// Run one received handshake message through the state machine.
///
/// `raw` is the envelope exactly as received. It enters the transcript here,
/// except for Finished, which is only added once verified.
pub fn process(
    state: &mut ConnectionState,
    ctx: &HandshakeContext<'_>,
    message: &HandshakeMessage,
    raw: &[u8],
) -> Result<Flight> {
    tracing::debug!(
        "Handshake message {:?} in state {:?}",
        message.handshake_type(),
        state.handshake
    );

    if state.role == Role::Client {
        return Err(Error::UnexpectedMessage(format!(
            "{:?} received in the client role",
            message.handshake_type()
        )));
    }

    if !matches!(message, HandshakeMessage::Finished(_)) {
        state.transcript.update(ctx.provider, raw)?;
    }

    match message {
        HandshakeMessage::ClientHello(hello) => server::on_client_hello(state, ctx, hello),
        HandshakeMessage::ClientKeyExchange(cke) => {
            server::on_client_key_exchange(state, ctx, cke)
        },
        HandshakeMessage::Finished(finished) => server::on_finished(state, ctx, finished, raw),
        other => Err(Error::UnexpectedMessage(format!(
            "{:?} is not accepted by a server",
            other.handshake_type()
        ))),
    }
}

/// Validate a received ChangeCipherSpec.
///
/// The body must be exactly `0x01`. It is only accepted while waiting for
/// it, with a negotiated suite pending and no partial handshake message
/// buffered.
pub fn check_change_cipher_spec(
    state: &ConnectionState,
    body: &[u8],
    handshake_buffered: usize,
) -> Result<()> {
    if body != &CHANGE_CIPHER_SPEC_BODY[..] {
        return Err(Error::DecodeError(format!(
            "ChangeCipherSpec body must be 0x01, got {} bytes",
            body.len()
        )));
    }
    if state.handshake != HandshakeState::AwaitingChangeCipherSpec {
        return Err(Error::UnexpectedMessage(format!(
            "ChangeCipherSpec in state {:?}",
            state.handshake
        )));
    }
    if state.cipher_suite_next.is_none() {
        return Err(Error::UnexpectedMessage(
            "ChangeCipherSpec without a pending cipher suite".into(),
        ));
    }
    if handshake_buffered != 0 {
        return Err(Error::UnexpectedMessage(
            "ChangeCipherSpec interleaved with a partial handshake message".into(),
        ));
    }
    Ok(())
}
