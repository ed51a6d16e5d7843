//! TLS 1.2 server handshake.
//!
//! ## State Transitions
//! ```text
//! AWAITING_CLIENT_HELLO
//!   | recv ClientHello
//!   v
//! NEGOTIATED_PENDING
//!   | send ServerHello
//!   | send Certificate (when an identity is configured)
//!   | send ServerHelloDone
//!   v
//! AWAITING_CLIENT_KEY_EXCHANGE
//!   | recv ClientKeyExchange
//!   v
//! AWAITING_CHANGE_CIPHER_SPEC
//!   | recv ChangeCipherSpec
//!   | send ChangeCipherSpec
//!   v
//! AWAITING_FINISHED
//!   | recv Finished
//!   | send Finished
//!   v
//! ESTABLISHED
//! ```

use subtle::ConstantTimeEq;

use crate::cipher_suites::negotiate;
use crate::error::{Error, Result};
use crate::handshake::{Flight, HandshakeContext};
use crate::messages::{
    encode_envelope, Certificate, ClientHello, ClientKeyExchange, Finished, HandshakeMessage,
    HelloRandom, ServerHello, ServerHelloDone,
};
use crate::prf::{
    compute_master_secret, compute_verify_data, LABEL_CLIENT_FINISHED, LABEL_SERVER_FINISHED,
};
use crate::protocol::Role;
use crate::state::{ConnectionState, HandshakeState};

fn expect_state(state: &ConnectionState, expected: HandshakeState, what: &str) -> Result<()> {
    if state.handshake != expected {
        return Err(Error::UnexpectedMessage(format!(
            "{} in state {:?}",
            what, state.handshake
        )));
    }
    Ok(())
}

/// Encode a message, add it to the transcript and append it to the flight.
fn emit(
    state: &mut ConnectionState,
    ctx: &HandshakeContext<'_>,
    envelopes: &mut Vec<Vec<u8>>,
    message: HandshakeMessage,
) -> Result<()> {
    let envelope = encode_envelope(&message)?;
    state.transcript.update(ctx.provider, &envelope)?;
    envelopes.push(envelope);
    Ok(())
}

/// Handle ClientHello: fix the version, negotiate suite and compression, and
/// answer with the server hello flight.
pub fn on_client_hello(
    state: &mut ConnectionState,
    ctx: &HandshakeContext<'_>,
    hello: &ClientHello,
) -> Result<Flight> {
    if state.role != Role::Server {
        return Err(Error::UnexpectedMessage(format!(
            "ClientHello received in the {:?} role",
            state.role
        )));
    }
    if state.negotiated_version.is_some() {
        return Err(Error::UnexpectedMessage(
            "ClientHello after the version was negotiated".into(),
        ));
    }
    expect_state(state, HandshakeState::AwaitingClientHello, "ClientHello")?;

    if hello.client_version < ctx.config.min_version.to_u16() {
        return Err(Error::ProtocolVersion(hello.client_version));
    }

    let version = ctx.config.max_version.to_u16();
    state.negotiated_version = Some(version);
    state.client_max_version = Some(hello.client_version);
    state.client_random = Some(hello.random.to_bytes());

    let suite = negotiate(&ctx.config.cipher_suites, &hello.cipher_suites).ok_or_else(|| {
        Error::HandshakeFailure("No mutually supported cipher suite found".into())
    })?;
    let compression = ctx
        .config
        .compression_methods
        .iter()
        .copied()
        .find(|m| hello.compression_methods.contains(m))
        .ok_or_else(|| {
            Error::HandshakeFailure("No mutually supported compression method found".into())
        })?;

    state.cipher_suite_next = Some(suite.descriptor());
    state.compression_method_next = Some(compression);
    state.handshake = HandshakeState::NegotiatedPending;

    tracing::info!(
        "Negotiated {} (client offered version 0x{:04x})",
        suite.name(),
        hello.client_version
    );

    let random = HelloRandom::generate(ctx.provider.random())?;
    state.server_random = Some(random.to_bytes());

    let mut envelopes = Vec::with_capacity(3);
    emit(
        state,
        ctx,
        &mut envelopes,
        HandshakeMessage::ServerHello(ServerHello::new(
            version,
            random,
            suite.to_u16(),
            compression,
        )),
    )?;
    if let Some(identity) = &ctx.config.identity {
        emit(
            state,
            ctx,
            &mut envelopes,
            HandshakeMessage::Certificate(Certificate::new(identity.certificates.clone())),
        )?;
    }
    emit(
        state,
        ctx,
        &mut envelopes,
        HandshakeMessage::ServerHelloDone(ServerHelloDone),
    )?;

    Ok(Flight {
        envelopes,
        next: HandshakeState::AwaitingClientKeyExchange,
    })
}

/// Handle ClientKeyExchange: check the rollback version and derive the
/// master secret.
pub fn on_client_key_exchange(
    state: &mut ConnectionState,
    ctx: &HandshakeContext<'_>,
    cke: &ClientKeyExchange,
) -> Result<Flight> {
    expect_state(
        state,
        HandshakeState::AwaitingClientKeyExchange,
        "ClientKeyExchange",
    )?;

    let advertised = state
        .client_max_version
        .ok_or_else(|| Error::InternalError("ClientHello version not recorded".into()))?;
    if cke.client_version() != advertised {
        return Err(Error::UnexpectedMessage(format!(
            "pre-master secret version 0x{:04x} does not match ClientHello version 0x{:04x}",
            cke.client_version(),
            advertised
        )));
    }

    let suite = state
        .cipher_suite_next
        .ok_or_else(|| Error::InternalError("no pending cipher suite".into()))?;
    let (client_random, server_random) = match (&state.client_random, &state.server_random) {
        (Some(c), Some(s)) => (*c, *s),
        _ => return Err(Error::InternalError("hello randoms missing".into())),
    };

    let master_secret = compute_master_secret(
        ctx.provider,
        suite.prf_hash(),
        cke.pre_master_secret(),
        &client_random,
        &server_random,
    )?;
    state.set_master_secret(master_secret)?;
    tracing::debug!("Master secret derived");

    Ok(Flight::empty(HandshakeState::AwaitingChangeCipherSpec))
}

/// Handle the client's Finished: verify it, then answer with our own.
///
/// `raw` is the received envelope; it is added to the transcript only after
/// verification succeeds.
pub fn on_finished(
    state: &mut ConnectionState,
    ctx: &HandshakeContext<'_>,
    finished: &Finished,
    raw: &[u8],
) -> Result<Flight> {
    expect_state(state, HandshakeState::AwaitingFinished, "Finished")?;

    let hash = state
        .cipher_suite
        .ok_or_else(|| Error::InternalError("Finished without an active cipher suite".into()))?
        .prf_hash();

    let transcript_hash = state.transcript.snapshot(ctx.provider)?;
    let expected = compute_verify_data(
        ctx.provider,
        hash,
        master_secret(state)?,
        LABEL_CLIENT_FINISHED,
        &transcript_hash,
    )?;
    if !bool::from(expected[..].ct_eq(&finished.verify_data[..])) {
        return Err(Error::HandshakeFailure("Finished verify data mismatch".into()));
    }

    state.transcript.update(ctx.provider, raw)?;
    let transcript_hash = state.transcript.finish(ctx.provider)?;
    let verify_data = compute_verify_data(
        ctx.provider,
        hash,
        master_secret(state)?,
        LABEL_SERVER_FINISHED,
        &transcript_hash,
    )?;

    let envelope = encode_envelope(&HandshakeMessage::Finished(Finished::new(verify_data)))?;
    tracing::info!("Client Finished verified");

    Ok(Flight {
        envelopes: vec![envelope],
        next: HandshakeState::Established,
    })
}

fn master_secret(state: &ConnectionState) -> Result<&[u8]> {
    state
        .master_secret()
        .ok_or_else(|| Error::InternalError("master secret not derived".into()))
}
