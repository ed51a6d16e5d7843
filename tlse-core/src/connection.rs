//! Connection: the byte-stream consumer contract.
//!
//! The integrator owns the event loop. It hands every chunk read from the
//! socket to [`Connection::consume`], and the connection writes whatever it
//! needs to send through its [`Transport`]. Chunk boundaries do not matter.
//!
//! ```rust,ignore
//! let mut conn = Connection::new(config, provider, transport);
//! loop {
//!     let n = socket.read(&mut buf)?;
//!     conn.consume(&buf[..n])?;
//!     let data = conn.read_application_data();
//!     // ...
//! }
//! ```
//!
//! Every protocol failure is fatal: a fatal alert is sent (best effort), the
//! transport is closed and `consume` returns [`Error::AlertSent`]. After
//! that the connection only answers [`Error::ConnectionClosed`].

use std::sync::Arc;

use bytes::{Buf, Bytes, BytesMut};
use tlse_crypto::{CryptoProvider, HashAlgorithm};

use crate::alert::Alert;
use crate::error::{Error, Result};
use crate::handshake::{self, Flight, HandshakeContext, CHANGE_CIPHER_SPEC_BODY};
use crate::messages::{parse_envelope, DecodeContext};
use crate::protocol::{ContentType, Role};
use crate::record::{self, Record, RecordReader, MAX_FRAGMENT_SIZE};
use crate::state::{ConnectionState, HandshakeState};
use crate::transcript::HandshakeTranscript;
use crate::Config;

/// Outgoing side of the connection, provided by the integrator.
pub trait Transport {
    /// Write bytes to the peer. Any error is fatal to the connection.
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Close the underlying channel.
    fn close(&mut self);

    /// Which end of the connection this transport is, if it knows.
    ///
    /// Consulted once when a connection is created with [`Role::AutoDetect`].
    fn role_hint(&self) -> Option<Role> {
        None
    }
}

/// A TLS 1.2 connection bound to a transport.
pub struct Connection<T: Transport> {
    config: Arc<Config>,
    provider: Arc<dyn CryptoProvider>,
    transport: T,
    state: ConnectionState,
    records: RecordReader,
    handshake_buffer: BytesMut,
    application_data: BytesMut,
}

impl<T: Transport> Connection<T> {
    /// Attach a connection to a transport.
    ///
    /// A configured role of `AutoDetect` is resolved here from
    /// [`Transport::role_hint`]. Without a hint the connection stays
    /// undetermined and refuses handshake messages.
    pub fn new(config: Arc<Config>, provider: Arc<dyn CryptoProvider>, transport: T) -> Self {
        let role = match config.role {
            Role::AutoDetect => transport.role_hint().unwrap_or(Role::AutoDetect),
            role => role,
        };
        tracing::debug!("Connection attached as {:?}", role);

        Self {
            config,
            provider,
            transport,
            state: ConnectionState::new(role, HandshakeTranscript::new(HashAlgorithm::Sha256)),
            records: RecordReader::new(),
            handshake_buffer: BytesMut::new(),
            application_data: BytesMut::new(),
        }
    }

    /// Our resolved role.
    pub fn role(&self) -> Role {
        self.state.role
    }

    /// Current handshake state.
    pub fn handshake_state(&self) -> HandshakeState {
        self.state.handshake
    }

    /// Check if the handshake has completed.
    pub fn is_established(&self) -> bool {
        self.state.is_established()
    }

    /// Check if the connection has been torn down.
    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }

    /// Negotiated and derived connection state.
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// The transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The transport, mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Feed bytes received from the peer.
    ///
    /// Processes every complete record; a trailing partial record is kept
    /// for the next call.
    pub fn consume(&mut self, data: &[u8]) -> Result<()> {
        if self.state.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        self.records.push(data);
        loop {
            let result = match self.records.next_record() {
                Ok(Some(record)) => self.process_record(record),
                Ok(None) => return Ok(()),
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                return Err(self.fail(e));
            }
        }
    }

    /// Take all application data received so far.
    pub fn read_application_data(&mut self) -> Bytes {
        self.application_data.split().freeze()
    }

    /// Send application data. Only valid once the handshake has completed.
    pub fn send_application_data(&mut self, data: &[u8]) -> Result<()> {
        if self.state.is_closed() {
            return Err(Error::ConnectionClosed);
        }
        if !self.state.is_established() {
            return Err(Error::UnexpectedMessage(
                "application data before the handshake completed".into(),
            ));
        }

        self.write_record(ContentType::ApplicationData, data)
            .map_err(|e| self.fail(e))
    }

    /// Close gracefully: send close_notify and close the transport.
    pub fn close(&mut self) -> Result<()> {
        if self.state.is_closed() {
            return Ok(());
        }

        let result = self.write_record(ContentType::Alert, &Alert::close_notify().encode());
        self.shutdown();
        result
    }

    fn process_record(&mut self, record: Record) -> Result<()> {
        tracing::debug!(
            content_type = record.content_type,
            version = record.version,
            len = record.fragment.len(),
            "Record received"
        );

        if let Some(version) = self.state.negotiated_version {
            if record.version != version {
                return Err(Error::ProtocolVersion(record.version));
            }
        }

        let payload = match self.state.read_cipher.as_mut() {
            Some(cipher) => cipher.open(
                self.provider.as_ref(),
                record.content_type,
                record.version,
                &record.fragment,
            )?,
            None => record.fragment,
        };
        if payload.len() > MAX_FRAGMENT_SIZE {
            return Err(Error::RecordOverflow(payload.len()));
        }

        match ContentType::from_u8(record.content_type) {
            Some(ContentType::Alert) => self.on_alert(&payload),
            Some(ContentType::Handshake) => self.on_handshake(&payload),
            Some(ContentType::ChangeCipherSpec) => self.on_change_cipher_spec(&payload),
            Some(ContentType::ApplicationData) => self.on_application_data(&payload),
            None => Err(Error::UnexpectedMessage(format!(
                "unknown record type 0x{:02x}",
                record.content_type
            ))),
        }
    }

    fn on_alert(&mut self, payload: &[u8]) -> Result<()> {
        let alert = Alert::decode(payload)?;
        let code = alert.description.to_u8();
        if alert.is_fatal() {
            tracing::warn!(code, "Fatal alert received: {}", alert.description.name());
            self.shutdown();
            return Err(Error::AlertReceived(alert.description));
        }

        tracing::warn!(code, "Warning alert received: {}", alert.description.name());
        Ok(())
    }

    fn on_handshake(&mut self, payload: &[u8]) -> Result<()> {
        self.handshake_buffer.extend_from_slice(payload);

        loop {
            let mut offset = 0;
            let decode_ctx = DecodeContext {
                provider: self.provider.as_ref(),
                key_exchange: self.state.cipher_suite_next.map(|d| d.key_exchange),
                private_key: self.config.identity.as_ref().map(|i| &i.private_key),
            };
            let available = self.handshake_buffer.len();
            let (message, raw) =
                match parse_envelope(&self.handshake_buffer, &mut offset, available, &decode_ctx)? {
                    Some(parsed) => (parsed.message, parsed.raw.to_vec()),
                    None => return Ok(()),
                };
            self.handshake_buffer.advance(offset);

            let ctx = HandshakeContext {
                config: &self.config,
                provider: self.provider.as_ref(),
            };
            let flight = handshake::process(&mut self.state, &ctx, &message, &raw)?;
            self.send_flight(flight)?;
        }
    }

    fn on_change_cipher_spec(&mut self, payload: &[u8]) -> Result<()> {
        handshake::check_change_cipher_spec(&self.state, payload, self.handshake_buffer.len())?;

        self.write_record(ContentType::ChangeCipherSpec, &CHANGE_CIPHER_SPEC_BODY)?;
        self.state.promote_pending(self.provider.as_ref())?;
        self.state.handshake = HandshakeState::AwaitingFinished;
        tracing::debug!("ChangeCipherSpec processed, ciphers active");
        Ok(())
    }

    fn on_application_data(&mut self, payload: &[u8]) -> Result<()> {
        if !self.state.is_established() {
            return Err(Error::UnexpectedMessage(
                "application data before the handshake completed".into(),
            ));
        }
        self.application_data.extend_from_slice(payload);
        Ok(())
    }

    fn send_flight(&mut self, flight: Flight) -> Result<()> {
        for envelope in &flight.envelopes {
            self.write_record(ContentType::Handshake, envelope)?;
        }
        if self.state.handshake != flight.next {
            tracing::debug!("{:?} -> {:?}", self.state.handshake, flight.next);
        }
        self.state.handshake = flight.next;
        if flight.next == HandshakeState::Established {
            tracing::info!("Handshake complete");
        }
        Ok(())
    }

    /// Frame, protect and write one payload, fragmenting as configured.
    fn write_record(&mut self, content_type: ContentType, payload: &[u8]) -> Result<()> {
        let version = self.state.record_version();
        let max_fragment = usize::from(self.config.max_fragment_length);

        for chunk in record::fragment(payload, max_fragment) {
            let body = match self.state.write_cipher.as_mut() {
                Some(cipher) => {
                    cipher.seal(self.provider.as_ref(), content_type.to_u8(), version, chunk)?
                },
                None => chunk.to_vec(),
            };
            let bytes = Record::new(content_type.to_u8(), version, body).encode()?;
            self.transport.write(&bytes).map_err(|e| match e {
                Error::IoError(_) => e,
                other => Error::IoError(other.to_string()),
            })?;
        }
        Ok(())
    }

    /// Tear down after an error, sending a fatal alert when one applies.
    fn fail(&mut self, error: Error) -> Error {
        if self.state.is_closed() {
            return error;
        }

        match error.alert_description() {
            Some(description) => {
                tracing::error!("Sending fatal alert {}: {}", description.name(), error);
                let alert = Alert::fatal(description).encode();
                if let Err(e) = self.write_record(ContentType::Alert, &alert) {
                    tracing::debug!("Alert not delivered: {}", e);
                }
                self.shutdown();
                Error::AlertSent(description)
            },
            None => {
                tracing::error!("Connection failed: {}", error);
                self.shutdown();
                error
            },
        }
    }

    fn shutdown(&mut self) {
        if self.state.is_closed() {
            return;
        }
        self.transport.close();
        self.state.handshake = HandshakeState::Closed;
        self.records.clear();
        self.handshake_buffer.clear();
    }
}

impl<T: Transport + core::fmt::Debug> core::fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Connection")
            .field("transport", &self.transport)
            .field("state", &self.state)
            .field("buffered", &self.records.buffered())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tlse_crypto_rustcrypto::RustCryptoProvider;

    #[derive(Debug, Default)]
    struct Sink {
        written: Vec<u8>,
        closed: bool,
        hint: Option<Role>,
    }

    impl Transport for Sink {
        fn write(&mut self, data: &[u8]) -> Result<()> {
            self.written.extend_from_slice(data);
            Ok(())
        }

        fn close(&mut self) {
            self.closed = true;
        }

        fn role_hint(&self) -> Option<Role> {
            self.hint
        }
    }

    fn connection(config: Config, sink: Sink) -> Connection<Sink> {
        Connection::new(Arc::new(config), Arc::new(RustCryptoProvider::new()), sink)
    }

    #[test]
    fn test_connection_is_send() {
        fn assert_send<S: Send>() {}
        assert_send::<Connection<Sink>>();
    }

    #[test]
    fn test_role_resolution() {
        let conn = connection(Config::default(), Sink::default());
        assert_eq!(conn.role(), Role::AutoDetect);
        assert_eq!(conn.handshake_state(), HandshakeState::Idle);

        let sink = Sink {
            hint: Some(Role::Server),
            ..Sink::default()
        };
        let conn = connection(Config::default(), sink);
        assert_eq!(conn.role(), Role::Server);
        assert_eq!(conn.handshake_state(), HandshakeState::AwaitingClientHello);

        let sink = Sink {
            hint: Some(Role::Client),
            ..Sink::default()
        };
        let config = Config::builder().with_role(Role::Server).build().unwrap();
        assert_eq!(connection(config, sink).role(), Role::Server);
    }

    #[test]
    fn test_partial_record_waits() {
        let config = Config::builder().with_role(Role::Server).build().unwrap();
        let mut conn = connection(config, Sink::default());
        conn.consume(&[0x16, 0x03, 0x01, 0x00]).unwrap();
        assert!(conn.transport().written.is_empty());
        assert!(!conn.is_closed());
    }

    #[test]
    fn test_fatal_error_sends_alert_and_closes() {
        let config = Config::builder().with_role(Role::Server).build().unwrap();
        let mut conn = connection(config, Sink::default());

        let err = conn.consume(&[0x18, 0x03, 0x01, 0x00, 0x00]).unwrap_err();
        assert_eq!(
            err,
            Error::AlertSent(crate::error::AlertDescription::UnexpectedMessage)
        );
        assert_eq!(conn.transport().written, vec![0x15, 0x03, 0x01, 0x00, 0x02, 0x02, 0x0A]);
        assert!(conn.transport().closed);
        assert_eq!(conn.consume(&[0x17]), Err(Error::ConnectionClosed));
    }

    #[test]
    fn test_send_before_established() {
        let mut conn = connection(Config::default(), Sink::default());
        assert!(matches!(
            conn.send_application_data(b"early"),
            Err(Error::UnexpectedMessage(_))
        ));
        assert!(!conn.is_closed());
    }

    #[test]
    fn test_close_sends_close_notify() {
        let mut conn = connection(Config::default(), Sink::default());
        conn.close().unwrap();
        assert_eq!(conn.transport().written, vec![0x15, 0x03, 0x01, 0x00, 0x02, 0x01, 0x00]);
        assert!(conn.transport().closed);
        assert!(conn.is_closed());
        conn.close().unwrap();
    }
}
