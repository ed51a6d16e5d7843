//! Shared test harness: a recording transport and a scripted TLS 1.2 client.
//!
//! The client builds its messages with the crate's codecs but derives every
//! secret and verify_data on its own with `hmac` + `sha2`. Its records go
//! through the crate's `CipherState`; `record_layer.rs` checks that layout
//! against records built by hand with `aes`, `cbc` and `hmac`.

#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use hmac::{Hmac, Mac};
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey};
use rsa::RsaPrivateKey;
use sha2::{Digest, Sha256};
use tlse_core::cipher_suites::{lookup, CipherSuiteDescriptor};
use tlse_core::messages::{
    encode_envelope, parse_envelope, ClientHello, ClientKeyExchange, DecodeContext, Finished,
    HandshakeMessage, HelloRandom,
};
use tlse_core::prf::KeyBlock;
use tlse_core::record::{Record, RecordReader};
use tlse_core::record_protection::CipherState;
use tlse_core::{Config, Connection, Error, Result, Role, Transport};
use tlse_crypto::{CryptoProvider, PrivateKey};
use tlse_crypto_rustcrypto::RustCryptoProvider;

pub const TLS12: u16 = 0x0303;
pub const TLS10: u16 = 0x0301;

pub const CT_CHANGE_CIPHER_SPEC: u8 = 0x14;
pub const CT_ALERT: u8 = 0x15;
pub const CT_HANDSHAKE: u8 = 0x16;
pub const CT_APPLICATION_DATA: u8 = 0x17;

/// Transport that records everything written to it.
#[derive(Debug, Default)]
pub struct MockTransport {
    pub written: Vec<u8>,
    pub writes: usize,
    pub closed: bool,
    pub fail_writes: bool,
    pub hint: Option<Role>,
}

impl Transport for MockTransport {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.fail_writes {
            return Err(Error::IoError("broken pipe".into()));
        }
        self.written.extend_from_slice(data);
        self.writes += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn role_hint(&self) -> Option<Role> {
        self.hint
    }
}

/// RSA key shared by every test in a binary.
pub struct TestKey {
    pub private_der: Vec<u8>,
    pub public_der: Vec<u8>,
}

pub fn test_key() -> &'static TestKey {
    static KEY: OnceLock<TestKey> = OnceLock::new();
    KEY.get_or_init(|| {
        let mut rng = rand::thread_rng();
        let key = RsaPrivateKey::new(&mut rng, 1024).expect("generate RSA key");
        TestKey {
            private_der: key.to_pkcs8_der().expect("pkcs8").as_bytes().to_vec(),
            public_der: key
                .to_public_key()
                .to_public_key_der()
                .expect("spki")
                .as_bytes()
                .to_vec(),
        }
    })
}

/// Stand-in certificate: the test harness only needs opaque DER bytes.
pub fn test_certificate() -> Vec<u8> {
    let mut cert = vec![0x30, 0x82];
    cert.extend_from_slice(&test_key().public_der);
    cert
}

pub fn server_config() -> Config {
    Config::builder()
        .with_role(Role::Server)
        .with_identity(
            PrivateKey::from_der(test_key().private_der.clone()),
            vec![test_certificate()],
        )
        .build()
        .expect("server config")
}

pub fn connection(config: Config) -> Connection<MockTransport> {
    Connection::new(
        Arc::new(config),
        Arc::new(RustCryptoProvider::new()),
        MockTransport::default(),
    )
}

pub fn server() -> Connection<MockTransport> {
    connection(server_config())
}

/// Take everything the connection has written so far.
pub fn take_written(conn: &mut Connection<MockTransport>) -> Vec<u8> {
    std::mem::take(&mut conn.transport_mut().written)
}

/// Encode a plaintext record.
pub fn record(content_type: u8, version: u16, body: &[u8]) -> Vec<u8> {
    Record::new(content_type, version, body.to_vec())
        .encode()
        .expect("encode record")
}

/// Split a byte stream into records.
pub fn parse_records(bytes: &[u8]) -> Vec<Record> {
    let mut reader = RecordReader::new();
    reader.push(bytes);
    let mut records = Vec::new();
    while let Some(record) = reader.next_record().expect("well-formed records") {
        records.push(record);
    }
    assert_eq!(reader.buffered(), 0, "trailing partial record");
    records
}

/// The (level, description) of a plaintext alert record at the end of `bytes`.
pub fn plaintext_alert(bytes: &[u8]) -> Option<(u8, u8)> {
    let last = parse_records(bytes).pop()?;
    if last.content_type == CT_ALERT && last.fragment.len() == 2 {
        Some((last.fragment[0], last.fragment[1]))
    } else {
        None
    }
}

/// TLS 1.2 PRF with SHA-256, written against `hmac` directly.
pub fn p_sha256(secret: &[u8], label: &[u8], seed: &[u8], len: usize) -> Vec<u8> {
    let mac = |parts: &[&[u8]]| {
        let mut m = <Hmac<Sha256> as Mac>::new_from_slice(secret).expect("hmac key");
        for part in parts {
            m.update(part);
        }
        m.finalize().into_bytes().to_vec()
    };

    let mut out = Vec::with_capacity(len);
    let mut a = mac(&[label, seed]);
    while out.len() < len {
        out.extend(mac(&[&a[..], label, seed]));
        a = mac(&[&a[..]]);
    }
    out.truncate(len);
    out
}

/// A client driven step by step from the test.
pub struct ScriptedClient {
    pub provider: RustCryptoProvider,
    pub version: u16,
    pub offered_suites: Vec<u16>,
    pub client_random: [u8; 32],
    pub server_random: Option<[u8; 32]>,
    pub suite: Option<&'static CipherSuiteDescriptor>,
    pub master_secret: Option<Vec<u8>>,
    pub key_block: Option<Vec<u8>>,
    pub transcript: Vec<u8>,
    pub read: Option<CipherState>,
    pub write: Option<CipherState>,
    pub received: Vec<HandshakeMessage>,
}

impl ScriptedClient {
    pub fn new(offered_suites: &[u16]) -> Self {
        let provider = RustCryptoProvider::new();
        let random = HelloRandom::generate(provider.random()).expect("random");
        Self {
            provider,
            version: TLS12,
            offered_suites: offered_suites.to_vec(),
            client_random: random.to_bytes(),
            server_random: None,
            suite: None,
            master_secret: None,
            key_block: None,
            transcript: Vec::new(),
            read: None,
            write: None,
            received: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: u16) -> Self {
        self.version = version;
        self
    }

    /// ClientHello record, sent with the initial record version.
    pub fn client_hello(&mut self) -> Vec<u8> {
        let hello = ClientHello::new(
            self.version,
            HelloRandom::from_bytes(self.client_random),
            self.offered_suites.clone(),
        );
        let envelope =
            encode_envelope(&HandshakeMessage::ClientHello(hello)).expect("encode ClientHello");
        self.transcript.extend_from_slice(&envelope);
        record(CT_HANDSHAKE, TLS10, &envelope)
    }

    /// Read the plaintext server flight.
    pub fn receive_flight(&mut self, bytes: &[u8]) {
        let mut payload = Vec::new();
        for record in parse_records(bytes) {
            assert_eq!(record.content_type, CT_HANDSHAKE);
            assert_eq!(record.version, TLS12);
            payload.extend_from_slice(&record.fragment);
        }

        let ctx = DecodeContext {
            provider: &self.provider,
            key_exchange: None,
            private_key: None,
        };
        let mut offset = 0;
        while let Some(parsed) =
            parse_envelope(&payload, &mut offset, payload.len(), &ctx).expect("server envelope")
        {
            self.transcript.extend_from_slice(parsed.raw);
            if let HandshakeMessage::ServerHello(hello) = &parsed.message {
                self.server_random = Some(hello.random.to_bytes());
                self.suite = lookup(hello.cipher_suite);
            }
            self.received.push(parsed.message);
        }
        assert_eq!(offset, payload.len());
    }

    /// ClientKeyExchange carrying `pms_version`; derives the master secret.
    pub fn client_key_exchange(&mut self, pms_version: u16) -> Vec<u8> {
        let cke =
            ClientKeyExchange::rsa_encrypt(&self.provider, &test_key().public_der, pms_version)
                .expect("encrypt pre-master secret");

        let mut seed = self.client_random.to_vec();
        seed.extend_from_slice(&self.server_random.expect("ServerHello seen"));
        self.master_secret = Some(p_sha256(cke.pre_master_secret(), b"master secret", &seed, 48));

        let envelope = encode_envelope(&HandshakeMessage::ClientKeyExchange(cke))
            .expect("encode ClientKeyExchange");
        self.transcript.extend_from_slice(&envelope);
        record(CT_HANDSHAKE, TLS12, &envelope)
    }

    /// ChangeCipherSpec record; activates the client's cipher states.
    pub fn change_cipher_spec(&mut self) -> Vec<u8> {
        let suite = self.suite.expect("suite negotiated");
        let master_secret = self.master_secret.as_ref().expect("master secret");

        let mut seed = self.server_random.expect("server random").to_vec();
        seed.extend_from_slice(&self.client_random);
        let block = p_sha256(
            master_secret,
            b"key expansion",
            &seed,
            suite.key_block_length(),
        );
        let (local, remote) =
            KeyBlock::split(&block, suite.mac_length(), suite.key_size, suite.iv_length())
                .expect("split key block")
                .into_local_remote(Role::Client)
                .expect("client keys");
        self.write = Some(CipherState::new(suite, local).expect("write state"));
        self.read = Some(CipherState::new(suite, remote).expect("read state"));
        self.key_block = Some(block);

        record(CT_CHANGE_CIPHER_SPEC, TLS12, &[0x01])
    }

    pub fn verify_data(&self, label: &[u8]) -> [u8; 12] {
        let hash = Sha256::digest(&self.transcript);
        let out = p_sha256(
            self.master_secret.as_ref().expect("master secret"),
            label,
            &hash,
            12,
        );
        let mut verify_data = [0u8; 12];
        verify_data.copy_from_slice(&out);
        verify_data
    }

    /// Encrypted Finished record with the given verify data.
    pub fn finished_with(&mut self, verify_data: [u8; 12]) -> Vec<u8> {
        let envelope = encode_envelope(&HandshakeMessage::Finished(Finished::new(verify_data)))
            .expect("encode Finished");
        self.transcript.extend_from_slice(&envelope);
        self.seal(CT_HANDSHAKE, &envelope)
    }

    /// Encrypted Finished record with correct verify data.
    pub fn finished(&mut self) -> Vec<u8> {
        let verify_data = self.verify_data(b"client finished");
        self.finished_with(verify_data)
    }

    /// Protect one record with the client's write state.
    pub fn seal(&mut self, content_type: u8, plaintext: &[u8]) -> Vec<u8> {
        let body = self
            .write
            .as_mut()
            .expect("cipher active")
            .seal(&self.provider, content_type, TLS12, plaintext)
            .expect("seal");
        record(content_type, TLS12, &body)
    }

    /// Open every record in `bytes`. ChangeCipherSpec records are returned
    /// as they are.
    pub fn open_all(&mut self, bytes: &[u8]) -> Vec<(u8, Vec<u8>)> {
        parse_records(bytes)
            .into_iter()
            .map(|record| {
                if record.content_type == CT_CHANGE_CIPHER_SPEC {
                    return (record.content_type, record.fragment);
                }
                let plaintext = self
                    .read
                    .as_mut()
                    .expect("cipher active")
                    .open(&self.provider, record.content_type, record.version, &record.fragment)
                    .expect("open server record");
                (record.content_type, plaintext)
            })
            .collect()
    }
}

/// Drive a server connection to Established with the scripted client.
pub fn establish(
    conn: &mut Connection<MockTransport>,
    client: &mut ScriptedClient,
) -> Result<()> {
    conn.consume(&client.client_hello())?;
    let flight = take_written(conn);
    client.receive_flight(&flight);

    conn.consume(&client.client_key_exchange(client.version))?;
    conn.consume(&client.change_cipher_spec())?;
    let ccs = take_written(conn);
    assert_eq!(ccs, record(CT_CHANGE_CIPHER_SPEC, TLS12, &[0x01]));

    conn.consume(&client.finished())?;
    let finished = take_written(conn);
    let opened = client.open_all(&finished);
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].0, CT_HANDSHAKE);

    let expected = client.verify_data(b"server finished");
    let mut envelope = vec![0x14, 0x00, 0x00, 0x0C];
    envelope.extend_from_slice(&expected);
    assert_eq!(opened[0].1, envelope, "server Finished verify data");
    Ok(())
}
