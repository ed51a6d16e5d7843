//! HMAC implementations using the RustCrypto `hmac` crate.

use hmac::Mac;
use tlse_crypto::{Error, HashAlgorithm, Hmac, Result};

type HmacMd5 = hmac::Hmac<md5::Md5>;
type HmacSha1 = hmac::Hmac<sha1::Sha1>;
type HmacSha256 = hmac::Hmac<sha2::Sha256>;
type HmacSha384 = hmac::Hmac<sha2::Sha384>;
type HmacSha512 = hmac::Hmac<sha2::Sha512>;

/// Create an HMAC instance for the specified algorithm and key.
pub fn create_hmac(algorithm: HashAlgorithm, key: &[u8]) -> Result<Box<dyn Hmac>> {
    let state = match algorithm {
        HashAlgorithm::Md5 => HmacState::Md5(HmacMd5::new_from_slice(key).map_err(key_error)?),
        HashAlgorithm::Sha1 => HmacState::Sha1(HmacSha1::new_from_slice(key).map_err(key_error)?),
        HashAlgorithm::Sha256 => {
            HmacState::Sha256(HmacSha256::new_from_slice(key).map_err(key_error)?)
        },
        HashAlgorithm::Sha384 => {
            HmacState::Sha384(HmacSha384::new_from_slice(key).map_err(key_error)?)
        },
        HashAlgorithm::Sha512 => {
            HmacState::Sha512(HmacSha512::new_from_slice(key).map_err(key_error)?)
        },
    };
    Ok(Box::new(RustCryptoHmac { state }))
}

fn key_error<E>(_: E) -> Error {
    Error::Internal("HMAC rejected key length".into())
}

enum HmacState {
    Md5(HmacMd5),
    Sha1(HmacSha1),
    Sha256(HmacSha256),
    Sha384(HmacSha384),
    Sha512(HmacSha512),
}

struct RustCryptoHmac {
    state: HmacState,
}

impl Hmac for RustCryptoHmac {
    fn update(&mut self, data: &[u8]) {
        match &mut self.state {
            HmacState::Md5(mac) => mac.update(data),
            HmacState::Sha1(mac) => mac.update(data),
            HmacState::Sha256(mac) => mac.update(data),
            HmacState::Sha384(mac) => mac.update(data),
            HmacState::Sha512(mac) => mac.update(data),
        }
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        match self.state {
            HmacState::Md5(mac) => mac.finalize().into_bytes().to_vec(),
            HmacState::Sha1(mac) => mac.finalize().into_bytes().to_vec(),
            HmacState::Sha256(mac) => mac.finalize().into_bytes().to_vec(),
            HmacState::Sha384(mac) => mac.finalize().into_bytes().to_vec(),
            HmacState::Sha512(mac) => mac.finalize().into_bytes().to_vec(),
        }
    }

    fn algorithm(&self) -> HashAlgorithm {
        match self.state {
            HmacState::Md5(_) => HashAlgorithm::Md5,
            HmacState::Sha1(_) => HashAlgorithm::Sha1,
            HmacState::Sha256(_) => HashAlgorithm::Sha256,
            HmacState::Sha384(_) => HashAlgorithm::Sha384,
            HmacState::Sha512(_) => HashAlgorithm::Sha512,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(algorithm: HashAlgorithm, key: &[u8], data: &[u8]) -> String {
        let mut mac = create_hmac(algorithm, key).unwrap();
        mac.update(data);
        hex::encode(mac.finalize())
    }

    #[test]
    fn test_rfc_vectors() {
        // RFC 2104 / RFC 2202 / RFC 4231 "Jefe" test case
        let key = b"Jefe";
        let data = b"what do ya want for nothing?";
        assert_eq!(
            tag(HashAlgorithm::Md5, key, data),
            "750c783e6ab0b503eaa86e310a5db738"
        );
        assert_eq!(
            tag(HashAlgorithm::Sha1, key, data),
            "effcdf6ae5eb2fa2d27416d5f184df9c259a7c79"
        );
        assert_eq!(
            tag(HashAlgorithm::Sha256, key, data),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_verify_constant_time_path() {
        let mut mac = create_hmac(HashAlgorithm::Sha256, b"key").unwrap();
        mac.update(b"data");
        let expected = mac.finalize();

        let mut mac = create_hmac(HashAlgorithm::Sha256, b"key").unwrap();
        mac.update(b"data");
        assert!(mac.verify(&expected));

        let mut mac = create_hmac(HashAlgorithm::Sha256, b"key").unwrap();
        mac.update(b"tampered");
        assert!(!mac.verify(&expected));
    }

    #[test]
    fn test_output_size_matches_algorithm() {
        let mac = create_hmac(HashAlgorithm::Sha384, b"k").unwrap();
        assert_eq!(mac.output_size(), 48);
        assert_eq!(mac.algorithm(), HashAlgorithm::Sha384);
    }
}
