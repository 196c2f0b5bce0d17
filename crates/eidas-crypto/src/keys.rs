//! Signing keys and public verification keys.
//!
//! Public keys are kept in the raw form aws-lc-rs verifies against: a DER
//! `RSAPublicKey` (PKCS#1) for RSA, an uncompressed SEC1 point for EC. Both
//! are exactly the `subjectPublicKey` bit string of an X.509 certificate.

use std::fmt;

use aws_lc_rs::{
    rand::SystemRandom,
    rsa::KeySize,
    signature::{
        self, EcdsaKeyPair, EcdsaSigningAlgorithm, KeyPair, RsaKeyPair,
        ECDSA_P256_SHA256_FIXED_SIGNING, ECDSA_P384_SHA384_FIXED_SIGNING,
        ECDSA_P521_SHA512_FIXED_SIGNING,
    },
};

use crate::algorithm::SignatureAlgorithm;
use crate::error::{CryptoError, CryptoResult};
use crate::hash::sha256;

/// Public key family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// RSA public key.
    Rsa,
    /// Elliptic-curve public key.
    Ec,
}

/// A public key used to verify signatures.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    key_type: KeyType,
    bytes: Vec<u8>,
}

impl PublicKey {
    /// Wraps a DER-encoded PKCS#1 `RSAPublicKey`.
    #[must_use]
    pub fn rsa(pkcs1_der: Vec<u8>) -> Self {
        Self {
            key_type: KeyType::Rsa,
            bytes: pkcs1_der,
        }
    }

    /// Wraps an uncompressed SEC1 EC point.
    #[must_use]
    pub fn ec(point: Vec<u8>) -> Self {
        Self {
            key_type: KeyType::Ec,
            bytes: point,
        }
    }

    /// Extracts the public key from a DER-encoded X.509 certificate.
    ///
    /// # Errors
    ///
    /// Returns an error if the certificate cannot be parsed or carries a key
    /// type other than RSA or EC.
    pub fn from_certificate_der(cert_der: &[u8]) -> CryptoResult<Self> {
        use x509_parser::prelude::*;
        use x509_parser::public_key::PublicKey as SpkiKey;

        let (_, cert) = X509Certificate::from_der(cert_der)
            .map_err(|e| CryptoError::InvalidKey(format!("failed to parse certificate: {e}")))?;

        let spki = cert.public_key();
        let key_type = match spki.parsed() {
            Ok(SpkiKey::RSA(_)) => KeyType::Rsa,
            Ok(SpkiKey::EC(_)) => KeyType::Ec,
            Ok(_) => {
                return Err(CryptoError::UnsupportedAlgorithm(
                    "certificate key is neither RSA nor EC".to_string(),
                ));
            }
            Err(e) => {
                return Err(CryptoError::InvalidKey(format!(
                    "invalid certificate public key: {e}"
                )));
            }
        };

        Ok(Self {
            key_type,
            bytes: spki.subject_public_key.data.to_vec(),
        })
    }

    /// Returns the key family.
    #[must_use]
    pub const fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Returns the raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns a short identifier derived from the key bytes, for logging.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        sha256(&self.bytes)
            .iter()
            .take(8)
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("key_type", &self.key_type)
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// A private signing key.
///
/// Used by issuers (and test fixtures) to produce XML signatures. The
/// verification pipeline itself never signs.
pub enum SigningKey {
    /// RSA key pair.
    Rsa(RsaKeyPair),
    /// ECDSA key pair bound to one curve/digest pairing.
    Ecdsa {
        /// The key pair.
        key_pair: EcdsaKeyPair,
        /// The signature algorithm the key was created for.
        algorithm: SignatureAlgorithm,
    },
}

impl SigningKey {
    /// Generates a fresh key suitable for the given algorithm.
    ///
    /// # Errors
    ///
    /// Returns an error if key generation fails or the algorithm is SHA-1 based.
    pub fn generate(algorithm: SignatureAlgorithm) -> CryptoResult<Self> {
        if algorithm.is_rsa() {
            let key_pair = RsaKeyPair::generate(KeySize::Rsa2048)
                .map_err(|e| CryptoError::InvalidKey(format!("RSA key generation failed: {e}")))?;
            return Ok(Self::Rsa(key_pair));
        }

        let key_pair = EcdsaKeyPair::generate(ecdsa_signing_alg(algorithm)?)
            .map_err(|e| CryptoError::InvalidKey(format!("EC key generation failed: {e}")))?;
        Ok(Self::Ecdsa {
            key_pair,
            algorithm,
        })
    }

    /// Loads a key from PKCS#8 DER.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid for the algorithm family.
    pub fn from_pkcs8(pkcs8_der: &[u8], algorithm: SignatureAlgorithm) -> CryptoResult<Self> {
        if algorithm.is_rsa() {
            let key_pair = RsaKeyPair::from_pkcs8(pkcs8_der)
                .or_else(|_| RsaKeyPair::from_der(pkcs8_der))
                .map_err(|e| CryptoError::InvalidKey(format!("invalid RSA key: {e}")))?;
            return Ok(Self::Rsa(key_pair));
        }

        let key_pair = EcdsaKeyPair::from_pkcs8(ecdsa_signing_alg(algorithm)?, pkcs8_der)
            .map_err(|e| CryptoError::InvalidKey(format!("invalid EC key: {e}")))?;
        Ok(Self::Ecdsa {
            key_pair,
            algorithm,
        })
    }

    /// Returns the matching public key.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        match self {
            Self::Rsa(key_pair) => PublicKey::rsa(key_pair.public_key().as_ref().to_vec()),
            Self::Ecdsa { key_pair, .. } => PublicKey::ec(key_pair.public_key().as_ref().to_vec()),
        }
    }

    /// Signs data with the given algorithm.
    ///
    /// # Errors
    ///
    /// Returns an error if the algorithm does not fit the key or signing fails.
    pub fn sign(&self, algorithm: SignatureAlgorithm, data: &[u8]) -> CryptoResult<Vec<u8>> {
        let rng = SystemRandom::new();
        match self {
            Self::Rsa(key_pair) => {
                let padding = match algorithm {
                    SignatureAlgorithm::RsaSha256 => &signature::RSA_PKCS1_SHA256,
                    SignatureAlgorithm::RsaSha384 => &signature::RSA_PKCS1_SHA384,
                    SignatureAlgorithm::RsaSha512 => &signature::RSA_PKCS1_SHA512,
                    other => {
                        return Err(CryptoError::UnsupportedAlgorithm(format!(
                            "{other:?} not supported for RSA signing"
                        )));
                    }
                };
                let mut sig = vec![0u8; key_pair.public_modulus_len()];
                key_pair
                    .sign(padding, &rng, data, &mut sig)
                    .map_err(|e| CryptoError::Signing(format!("RSA signing failed: {e}")))?;
                Ok(sig)
            }
            Self::Ecdsa {
                key_pair,
                algorithm: key_alg,
            } => {
                if *key_alg != algorithm {
                    return Err(CryptoError::UnsupportedAlgorithm(format!(
                        "key was created for {key_alg:?}, not {algorithm:?}"
                    )));
                }
                let sig = key_pair
                    .sign(&rng, data)
                    .map_err(|e| CryptoError::Signing(format!("ECDSA signing failed: {e}")))?;
                Ok(sig.as_ref().to_vec())
            }
        }
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

fn ecdsa_signing_alg(
    algorithm: SignatureAlgorithm,
) -> CryptoResult<&'static EcdsaSigningAlgorithm> {
    match algorithm {
        SignatureAlgorithm::EcdsaSha256 => Ok(&ECDSA_P256_SHA256_FIXED_SIGNING),
        SignatureAlgorithm::EcdsaSha384 => Ok(&ECDSA_P384_SHA384_FIXED_SIGNING),
        SignatureAlgorithm::EcdsaSha512 => Ok(&ECDSA_P521_SHA512_FIXED_SIGNING),
        other => Err(CryptoError::UnsupportedAlgorithm(format!(
            "{other:?} is not an ECDSA algorithm"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ecdsa_key_exposes_point() {
        let key = SigningKey::generate(SignatureAlgorithm::EcdsaSha256).unwrap();
        let public = key.public_key();
        assert_eq!(public.key_type(), KeyType::Ec);
        // Uncompressed P-256 point: 0x04 || X || Y
        assert_eq!(public.as_bytes().len(), 65);
        assert_eq!(public.as_bytes()[0], 0x04);
    }

    #[test]
    fn ecdsa_key_rejects_other_algorithm() {
        let key = SigningKey::generate(SignatureAlgorithm::EcdsaSha256).unwrap();
        assert!(key.sign(SignatureAlgorithm::EcdsaSha384, b"data").is_err());
        assert!(key.sign(SignatureAlgorithm::RsaSha256, b"data").is_err());
    }

    #[test]
    fn fingerprint_is_stable() {
        let key = PublicKey::rsa(vec![1, 2, 3]);
        assert_eq!(key.fingerprint(), key.clone().fingerprint());
        assert_eq!(key.fingerprint().len(), 16);
    }

    #[test]
    fn garbage_certificate_is_rejected() {
        assert!(PublicKey::from_certificate_der(b"not a certificate").is_err());
    }
}
