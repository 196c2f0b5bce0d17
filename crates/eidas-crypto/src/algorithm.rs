//! Algorithm identifiers and their XML-DSig / XML-Enc URIs.
//!
//! Only the algorithms named by the eIDAS cryptographic requirements are
//! modelled. SHA-1 variants exist for legacy peers and are refused by the
//! protocol crate unless explicitly enabled.

use serde::{Deserialize, Serialize};

/// Digest algorithms usable in `ds:DigestMethod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    /// SHA-1 (legacy only).
    Sha1,
    /// SHA-256.
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl DigestAlgorithm {
    /// Returns the XML-DSig URI for this digest.
    #[must_use]
    pub const fn uri(self) -> &'static str {
        match self {
            Self::Sha1 => "http://www.w3.org/2000/09/xmldsig#sha1",
            Self::Sha256 => "http://www.w3.org/2001/04/xmlenc#sha256",
            Self::Sha384 => "http://www.w3.org/2001/04/xmldsig-more#sha384",
            Self::Sha512 => "http://www.w3.org/2001/04/xmlenc#sha512",
        }
    }

    /// Parses a digest algorithm from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        [Self::Sha1, Self::Sha256, Self::Sha384, Self::Sha512]
            .into_iter()
            .find(|alg| alg.uri() == uri)
    }

    /// Returns the output length in bytes.
    #[must_use]
    pub const fn output_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Returns true for SHA-1.
    #[must_use]
    pub const fn is_deprecated(self) -> bool {
        matches!(self, Self::Sha1)
    }
}

/// Signature algorithms usable in `ds:SignatureMethod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    /// RSA PKCS#1 v1.5 with SHA-1 (legacy only).
    RsaSha1,
    /// RSA PKCS#1 v1.5 with SHA-256.
    RsaSha256,
    /// RSA PKCS#1 v1.5 with SHA-384.
    RsaSha384,
    /// RSA PKCS#1 v1.5 with SHA-512.
    RsaSha512,
    /// ECDSA on P-256 with SHA-256.
    EcdsaSha256,
    /// ECDSA on P-384 with SHA-384.
    EcdsaSha384,
    /// ECDSA on P-521 with SHA-512.
    EcdsaSha512,
}

impl SignatureAlgorithm {
    /// Returns the XML-DSig URI for this algorithm.
    #[must_use]
    pub const fn uri(self) -> &'static str {
        match self {
            Self::RsaSha1 => "http://www.w3.org/2000/09/xmldsig#rsa-sha1",
            Self::RsaSha256 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256",
            Self::RsaSha384 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha384",
            Self::RsaSha512 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha512",
            Self::EcdsaSha256 => "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256",
            Self::EcdsaSha384 => "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha384",
            Self::EcdsaSha512 => "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha512",
        }
    }

    /// Parses a signature algorithm from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        [
            Self::RsaSha1,
            Self::RsaSha256,
            Self::RsaSha384,
            Self::RsaSha512,
            Self::EcdsaSha256,
            Self::EcdsaSha384,
            Self::EcdsaSha512,
        ]
        .into_iter()
        .find(|alg| alg.uri() == uri)
    }

    /// Returns the digest paired with this algorithm.
    #[must_use]
    pub const fn digest(self) -> DigestAlgorithm {
        match self {
            Self::RsaSha1 => DigestAlgorithm::Sha1,
            Self::RsaSha256 | Self::EcdsaSha256 => DigestAlgorithm::Sha256,
            Self::RsaSha384 | Self::EcdsaSha384 => DigestAlgorithm::Sha384,
            Self::RsaSha512 | Self::EcdsaSha512 => DigestAlgorithm::Sha512,
        }
    }

    /// Returns true if this algorithm uses RSA.
    #[must_use]
    pub const fn is_rsa(self) -> bool {
        matches!(
            self,
            Self::RsaSha1 | Self::RsaSha256 | Self::RsaSha384 | Self::RsaSha512
        )
    }

    /// Returns true if this algorithm uses ECDSA.
    #[must_use]
    pub const fn is_ecdsa(self) -> bool {
        matches!(
            self,
            Self::EcdsaSha256 | Self::EcdsaSha384 | Self::EcdsaSha512
        )
    }

    /// Returns true if this algorithm uses a deprecated hash (SHA-1).
    #[must_use]
    pub const fn is_deprecated(self) -> bool {
        matches!(self, Self::RsaSha1)
    }
}

/// Key transport algorithms usable in `xenc:EncryptedKey/xenc:EncryptionMethod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyTransportAlgorithm {
    /// RSA-OAEP with SHA-1 digest and MGF1-SHA1 (`xmlenc#rsa-oaep-mgf1p`).
    RsaOaepMgf1Sha1,
    /// RSA-OAEP with SHA-256 digest and MGF1-SHA256 (`xmlenc11#rsa-oaep`).
    RsaOaepSha256,
}

impl KeyTransportAlgorithm {
    /// URI of `xmlenc#rsa-oaep-mgf1p`.
    pub const RSA_OAEP_MGF1P_URI: &'static str = "http://www.w3.org/2001/04/xmlenc#rsa-oaep-mgf1p";
    /// URI of `xmlenc11#rsa-oaep`.
    pub const RSA_OAEP_URI: &'static str = "http://www.w3.org/2009/xmlenc11#rsa-oaep";
    /// URI of the MGF1-SHA256 mask generation function.
    pub const MGF1_SHA256_URI: &'static str = "http://www.w3.org/2009/xmlenc11#mgf1sha256";

    /// Resolves the algorithm from the method URI, the optional `ds:DigestMethod`
    /// and the optional `xenc11:MGF` found under the encryption method.
    #[must_use]
    pub fn resolve(method: &str, digest: Option<&str>, mgf: Option<&str>) -> Option<Self> {
        let digest = match digest {
            Some(uri) => Some(DigestAlgorithm::from_uri(uri)?),
            None => None,
        };
        match method {
            Self::RSA_OAEP_MGF1P_URI => match (digest, mgf) {
                (None | Some(DigestAlgorithm::Sha1), None) => Some(Self::RsaOaepMgf1Sha1),
                _ => None,
            },
            Self::RSA_OAEP_URI => match (digest, mgf) {
                (Some(DigestAlgorithm::Sha256), Some(Self::MGF1_SHA256_URI)) => {
                    Some(Self::RsaOaepSha256)
                }
                (None | Some(DigestAlgorithm::Sha1), None) => Some(Self::RsaOaepMgf1Sha1),
                _ => None,
            },
            _ => None,
        }
    }

    /// Returns the method URI for this algorithm.
    #[must_use]
    pub const fn uri(self) -> &'static str {
        match self {
            Self::RsaOaepMgf1Sha1 => Self::RSA_OAEP_MGF1P_URI,
            Self::RsaOaepSha256 => Self::RSA_OAEP_URI,
        }
    }
}

/// Content (block) encryption algorithms usable in `xenc:EncryptedData`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentEncryptionAlgorithm {
    /// AES-128 in GCM mode.
    Aes128Gcm,
    /// AES-256 in GCM mode.
    Aes256Gcm,
}

impl ContentEncryptionAlgorithm {
    /// Returns the XML-Enc 1.1 URI.
    #[must_use]
    pub const fn uri(self) -> &'static str {
        match self {
            Self::Aes128Gcm => "http://www.w3.org/2009/xmlenc11#aes128-gcm",
            Self::Aes256Gcm => "http://www.w3.org/2009/xmlenc11#aes256-gcm",
        }
    }

    /// Parses an algorithm from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        [Self::Aes128Gcm, Self::Aes256Gcm]
            .into_iter()
            .find(|alg| alg.uri() == uri)
    }

    /// Returns the key length in bytes.
    #[must_use]
    pub const fn key_len(self) -> usize {
        match self {
            Self::Aes128Gcm => 16,
            Self::Aes256Gcm => 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_algorithm_uri_lookup() {
        assert_eq!(
            SignatureAlgorithm::from_uri("http://www.w3.org/2001/04/xmldsig-more#rsa-sha512"),
            Some(SignatureAlgorithm::RsaSha512)
        );
        assert_eq!(SignatureAlgorithm::from_uri("urn:unknown"), None);
        assert_eq!(SignatureAlgorithm::EcdsaSha384.digest(), DigestAlgorithm::Sha384);
    }

    #[test]
    fn signature_algorithm_properties() {
        assert!(SignatureAlgorithm::RsaSha256.is_rsa());
        assert!(!SignatureAlgorithm::RsaSha256.is_ecdsa());
        assert!(SignatureAlgorithm::EcdsaSha256.is_ecdsa());
        assert!(SignatureAlgorithm::RsaSha1.is_deprecated());
        assert!(DigestAlgorithm::Sha1.is_deprecated());
    }

    #[test]
    fn key_transport_resolution() {
        assert_eq!(
            KeyTransportAlgorithm::resolve(KeyTransportAlgorithm::RSA_OAEP_MGF1P_URI, None, None),
            Some(KeyTransportAlgorithm::RsaOaepMgf1Sha1)
        );
        assert_eq!(
            KeyTransportAlgorithm::resolve(
                KeyTransportAlgorithm::RSA_OAEP_URI,
                Some(DigestAlgorithm::Sha256.uri()),
                Some(KeyTransportAlgorithm::MGF1_SHA256_URI),
            ),
            Some(KeyTransportAlgorithm::RsaOaepSha256)
        );
        // SHA-256 digest with the default SHA-1 mask is not a supported pairing.
        assert_eq!(
            KeyTransportAlgorithm::resolve(
                KeyTransportAlgorithm::RSA_OAEP_URI,
                Some(DigestAlgorithm::Sha256.uri()),
                None,
            ),
            None
        );
        assert_eq!(
            KeyTransportAlgorithm::resolve("http://www.w3.org/2001/04/xmlenc#rsa-1_5", None, None),
            None
        );
    }

    #[test]
    fn content_algorithm_key_lengths() {
        assert_eq!(ContentEncryptionAlgorithm::Aes128Gcm.key_len(), 16);
        assert_eq!(ContentEncryptionAlgorithm::Aes256Gcm.key_len(), 32);
        assert_eq!(
            ContentEncryptionAlgorithm::from_uri("http://www.w3.org/2001/04/xmlenc#aes128-cbc"),
            None
        );
    }
}
