//! Key transport (RSA-OAEP) and content encryption (AES-GCM).
//!
//! An XML-Enc payload is protected by a per-message symmetric [`ContentKey`]
//! which in turn is wrapped for the recipient with RSA-OAEP. GCM cipher
//! values are laid out as `IV (12 bytes) || ciphertext || tag (16 bytes)`.

use std::fmt;

use aws_lc_rs::{
    aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_128_GCM, AES_256_GCM, NONCE_LEN},
    rsa::{
        KeySize, OaepAlgorithm, OaepPrivateDecryptingKey, OaepPublicEncryptingKey,
        PrivateDecryptingKey, PublicEncryptingKey, OAEP_SHA1_MGF1SHA1, OAEP_SHA256_MGF1SHA256,
    },
};

use crate::algorithm::{ContentEncryptionAlgorithm, KeyTransportAlgorithm};
use crate::error::{CryptoError, CryptoResult};
use crate::pem::pem_to_der;
use crate::random::random_bytes;

const GCM_TAG_LEN: usize = 16;

fn oaep_algorithm(algorithm: KeyTransportAlgorithm) -> &'static OaepAlgorithm {
    match algorithm {
        KeyTransportAlgorithm::RsaOaepMgf1Sha1 => &OAEP_SHA1_MGF1SHA1,
        KeyTransportAlgorithm::RsaOaepSha256 => &OAEP_SHA256_MGF1SHA256,
    }
}

/// Symmetric content key recovered from (or destined for) an `xenc:EncryptedKey`.
///
/// The bytes are zeroed on drop.
pub struct ContentKey(Vec<u8>);

impl ContentKey {
    /// Wraps raw key bytes.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Generates a random key for the given algorithm.
    #[must_use]
    pub fn generate(algorithm: ContentEncryptionAlgorithm) -> Self {
        Self(random_bytes(algorithm.key_len()))
    }

    /// Returns the key length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the key is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn aead_key(&self, algorithm: ContentEncryptionAlgorithm) -> CryptoResult<LessSafeKey> {
        if self.0.len() != algorithm.key_len() {
            return Err(CryptoError::UnsupportedAlgorithm(format!(
                "{algorithm:?} requires a {}-byte key, got {} bytes",
                algorithm.key_len(),
                self.0.len()
            )));
        }
        let aead_alg = match algorithm {
            ContentEncryptionAlgorithm::Aes128Gcm => &AES_128_GCM,
            ContentEncryptionAlgorithm::Aes256Gcm => &AES_256_GCM,
        };
        let unbound = UnboundKey::new(aead_alg, &self.0)
            .map_err(|_| CryptoError::InvalidKey("AES key rejected".to_string()))?;
        Ok(LessSafeKey::new(unbound))
    }

    /// Decrypts a GCM cipher value (`IV || ciphertext || tag`).
    ///
    /// # Errors
    ///
    /// Returns an error if the key length does not match the algorithm, the
    /// input is too short or the authentication tag does not verify.
    pub fn decrypt(
        &self,
        algorithm: ContentEncryptionAlgorithm,
        cipher_value: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        let key = self.aead_key(algorithm)?;

        if cipher_value.len() < NONCE_LEN + GCM_TAG_LEN {
            return Err(CryptoError::Decryption("cipher value too short".to_string()));
        }
        let (iv, body) = cipher_value.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(iv)
            .map_err(|_| CryptoError::Decryption("invalid IV".to_string()))?;

        let mut in_out = body.to_vec();
        let plaintext = key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| CryptoError::Decryption("authentication tag mismatch".to_string()))?;
        Ok(plaintext.to_vec())
    }

    /// Encrypts plaintext into a GCM cipher value with a fresh random IV.
    ///
    /// # Errors
    ///
    /// Returns an error if the key length does not match the algorithm.
    pub fn encrypt(
        &self,
        algorithm: ContentEncryptionAlgorithm,
        plaintext: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        let key = self.aead_key(algorithm)?;

        let iv = random_bytes(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(&iv)
            .map_err(|_| CryptoError::Encryption("invalid IV".to_string()))?;

        let mut in_out = plaintext.to_vec();
        key.seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| CryptoError::Encryption("AES-GCM seal failed".to_string()))?;

        let mut out = iv;
        out.extend_from_slice(&in_out);
        Ok(out)
    }
}

impl Drop for ContentKey {
    fn drop(&mut self) {
        self.0.fill(0);
    }
}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentKey")
            .field("len", &self.0.len())
            .finish_non_exhaustive()
    }
}

/// Recipient public key used to wrap content keys.
pub struct EncryptionKey {
    key: OaepPublicEncryptingKey,
}

impl EncryptionKey {
    /// Loads an RSA public key from `SubjectPublicKeyInfo` DER.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not a usable RSA public key.
    pub fn from_der(spki_der: &[u8]) -> CryptoResult<Self> {
        let public = PublicEncryptingKey::from_der(spki_der)
            .map_err(|e| CryptoError::InvalidKey(format!("invalid RSA public key: {e}")))?;
        Self::from_public(public)
    }

    fn from_public(public: PublicEncryptingKey) -> CryptoResult<Self> {
        let key = OaepPublicEncryptingKey::new(public)
            .map_err(|e| CryptoError::InvalidKey(format!("RSA key unusable for OAEP: {e}")))?;
        Ok(Self { key })
    }

    /// Wraps a content key for this recipient.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is too large for the modulus.
    pub fn wrap_key(
        &self,
        algorithm: KeyTransportAlgorithm,
        content_key: &ContentKey,
    ) -> CryptoResult<Vec<u8>> {
        let mut out = vec![0u8; self.key.ciphertext_size()];
        let written = self
            .key
            .encrypt(oaep_algorithm(algorithm), &content_key.0, &mut out, None)
            .map_err(|e| CryptoError::KeyWrap(format!("RSA-OAEP encryption failed: {e}")))?;
        Ok(written.to_vec())
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey").finish_non_exhaustive()
    }
}

/// Service-provider private key used to unwrap content keys.
pub struct DecryptionKey {
    key: OaepPrivateDecryptingKey,
    public: EncryptionKey,
}

impl DecryptionKey {
    /// Loads an RSA private key from PKCS#8 DER.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be parsed.
    pub fn from_pkcs8(pkcs8_der: &[u8]) -> CryptoResult<Self> {
        let private = PrivateDecryptingKey::from_pkcs8(pkcs8_der)
            .map_err(|e| CryptoError::InvalidKey(format!("invalid RSA private key: {e}")))?;
        Self::from_private(private)
    }

    /// Loads an RSA private key from a `PRIVATE KEY` PEM block.
    ///
    /// # Errors
    ///
    /// Returns an error if the PEM block is missing or the key cannot be parsed.
    pub fn from_pkcs8_pem(pem: &str) -> CryptoResult<Self> {
        Self::from_pkcs8(&pem_to_der(pem, "PRIVATE KEY")?)
    }

    /// Generates a fresh 2048-bit key.
    ///
    /// # Errors
    ///
    /// Returns an error if key generation fails.
    pub fn generate() -> CryptoResult<Self> {
        let private = PrivateDecryptingKey::generate(KeySize::Rsa2048)
            .map_err(|e| CryptoError::InvalidKey(format!("RSA key generation failed: {e}")))?;
        Self::from_private(private)
    }

    fn from_private(private: PrivateDecryptingKey) -> CryptoResult<Self> {
        let public = EncryptionKey::from_public(private.public_key())?;
        let key = OaepPrivateDecryptingKey::new(private)
            .map_err(|e| CryptoError::InvalidKey(format!("RSA key unusable for OAEP: {e}")))?;
        Ok(Self { key, public })
    }

    /// Returns the matching public key.
    #[must_use]
    pub const fn encryption_key(&self) -> &EncryptionKey {
        &self.public
    }

    /// Unwraps an `xenc:EncryptedKey` cipher value.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyUnwrap`] on any failure. The cause is not
    /// reported to avoid acting as a padding oracle.
    pub fn unwrap_key(
        &self,
        algorithm: KeyTransportAlgorithm,
        wrapped: &[u8],
    ) -> CryptoResult<ContentKey> {
        let mut out = vec![0u8; self.key.min_output_size()];
        let plaintext = self
            .key
            .decrypt(oaep_algorithm(algorithm), wrapped, &mut out, None)
            .map_err(|_| CryptoError::KeyUnwrap)?;
        let content_key = ContentKey(plaintext.to_vec());
        out.fill(0);
        Ok(content_key)
    }
}

impl fmt::Debug for DecryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptionKey").finish_non_exhaustive()
    }
}
