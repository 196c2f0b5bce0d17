//! Signature verification over canonical bytes.

use aws_lc_rs::signature::{
    self, UnparsedPublicKey, ECDSA_P256_SHA256_FIXED, ECDSA_P384_SHA384_FIXED,
    ECDSA_P521_SHA512_FIXED, RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY,
    RSA_PKCS1_2048_8192_SHA256, RSA_PKCS1_2048_8192_SHA384, RSA_PKCS1_2048_8192_SHA512,
};

use crate::algorithm::SignatureAlgorithm;
use crate::error::{CryptoError, CryptoResult};
use crate::keys::{KeyType, PublicKey};

/// Verifies a signature over `data`.
///
/// ECDSA signatures are expected in the fixed-width `r || s` form used by
/// XML-DSig, not ASN.1 DER.
///
/// # Errors
///
/// Returns [`CryptoError::UnsupportedAlgorithm`] if the algorithm does not fit
/// the key type, and [`CryptoError::Verification`] if the signature is invalid.
pub fn verify_signature(
    algorithm: SignatureAlgorithm,
    public_key: &PublicKey,
    data: &[u8],
    sig: &[u8],
) -> CryptoResult<()> {
    let verification_alg: &'static dyn signature::VerificationAlgorithm =
        match (algorithm, public_key.key_type()) {
            (SignatureAlgorithm::RsaSha1, KeyType::Rsa) => {
                &RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY
            }
            (SignatureAlgorithm::RsaSha256, KeyType::Rsa) => &RSA_PKCS1_2048_8192_SHA256,
            (SignatureAlgorithm::RsaSha384, KeyType::Rsa) => &RSA_PKCS1_2048_8192_SHA384,
            (SignatureAlgorithm::RsaSha512, KeyType::Rsa) => &RSA_PKCS1_2048_8192_SHA512,
            (SignatureAlgorithm::EcdsaSha256, KeyType::Ec) => &ECDSA_P256_SHA256_FIXED,
            (SignatureAlgorithm::EcdsaSha384, KeyType::Ec) => &ECDSA_P384_SHA384_FIXED,
            (SignatureAlgorithm::EcdsaSha512, KeyType::Ec) => &ECDSA_P521_SHA512_FIXED,
            (alg, key_type) => {
                return Err(CryptoError::UnsupportedAlgorithm(format!(
                    "{alg:?} cannot be verified with a {key_type:?} key"
                )));
            }
        };

    UnparsedPublicKey::new(verification_alg, public_key.as_bytes())
        .verify(data, sig)
        .map_err(|_| CryptoError::Verification)
}
