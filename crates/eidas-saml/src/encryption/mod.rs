//! XML Encryption of assertions.
//!
//! Only the shape used by eIDAS nodes is supported: an `xenc:EncryptedData`
//! of type `Element` encrypted with AES-GCM, whose content key is wrapped
//! with RSA-OAEP in an `xenc:EncryptedKey`.

mod decrypter;
#[cfg(any(test, feature = "fixtures"))]
mod encrypter;

pub use decrypter::AssertionDecrypter;
#[cfg(any(test, feature = "fixtures"))]
pub use encrypter::AssertionEncrypter;
