//! XML Signature support for SAML assertions.
//!
//! Verification is split in two steps that run in order:
//!
//! 1. [`SignatureProfileValidator`] checks the shape of the `ds:Signature`
//!    against the SAML signature profile and extracts an [`XmlSignature`].
//!    This rejects signature wrapping and algorithm confusion before any
//!    cryptography runs.
//! 2. [`SignatureValidator`] recomputes the reference digest and verifies the
//!    signature value over the canonical `ds:SignedInfo`.
//!
//! # Signing Algorithms
//!
//! - RSA-SHA256/384/512
//! - ECDSA-SHA256/384/512
//!
//! Legacy RSA-SHA1 is accepted only when explicitly allowed.

mod profile;
#[cfg(any(test, feature = "fixtures"))]
mod signer;
mod validator;

pub use profile::*;
#[cfg(any(test, feature = "fixtures"))]
pub use signer::*;
pub use validator::*;

use eidas_crypto::{DigestAlgorithm, SignatureAlgorithm};

use crate::types::canonicalization_algorithms;
use crate::xml::XmlElement;

/// Canonicalization algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CanonicalizationAlgorithm {
    /// Exclusive C14N without comments (recommended).
    #[default]
    ExclusiveC14N,
    /// Exclusive C14N with comments.
    ExclusiveC14NWithComments,
    /// C14N without comments.
    C14N,
    /// C14N with comments.
    C14NWithComments,
}

impl CanonicalizationAlgorithm {
    /// Returns the URI for this canonicalization algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::ExclusiveC14N => canonicalization_algorithms::EXCLUSIVE_C14N,
            Self::ExclusiveC14NWithComments => {
                canonicalization_algorithms::EXCLUSIVE_C14N_WITH_COMMENTS
            }
            Self::C14N => canonicalization_algorithms::C14N,
            Self::C14NWithComments => canonicalization_algorithms::C14N_WITH_COMMENTS,
        }
    }

    /// Parses a canonicalization algorithm from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            canonicalization_algorithms::EXCLUSIVE_C14N => Some(Self::ExclusiveC14N),
            canonicalization_algorithms::EXCLUSIVE_C14N_WITH_COMMENTS => {
                Some(Self::ExclusiveC14NWithComments)
            }
            canonicalization_algorithms::C14N => Some(Self::C14N),
            canonicalization_algorithms::C14N_WITH_COMMENTS => Some(Self::C14NWithComments),
            _ => None,
        }
    }

    /// Returns true for the exclusive variants.
    ///
    /// Comments are never kept in the element tree, so both exclusive
    /// variants canonicalize identically.
    #[must_use]
    pub const fn is_exclusive(&self) -> bool {
        matches!(self, Self::ExclusiveC14N | Self::ExclusiveC14NWithComments)
    }
}

/// A `ds:Signature` that passed the profile checks.
#[derive(Debug, Clone)]
pub struct XmlSignature {
    /// The `ds:SignedInfo` element, with its in-scope namespaces.
    pub signed_info: XmlElement,
    /// The `SignedInfo` canonicalization algorithm.
    pub canonicalization: CanonicalizationAlgorithm,
    /// `InclusiveNamespaces` prefixes of the `SignedInfo` canonicalization.
    pub canonicalization_prefixes: Vec<String>,
    /// The signature algorithm.
    pub algorithm: SignatureAlgorithm,
    /// The single reference.
    pub reference: SignatureReference,
    /// The decoded signature value.
    pub signature_value: Vec<u8>,
    /// Position of the `ds:Signature` among the element children of the
    /// signed element.
    pub position: usize,
}

/// The `ds:Reference` of an assertion signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureReference {
    /// The reference URI (`#` + assertion ID, or empty).
    pub uri: String,
    /// `InclusiveNamespaces` prefixes of the exclusive C14N transform.
    pub inclusive_prefixes: Vec<String>,
    /// The digest algorithm.
    pub digest_algorithm: DigestAlgorithm,
    /// The decoded digest value.
    pub digest_value: Vec<u8>,
}
