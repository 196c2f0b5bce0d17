//! Cryptographically secure random generation.

use rand::Rng;

/// Generates a cryptographically secure random byte array.
#[must_use]
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut rng = rand::rng();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes[..]);
    bytes
}

/// Generates a random XML `ID` value.
///
/// The leading underscore keeps the value a valid `xs:ID` (an NCName may not
/// start with a digit).
#[must_use]
pub fn random_id() -> String {
    let hex: String = random_bytes(16).iter().map(|b| format!("{b:02x}")).collect();
    format!("_{hex}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_bytes_length() {
        assert_eq!(random_bytes(32).len(), 32);
        assert!(random_bytes(0).is_empty());
    }

    #[test]
    fn random_id_is_ncname() {
        let id = random_id();
        assert!(id.starts_with('_'));
        assert_eq!(id.len(), 33);
        assert_ne!(id, random_id());
    }
}
