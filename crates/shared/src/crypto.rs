//! Cryptographic helpers.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{distributions::Alphanumeric, Rng};

/// Returns true if the value decodes as unpadded (or padded) base64url.
pub fn is_base64url(value: &str) -> bool {
    let trimmed = value.trim_end_matches('=');
    !trimmed.is_empty() && URL_SAFE_NO_PAD.decode(trimmed).is_ok()
}

/// Random uppercase alphanumeric code of the given length.
pub fn random_code(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_base64url() {
        assert!(is_base64url("dGVzdC1jaGFsbGVuZ2U"));
        assert!(is_base64url("dGVzdA=="));
        assert!(is_base64url("a-_b"));
        assert!(!is_base64url(""));
        assert!(!is_base64url("has spaces"));
        assert!(!is_base64url("plus+slash/"));
    }

    #[test]
    fn test_random_code() {
        let code = random_code(6);
        assert_eq!(code.len(), 6);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
