//! Session-token value generation.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;

/// Number of random bytes backing a token value.
pub const TOKEN_BYTES: usize = 64;

/// Produce a fresh token value: [`TOKEN_BYTES`] bytes from the operating
/// system's CSPRNG, base64url-encoded without padding.
pub fn generate_token_value() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_values_are_unique_and_urlsafe() {
        let a = generate_token_value();
        let b = generate_token_value();
        assert_ne!(a, b);
        // 64 bytes -> ceil(64 * 4 / 3) unpadded base64 characters
        assert_eq!(a.len(), 86);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn token_value_decodes_to_full_entropy_width() {
        let value = generate_token_value();
        let decoded = URL_SAFE_NO_PAD.decode(value).unwrap();
        assert_eq!(decoded.len(), TOKEN_BYTES);
    }
}
