//! Session secret generation

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;

/// 32 random bytes, base64-encoded. Written to the env file as the session
/// signing secret and shipped to the deploy integration as a ready value.
pub fn generate_session_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_decodes_to_32_bytes() {
        let secret = generate_session_secret();
        let decoded = STANDARD.decode(secret).unwrap();
        assert_eq!(decoded.len(), 32);
    }

    #[test]
    fn test_secrets_are_unique() {
        assert_ne!(generate_session_secret(), generate_session_secret());
    }
}
