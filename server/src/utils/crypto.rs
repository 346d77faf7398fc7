//! Cryptographic utility functions

use sha2::{Digest, Sha256};

/// Encode bytes as a lowercase hex string
pub fn encode_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

/// SHA-256 hash of a string, hex-encoded (migration checksums)
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    encode_hex(&hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_hex() {
        assert_eq!(encode_hex(&[0x00, 0xff, 0x10]), "00ff10");
        assert_eq!(encode_hex(&[]), "");
    }

    #[test]
    fn test_sha256_hex_known_value() {
        // sha256("abc")
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sha256_hex_is_deterministic() {
        assert_eq!(sha256_hex("schema"), sha256_hex("schema"));
        assert_ne!(sha256_hex("schema"), sha256_hex("schema2"));
    }
}
