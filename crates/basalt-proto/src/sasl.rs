//! SASL credential encoding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Encode credentials for the SASL PLAIN mechanism.
///
/// Produces the base64 of `\0user\0pass` (empty authorization identity),
/// ready to be sent in an `AUTHENTICATE` command.
pub fn encode_plain(user: &str, pass: &str) -> String {
    let raw = format!("\0{user}\0{pass}");
    STANDARD.encode(raw.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_plain() {
        // base64("\0jilles\0sesame")
        assert_eq!(encode_plain("jilles", "sesame"), "AGppbGxlcwBzZXNhbWU=");
    }

    #[test]
    fn test_encode_plain_empty_password() {
        assert_eq!(
            STANDARD.decode(encode_plain("user", "")).unwrap(),
            b"\0user\0"
        );
    }
}
