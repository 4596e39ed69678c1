//! Session token minting.

use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::SessionError;

/// Length of a token: 32 random bytes, two hex characters each.
pub const TOKEN_HEX_LEN: usize = 64;

/// Generates a random 64-character hex token (256 bits of entropy).
///
/// Reads straight from the OS random source. A failure is returned to the
/// caller; there is no fallback generator.
pub fn generate_token() -> Result<String, SessionError> {
    let mut bytes = [0u8; TOKEN_HEX_LEN / 2];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| SessionError::RandomSource(e.to_string()))?;
    // `{:02x}`: lowercase hex, zero-padded, so 0x0A becomes "0a".
    Ok(bytes.iter().map(|b| format!("{b:02x}")).collect())
}

/// Checks the shape of a presented token without looking it up.
pub fn validate_token_format(token: &str) -> Result<(), SessionError> {
    let well_formed = token.len() == TOKEN_HEX_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if well_formed {
        Ok(())
    } else {
        Err(SessionError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_is_64_lowercase_hex() {
        let token = generate_token().unwrap();
        assert_eq!(token.len(), TOKEN_HEX_LEN);
        assert!(validate_token_format(&token).is_ok());
    }

    #[test]
    fn test_generate_token_unique() {
        assert_ne!(generate_token().unwrap(), generate_token().unwrap());
    }

    #[test]
    fn test_validate_token_format_rejects_short_and_uppercase() {
        assert_eq!(
            validate_token_format("abc"),
            Err(SessionError::InvalidToken)
        );
        let upper = "A".repeat(TOKEN_HEX_LEN);
        assert_eq!(
            validate_token_format(&upper),
            Err(SessionError::InvalidToken)
        );
    }
}
