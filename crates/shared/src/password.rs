//! Temporary password generation for administratively created accounts.
//!
//! Accounts created by an admin never see this password: the invitee receives
//! a recovery link and chooses their own. It only has to be strong enough that
//! the account cannot be guessed in the meantime.

use rand::{seq::SliceRandom, Rng};
use thiserror::Error;

/// Minimum accepted length for a generated password.
pub const MIN_TEMPORARY_PASSWORD_LENGTH: usize = 12;

/// Default length used when configuration does not override it.
pub const DEFAULT_TEMPORARY_PASSWORD_LENGTH: usize = 24;

const LOWERCASE: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const DIGITS: &[u8] = b"23456789";
const SYMBOLS: &[u8] = b"!@#$%^&*-_=+?";

/// Error type for password generation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Temporary password length {0} is below the minimum of {MIN_TEMPORARY_PASSWORD_LENGTH}")]
    TooShort(usize),
}

/// Generates a random password containing at least one lowercase letter, one
/// uppercase letter, one digit and one symbol.
///
/// # Example
/// ```
/// use shared::password::generate_temporary_password;
///
/// let password = generate_temporary_password(20).unwrap();
/// assert_eq!(password.len(), 20);
/// ```
pub fn generate_temporary_password(length: usize) -> Result<String, PasswordError> {
    if length < MIN_TEMPORARY_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort(length));
    }

    let mut rng = rand::thread_rng();
    let classes = [LOWERCASE, UPPERCASE, DIGITS, SYMBOLS];
    let alphabet: Vec<u8> = classes.concat();

    let mut bytes: Vec<u8> = classes
        .iter()
        .map(|class| class[rng.gen_range(0..class.len())])
        .collect();
    while bytes.len() < length {
        bytes.push(alphabet[rng.gen_range(0..alphabet.len())]);
    }
    bytes.shuffle(&mut rng);

    // Every byte comes from an ASCII alphabet.
    Ok(bytes.into_iter().map(char::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_password_has_requested_length() {
        let password = generate_temporary_password(24).unwrap();
        assert_eq!(password.len(), 24);
    }

    #[test]
    fn test_generated_password_contains_every_class() {
        for _ in 0..50 {
            let password = generate_temporary_password(MIN_TEMPORARY_PASSWORD_LENGTH).unwrap();
            assert!(password.bytes().any(|b| LOWERCASE.contains(&b)));
            assert!(password.bytes().any(|b| UPPERCASE.contains(&b)));
            assert!(password.bytes().any(|b| DIGITS.contains(&b)));
            assert!(password.bytes().any(|b| SYMBOLS.contains(&b)));
        }
    }

    #[test]
    fn test_generated_passwords_differ() {
        let a = generate_temporary_password(24).unwrap();
        let b = generate_temporary_password(24).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_too_short_length_rejected() {
        assert_eq!(
            generate_temporary_password(8),
            Err(PasswordError::TooShort(8))
        );
    }
}
