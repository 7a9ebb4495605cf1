//! Random secret and password generation for client provisioning.
//!
//! Every character is drawn independently and uniformly from the requested
//! alphabet using the thread-local CSPRNG (`rand::rng()`, ChaCha-based and
//! periodically reseeded from the OS). Generated values are handed to the
//! provisioning script once and never persisted.

use std::fmt;

use rand::Rng;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Alphabets
// ---------------------------------------------------------------------------

/// ASCII letters and digits.
pub const SECRET_KEY_ALPHABET: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Symbols appended to [`SECRET_KEY_ALPHABET`] for passwords.
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*";

/// ASCII letters, digits and [`PASSWORD_SYMBOLS`].
pub const PASSWORD_ALPHABET: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*";

// ---------------------------------------------------------------------------
// Lengths
// ---------------------------------------------------------------------------

/// Length of the deployment secret key.
pub const SECRET_KEY_LENGTH: usize = 32;

/// Length of the per-client PostgreSQL password.
pub const POSTGRES_PASSWORD_LENGTH: usize = 16;

/// Length of the initial login password shown to the new client.
pub const INITIAL_PASSWORD_LENGTH: usize = 12;

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Draw `length` characters uniformly from `alphabet`.
///
/// Fails with [`CoreError::Precondition`] when `length` is zero or the
/// alphabet is empty.
pub fn generate(length: usize, alphabet: &str) -> Result<String, CoreError> {
    if length == 0 {
        return Err(CoreError::Precondition(
            "credential length must be greater than zero".to_string(),
        ));
    }

    let symbols: Vec<char> = alphabet.chars().collect();
    if symbols.is_empty() {
        return Err(CoreError::Precondition(
            "credential alphabet must not be empty".to_string(),
        ));
    }

    let mut rng = rand::rng();
    Ok((0..length)
        .map(|_| symbols[rng.random_range(0..symbols.len())])
        .collect())
}

/// Generate an alphanumeric secret key of the given length.
pub fn generate_secret_key(length: usize) -> Result<String, CoreError> {
    generate(length, SECRET_KEY_ALPHABET)
}

/// Generate a password (alphanumeric plus symbols) of the given length.
pub fn generate_password(length: usize) -> Result<String, CoreError> {
    generate(length, PASSWORD_ALPHABET)
}

/// The three secrets handed to the provisioning script for one client.
#[derive(Clone)]
pub struct ProvisioningCredentials {
    pub secret_key: String,
    pub postgres_password: String,
    pub initial_password: String,
}

impl ProvisioningCredentials {
    /// Generate a fresh set using the standard lengths.
    pub fn generate() -> Result<Self, CoreError> {
        Ok(Self {
            secret_key: generate_secret_key(SECRET_KEY_LENGTH)?,
            postgres_password: generate_password(POSTGRES_PASSWORD_LENGTH)?,
            initial_password: generate_password(INITIAL_PASSWORD_LENGTH)?,
        })
    }
}

impl fmt::Debug for ProvisioningCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisioningCredentials")
            .field("secret_key", &"<redacted>")
            .field("postgres_password", &"<redacted>")
            .field("initial_password", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn generated_length_matches_request() {
        for length in [1, 2, 12, 16, 32, 100] {
            let value = generate(length, PASSWORD_ALPHABET).expect("generate");
            assert_eq!(value.chars().count(), length);
        }
    }

    #[test]
    fn every_character_comes_from_the_alphabet() {
        let alphabet = "ab'$";
        let value = generate(500, alphabet).expect("generate");
        assert!(value.chars().all(|c| alphabet.contains(c)));
    }

    #[test]
    fn single_symbol_alphabet_repeats_it() {
        assert_eq!(generate(5, "x").expect("generate"), "xxxxx");
    }

    #[test]
    fn secret_key_is_alphanumeric() {
        let key = generate_secret_key(SECRET_KEY_LENGTH).expect("generate");
        assert_eq!(key.len(), 32);
        assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn password_uses_extended_alphabet_only() {
        let password = generate_password(POSTGRES_PASSWORD_LENGTH).expect("generate");
        assert_eq!(password.len(), 16);
        assert!(password.chars().all(|c| PASSWORD_ALPHABET.contains(c)));
    }

    #[test]
    fn password_alphabet_is_letters_digits_and_symbols() {
        assert_eq!(
            PASSWORD_ALPHABET,
            format!("{SECRET_KEY_ALPHABET}{PASSWORD_SYMBOLS}")
        );
    }

    #[test]
    fn zero_length_is_rejected() {
        assert_matches!(generate(0, SECRET_KEY_ALPHABET), Err(CoreError::Precondition(_)));
    }

    #[test]
    fn empty_alphabet_is_rejected() {
        assert_matches!(generate(8, ""), Err(CoreError::Precondition(_)));
    }

    #[test]
    fn consecutive_keys_differ() {
        let a = generate_secret_key(SECRET_KEY_LENGTH).expect("generate");
        let b = generate_secret_key(SECRET_KEY_LENGTH).expect("generate");
        assert_ne!(a, b);
    }

    #[test]
    fn credential_set_uses_standard_lengths() {
        let creds = ProvisioningCredentials::generate().expect("generate");
        assert_eq!(creds.secret_key.len(), SECRET_KEY_LENGTH);
        assert_eq!(creds.postgres_password.len(), POSTGRES_PASSWORD_LENGTH);
        assert_eq!(creds.initial_password.len(), INITIAL_PASSWORD_LENGTH);
    }

    #[test]
    fn debug_output_hides_secrets() {
        let creds = ProvisioningCredentials::generate().expect("generate");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains(&creds.secret_key));
        assert!(!rendered.contains(&creds.initial_password));
        assert!(rendered.contains("<redacted>"));
    }
}
