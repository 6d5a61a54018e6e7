//! Identifier normalization and SHA-256 hashing
//!
//! Ad platforms match users on hashed identifiers. Both sides must normalize
//! identically before hashing, so the rules here follow the platforms'
//! published matching guides.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `input`.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Trimmed, lowercased email. Dots in the local part of Gmail addresses are
/// dropped since Gmail ignores them.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim().to_lowercase();
    match email.rsplit_once('@') {
        Some((local, domain @ ("gmail.com" | "googlemail.com"))) => {
            format!("{}@{}", local.replace('.', ""), domain)
        }
        _ => email,
    }
}

/// Phone number reduced to a leading `+` and its digits.
pub fn normalize_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    format!("+{digits}")
}

/// Hash of the normalized email.
pub fn hashed_email(email: &str) -> String {
    sha256_hex(&normalize_email(email))
}

/// Hash of the normalized phone number.
pub fn hashed_phone(phone: &str) -> String {
    sha256_hex(&normalize_phone(phone))
}
