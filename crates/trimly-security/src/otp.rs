//! One-time passcode generation.

use rand::Rng;

/// Generates a random numeric code of `length` digits.
///
/// Leading zeros are allowed, so every code of the given length is equally
/// likely.
#[must_use]
pub fn generate_numeric_code(length: u32) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Compares a submitted code with the expected length and digit-only format
/// before any hash work is done.
#[must_use]
pub fn is_well_formed_code(code: &str, length: u32) -> bool {
    code.len() == length as usize && code.chars().all(|c| c.is_ascii_digit())
}
