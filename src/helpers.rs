//! Small shared utilities.
//!
//! # Responsibilities
//! - Random hex strings (API tokens, salts)
//! - Probability coin flips for the demo domain code
//! - Opinionated string validation for request input

/// Returns a random hex string of `bytes` random bytes.
pub fn random_hex(bytes: usize, uppercase: bool) -> String {
    let mut buf = vec![0u8; bytes];
    for b in buf.iter_mut() {
        *b = fastrand::u8(..);
    }
    let s = hex::encode(buf);
    if uppercase {
        s.to_uppercase()
    } else {
        s
    }
}

/// Returns true with the given probability, in percent.
///
/// `maybe(0)` is always false, `maybe(100)` is always true.
pub fn maybe(percent: u32) -> bool {
    fastrand::u32(0..100) < percent
}

/// Opinionated string validation: rejects blank or whitespace-only input.
pub fn valid_string(value: &str) -> bool {
    !value.trim().is_empty()
}
