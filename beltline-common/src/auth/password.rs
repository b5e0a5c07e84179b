//! Password storage
//!
//! Salted, iterated SHA-512 digests in `salt$hex` form. Verification
//! recomputes the digest from the stored salt.

use rand::RngCore;
use sha2::{Digest, Sha512};

const ITERATIONS: u32 = 100_000;

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> String {
    let mut salt_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt: String = salt_bytes.iter().map(|b| format!("{:02x}", b)).collect();

    format!("{}${}", salt, digest(&salt, password))
}

/// Check a password against a stored `salt$hex` hash
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, expected)) = stored.split_once('$') else {
        return false;
    };
    digest(salt, password) == expected
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    let mut current = hasher.finalize();

    for _ in 1..ITERATIONS {
        let mut hasher = Sha512::new();
        hasher.update(current);
        current = hasher.finalize();
    }

    current.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_correct_password() {
        let stored = hash_password("correct horse battery staple");
        assert!(verify_password("correct horse battery staple", &stored));
    }

    #[test]
    fn rejects_wrong_password() {
        let stored = hash_password("correct horse battery staple");
        assert!(!verify_password("tr0ub4dor&3", &stored));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_password("same");
        let b = hash_password("same");
        assert_ne!(a, b);
        assert!(verify_password("same", &a));
        assert!(verify_password("same", &b));
    }

    #[test]
    fn rejects_malformed_stored_value() {
        assert!(!verify_password("anything", "no-dollar-separator"));
    }
}
