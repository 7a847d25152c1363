//! Salted password hashing
//!
//! Stored format: `pbkdf2-sha256$<iterations>$<salt>$<hash>` with standard
//! base64 salt and hash. The iteration count travels with the hash, so a
//! config change only affects newly hashed passwords.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

pub const DEFAULT_ITERATIONS: u32 = 600_000;
pub const SALT_LENGTH: usize = 16;
pub const HASH_LENGTH: usize = 32;

const SCHEME: &str = "pbkdf2-sha256";

/// Hashes new passwords with a fixed iteration count
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS)
    }
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    /// Hash with a fresh random salt
    pub fn hash(&self, password: &str) -> String {
        let mut salt = [0u8; SALT_LENGTH];
        rand::thread_rng().fill_bytes(&mut salt);
        let key = derive(password, &salt, self.iterations);
        format!(
            "{}${}${}${}",
            SCHEME,
            self.iterations,
            B64.encode(salt),
            B64.encode(key)
        )
    }
}

/// Check a password against a stored hash; malformed hashes never match
pub fn verify(password: &str, stored: &str) -> bool {
    let Some(parsed) = ParsedHash::parse(stored) else {
        tracing::warn!("Stored password hash has an unrecognised format");
        return false;
    };
    if password.is_empty() {
        return false;
    }

    let key = derive(password, &parsed.salt, parsed.iterations);
    key.as_slice().ct_eq(parsed.hash.as_slice()).into()
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LENGTH] {
    let mut key = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}

struct ParsedHash {
    iterations: u32,
    salt: Vec<u8>,
    hash: Vec<u8>,
}

impl ParsedHash {
    fn parse(stored: &str) -> Option<Self> {
        let mut parts = stored.split('$');
        if parts.next()? != SCHEME {
            return None;
        }
        let iterations: u32 = parts.next()?.parse().ok().filter(|n| *n > 0)?;
        let salt = B64.decode(parts.next()?).ok()?;
        let hash = B64.decode(parts.next()?).ok()?;
        if parts.next().is_some() || hash.len() != HASH_LENGTH {
            return None;
        }
        Some(Self {
            iterations,
            salt,
            hash,
        })
    }
}
