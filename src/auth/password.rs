use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::error;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
const DIGITS: &[u8] = b"23456789";

/// Random unmemorable password for accounts created through OAuth.
/// Satisfies the registration policy so the stored hash is never the
/// odd one out; the plaintext is discarded immediately after hashing.
pub fn generate_random_password() -> String {
    let mut rng = rand::thread_rng();
    let mut chars: Vec<u8> = Vec::with_capacity(32);
    chars.push(*UPPER.choose(&mut rng).unwrap());
    chars.push(*LOWER.choose(&mut rng).unwrap());
    chars.push(*DIGITS.choose(&mut rng).unwrap());
    let all: Vec<u8> = [UPPER, LOWER, DIGITS].concat();
    for _ in 0..29 {
        chars.push(all[rng.gen_range(0..all.len())]);
    }
    chars.shuffle(&mut rng);
    String::from_utf8(chars).expect("ascii alphabet")
}
