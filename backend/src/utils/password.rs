use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

/// Hashes a password with Argon2id and a fresh random salt, returning a PHC string.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;

    Ok(password_hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Invalid password hash: {}", e))?;

    let argon2 = Argon2::default();
    let result = argon2.verify_password(password.as_bytes(), &parsed_hash);

    match result {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("Password verification error: {}", e)),
    }
}

/// Like [`verify_password`] but for accounts that may have no password yet.
pub fn matches_stored_password(password: &str, hash: Option<&str>) -> anyhow::Result<bool> {
    match hash {
        Some(hash) => verify_password(password, hash),
        None => Ok(false),
    }
}

/// Runs [`hash_password`] on the blocking pool so Argon2 does not stall the
/// async workers.
pub async fn hash_password_blocking(password: &str) -> anyhow::Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| anyhow::anyhow!("Password hashing task failed: {}", e))?
}

/// Runs [`matches_stored_password`] on the blocking pool.
pub async fn matches_stored_password_blocking(
    password: &str,
    hash: Option<&str>,
) -> anyhow::Result<bool> {
    let hash = hash.map(str::to_string);
    let password = password.to_string();
    tokio::task::spawn_blocking(move || matches_stored_password(&password, hash.as_deref()))
        .await
        .map_err(|e| anyhow::anyhow!("Password verification task failed: {}", e))?
}
