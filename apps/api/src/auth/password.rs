use anyhow::{Context, Result};

const MIN_COST: u32 = 4;
const MAX_COST: u32 = 31;

/// bcrypt wrapper. Every hash embeds a fresh random salt and the configured
/// cost, so hashing the same password twice yields different strings.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(MIN_COST, MAX_COST),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hashes on the blocking pool; bcrypt at a real cost takes tens of milliseconds.
    pub async fn hash(&self, plaintext: &str) -> Result<String> {
        let plaintext = plaintext.to_owned();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
            .await
            .context("Password hashing task panicked")?
            .context("Failed to hash password")
    }

    /// Returns `Ok(false)` on mismatch. Errors only when `encoded` is not a bcrypt hash.
    pub async fn verify(&self, plaintext: &str, encoded: &str) -> Result<bool> {
        let plaintext = plaintext.to_owned();
        let encoded = encoded.to_owned();
        tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &encoded))
            .await
            .context("Password verification task panicked")?
            .context("Stored password hash is malformed")
    }
}
