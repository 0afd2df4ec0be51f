use anyhow::{anyhow, Context, Result};
use fernet::Fernet;
use sha2::{Digest, Sha256};

/// Transform applied to national IDs before they leave the process.
pub trait Encrypt: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> String;
}

/// Fernet tokens under a shared key; the payment agent holds the same key and
/// decrypts downstream.
pub struct FernetEncryptor {
    fernet: Fernet,
}

impl FernetEncryptor {
    /// `key` is the url-safe base64 encoding of 32 bytes.
    pub fn new(key: &str) -> Result<Self> {
        let fernet = Fernet::new(key.trim()).ok_or_else(|| anyhow!("invalid Fernet key"))?;
        Ok(Self { fernet })
    }

    pub fn from_env(var: &str) -> Result<Self> {
        let key = std::env::var(var).with_context(|| format!("{var} not set"))?;
        Self::new(&key).with_context(|| format!("key in {var}"))
    }

    pub fn decrypt(&self, token: &str) -> Result<String> {
        let bytes = self
            .fernet
            .decrypt(token)
            .map_err(|_| anyhow!("token rejected"))?;
        String::from_utf8(bytes).context("decrypted value is not UTF-8")
    }
}

impl Encrypt for FernetEncryptor {
    fn encrypt(&self, plaintext: &str) -> String {
        self.fernet.encrypt(plaintext.as_bytes())
    }
}

/// Hex SHA-256 over `key || plaintext`. A one-way digest, not encryption:
/// nothing downstream can recover the input. Useful for pseudonymised test
/// runs where the value must stay stable.
pub struct KeyedDigest {
    key: Vec<u8>,
}

impl KeyedDigest {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    /// Read the key from an environment variable.
    pub fn from_env(var: &str) -> Result<Self> {
        let key = std::env::var(var).with_context(|| format!("{var} not set"))?;
        Ok(Self::new(key))
    }
}

impl Encrypt for KeyedDigest {
    fn encrypt(&self, plaintext: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.key);
        hasher.update(plaintext.as_bytes());
        hex::encode(hasher.finalize())
    }
}
