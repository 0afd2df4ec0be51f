use anyhow::{Context, Result};
use std::{collections::HashMap, env, fmt};

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Resolves a named service account.
pub trait CredentialLookup: Send + Sync {
    fn credentials(&self, account: &str) -> Result<Credentials>;
}

/// `<ACCOUNT>_USERNAME` / `<ACCOUNT>_PASSWORD`, account upper-cased.
#[derive(Debug, Default, Clone)]
pub struct EnvCredentials;

impl EnvCredentials {
    fn var_name(account: &str, field: &str) -> String {
        let prefix: String = account
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect();
        format!("{prefix}_{field}")
    }
}

impl CredentialLookup for EnvCredentials {
    fn credentials(&self, account: &str) -> Result<Credentials> {
        let user_var = Self::var_name(account, "USERNAME");
        let pass_var = Self::var_name(account, "PASSWORD");
        Ok(Credentials {
            username: env::var(&user_var).with_context(|| format!("{user_var} not set"))?,
            password: env::var(&pass_var).with_context(|| format!("{pass_var} not set"))?,
        })
    }
}

/// Fixed account table, for embedding callers that already hold secrets.
#[derive(Debug, Default, Clone)]
pub struct StaticCredentials {
    accounts: HashMap<String, Credentials>,
}

impl StaticCredentials {
    pub fn with(mut self, account: &str, username: &str, password: &str) -> Self {
        self.accounts.insert(
            account.to_string(),
            Credentials {
                username: username.to_string(),
                password: password.to_string(),
            },
        );
        self
    }
}

impl CredentialLookup for StaticCredentials {
    fn credentials(&self, account: &str) -> Result<Credentials> {
        self.accounts
            .get(account)
            .cloned()
            .with_context(|| format!("no credentials for account {account}"))
    }
}
