//! Password credentials for users.
//!
//! A user row only ever stores an Argon2id PHC string. Callers provision the
//! credential explicitly through [`CredentialHasher::hash`]; there is no
//! default password.

use std::fmt;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::StoreError;

/// PHC-format Argon2id hash of a user's password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl CredentialHasher {
    /// Hasher with explicit Argon2 memory (KiB) and iteration costs.
    pub fn with_cost(memory_kib: u32, iterations: u32) -> Result<Self, StoreError> {
        let params = Params::new(memory_kib, iterations, 1, None).map_err(|e| {
            StoreError::Credential {
                reason: format!("invalid argon2 parameters: {e}"),
            }
        })?;
        Ok(Self { params })
    }

    pub fn hash(&self, password: &str) -> Result<Credential, StoreError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| StoreError::Credential {
                reason: format!("failed to hash password: {e}"),
            })?;
        Ok(Credential(hash.to_string()))
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}
