use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

use anyhow::anyhow;
use nutype::nutype;
use pbkdf2::{
    Params, Pbkdf2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::{RngCore, rngs::OsRng};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Rounds used when no configuration overrides them
pub const DEFAULT_PASSWORD_ROUNDS: u32 = 100_000;

// Login names: ASCII letters, digits, dot, dash and underscore.
pub const USERNAME_REGEX: &str = r"^[A-Za-z0-9_.-]+$";

static USERNAME_REGEX_COMPILED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(USERNAME_REGEX).expect("USERNAME_REGEX must be a valid regex"));

pub fn is_eligible_username(username: &str) -> bool {
    USERNAME_REGEX_COMPILED.is_match(username)
}

#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 50, predicate = is_eligible_username),
    derive(
        Clone,
        Debug,
        Display,
        FromStr,
        AsRef,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize
    )
)]
pub struct Username(String);

/// Only `admin` is privileged, every other stored role reads as staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::Staff
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hashes a password into a PBKDF2-SHA256 PHC string.
pub fn hash_password(password: &str, rounds: u32) -> Result<String, anyhow::Error> {
    let mut salt_bytes = [0u8; 16];
    OsRng.fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| anyhow!("failed to encode password salt: {}", e))?;

    let params = Params {
        rounds,
        output_length: 32,
    };

    Pbkdf2
        .hash_password_customized(password.as_bytes(), None, None, params, &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("failed to hash password: {}", e))
}

/// Checks a password against a stored PHC string. Malformed hashes never verify.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash)
        .and_then(|parsed| Pbkdf2.verify_password(password.as_bytes(), &parsed))
        .is_ok()
}
