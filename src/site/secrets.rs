//! The eight generated keys and salts a configured site carries.

use std::collections::BTreeMap;

use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Length of every generated key and salt.
pub const KEY_LENGTH: usize = 64;

/// Constant names, in configuration file order.
pub const KEY_NAMES: [&str; 8] = [
    "AUTH_KEY",
    "SECURE_AUTH_KEY",
    "LOGGED_IN_KEY",
    "NONCE_KEY",
    "AUTH_SALT",
    "SECURE_AUTH_SALT",
    "LOGGED_IN_SALT",
    "NONCE_SALT",
];

/// Eight independent 64-character secrets. Serialized field names match the
/// constant names, so this maps directly onto the `[keys]` table of the
/// configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Salts {
    #[serde(rename = "AUTH_KEY")]
    pub auth_key: String,
    #[serde(rename = "SECURE_AUTH_KEY")]
    pub secure_auth_key: String,
    #[serde(rename = "LOGGED_IN_KEY")]
    pub logged_in_key: String,
    #[serde(rename = "NONCE_KEY")]
    pub nonce_key: String,
    #[serde(rename = "AUTH_SALT")]
    pub auth_salt: String,
    #[serde(rename = "SECURE_AUTH_SALT")]
    pub secure_auth_salt: String,
    #[serde(rename = "LOGGED_IN_SALT")]
    pub logged_in_salt: String,
    #[serde(rename = "NONCE_SALT")]
    pub nonce_salt: String,
}

impl Salts {
    /// Generate eight fresh secrets.
    pub fn generate() -> Self {
        Self {
            auth_key: random_key(),
            secure_auth_key: random_key(),
            logged_in_key: random_key(),
            nonce_key: random_key(),
            auth_salt: random_key(),
            secure_auth_salt: random_key(),
            logged_in_salt: random_key(),
            nonce_salt: random_key(),
        }
    }

    /// The secrets keyed by constant name, in [`KEY_NAMES`] order.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        KEY_NAMES
            .iter()
            .zip(self.values())
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    fn values(&self) -> [&String; 8] {
        [
            &self.auth_key,
            &self.secure_auth_key,
            &self.logged_in_key,
            &self.nonce_key,
            &self.auth_salt,
            &self.secure_auth_salt,
            &self.logged_in_salt,
            &self.nonce_salt,
        ]
    }
}

/// One 64-character secret: 32 random bytes, hex-encoded.
fn random_key() -> String {
    let mut bytes = [0u8; KEY_LENGTH / 2];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn every_secret_is_64_characters() {
        let salts = Salts::generate();
        for value in salts.values() {
            assert_eq!(value.len(), KEY_LENGTH);
        }
    }

    #[test]
    fn secrets_are_pairwise_distinct() {
        let salts = Salts::generate();
        let unique: BTreeSet<&String> = salts.values().into_iter().collect();
        assert_eq!(unique.len(), 8);
    }

    #[test]
    fn map_is_keyed_by_constant_name() {
        let salts = Salts::generate();
        let map = salts.to_map();
        assert_eq!(map.len(), 8);
        assert_eq!(map["AUTH_KEY"], salts.auth_key);
        assert_eq!(map["NONCE_SALT"], salts.nonce_salt);
    }

    #[test]
    fn serializes_with_constant_names() {
        let salts = Salts::generate();
        let toml = toml::to_string(&salts).unwrap();
        for name in KEY_NAMES {
            assert!(toml.contains(name), "missing {name} in:\n{toml}");
        }
    }
}
