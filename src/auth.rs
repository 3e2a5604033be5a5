use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Characters that satisfy the special-character password rule.
pub const SPECIAL_CHARS: &str = "!@#?";

/// Salted credential material: 16 random bytes of salt plus the SHA-256 of
/// salt followed by the password bytes. Stored in the WAL with the account,
/// never the password itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    salt: Vec<u8>,
    hash: Vec<u8>,
}

impl Credential {
    pub fn derive(password: &str) -> Self {
        let mut salt = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut salt);
        let hash = hash_with_salt(&salt, password);
        Self {
            salt: salt.to_vec(),
            hash,
        }
    }

    pub fn verify(&self, password: &str) -> bool {
        hash_with_salt(&self.salt, password) == self.hash
    }
}

fn hash_with_salt(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

/// Registration password rules, applied to both roles. Returns the first
/// violated rule, phrased for the user.
pub fn check_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase())
        || !password.chars().any(|c| c.is_ascii_lowercase())
    {
        return Err("mix upper and lower case letters");
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic())
        || !password.chars().any(|c| c.is_ascii_digit())
    {
        return Err("mix letters and numbers");
    }
    if !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        return Err("include a special character from !@#?");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_and_verify() {
        let cred = Credential::derive("Passw0rd!");
        assert!(cred.verify("Passw0rd!"));
        assert!(!cred.verify("Passw0rd?"));
        assert!(!cred.verify(""));
    }

    #[test]
    fn salts_are_unique() {
        let a = Credential::derive("Passw0rd!");
        let b = Credential::derive("Passw0rd!");
        // Same password, different salt, different hash.
        assert_ne!(a, b);
        assert!(a.verify("Passw0rd!"));
        assert!(b.verify("Passw0rd!"));
    }

    #[test]
    fn policy_length() {
        assert!(check_password("Aa1!").is_err());
        assert!(check_password("Aa1!Aa1").is_err()); // 7 chars
        assert!(check_password("Aa1!Aa1!").is_ok()); // exactly 8
    }

    #[test]
    fn policy_case_mix() {
        assert!(check_password("PASSW0RD!").is_err());
        assert!(check_password("passw0rd!").is_err());
    }

    #[test]
    fn policy_digit() {
        assert!(check_password("Password!").is_err());
    }

    #[test]
    fn policy_special_char() {
        assert!(check_password("Passw0rdX").is_err());
        for c in SPECIAL_CHARS.chars() {
            assert!(check_password(&format!("Passw0rd{c}")).is_ok());
        }
    }
}
