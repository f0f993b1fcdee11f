use crate::domain::error::{AppError, Result};
use sha2::{Digest, Sha256};

/// Cookie value that marks a logged-in browser.
pub const AUTHENTICATED_MARKER: &str = "authenticated";

pub fn is_authenticated_marker(value: Option<&str>) -> bool {
    value == Some(AUTHENTICATED_MARKER)
}

/// Shared-password check for the login form.
///
/// Only the SHA-256 digest of the password is kept in memory.
#[derive(Clone)]
pub struct PasswordGate {
    digest: Option<[u8; 32]>,
}

impl std::fmt::Debug for PasswordGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordGate")
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl PasswordGate {
    pub fn from_password(password: Option<&str>) -> Self {
        let digest = password
            .filter(|password| !password.is_empty())
            .map(|password| sha256(password.as_bytes()));
        Self { digest }
    }

    /// Build from a hex-encoded SHA-256 digest, as stored in config files.
    pub fn from_hex_digest(digest_hex: &str) -> Result<Self> {
        let bytes = hex::decode(digest_hex.trim()).map_err(|e| {
            AppError::ConfigError(format!("auth.password_sha256 is not valid hex: {}", e))
        })?;
        let digest: [u8; 32] = bytes.try_into().map_err(|_| {
            AppError::ConfigError("auth.password_sha256 must be 32 bytes".to_string())
        })?;
        Ok(Self {
            digest: Some(digest),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.digest.is_some()
    }

    pub fn verify(&self, candidate: &str) -> Result<()> {
        let Some(expected) = self.digest else {
            return Err(AppError::ConfigError(
                "Server configuration error. Please contact support.".to_string(),
            ));
        };

        let actual = sha256(candidate.as_bytes());
        let diff = expected
            .iter()
            .zip(actual.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));

        if diff == 0 {
            Ok(())
        } else {
            Err(AppError::SecurityError("Invalid password.".to_string()))
        }
    }
}

fn sha256(bytes: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(bytes));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_password() {
        let gate = PasswordGate::from_password(Some("hunter2"));

        assert!(gate.verify("hunter2").is_ok());
        assert_eq!(
            gate.verify("hunter3"),
            Err(AppError::SecurityError("Invalid password.".to_string()))
        );
    }

    #[test]
    fn test_missing_password_is_config_error() {
        let gate = PasswordGate::from_password(None);

        assert!(!gate.is_configured());
        assert!(matches!(gate.verify("anything"), Err(AppError::ConfigError(_))));
        assert!(!PasswordGate::from_password(Some("")).is_configured());
    }

    #[test]
    fn test_hex_digest_matches_plain_password() {
        let digest = hex::encode(Sha256::digest(b"hunter2"));
        let gate = PasswordGate::from_hex_digest(&digest).unwrap();

        assert!(gate.verify("hunter2").is_ok());
        assert!(PasswordGate::from_hex_digest("abcd").is_err());
        assert!(PasswordGate::from_hex_digest("zz").is_err());
    }

    #[test]
    fn test_authenticated_marker() {
        assert!(is_authenticated_marker(Some("authenticated")));
        assert!(!is_authenticated_marker(Some("yes")));
        assert!(!is_authenticated_marker(None));
    }
}
