//! Admin authorization
//!
//! Administrators authenticate per request with a shared secret. There is no
//! session or token state.

mod extract;

pub use extract::{AdminJson, AdminOnly};

use crate::error::AppError;
use sha2::{Digest, Sha256};
use tracing::warn;

/// Verifies the shared admin secret
#[derive(Clone)]
pub struct AdminGuard {
    digest: [u8; 32],
}

impl AdminGuard {
    pub fn new(secret: &str) -> Self {
        Self {
            digest: digest(secret),
        }
    }

    /// Check a submitted secret against the configured one
    pub fn verify(&self, supplied: Option<&str>) -> Result<(), AppError> {
        let supplied = supplied.ok_or_else(|| {
            warn!("admin request without password");
            AppError::Unauthorized("Unauthorized".to_string())
        })?;

        // Compare fixed-length digests without short-circuiting
        let candidate = digest(supplied);
        let diff = candidate
            .iter()
            .zip(self.digest.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));

        if diff != 0 {
            warn!("admin authentication failed");
            return Err(AppError::Unauthorized("Unauthorized".to_string()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for AdminGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AdminGuard(***)")
    }
}

fn digest(secret: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_configured_secret() {
        let guard = AdminGuard::new("s3cret");
        assert!(guard.verify(Some("s3cret")).is_ok());
    }

    #[test]
    fn test_rejects_wrong_or_missing_secret() {
        let guard = AdminGuard::new("s3cret");
        assert!(matches!(guard.verify(Some("s3cret ")), Err(AppError::Unauthorized(_))));
        assert!(matches!(guard.verify(Some("")), Err(AppError::Unauthorized(_))));
        assert!(matches!(guard.verify(None), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_debug_hides_digest() {
        assert_eq!(format!("{:?}", AdminGuard::new("x")), "AdminGuard(***)");
    }
}
