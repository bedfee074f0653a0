//! Upload-URL contract for patient documents and photos.
//!
//! The crate never moves file bytes itself: callers ask for an
//! [`UploadTarget`], hand the upload URL to the client, and store the
//! public URL (typically in the patients `photo` column). No retry policy;
//! a failed derivation surfaces immediately.

use crate::config::StorageConfig;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Storage error type
#[derive(Debug)]
pub enum StorageError {
    /// Object key is empty or contains path traversal
    InvalidKey(String),
    /// Store is missing required configuration
    Misconfigured(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::InvalidKey(k) => write!(f, "Invalid object key: {k:?}"),
            StorageError::Misconfigured(s) => write!(f, "Storage misconfigured: {s}"),
        }
    }
}

impl std::error::Error for StorageError {}

/// Where a client should PUT the bytes, and where they will be readable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub upload_url: String,
    pub public_url: String,
}

/// A backend that can mint upload targets.
pub trait ObjectStore {
    /// # Errors
    ///
    /// Returns `StorageError` when the key is unusable or the store is
    /// misconfigured.
    fn upload_target(&self, key: &str, content_type: &str)
        -> Result<UploadTarget, StorageError>;
}

/// Derives time-limited HMAC-signed upload URLs from [`StorageConfig`].
///
/// The signature covers `key \n content_type \n expiry`, so a leaked URL
/// cannot be replayed for a different object or past its window.
pub struct SignedUrlStore {
    config: StorageConfig,
}

impl SignedUrlStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    fn check_key(key: &str) -> Result<(), StorageError> {
        if key.trim().is_empty() || key.contains("..") || key.starts_with('/') {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(())
    }
}

impl ObjectStore for SignedUrlStore {
    fn upload_target(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<UploadTarget, StorageError> {
        Self::check_key(key)?;
        if self.config.upload_base_url.is_empty() || self.config.signing_secret.is_empty() {
            return Err(StorageError::Misconfigured(
                "upload_base_url and signing_secret are required".into(),
            ));
        }

        let expires = Utc::now().timestamp() + self.config.upload_url_ttl_seconds;
        let mut mac = HmacSha256::new_from_slice(self.config.signing_secret.as_bytes())
            .expect("hmac key");
        mac.update(format!("{key}\n{content_type}\n{expires}").as_bytes());
        let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        let base = self.config.upload_base_url.trim_end_matches('/');
        let public_base = self.config.public_base_url.trim_end_matches('/');
        Ok(UploadTarget {
            upload_url: format!("{base}/{key}?expires={expires}&signature={sig}"),
            public_url: format!("{public_base}/{key}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SignedUrlStore {
        SignedUrlStore::new(StorageConfig {
            upload_base_url: "https://uploads.example/bucket/".into(),
            public_base_url: "https://cdn.example".into(),
            signing_secret: "secret".into(),
            upload_url_ttl_seconds: 900,
        })
    }

    #[test]
    fn test_upload_target_urls() {
        let target = store()
            .upload_target("patients/42/photo.jpg", "image/jpeg")
            .unwrap();
        assert!(target
            .upload_url
            .starts_with("https://uploads.example/bucket/patients/42/photo.jpg?expires="));
        assert!(target.upload_url.contains("&signature="));
        assert_eq!(
            target.public_url,
            "https://cdn.example/patients/42/photo.jpg"
        );
    }

    #[test]
    fn test_rejects_traversal_and_empty_keys() {
        let store = store();
        assert!(store.upload_target("", "image/png").is_err());
        assert!(store.upload_target("../etc/passwd", "image/png").is_err());
        assert!(store.upload_target("/abs/path", "image/png").is_err());
    }

    #[test]
    fn test_unconfigured_store_errors() {
        let store = SignedUrlStore::new(StorageConfig::default());
        assert!(matches!(
            store.upload_target("k", "image/png").unwrap_err(),
            StorageError::Misconfigured(_)
        ));
    }
}
