//! Source file descriptors and integrity hashing.

use crate::errors::FolkloreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Supported integrity hash algorithms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashType {
    /// SHA-256 (the default).
    #[default]
    Sha256,
    /// MD5, for catalogs whose upstream publishes md5 sums.
    Md5,
}

impl fmt::Display for HashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => write!(f, "sha256"),
            Self::Md5 => write!(f, "md5"),
        }
    }
}

/// What a source file contributes to its dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRole {
    /// A data file (the default).
    #[default]
    Data,
    /// A human-readable description.
    Description,
    /// License text.
    License,
}

/// Hashes `bytes` with the given algorithm, returning lowercase hex.
#[must_use]
pub fn hash_bytes(hash_type: HashType, bytes: &[u8]) -> String {
    match hash_type {
        HashType::Sha256 => {
            use sha2::{Digest, Sha256};
            let mut hasher = Sha256::new();
            hasher.update(bytes);
            hex::encode(hasher.finalize())
        }
        HashType::Md5 => {
            use md5::{Digest, Md5};
            let mut hasher = Md5::new();
            hasher.update(bytes);
            hex::encode(hasher.finalize())
        }
    }
}

/// One file belonging to a raw dataset.
///
/// A source is fetched from `url`, expected on disk already, or written
/// from inline `contents` (used for descriptions and licenses).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Where the file can be downloaded, if anywhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// File name under the raw data directory.
    pub file_name: String,

    /// Hash algorithm used for verification.
    #[serde(default)]
    pub hash_type: HashType,

    /// Expected hash, lowercase hex. Absent means "fill in on fetch".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_value: Option<String>,

    /// The file's role within the dataset.
    #[serde(default)]
    pub role: SourceRole,

    /// Inline contents to materialize instead of fetching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
}

impl SourceFile {
    /// Creates a descriptor for a URL; the file name is the URL's last
    /// path segment.
    #[must_use]
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let file_name = url
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("download")
            .to_string();
        Self {
            url: Some(url),
            file_name,
            hash_type: HashType::default(),
            hash_value: None,
            role: SourceRole::default(),
            contents: None,
        }
    }

    /// Creates a descriptor for a file expected on disk (offline
    /// acquisition).
    #[must_use]
    pub fn from_path(file_name: impl Into<String>) -> Self {
        Self {
            url: None,
            file_name: file_name.into(),
            hash_type: HashType::default(),
            hash_value: None,
            role: SourceRole::default(),
            contents: None,
        }
    }

    /// Creates a descriptor materialized from inline contents.
    #[must_use]
    pub fn from_contents(file_name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            url: None,
            file_name: file_name.into(),
            hash_type: HashType::default(),
            hash_value: None,
            role: SourceRole::default(),
            contents: Some(contents.into()),
        }
    }

    /// Sets the expected hash.
    #[must_use]
    pub fn with_hash(mut self, hash_type: HashType, value: impl Into<String>) -> Self {
        self.hash_type = hash_type;
        self.hash_value = Some(value.into());
        self
    }

    /// Sets the role.
    #[must_use]
    pub fn with_role(mut self, role: SourceRole) -> Self {
        self.role = role;
        self
    }

    /// Computes this file's hash from its copy under `dir`.
    pub fn compute_hash(&self, dir: &Path) -> Result<String, FolkloreError> {
        let path = dir.join(&self.file_name);
        let bytes = fs::read(&path).map_err(|e| FolkloreError::from_io(e, &path))?;
        Ok(hash_bytes(self.hash_type, &bytes))
    }

    /// Verifies the file's copy under `dir` against the expected hash.
    ///
    /// Returns true when no expected hash is recorded; fails with
    /// [`FolkloreError::NotFound`] when the file is absent.
    pub fn verify(&self, dir: &Path) -> Result<bool, FolkloreError> {
        let Some(expected) = &self.hash_value else {
            return Ok(true);
        };
        let actual = self.compute_hash(dir)?;
        Ok(actual == *expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_bytes_known_values() {
        // Well-known digests of the empty input.
        assert_eq!(
            hash_bytes(HashType::Sha256, b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(hash_bytes(HashType::Md5, b""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_from_url_derives_file_name() {
        let src = SourceFile::from_url("https://example.com/data/houses.csv");
        assert_eq!(src.file_name, "houses.csv");

        let src = SourceFile::from_url("https://example.com/houses.csv/");
        assert_eq!(src.file_name, "download");
    }

    #[test]
    fn test_hash_type_default_is_sha256() {
        let src: SourceFile = serde_json::from_str(r#"{"file_name": "x.csv"}"#).unwrap();
        assert_eq!(src.hash_type, HashType::Sha256);
        assert_eq!(src.role, SourceRole::Data);
    }

    #[test]
    fn test_unknown_hash_type_rejected() {
        let result: Result<SourceFile, _> =
            serde_json::from_str(r#"{"file_name": "x", "hash_type": "sha1"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_verify() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("houses.csv"), b"a,b\n1,2\n").unwrap();

        let good = hash_bytes(HashType::Sha256, b"a,b\n1,2\n");
        let src = SourceFile::from_path("houses.csv").with_hash(HashType::Sha256, good);
        assert!(src.verify(dir.path()).unwrap());

        let src = SourceFile::from_path("houses.csv").with_hash(HashType::Sha256, "deadbeef");
        assert!(!src.verify(dir.path()).unwrap());
    }

    #[test]
    fn test_verify_without_expected_hash() {
        let dir = tempfile::tempdir().unwrap();
        let src = SourceFile::from_path("absent.csv");
        assert!(src.verify(dir.path()).unwrap());
    }

    #[test]
    fn test_verify_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = SourceFile::from_path("absent.csv").with_hash(HashType::Sha256, "00");
        let err = src.verify(dir.path()).unwrap_err();
        assert!(matches!(err, FolkloreError::NotFound { .. }));
    }
}
