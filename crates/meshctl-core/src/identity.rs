//! Identity issuer material
//!
//! Certificates and keys are produced elsewhere; the installer only reads
//! them through a [`CredentialSource`] and passes their text through.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::options::IdentityOptions;

/// Something that can hand over the bytes behind an identity file path
pub trait CredentialSource {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads identity material from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsCredentials;

impl CredentialSource for FsCredentials {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// Identity material held in memory, keyed by the path it stands in for
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    files: HashMap<PathBuf, Vec<u8>>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }
}

impl CredentialSource for StaticCredentials {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "no such identity file")
        })
    }
}

/// PEM text for the trust anchors and the issuer certificate and key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityMaterial {
    pub trust_anchors_pem: String,
    pub issuer_crt_pem: String,
    pub issuer_key_pem: String,
}

impl IdentityMaterial {
    /// Read all three files named in validated identity options
    pub fn load(options: &IdentityOptions, source: &dyn CredentialSource) -> Result<Self> {
        Ok(Self {
            trust_anchors_pem: read_pem(source, options.trust_anchors_file.as_deref())?,
            issuer_crt_pem: read_pem(source, options.issuer_certificate_file.as_deref())?,
            issuer_key_pem: read_pem(source, options.issuer_key_file.as_deref())?,
        })
    }
}

fn read_pem(source: &dyn CredentialSource, path: Option<&Path>) -> Result<String> {
    let path = path.unwrap_or_else(|| Path::new(""));

    let bytes = source.read(path).map_err(|source| CoreError::Credentials {
        path: path.to_path_buf(),
        source,
    })?;

    let text = String::from_utf8(bytes).map_err(|_| CoreError::InvalidCredentials {
        path: path.to_path_buf(),
        problem: "not valid UTF-8",
    })?;

    if text.trim().is_empty() {
        return Err(CoreError::InvalidCredentials {
            path: path.to_path_buf(),
            problem: "empty",
        });
    }

    tracing::debug!(path = %path.display(), bytes = text.len(), "loaded identity material");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> IdentityOptions {
        IdentityOptions {
            trust_anchors_file: Some("anchors.pem".into()),
            issuer_certificate_file: Some("crt.pem".into()),
            issuer_key_file: Some("key.pem".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_load_from_static_source() {
        let source = StaticCredentials::new()
            .with("anchors.pem", "ANCHORS\n")
            .with("crt.pem", "CRT\n")
            .with("key.pem", "KEY\n");

        let material = IdentityMaterial::load(&options(), &source).unwrap();
        assert_eq!(material.trust_anchors_pem, "ANCHORS\n");
        assert_eq!(material.issuer_crt_pem, "CRT\n");
        assert_eq!(material.issuer_key_pem, "KEY\n");
    }

    #[test]
    fn test_missing_file_names_path() {
        let source = StaticCredentials::new().with("anchors.pem", "ANCHORS\n");

        let err = IdentityMaterial::load(&options(), &source).unwrap_err();
        assert!(matches!(err, CoreError::Credentials { .. }));
        assert!(err.to_string().contains("crt.pem"));
    }

    #[test]
    fn test_empty_material_is_rejected() {
        let source = StaticCredentials::new()
            .with("anchors.pem", "ANCHORS\n")
            .with("crt.pem", "  \n")
            .with("key.pem", "KEY\n");

        let err = IdentityMaterial::load(&options(), &source).unwrap_err();
        assert_eq!(err.to_string(), "Identity material in crt.pem is empty");
    }

    #[test]
    fn test_fs_source_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crt.pem");
        std::fs::write(&path, "CRT\n").unwrap();

        assert_eq!(FsCredentials.read(&path).unwrap(), b"CRT\n");
    }
}
