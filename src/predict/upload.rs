//! Sensor archive selected for submission

use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Largest archive accepted for upload (50 MiB)
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Please select a valid ZIP file containing sensor data")]
    NotZip,

    #[error("File size must be less than 50MB ({0} bytes given)")]
    TooLarge(u64),
}

/// A file read into memory with its digest
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub size: u64,
    /// Lower-case hex SHA-256 of `bytes`
    pub sha256: String,
}

impl Upload {
    /// Read a `.zip` archive from disk
    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let is_zip = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("zip"))
            .unwrap_or(false);
        if !is_zip {
            return Err(UploadError::NotZip);
        }

        let io_err = |source| UploadError::Io {
            path: path.to_path_buf(),
            source,
        };
        let size = fs::metadata(path).map_err(io_err)?.len();
        if size > MAX_UPLOAD_BYTES {
            return Err(UploadError::TooLarge(size));
        }
        let bytes = fs::read(path).map_err(io_err)?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.zip".to_string());

        Ok(Self::from_bytes(file_name, bytes))
    }

    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let sha256 = hex_digest(&bytes);
        Self {
            file_name: file_name.into(),
            size: bytes.len() as u64,
            bytes,
            sha256,
        }
    }
}

fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_path_reads_zip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Walk.ZIP");
        fs::write(&path, b"abc").unwrap();

        let upload = Upload::from_path(&path).unwrap();
        assert_eq!(upload.file_name, "Walk.ZIP");
        assert_eq!(upload.size, 3);
        assert_eq!(
            upload.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_rejects_non_zip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("walk.csv");
        fs::write(&path, b"a,b").unwrap();
        assert!(matches!(Upload::from_path(&path), Err(UploadError::NotZip)));
    }

    #[test]
    fn test_size_limit() {
        let dir = TempDir::new().unwrap();

        // Sparse files: no 50 MiB actually written
        let at_limit = dir.path().join("limit.zip");
        fs::File::create(&at_limit)
            .unwrap()
            .set_len(MAX_UPLOAD_BYTES)
            .unwrap();
        assert_eq!(Upload::from_path(&at_limit).unwrap().size, MAX_UPLOAD_BYTES);

        let over = dir.path().join("over.zip");
        fs::File::create(&over)
            .unwrap()
            .set_len(MAX_UPLOAD_BYTES + 1)
            .unwrap();
        let err = Upload::from_path(&over).unwrap_err();
        assert!(matches!(err, UploadError::TooLarge(n) if n == MAX_UPLOAD_BYTES + 1));
        assert!(err.to_string().starts_with("File size must be less than 50MB"));
    }

    #[test]
    fn test_missing_file() {
        let err = Upload::from_path(Path::new("/nonexistent/walk.zip")).unwrap_err();
        assert!(matches!(err, UploadError::Io { .. }));
    }
}
