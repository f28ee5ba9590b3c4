//! Checks applied to operator-supplied and runner-produced files.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("file does not exist: {}", .0.display())]
    Missing(PathBuf),
    #[error("path is not a file: {}", .0.display())]
    NotAFile(PathBuf),
    #[error("file is empty: {}", .0.display())]
    Empty(PathBuf),
    #[error("file is not readable: {}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The file must exist, be a regular file, be non-empty, and open for reading.
pub fn validate_file(path: &Path) -> Result<(), FileError> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(FileError::Missing(path.to_path_buf()));
        }
        Err(source) => {
            return Err(FileError::Unreadable {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if !metadata.is_file() {
        return Err(FileError::NotAFile(path.to_path_buf()));
    }
    if metadata.len() == 0 {
        return Err(FileError::Empty(path.to_path_buf()));
    }

    File::open(path).map_err(|source| FileError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.yaml");
        std::fs::write(&path, "pg1:\n").unwrap();
        assert!(validate_file(&path).is_ok());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_file(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, FileError::Missing(_)));
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_file(dir.path()).unwrap_err();
        assert!(matches!(err, FileError::NotAFile(_)));
    }

    #[test]
    fn test_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        std::fs::write(&path, "").unwrap();
        let err = validate_file(&path).unwrap_err();
        assert!(matches!(err, FileError::Empty(_)));
        assert!(err.to_string().starts_with("file is empty"));
    }
}
