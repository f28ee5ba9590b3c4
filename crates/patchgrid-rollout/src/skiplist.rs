//! Skip files: hosts and roles the playbook must leave alone.
//!
//! One name per line. Appends never duplicate a name already in the file.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use tracing::info;

use crate::error::{RolloutError, RolloutResult};

#[derive(Debug, Clone)]
pub struct SkipList {
    path: PathBuf,
}

impl SkipList {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current entries; a missing file is an empty list.
    pub fn entries(&self) -> RolloutResult<IndexSet<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(IndexSet::new()),
            Err(e) => Err(RolloutError::io(&self.path)(e)),
        }
    }

    /// Append names not already present. Returns how many were written.
    pub fn append<I, S>(&self, names: I) -> RolloutResult<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut known = self.entries()?;
        let fresh: Vec<String> = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_string())
            .filter(|name| !name.is_empty() && known.insert(name.clone()))
            .collect();

        if fresh.is_empty() {
            return Ok(0);
        }

        // Keep a hand-edited file without a trailing newline line-delimited
        let needs_newline = std::fs::read(&self.path)
            .map(|bytes| bytes.last().is_some_and(|b| *b != b'\n'))
            .unwrap_or(false);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(RolloutError::io(&self.path))?;
        if needs_newline {
            writeln!(file).map_err(RolloutError::io(&self.path))?;
        }
        for name in &fresh {
            writeln!(file, "{name}").map_err(RolloutError::io(&self.path))?;
        }

        info!(
            path = %self.path.display(),
            added = fresh.len(),
            "appended unique names to skip file"
        );
        Ok(fresh.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(list: &SkipList) -> String {
        std::fs::read_to_string(list.path()).unwrap()
    }

    #[test]
    fn append_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let list = SkipList::new(dir.path().join("skiphost"));

        assert_eq!(list.append(["web-1", "web-2"]).unwrap(), 2);
        assert_eq!(read(&list), "web-1\nweb-2\n");
    }

    #[test]
    fn append_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let list = SkipList::new(dir.path().join("skiprole"));

        list.append(["db-1"]).unwrap();
        assert_eq!(list.append(["db-1"]).unwrap(), 0);
        assert_eq!(list.append([" db-1 ", "db-2"]).unwrap(), 1);
        assert_eq!(read(&list), "db-1\ndb-2\n");
    }

    #[test]
    fn append_dedups_within_batch_and_drops_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let list = SkipList::new(dir.path().join("skiphost"));

        assert_eq!(list.append(["a", "", "a", "  ", "b"]).unwrap(), 2);
        assert_eq!(read(&list), "a\nb\n");
    }

    #[test]
    fn append_respects_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skiphost");
        std::fs::write(&path, "old-1\n  old-2  \n").unwrap();
        let list = SkipList::new(&path);

        assert_eq!(list.append(["old-2", "new-1"]).unwrap(), 1);
        assert_eq!(read(&list), "old-1\n  old-2  \nnew-1\n");
        assert_eq!(list.entries().unwrap().len(), 3);
    }

    #[test]
    fn append_after_unterminated_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skiphost");
        std::fs::write(&path, "old-1").unwrap();
        let list = SkipList::new(&path);

        list.append(["new-1"]).unwrap();
        assert_eq!(read(&list), "old-1\nnew-1\n");
    }

    #[test]
    fn missing_file_has_no_entries() {
        let dir = tempfile::tempdir().unwrap();
        let list = SkipList::new(dir.path().join("skiprole"));

        assert!(list.entries().unwrap().is_empty());
        assert_eq!(list.append(Vec::<String>::new()).unwrap(), 0);
        assert!(!list.path().exists());
    }
}
