//! In-memory mock filesystem for testing collectors without real `/proc`.
//!
//! `MockFs` simulates a filesystem in memory, allowing tests to run on macOS
//! and in CI environments without Linux.

use crate::collector::traits::FileSystem;
use glob::{MatchOptions, Pattern};
use std::collections::{BTreeSet, HashMap};
use std::io;
use std::path::{Path, PathBuf};

/// In-memory filesystem for testing.
///
/// Stores files and directories in memory, allowing tests to simulate
/// various `/proc` and `/sys` states without needing actual Linux access.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    /// Map from path to file contents.
    files: HashMap<PathBuf, String>,
    /// Set of directories (for glob support).
    directories: BTreeSet<PathBuf>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, content.into());
    }

    /// Adds an empty directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.directories.insert(path);
    }

    /// Removes a file, returning its previous content.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) -> Option<String> {
        self.files.remove(path.as_ref())
    }

    /// Adds a block device directory under `sys_block` with its queue
    /// attributes.
    ///
    /// # Arguments
    /// * `sys_block` - Attribute tree root, usually `/sys/block`
    /// * `device` - Device name (`sda`, `nvme0n1`, ...)
    /// * `rotational` - Content of `queue/rotational`
    /// * `scheduler` - Content of `queue/scheduler`
    pub fn add_block_device(
        &mut self,
        sys_block: impl AsRef<Path>,
        device: &str,
        rotational: &str,
        scheduler: &str,
    ) {
        let queue = sys_block.as_ref().join(device).join("queue");
        self.add_file(queue.join("rotational"), rotational);
        self.add_file(queue.join("scheduler"), scheduler);
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn glob(&self, pattern: &str) -> io::Result<Vec<PathBuf>> {
        let pattern =
            Pattern::new(pattern).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let options = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::new()
        };

        let mut matches: BTreeSet<PathBuf> = self
            .directories
            .iter()
            .filter(|dir| pattern.matches_path_with(dir, options))
            .cloned()
            .collect();
        matches.extend(
            self.files
                .keys()
                .filter(|file| pattern.matches_path_with(file, options))
                .cloned(),
        );

        Ok(matches.into_iter().collect())
    }
}
