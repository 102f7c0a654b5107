//! Output file system implementations.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::OutputFs;

/// The real file system.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFs;

impl OutputFs for LocalFs {
    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn write_file(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes)?;
        writer.flush()
    }
}

/// In-memory file system. Writes under a missing directory fail like on disk.
#[derive(Debug, Default)]
pub struct MemoryFs {
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
    dirs: Mutex<BTreeSet<PathBuf>>,
    fail_writes: Mutex<BTreeSet<PathBuf>>,
    lenient: bool,
}

impl MemoryFs {
    /// Every parent directory is implicitly present.
    pub fn new() -> Self {
        Self { lenient: true, ..Default::default() }
    }

    /// Writes require `create_dir_all` on the parent first.
    pub fn strict() -> Self {
        Self::default()
    }

    /// Make writes to `path` fail with permission denied.
    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        self.fail_writes.lock().insert(path.into());
    }

    pub fn read(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.lock().get(path).cloned()
    }

    pub fn read_string(&self, path: &Path) -> Option<String> {
        self.read(path).and_then(|b| String::from_utf8(b).ok())
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.files.lock().contains_key(path)
    }

    pub fn has_dir(&self, path: &Path) -> bool {
        self.dirs.lock().contains(path)
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.lock().is_empty()
    }
}

impl OutputFs for MemoryFs {
    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut dirs = self.dirs.lock();
        for dir in path.ancestors().filter(|p| !p.as_os_str().is_empty()) {
            dirs.insert(dir.to_path_buf());
        }
        Ok(())
    }

    fn write_file(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        if self.fail_writes.lock().contains(path) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "write refused"));
        }
        if !self.lenient {
            let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
            if let Some(parent) = parent {
                if !self.dirs.lock().contains(parent) {
                    return Err(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("no such directory: {}", parent.display()),
                    ));
                }
            }
        }
        self.files.lock().insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }
}
