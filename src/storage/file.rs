//! File Backend
//!
//! Stores every key as its own file inside a directory.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{BenchError, Result};
use crate::workload::Key;

use super::StorageBackend;

/// Directory-backed store, one file per key
#[derive(Debug)]
pub struct FileBackend {
    /// Directory holding the value files
    dir: PathBuf,

    /// Open value files with O_SYNC
    sync_writes: bool,
}

impl FileBackend {
    /// Open a backend rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl AsRef<Path>, sync_writes: bool) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            sync_writes,
        })
    }

    /// Directory holding the value files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &Key) -> PathBuf {
        self.dir.join(key.as_str())
    }

    fn write_options(&self) -> OpenOptions {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
            if self.sync_writes {
                options.custom_flags(libc::O_SYNC);
            }
        }

        options
    }
}

impl StorageBackend for FileBackend {
    fn put(&self, key: &Key, value: &[u8]) -> Result<()> {
        let mut file = self.write_options().open(self.key_path(key))?;
        file.write_all(value)?;
        Ok(())
    }

    fn get(&self, key: &Key, buf: &mut [u8]) -> Result<()> {
        let mut file = File::open(self.key_path(key))?;

        // Count what we got so a truncated file reports how short it was
        let mut filled = 0;
        while filled < buf.len() {
            match file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if filled < buf.len() {
            return Err(BenchError::ShortRead {
                expected: buf.len(),
                actual: filled,
            });
        }
        Ok(())
    }

    fn delete(&self, key: &Key) -> Result<()> {
        fs::remove_file(self.key_path(key))?;
        Ok(())
    }
}
