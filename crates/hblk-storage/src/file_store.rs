use anyhow::{Context, Result};
use hblk_core::{codec, Blockchain, ChainStore};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// Keeps a chain in a single file in the HBLK binary format.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }
}

impl ChainStore for FileStore {
    fn load(&self) -> Result<Option<Blockchain>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()))
            }
        };
        let chain = codec::decode(&bytes)
            .with_context(|| format!("decoding {}", self.path.display()))?;
        info!(path = %self.path.display(), blocks = chain.len(), "chain loaded");
        Ok(Some(chain))
    }

    /// Writes to a temporary file next to the target, then renames it over the target.
    fn save(&self, chain: &Blockchain) -> Result<()> {
        let bytes = codec::encode(chain);
        let mut tmp = NamedTempFile::new_in(self.dir())
            .with_context(|| format!("creating temp file in {}", self.dir().display()))?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("writing {}", self.path.display()))?;
        info!(path = %self.path.display(), blocks = chain.len(), bytes = bytes.len(), "chain saved");
        Ok(())
    }
}
