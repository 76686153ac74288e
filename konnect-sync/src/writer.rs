//! Hash-gated atomic writer.
//!
//! ## `atomic_write` protocol
//!
//! 1. SHA-256 hash the new content.
//! 2. Hash the file already on disk, if any.
//! 3. Equal digests: leave the file alone.
//! 4. Create parent directories (0755).
//! 5. Write to `<path>.tmp` (0644).
//! 6. Rename to the final path (atomic on POSIX).

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{io_err, SyncError};

/// Outcome of an individual file write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// Content changed or the file did not exist.
    Written { path: PathBuf },
    /// The file already held exactly this content.
    Unchanged { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path } | WriteResult::Unchanged { path } => path,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, WriteResult::Written { .. })
    }
}

/// Hex SHA-256 of `bytes`.
pub fn digest(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

/// Write `content` to `path` unless the file already holds it.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<WriteResult, SyncError> {
    let tmp = PathBuf::from(format!("{}.tmp", path.display()));
    atomic_write_with_tmp(path, content, &tmp)
}

fn atomic_write_with_tmp(path: &Path, content: &[u8], tmp: &Path) -> Result<WriteResult, SyncError> {
    let wanted = digest(content);

    match fs::read(path) {
        Ok(existing) if digest(&existing) == wanted => {
            tracing::debug!("unchanged: {}", path.display());
            return Ok(WriteResult::Unchanged {
                path: path.to_path_buf(),
            });
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(io_err(path, e)),
    }

    if let Some(parent) = path.parent() {
        create_dirs(parent)?;
    }
    if let Some(tmp_parent) = tmp.parent() {
        create_dirs(tmp_parent)?;
    }
    fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;
    set_file_mode(tmp)?;

    if let Err(e) = fs::rename(tmp, path) {
        let _ = fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    tracing::info!("wrote: {}", path.display());
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}

#[cfg(unix)]
fn create_dirs(dir: &Path) -> Result<(), SyncError> {
    use std::os::unix::fs::DirBuilderExt;

    fs::DirBuilder::new()
        .recursive(true)
        .mode(0o755)
        .create(dir)
        .map_err(|e| io_err(dir, e))
}

#[cfg(not(unix))]
fn create_dirs(dir: &Path) -> Result<(), SyncError> {
    fs::create_dir_all(dir).map_err(|e| io_err(dir, e))
}

#[cfg(unix)]
fn set_file_mode(path: &Path) -> Result<(), SyncError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o644)).map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_file_mode(_path: &Path) -> Result<(), SyncError> {
    Ok(())
}
