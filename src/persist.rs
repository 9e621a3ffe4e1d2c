//! Disk I/O: snapshot load and the guarded snapshot write.
//!
//! Writes go to a temp file that is renamed over the target only after the
//! byte count on disk checks out, so the previous snapshot survives any
//! failure mid-write. The rename-over approach is close to atomic on most
//! platforms; on FAT32 or network shares there are no hard guarantees.

use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads and decodes the snapshot at `path` as a single JSON object.
///
/// A missing file just means an empty store (not an error). Anything else
/// that fails to decode as a JSON object, whether malformed bytes, an empty
/// file, or a top-level array, is a [`Error::Decode`] and aborts startup.
pub fn load(path: &Path) -> Result<Map<String, Value>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(err) => return Err(Error::Io(err.to_string())),
    };
    serde_json::from_slice(&bytes).map_err(|err| Error::Decode(err.to_string()))
}

/// Write `bytes` as the new snapshot at `path`.
///
/// The advisory `.lock` marker brackets the attempt; real exclusion between
/// in-process writers is the store's write mutex. A write or length-check
/// failure discards the temp file without renaming, leaving the previous
/// snapshot intact.
pub fn write_snapshot(path: &Path, bytes: &[u8]) -> Result<()> {
    let marker = WriteMarker::create(path)?;

    let tmp = tmp_path(path);
    if let Err(err) = write_exact(&tmp, bytes) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(Error::Io(err.to_string()));
    }

    marker.release()?;
    debug!(path = %path.display(), bytes = bytes.len(), "snapshot written");
    Ok(())
}

fn write_exact(tmp: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = fs::File::create(tmp)?;
    file.write_all(bytes)?;
    let written = file.metadata()?.len();
    let expected = bytes.len() as u64;
    if written < expected {
        return Err(Error::ShortWrite { written, expected });
    }
    Ok(())
}

/// Advisory marker path for a given snapshot path: `<path>.lock`.
pub fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Advisory write-in-progress marker (`<path>.lock`).
///
/// Created unconditionally when a write attempt starts (an existing marker,
/// say one left by a crashed writer, is truncated rather than treated as a
/// conflict) and removed when the attempt ends. `Drop` cleans up on error
/// paths so a failed flush does not leave the marker behind.
struct WriteMarker {
    path: Option<PathBuf>,
}

impl WriteMarker {
    fn create(target: &Path) -> Result<Self> {
        let path = lock_path(target);
        fs::File::create(&path)
            .map_err(|err| Error::Lock(format!("creating {}: {err}", path.display())))?;
        Ok(Self { path: Some(path) })
    }

    /// Remove the marker, surfacing the failure. Consumes the guard so
    /// `Drop` does not try a second time.
    fn release(mut self) -> Result<()> {
        if let Some(path) = self.path.take() {
            fs::remove_file(&path)
                .map_err(|err| Error::Lock(format!("removing {}: {err}", path.display())))?;
        }
        Ok(())
    }
}

impl Drop for WriteMarker {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            let _ = fs::remove_file(path);
        }
    }
}
