//! Hard-link-or-copy file placement
//!
//! Files are hard-linked when possible and copied otherwise. Copies keep the
//! source's permissions and access/modification times. Every operation here
//! creates its target exclusively, so an existing destination is reported as
//! `AlreadyExists` and never replaced.

use crate::{LibraryError, Result};
use std::fs::{self, File, FileTimes, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How a file ended up at its destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMethod {
    HardLink,
    Copy,
}

/// Removes a partially written destination unless kept
#[derive(Debug)]
pub struct PartialFile {
    path: PathBuf,
    armed: bool,
}

impl PartialFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            armed: true,
        }
    }

    /// The destination is complete (or not ours to remove)
    pub fn keep(mut self) {
        self.armed = false;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed partial file {:?}", self.path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove partial file {:?}: {}", self.path, e),
        }
    }
}

/// Place `src` at `dest`, hard-linking when `try_link` is set.
///
/// Falls back to a byte copy when the link fails for any reason other than
/// the destination already existing.
pub fn lazy_copy(src: &Path, dest: &Path, try_link: bool) -> Result<CopyMethod> {
    // Link the file a symlink points at, never the symlink itself
    let src = if src.is_symlink() {
        fs::canonicalize(src).map_err(LibraryError::fs("resolve", src))?
    } else {
        src.to_path_buf()
    };
    let src = src.as_path();

    if try_link {
        match fs::hard_link(src, dest) {
            Ok(()) => return Ok(CopyMethod::HardLink),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(LibraryError::fs("link", dest)(e));
            }
            Err(e) => debug!("Hard link {:?} -> {:?} failed ({}), copying", src, dest, e),
        }
    }

    copy_preserving(src, dest)?;
    Ok(CopyMethod::Copy)
}

/// Copy file contents, permissions and timestamps into a new file.
///
/// Fails with `AlreadyExists` if `dest` is present. A failed copy removes the
/// file it created.
pub fn copy_preserving(src: &Path, dest: &Path) -> Result<()> {
    let mut reader = File::open(src).map_err(LibraryError::fs("open", src))?;
    let metadata = reader.metadata().map_err(LibraryError::fs("stat", src))?;

    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .map_err(LibraryError::fs("create", dest))?;
    let guard = PartialFile::new(dest);

    io::copy(&mut reader, &mut writer).map_err(LibraryError::fs("copy to", dest))?;

    writer
        .set_permissions(metadata.permissions())
        .map_err(LibraryError::fs("set permissions of", dest))?;

    let mut times = FileTimes::new();
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    writer
        .set_times(times)
        .map_err(LibraryError::fs("set times of", dest))?;

    guard.keep();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    #[test]
    fn test_lazy_copy_links_when_possible() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("a.flac");
        let dest = temp_dir.path().join("b.flac");
        fs::write(&src, b"audio").unwrap();

        let method = lazy_copy(&src, &dest, true).unwrap();

        assert_eq!(method, CopyMethod::HardLink);
        assert_eq!(fs::read(&dest).unwrap(), b"audio");
    }

    #[test]
    fn test_copy_only_preserves_mtime() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("a.flac");
        let dest = temp_dir.path().join("b.flac");
        fs::write(&src, b"audio").unwrap();

        let past = SystemTime::now() - Duration::from_secs(86_400 * 30);
        File::options()
            .write(true)
            .open(&src)
            .unwrap()
            .set_modified(past)
            .unwrap();

        let method = lazy_copy(&src, &dest, false).unwrap();

        assert_eq!(method, CopyMethod::Copy);
        assert_eq!(fs::read(&dest).unwrap(), b"audio");
        let copied = fs::metadata(&dest).unwrap().modified().unwrap();
        let original = fs::metadata(&src).unwrap().modified().unwrap();
        assert_eq!(copied, original);
    }

    #[test]
    fn test_existing_destination_is_not_replaced() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("a.flac");
        let dest = temp_dir.path().join("b.flac");
        fs::write(&src, b"new").unwrap();
        fs::write(&dest, b"old").unwrap();

        let linked = lazy_copy(&src, &dest, true).unwrap_err();
        assert!(linked.is_already_exists());

        let copied = lazy_copy(&src, &dest, false).unwrap_err();
        assert!(copied.is_already_exists());

        assert_eq!(fs::read(&dest).unwrap(), b"old");
    }

    #[test]
    fn test_missing_source_creates_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("b.flac");

        let result = copy_preserving(&temp_dir.path().join("missing.flac"), &dest);

        assert!(result.is_err());
        assert!(!dest.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_source_is_linked_through() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("store")).unwrap();
        fs::write(temp_dir.path().join("store/a.flac"), b"audio").unwrap();
        let link = temp_dir.path().join("a.flac");
        std::os::unix::fs::symlink("store/a.flac", &link).unwrap();
        let dest = temp_dir.path().join("out.flac");

        lazy_copy(&link, &dest, true).unwrap();

        assert!(!fs::symlink_metadata(&dest).unwrap().file_type().is_symlink());
        assert_eq!(fs::read(&dest).unwrap(), b"audio");
    }

    #[test]
    fn test_partial_file_guard() {
        let temp_dir = TempDir::new().unwrap();
        let dropped = temp_dir.path().join("dropped");
        let kept = temp_dir.path().join("kept");
        fs::write(&dropped, b"").unwrap();
        fs::write(&kept, b"").unwrap();

        drop(PartialFile::new(&dropped));
        PartialFile::new(&kept).keep();

        assert!(!dropped.exists());
        assert!(kept.exists());
    }
}
