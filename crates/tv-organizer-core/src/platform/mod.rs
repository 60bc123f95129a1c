use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Source of free-space figures for destination scoring.
pub trait SpaceProbe: Send + Sync {
    /// Bytes available on the volume holding `path`, or `None` when unknown.
    fn available_bytes(&self, path: &Path) -> Option<u64>;
}

/// Reads free space from the mounted disks.
pub struct DiskSpaceProbe;

impl SpaceProbe for DiskSpaceProbe {
    fn available_bytes(&self, path: &Path) -> Option<u64> {
        let existing = nearest_existing_ancestor(path)?;
        let search_path = existing.canonicalize().unwrap_or(existing);

        let disks = sysinfo::Disks::new_with_refreshed_list();
        let mut available = None;
        let mut matched_len = 0;
        for disk in disks.list() {
            let mount = disk.mount_point();
            if search_path.starts_with(mount) {
                let mount_len = mount.as_os_str().len();
                if available.is_none() || mount_len > matched_len {
                    matched_len = mount_len;
                    available = Some(disk.available_space());
                }
            }
        }
        available
    }
}

/// Reports the same figure for every path.
pub struct FixedSpaceProbe(pub Option<u64>);

impl FixedSpaceProbe {
    pub fn gigabytes(gb: u64) -> Self {
        Self(Some(gb * 1024 * 1024 * 1024))
    }
}

impl SpaceProbe for FixedSpaceProbe {
    fn available_bytes(&self, _path: &Path) -> Option<u64> {
        self.0
    }
}

fn nearest_existing_ancestor(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .find(|p| !p.as_os_str().is_empty() && p.exists())
        .map(Path::to_path_buf)
}

/// A file is considered locked when it cannot be opened for read and write.
pub fn is_file_locked(path: &Path) -> bool {
    OpenOptions::new().read(true).write(true).open(path).is_err()
}

/// Rename `source` to `dest`, falling back to copy then remove across devices.
pub fn move_file(source: &Path, dest: &Path) -> io::Result<()> {
    match fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(err) => {
            warn!(
                "Rename {} -> {} failed ({}), attempting copy",
                source.display(),
                dest.display(),
                err
            );
            fs::copy(source, dest)?;
            fs::remove_file(source)
        }
    }
}

/// First free path in `dir` for `file_name`, appending `_1`, `_2`, ... to the stem on collision.
pub fn unique_destination(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let name = Path::new(file_name);
    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    let ext = name
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1;
    loop {
        let candidate = dir.join(format!("{}_{}{}", stem, counter, ext));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unique_destination_appends_counter() {
        let dir = TempDir::new().unwrap();
        let first = unique_destination(dir.path(), "Show.S01E01.mkv");
        assert_eq!(first, dir.path().join("Show.S01E01.mkv"));

        fs::write(&first, b"x").unwrap();
        let second = unique_destination(dir.path(), "Show.S01E01.mkv");
        assert_eq!(second, dir.path().join("Show.S01E01_1.mkv"));

        fs::write(&second, b"x").unwrap();
        let third = unique_destination(dir.path(), "Show.S01E01.mkv");
        assert_eq!(third, dir.path().join("Show.S01E01_2.mkv"));
    }

    #[test]
    fn test_move_file_relocates_content() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.mkv");
        let dst = dir.path().join("b.mkv");
        fs::write(&src, b"data").unwrap();
        move_file(&src, &dst).unwrap();
        assert!(!src.exists());
        assert_eq!(fs::read(&dst).unwrap(), b"data");
    }

    #[test]
    fn test_missing_file_counts_as_locked() {
        let dir = TempDir::new().unwrap();
        assert!(is_file_locked(&dir.path().join("missing.mkv")));
        let present = dir.path().join("present.mkv");
        fs::write(&present, b"x").unwrap();
        assert!(!is_file_locked(&present));
    }

    #[test]
    fn test_fixed_probe() {
        let probe = FixedSpaceProbe::gigabytes(2);
        assert_eq!(probe.available_bytes(Path::new("/anywhere")), Some(2 * 1024 * 1024 * 1024));
    }
}
