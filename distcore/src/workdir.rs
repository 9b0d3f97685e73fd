//! Ephemeral per-invocation scratch directory.
//!
//! The reference design registers an `atexit` handler to remove the work
//! directory. In Rust the idiomatic equivalent is RAII: [`WorkDir`] wraps a
//! [`tempfile::TempDir`] whose `Drop` impl performs the same best-effort,
//! idempotent removal on every exit path, including panics that unwind.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::TempDir;

/// A freshly created scratch directory, removed when dropped.
#[derive(Debug)]
pub struct WorkDir {
    dir: TempDir,
}

impl WorkDir {
    /// Creates a new work directory named from a short hash of `root`, so
    /// concurrent invocations against different roots never collide inside
    /// the system temp directory.
    pub fn create(root: &Path) -> std::io::Result<Self> {
        let token = root_token(root);
        let dir = tempfile::Builder::new()
            .prefix(&format!("dist-{token}-"))
            .tempdir()?;
        Ok(WorkDir { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

fn root_token(root: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(root.to_string_lossy().as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)[..12].to_string()
}

impl AsRef<Path> for WorkDir {
    fn as_ref(&self) -> &Path {
        self.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn different_roots_get_different_tokens() {
        assert_ne!(
            root_token(Path::new("/a")),
            root_token(Path::new("/b"))
        );
    }

    #[test]
    fn work_dir_is_removed_on_drop() {
        let path;
        {
            let wd = WorkDir::create(Path::new("/tmp/example-root")).unwrap();
            path = wd.path().to_path_buf();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }
}
