//! Staleness oracle: decides whether a target needs rebuilding.
//!
//! Two policies are offered. [`Staleness::MtimeCompare`] implements the
//! fuller comparison documented as "preferred"; [`Staleness::AlwaysStale`]
//! preserves the reference tool's effective behavior (`stale` pinned to 1)
//! for parity testing. The orchestrator defaults to `MtimeCompare`.

use std::path::Path;

use filetime::FileTime;
use snafu::{ResultExt, Snafu};

#[derive(Debug, Snafu)]
pub enum StaleError {
    #[snafu(display("failed to stat '{}': {source}", path.display()))]
    Stat { path: std::path::PathBuf, source: std::io::Error },
}

type Result<T, E = StaleError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    AlwaysStale,
    MtimeCompare,
}

fn mtime_or_zero(path: &Path) -> Result<FileTime> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(FileTime::from_last_modification_time(&meta)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileTime::zero()),
        Err(source) => Err(StaleError::Stat { path: path.to_path_buf(), source }),
    }
}

/// `target` needs rebuilding if any input is missing or newer than it, or if
/// any auxiliary link library is newer than it.
pub fn is_stale(policy: Staleness, target: &Path, inputs: &[std::path::PathBuf], libs: &[std::path::PathBuf]) -> Result<bool> {
    if policy == Staleness::AlwaysStale {
        return Ok(true);
    }

    let target_mtime = mtime_or_zero(target)?;

    for input in inputs {
        let m = mtime_or_zero(input)?;
        if m == FileTime::zero() || m > target_mtime {
            return Ok(true);
        }
    }
    for lib in libs {
        let m = mtime_or_zero(lib)?;
        if m > target_mtime {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_input_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.o");
        fs::write(&target, "x").unwrap();
        let missing = dir.path().join("nope.c");
        assert!(is_stale(Staleness::MtimeCompare, &target, &[missing], &[]).unwrap());
    }

    #[test]
    fn unchanged_inputs_are_not_stale() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.c");
        fs::write(&input, "x").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let target = dir.path().join("out.o");
        fs::write(&target, "x").unwrap();
        assert!(!is_stale(Staleness::MtimeCompare, &target, &[input], &[]).unwrap());
    }

    #[test]
    fn always_stale_policy_ignores_mtimes() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.c");
        fs::write(&input, "x").unwrap();
        let target = dir.path().join("out.o");
        fs::write(&target, "x").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));
        filetime::set_file_mtime(&target, FileTime::now()).unwrap();
        assert!(is_stale(Staleness::AlwaysStale, &target, &[input], &[]).unwrap());
    }
}
