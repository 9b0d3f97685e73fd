//! Version string discovery, per the three-tier precedence: `VERSION` file,
//! then `VERSION.cache`, then a source-control query that is cached back to
//! `VERSION.cache` for next time.

use std::path::Path;

use duct::cmd;
use snafu::{ResultExt, Snafu};

#[derive(Debug, Snafu)]
pub enum VersionError {
    #[snafu(display("failed to read '{}': {source}", path.display()))]
    Read { path: std::path::PathBuf, source: std::io::Error },

    #[snafu(display("failed to write '{}': {source}", path.display()))]
    Write { path: std::path::PathBuf, source: std::io::Error },

    #[snafu(display("source control query failed: {source}"))]
    SourceControl { source: std::io::Error },

    #[snafu(display("source control produced no usable branch or tag information"))]
    NoSourceControlInfo,
}

type Result<T, E = VersionError> = std::result::Result<T, E>;

/// Recognized version-tag prefixes, checked in order against tags reachable
/// from the current branch.
const RECOGNIZED_TAG_PREFIXES: &[&str] = &["v", "release-"];

/// Abstracts the version-control tool so tests don't need a real repository.
pub trait SourceControl {
    fn current_branch(&self, root: &Path) -> Result<String>;
    /// Tags reachable from `branch`, nearest first, paired with `true` if the
    /// tag is an exact match for the current checkout.
    fn tags_on_branch(&self, root: &Path, branch: &str) -> Result<Vec<(String, bool)>>;
    fn short_revision(&self, root: &Path) -> Result<String>;
}

/// Production implementation shelling out to `hg`, the way the original
/// reference tool does (`hg identify -b`, `hg log ... --template`).
pub struct HgSourceControl;

impl SourceControl for HgSourceControl {
    fn current_branch(&self, root: &Path) -> Result<String> {
        let out = cmd!("hg", "identify", "-b")
            .dir(root)
            .read()
            .context(SourceControlSnafu)?;
        Ok(out.trim().to_string())
    }

    fn tags_on_branch(&self, root: &Path, branch: &str) -> Result<Vec<(String, bool)>> {
        let out = cmd!(
            "hg",
            "log",
            "-b",
            branch,
            "--template",
            "{tags}\n"
        )
        .dir(root)
        .read()
        .context(SourceControlSnafu)?;

        let mut seen_non_matching = false;
        let mut result = Vec::new();
        for line in out.lines() {
            for tag in line.split_whitespace() {
                if RECOGNIZED_TAG_PREFIXES.iter().any(|p| tag.starts_with(p)) {
                    result.push((tag.to_string(), !seen_non_matching));
                } else {
                    seen_non_matching = true;
                }
            }
        }
        Ok(result)
    }

    fn short_revision(&self, root: &Path) -> Result<String> {
        let out = cmd!("hg", "identify", "-i")
            .dir(root)
            .read()
            .context(SourceControlSnafu)?;
        Ok(out.trim().trim_end_matches('+').to_string())
    }
}

/// Resolves the version string under `root` using the precedence documented
/// in the design: `VERSION` file, then `VERSION.cache`, then `scm`.
pub fn resolve(root: &Path, scm: &dyn SourceControl) -> Result<String> {
    let version_path = root.join("VERSION");
    if let Ok(contents) = std::fs::read_to_string(&version_path) {
        return Ok(contents.trim().to_string());
    }

    let cache_path = root.join("VERSION.cache");
    if let Ok(contents) = std::fs::read_to_string(&cache_path) {
        return Ok(contents.trim().to_string());
    }

    let version = resolve_from_source_control(root, scm)?;
    std::fs::write(&cache_path, format!("{version}\n")).context(WriteSnafu { path: cache_path })?;
    Ok(version)
}

fn resolve_from_source_control(root: &Path, scm: &dyn SourceControl) -> Result<String> {
    let branch = scm.current_branch(root)?;
    let tags = scm.tags_on_branch(root, &branch)?;

    match tags.first() {
        Some((tag, true)) => Ok(tag.clone()),
        Some((tag, false)) => {
            let rev = scm.short_revision(root)?;
            Ok(format!("{tag}-{rev}"))
        }
        None => Ok(format!("branch.{branch}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct FakeScm {
        branch: &'static str,
        tags: RefCell<Vec<(String, bool)>>,
        rev: &'static str,
    }

    impl SourceControl for FakeScm {
        fn current_branch(&self, _root: &Path) -> Result<String> {
            Ok(self.branch.to_string())
        }
        fn tags_on_branch(&self, _root: &Path, _branch: &str) -> Result<Vec<(String, bool)>> {
            Ok(self.tags.borrow().clone())
        }
        fn short_revision(&self, _root: &Path) -> Result<String> {
            Ok(self.rev.to_string())
        }
    }

    #[test]
    fn version_file_wins_regardless_of_scm_state() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("VERSION"), "go1.0.0\n").unwrap();
        let scm = FakeScm { branch: "default", tags: RefCell::new(vec![]), rev: "abc123" };
        assert_eq!(resolve(dir.path(), &scm).unwrap(), "go1.0.0");
    }

    #[test]
    fn cache_used_when_version_file_absent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("VERSION.cache"), "go1.0.1\n").unwrap();
        let scm = FakeScm { branch: "default", tags: RefCell::new(vec![]), rev: "abc123" };
        assert_eq!(resolve(dir.path(), &scm).unwrap(), "go1.0.1");
    }

    #[test]
    fn falls_back_to_branch_name_with_no_tags() {
        let dir = tempfile::tempdir().unwrap();
        let scm = FakeScm { branch: "feature-x", tags: RefCell::new(vec![]), rev: "abc123" };
        assert_eq!(resolve(dir.path(), &scm).unwrap(), "branch.feature-x");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("VERSION.cache")).unwrap(),
            "branch.feature-x\n"
        );
    }

    #[test]
    fn exact_tag_match_has_no_revision_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let scm = FakeScm {
            branch: "default",
            tags: RefCell::new(vec![("v1.2.0".to_string(), true)]),
            rev: "abc123",
        };
        assert_eq!(resolve(dir.path(), &scm).unwrap(), "v1.2.0");
    }

    #[test]
    fn non_exact_tag_match_appends_revision() {
        let dir = tempfile::tempdir().unwrap();
        let scm = FakeScm {
            branch: "default",
            tags: RefCell::new(vec![("v1.2.0".to_string(), false)]),
            rev: "abc123",
        };
        assert_eq!(resolve(dir.path(), &scm).unwrap(), "v1.2.0-abc123");
    }
}
