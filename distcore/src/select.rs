//! Source selector: expands a subtree's directory listing plus its
//! dependency tweaks into an absolute, deduplicated file set.

use std::path::{Path, PathBuf};

use snafu::{ResultExt, Snafu};

use crate::buildtag::{self, BuildTagError};
use crate::platform::PlatformContext;
use crate::tables::{DepToken, DEP_TABLE, SOURCE_SUFFIXES};

#[derive(Debug, Snafu)]
pub enum SelectError {
    #[snafu(display("failed to read directory '{}': {source}", dir.display()))]
    ReadDir { dir: PathBuf, source: std::io::Error },

    #[snafu(display("build-tag evaluation failed for '{}': {source}", path.display()))]
    BuildTag { path: PathBuf, source: BuildTagError },
}

type Result<T, E = SelectError> = std::result::Result<T, E>;

#[derive(Debug, Default, Clone)]
pub struct Selection {
    /// Relative-to-`src_dir` file names, in first-selected order.
    pub files: Vec<String>,
    pub libs: Vec<PathBuf>,
}

/// Runs steps 1-7 of the selector against `subtree` (relative to `<root>/src`).
pub fn select(ctx: &PlatformContext, subtree: &str) -> Result<Selection> {
    let src_dir = ctx.src_dir(subtree);

    let mut files = list_dir(&src_dir)?;
    let mut libs = Vec::new();

    for rule in DEP_TABLE
        .iter()
        .filter(|r| subtree.starts_with(ctx.resolve_pattern(r.prefix).as_str()))
    {
        for token in rule.tokens {
            apply_token(ctx, &src_dir, token, &mut files, &mut libs)?;
        }
    }

    dedup_preserve_order(&mut files);

    files.retain(|f| has_recognized_suffix(f));

    let mut accepted = Vec::with_capacity(files.len());
    for f in files {
        let abs = src_dir.join(&f);
        if !f.ends_with(".a") && abs.exists() {
            if !buildtag::should_build(ctx, &abs, subtree).context(BuildTagSnafu { path: abs.clone() })? {
                continue;
            }
        }
        accepted.push(f);
    }

    Ok(Selection { files: accepted, libs })
}

fn list_dir(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
        Err(source) => return Err(SelectError::ReadDir { dir: dir.to_path_buf(), source }),
    };
    for entry in entries {
        let entry = entry.context(ReadDirSnafu { dir: dir.to_path_buf() })?;
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

fn apply_token(
    ctx: &PlatformContext,
    src_dir: &Path,
    token: &DepToken,
    files: &mut Vec<String>,
    libs: &mut Vec<PathBuf>,
) -> Result<()> {
    match token {
        DepToken::Path(p) => {
            files.push(ctx.substitute_placeholders(p));
        }
        DepToken::Glob(p) => {
            let resolved = ctx.substitute_placeholders(p);
            let dir_part = resolved.trim_end_matches('*').trim_end_matches('/');
            let glob_dir = if dir_part.is_empty() {
                src_dir.to_path_buf()
            } else {
                src_dir.join(dir_part)
            };
            for name in list_dir(&glob_dir)? {
                let rel = if dir_part.is_empty() {
                    name
                } else {
                    format!("{dir_part}/{name}")
                };
                files.push(rel);
            }
        }
        DepToken::Exclude(prefix) => {
            let prefix = ctx.substitute_placeholders(prefix);
            files.retain(|f| {
                let base = Path::new(f)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                !base.starts_with(prefix.as_str())
            });
        }
        DepToken::Lib(p) => {
            libs.push(PathBuf::from(ctx.substitute_placeholders(p)));
        }
    }
    Ok(())
}

fn dedup_preserve_order(files: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    files.retain(|f| seen.insert(f.clone()));
}

fn has_recognized_suffix(f: &str) -> bool {
    SOURCE_SUFFIXES.iter().any(|s| f.ends_with(s)) || f.ends_with(".a")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Overrides;

    fn fixture_ctx(dir: &Path) -> PlatformContext {
        std::fs::create_dir_all(dir.join("include")).unwrap();
        std::fs::write(dir.join("include").join("bootstrap.h"), "").unwrap();
        std::fs::write(dir.join("VERSION"), "v0.0.0\n").unwrap();
        PlatformContext::resolve(Overrides {
            root: Some(dir.to_path_buf()),
            host_os: Some("linux".into()),
            host_arch: Some("amd64".into()),
            target_os: Some("linux".into()),
            target_arch: Some("amd64".into()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn exclusion_token_removes_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = fixture_ctx(dir.path());
        let mut files = vec!["pgen.c".into(), "pswt.c".into(), "foo.c".into()];
        let mut libs = vec![];
        apply_token(&ctx, dir.path(), &DepToken::Exclude("pgen.c"), &mut files, &mut libs).unwrap();
        apply_token(&ctx, dir.path(), &DepToken::Exclude("pswt.c"), &mut files, &mut libs).unwrap();
        assert_eq!(files, vec!["foo.c".to_string()]);
    }

    #[test]
    fn arch_letter_dep_rule_matches_resolved_subtree() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = fixture_ctx(dir.path());
        std::fs::create_dir_all(dir.path().join("src/cmd/6l")).unwrap();
        std::fs::write(dir.path().join("src/cmd/6l/foo.c"), "").unwrap();
        let selection = select(&ctx, "cmd/6l").unwrap();
        assert!(selection.libs.iter().any(|l| l.ends_with("libsys.a")));
        assert!(selection.libs.iter().any(|l| l.ends_with("libobj.a")));
    }

    #[test]
    fn dedup_is_idempotent() {
        let mut files = vec!["a.c".to_string(), "b.c".to_string(), "a.c".to_string()];
        dedup_preserve_order(&mut files);
        let once = files.clone();
        dedup_preserve_order(&mut files);
        assert_eq!(files, once);
        assert_eq!(files, vec!["a.c".to_string(), "b.c".to_string()]);
    }
}
