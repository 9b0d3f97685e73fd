//! Build-tag predicate (`should_build`): decides whether a source file is
//! included for the current target, by filename sniffing and a top-of-file
//! `+build` directive scan.

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use snafu::{ResultExt, Snafu};

use crate::platform::{PlatformContext, RECOGNIZED_ARCH, RECOGNIZED_OS};
use crate::tables::{DOCUMENTATION_ONLY_FILES, PACKAGE_MANAGER_SUBTREE};

/// A build-tag token matches the bootstrapping package manager itself, so
/// files tagged for it still build while the bootstrap toolchain is built.
const BOOTSTRAP_SELF_TAG: &str = "dist_bootstrap_self";

lazy_static! {
    static ref COMMENT_LINE: Regex = Regex::new(r"^//\s?(.*)$").unwrap();
    static ref BUILD_DIRECTIVE: Regex = Regex::new(r"^\+build\s+(.+)$").unwrap();
}

#[derive(Debug, Snafu)]
pub enum BuildTagError {
    #[snafu(display("failed to read '{}': {source}", path.display()))]
    Read { path: std::path::PathBuf, source: std::io::Error },
}

type Result<T, E = BuildTagError> = std::result::Result<T, E>;

pub fn should_build(ctx: &PlatformContext, path: &Path, subtree: &str) -> Result<bool> {
    let basename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if sniffs_other_platform(ctx, &basename) {
        return Ok(false);
    }
    if basename.contains("_test") {
        return Ok(false);
    }
    let rel = format!("{subtree}/{basename}");
    if DOCUMENTATION_ONLY_FILES.contains(&rel.as_str()) {
        return Ok(true);
    }

    let contents = std::fs::read_to_string(path).context(ReadSnafu { path: path.to_path_buf() })?;
    evaluate_header(ctx, &contents, subtree)
}

fn sniffs_other_platform(ctx: &PlatformContext, basename: &str) -> bool {
    let other_os = RECOGNIZED_OS
        .iter()
        .any(|os| *os != ctx.target_os && basename.contains(os));
    let other_arch = RECOGNIZED_ARCH
        .iter()
        .any(|arch| *arch != ctx.target_arch && basename.contains(arch));
    other_os || other_arch
}

fn evaluate_header(ctx: &PlatformContext, contents: &str, subtree: &str) -> Result<bool> {
    let mut build_lines: Vec<&str> = Vec::new();

    for line in contents.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.contains("package documentation") {
            return Ok(false);
        }
        if trimmed.contains("package main") && subtree != PACKAGE_MANAGER_SUBTREE {
            return Ok(false);
        }
        if let Some(caps) = COMMENT_LINE.captures(trimmed) {
            let rest = caps.get(1).map(|m| m.as_str()).unwrap_or("").trim();
            if let Some(caps) = BUILD_DIRECTIVE.captures(rest) {
                build_lines.push(caps.get(1).unwrap().as_str());
            }
            continue;
        }
        break;
    }

    for line in &build_lines {
        let any_match = line
            .split_whitespace()
            .any(|tag| tag_matches(ctx, tag));
        if !any_match {
            return Ok(false);
        }
    }

    Ok(true)
}

fn tag_matches(ctx: &PlatformContext, tag: &str) -> bool {
    if let Some(negated) = tag.strip_prefix('!') {
        return !tag_equals(ctx, negated);
    }
    tag_equals(ctx, tag)
}

fn tag_equals(ctx: &PlatformContext, tag: &str) -> bool {
    tag == ctx.target_os || tag == ctx.target_arch || tag == BOOTSTRAP_SELF_TAG
}
