//! Tree setup & clean: initial directory layout and removal of prior
//! artifacts.

use std::path::Path;

use snafu::{ResultExt, Snafu};
use walkdir::WalkDir;

use crate::platform::PlatformContext;
use crate::tables::{CLEAN_LIST, GEN_TABLE, OBSOLETE_TOOL_BINARIES};

#[derive(Debug, Snafu)]
pub enum SetupError {
    #[snafu(display("failed to create directory '{}': {source}", path.display()))]
    CreateDir { path: std::path::PathBuf, source: std::io::Error },
    #[snafu(display("failed to remove '{}': {source}", path.display()))]
    Remove { path: std::path::PathBuf, source: std::io::Error },
    #[snafu(display("failed to walk '{}': {source}", path.display()))]
    Walk { path: std::path::PathBuf, source: walkdir::Error },
}

type Result<T, E = SetupError> = std::result::Result<T, E>;

fn remove_dir_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_dir_all(path).context(RemoveSnafu { path: path.to_path_buf() })?;
    }
    Ok(())
}

fn remove_file_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path).context(RemoveSnafu { path: path.to_path_buf() })?;
    }
    Ok(())
}

/// Ensures the output directory layout exists and wipes any artifacts from a
/// prior platform/arch combination.
pub fn prepare(ctx: &PlatformContext) -> Result<()> {
    for dir in ["bin", "bin/tool", "pkg"] {
        let path = ctx.root_dir.join(dir);
        std::fs::create_dir_all(&path).context(CreateDirSnafu { path: path.clone() })?;
    }

    let platform_pkg_dir = ctx.root_dir.join("pkg").join(format!("{}_{}", ctx.target_os, ctx.target_arch));
    remove_dir_if_exists(&platform_pkg_dir)?;
    std::fs::create_dir_all(&platform_pkg_dir).context(CreateDirSnafu { path: platform_pkg_dir })?;

    let obj_dir = ctx.root_dir.join("pkg").join("obj");
    remove_dir_if_exists(&obj_dir)?;
    std::fs::create_dir_all(&obj_dir).context(CreateDirSnafu { path: obj_dir })?;

    let bin_dir = ctx.root_dir.join("bin");
    for name in OBSOLETE_TOOL_BINARIES {
        remove_file_if_exists(&bin_dir.join(name))?;
    }

    if bin_dir_has_target_compiler(&ctx.bin_dir, ctx.arch_letter) {
        for name in OBSOLETE_TOOL_BINARIES {
            remove_file_if_exists(&ctx.bin_dir.join(name))?;
        }
    }

    Ok(())
}

fn bin_dir_has_target_compiler(bin_dir: &Path, arch_letter: char) -> bool {
    let wanted = format!("{arch_letter}g");
    std::fs::read_dir(bin_dir)
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .any(|e| e.file_name().to_string_lossy() == wanted)
        })
        .unwrap_or(false)
}

/// Removes generated files and prior binaries for every subtree in the
/// clean list, then wipes the shared output directories.
pub fn clean(ctx: &PlatformContext) -> Result<()> {
    for subtree in CLEAN_LIST {
        let src_dir = ctx.src_dir(subtree);
        clean_generated_files(&src_dir)?;

        if subtree.starts_with("cmd/") {
            let name = subtree.rsplit('/').next().unwrap_or(subtree);
            let bin = ctx.root_dir.join("bin").join("tool").join(format!("{name}{}", ctx.exe_suffix()));
            remove_file_if_exists(&bin)?;
        }
    }

    remove_dir_if_exists(&ctx.root_dir.join("pkg").join("obj"))?;
    remove_dir_if_exists(&ctx.root_dir.join("pkg").join(format!("{}_{}", ctx.target_os, ctx.target_arch)))?;
    remove_dir_if_exists(&ctx.root_dir.join("bin").join("tool"))?;
    remove_file_if_exists(&ctx.root_dir.join("VERSION.cache"))?;

    Ok(())
}

fn clean_generated_files(src_dir: &Path) -> Result<()> {
    if !src_dir.exists() {
        return Ok(());
    }
    for entry in WalkDir::new(src_dir).min_depth(1).max_depth(1) {
        let entry = entry.context(WalkSnafu { path: src_dir.to_path_buf() })?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if GEN_TABLE.iter().any(|b| name.starts_with(b.name_prefix)) {
            remove_file_if_exists(entry.path())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Overrides;

    fn ctx(dir: &Path) -> PlatformContext {
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
    fn prepare_creates_expected_layout() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(dir.path());
        prepare(&ctx).unwrap();
        assert!(dir.path().join("bin/tool").is_dir());
        assert!(dir.path().join("pkg/linux_amd64").is_dir());
        assert!(dir.path().join("pkg/obj").is_dir());
    }

    #[test]
    fn clean_removes_version_cache() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(dir.path());
        std::fs::write(dir.path().join("VERSION.cache"), "x\n").unwrap();
        clean(&ctx).unwrap();
        assert!(!dir.path().join("VERSION.cache").exists());
    }
}
