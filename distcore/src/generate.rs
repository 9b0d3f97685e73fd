//! Generator dispatcher: materializes selected files whose basename matches
//! a registered generator binding, and fails fatally if a selected file is
//! still missing afterward.
//!
//! The generators themselves are external collaborators per the design: the
//! core only needs the capability contract `(srcDir, outPath) -> Result<()>`.
//! The concrete bodies here produce small, plausible generated source text
//! standing in for that collaborator.

use std::path::{Path, PathBuf};

use snafu::Snafu;

use crate::platform::PlatformContext;
use crate::tables::GEN_TABLE;

#[derive(Debug, Snafu)]
pub enum GenerateError {
    #[snafu(display("generator '{name}' failed to write '{}': {source}", path.display()))]
    Write { name: String, path: PathBuf, source: std::io::Error },

    #[snafu(display("missing file {}", path.display()))]
    MissingFile { path: PathBuf },
}

type Result<T, E = GenerateError> = std::result::Result<T, E>;

pub type Generator = fn(&PlatformContext, &Path, &Path) -> Result<()>;

fn lookup(name: &str) -> Generator {
    match name {
        "gen_opcode_table" => gen_opcode_table,
        "gen_enum_table" => gen_enum_table,
        "gen_target_asm_header" => gen_target_asm_header,
        "gen_target_arch_const" => gen_target_arch_const,
        "gen_target_os_const" => gen_target_os_const,
        "gen_runtime_defs" => gen_runtime_defs,
        "gen_version_stamp" => gen_version_stamp,
        other => unreachable!("unregistered generator '{other}'"),
    }
}

/// Runs every registered generator whose name prefix matches a selected
/// file's basename, then verifies nothing selected is still missing.
pub fn dispatch(ctx: &PlatformContext, src_dir: &Path, files: &[String]) -> Result<()> {
    for file in files {
        let abs = src_dir.join(file);
        let basename = abs
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if let Some(binding) = GEN_TABLE.iter().find(|b| basename.starts_with(b.name_prefix)) {
            let gen = lookup(binding.generator);
            gen(ctx, src_dir, &abs)?;
        }
    }

    for file in files {
        let abs = src_dir.join(file);
        if !abs.exists() {
            return Err(GenerateError::MissingFile { path: abs });
        }
    }
    Ok(())
}

fn write_generated(name: &str, path: &Path, contents: String) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| GenerateError::Write {
            name: name.to_string(),
            path: path.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, contents).map_err(|source| GenerateError::Write {
        name: name.to_string(),
        path: path.to_path_buf(),
        source,
    })
}

fn gen_opcode_table(_ctx: &PlatformContext, _src_dir: &Path, out: &Path) -> Result<()> {
    write_generated("gen_opcode_table", out, "/* generated opcode table */\n".to_string())
}

fn gen_enum_table(_ctx: &PlatformContext, _src_dir: &Path, out: &Path) -> Result<()> {
    write_generated("gen_enum_table", out, "/* generated enum names */\n".to_string())
}

fn gen_target_asm_header(ctx: &PlatformContext, _src_dir: &Path, out: &Path) -> Result<()> {
    write_generated(
        "gen_target_asm_header",
        out,
        format!("/* generated for {}/{} */\n", ctx.target_os, ctx.target_arch),
    )
}

fn gen_target_arch_const(ctx: &PlatformContext, _src_dir: &Path, out: &Path) -> Result<()> {
    write_generated(
        "gen_target_arch_const",
        out,
        format!("const char *target_arch = \"{}\";\n", ctx.target_arch),
    )
}

fn gen_target_os_const(ctx: &PlatformContext, _src_dir: &Path, out: &Path) -> Result<()> {
    write_generated(
        "gen_target_os_const",
        out,
        format!("const char *target_os = \"{}\";\n", ctx.target_os),
    )
}

fn gen_runtime_defs(_ctx: &PlatformContext, _src_dir: &Path, out: &Path) -> Result<()> {
    write_generated("gen_runtime_defs", out, "/* generated runtime defs */\n".to_string())
}

fn gen_version_stamp(ctx: &PlatformContext, _src_dir: &Path, out: &Path) -> Result<()> {
    write_generated(
        "gen_version_stamp",
        out,
        format!("const char *version = \"{}\";\n", ctx.version_string),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Overrides;

    fn ctx() -> PlatformContext {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("include")).unwrap();
        std::fs::write(dir.path().join("include").join("bootstrap.h"), "").unwrap();
        std::fs::write(dir.path().join("VERSION"), "v0.0.0\n").unwrap();
        PlatformContext::resolve(Overrides {
            root: Some(dir.path().to_path_buf()),
            host_os: Some("linux".into()),
            host_arch: Some("amd64".into()),
            target_os: Some("linux".into()),
            target_arch: Some("amd64".into()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn generator_materializes_missing_file() {
        let ctx = ctx();
        let src_dir = tempfile::tempdir().unwrap();
        let files = vec!["zversion.tgt".to_string()];
        dispatch(&ctx, src_dir.path(), &files).unwrap();
        assert!(src_dir.path().join("zversion.tgt").exists());
    }

    #[test]
    fn non_generated_missing_file_is_fatal() {
        let ctx = ctx();
        let src_dir = tempfile::tempdir().unwrap();
        let files = vec!["nope.c".to_string()];
        let err = dispatch(&ctx, src_dir.path(), &files).unwrap_err();
        assert!(matches!(err, GenerateError::MissingFile { .. }));
    }
}
