//! Compiler/linker driver: assembles command lines for the native C
//! toolchain or the target-language toolchain, compiles in parallel, then
//! links. Object placement, side-copies, and the translator hook for the
//! runtime subtree all live here.

use std::path::{Path, PathBuf};

use duct::cmd;
use rayon::prelude::*;
use snafu::{ResultExt, Snafu};

use crate::generate::{self, GenerateError};
use crate::platform::PlatformContext;
use crate::select::{self, Selection, SelectError};
use crate::stale::{self, Staleness, StaleError};
use crate::tables::{MIXED_SYNTAX_EXT, PACKAGE_MANAGER_SUBTREE, RUNTIME_SUBTREE, TARGET_LANG_EXT};
use crate::translate::{PassthroughTranslator, SourceTranslator};

#[derive(Debug, Snafu)]
pub enum BuildError {
    #[snafu(display("{source}"))]
    Select { source: SelectError },
    #[snafu(display("{source}"))]
    Generate { source: GenerateError },
    #[snafu(display("{source}"))]
    Stale { source: StaleError },
    #[snafu(display("command '{cmd}' exited with status {status}: {output}"))]
    CheckExit { cmd: String, status: i32, output: String },
    #[snafu(display("failed to spawn '{cmd}': {source}"))]
    Spawn { cmd: String, source: std::io::Error },
    #[snafu(display("failed to create directory '{}': {source}", path.display()))]
    CreateDir { path: PathBuf, source: std::io::Error },
    #[snafu(display("failed to remove '{}': {source}", path.display()))]
    Remove { path: PathBuf, source: std::io::Error },
    #[snafu(display("failed to copy '{}' to '{}': {source}", from.display(), to.display()))]
    Copy { from: PathBuf, to: PathBuf, source: std::io::Error },
    #[snafu(display("{source}"))]
    Translate { source: crate::translate::TranslateError },
}

type Result<T, E = BuildError> = std::result::Result<T, E>;

impl From<SelectError> for BuildError {
    fn from(source: SelectError) -> Self {
        BuildError::Select { source }
    }
}
impl From<GenerateError> for BuildError {
    fn from(source: GenerateError) -> Self {
        BuildError::Generate { source }
    }
}
impl From<StaleError> for BuildError {
    fn from(source: StaleError) -> Self {
        BuildError::Stale { source }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
    CLibrary,
    TargetPackage,
    TargetCommand,
    CCommand,
}

serde_plain::derive_display_from_serialize!(TargetKind);
serde_plain::derive_fromstr_from_deserialize!(TargetKind);

pub fn classify(subtree: &str) -> TargetKind {
    if subtree.starts_with("lib") || subtree == "cmd/cc" || subtree == "cmd/gc" {
        TargetKind::CLibrary
    } else if subtree == PACKAGE_MANAGER_SUBTREE {
        TargetKind::TargetCommand
    } else if subtree.starts_with("pkg") {
        TargetKind::TargetPackage
    } else {
        TargetKind::CCommand
    }
}

/// Runs a child process the way the reference `CheckExit` policy requires:
/// any non-zero exit is immediately fatal, with combined output captured for
/// the diagnostic.
fn check_exit(program: &str, args: &[String], dir: &Path) -> Result<()> {
    let display = format!("{program} {}", args.join(" "));
    let output = cmd(program, args)
        .dir(dir)
        .stderr_to_stdout()
        .stdout_capture()
        .unchecked()
        .run()
        .context(SpawnSnafu { cmd: display.clone() })?;

    if !output.status.success() {
        return Err(BuildError::CheckExit {
            cmd: display,
            status: output.status.code().unwrap_or(-1),
            output: String::from_utf8_lossy(&output.stdout).into_owned(),
        });
    }
    Ok(())
}

fn c_compiler_flags(ctx: &PlatformContext, src_dir: &Path) -> Vec<String> {
    let mut flags = vec![
        "-Wall".to_string(),
        "-Werror".to_string(),
        "-Wno-unused".to_string(),
        "-Wno-missing-braces".to_string(),
        "-g".to_string(),
        "-O2".to_string(),
        "-c".to_string(),
    ];
    flags.push(if ctx.host_arch == "amd64" { "-m64".to_string() } else { "-m32".to_string() });
    flags.push(format!("-I{}/include", ctx.root_dir.display()));
    flags.push(format!("-I{}", src_dir.display()));
    flags
}

/// File receiving the OS/arch/root/version macro defines (the "runtime
/// OS-identification file").
fn is_os_ident_file(name: &str) -> bool {
    name == "os_ident.c"
}

/// File receiving `-DTARGET_EXPERIMENT` from the environment (the
/// "compiler-lex file").
fn is_lex_file(name: &str) -> bool {
    name == "lex.c"
}

fn extra_defines(ctx: &PlatformContext, name: &str) -> Vec<String> {
    if is_os_ident_file(name) {
        let root_escaped = ctx.root_dir.to_string_lossy().replace('\\', "\\\\");
        vec![
            format!("-DTARGETOS={}", ctx.target_os),
            format!("-DTARGETARCH={}", ctx.target_arch),
            format!("-DDISTROOT={root_escaped}"),
            format!("-DDISTVERSION={}", ctx.version_string),
        ]
    } else if is_lex_file(name) {
        vec![format!("-DTARGETEXPERIMENT={}", ctx.experiment)]
    } else {
        vec![]
    }
}

/// Object placement: on a Darwin host, C objects persist under
/// `pkg/obj/<subtree>`; everything else (including assembly objects, even on
/// Darwin) goes into the scratch work directory.
fn object_path(ctx: &PlatformContext, subtree: &str, stem: &str, is_c: bool) -> PathBuf {
    if is_c && ctx.is_darwin_host() {
        ctx.root_dir.join("pkg").join("obj").join(subtree).join(format!("{stem}.o"))
    } else {
        ctx.work_dir.path().join(format!("{stem}.o"))
    }
}

fn file_stem(name: &str) -> &str {
    Path::new(name).file_stem().and_then(|s| s.to_str()).unwrap_or(name)
}

pub struct BuildOutcome {
    pub objects: Vec<PathBuf>,
    pub link_target: PathBuf,
}

/// Runs the full per-subtree pipeline: select, generate, stale-check,
/// compile (parallel), link, side-copies.
pub fn build_subtree(ctx: &PlatformContext, subtree: &str) -> Result<Option<BuildOutcome>> {
    let src_dir = ctx.src_dir(subtree);
    let mut selection = select::select(ctx, subtree)?;

    if subtree == RUNTIME_SUBTREE {
        runtime_pre_generate_side_copies(ctx, &src_dir)?;
    }

    generate::dispatch(ctx, &src_dir, &selection.files)?;

    if subtree == RUNTIME_SUBTREE {
        runtime_post_generate_side_copies(ctx, &src_dir)?;
    }

    translate_mixed_syntax_files(ctx, &src_dir, &mut selection)?;

    let kind = classify(subtree);
    let link_target = link_target_path(ctx, subtree, kind);

    let inputs: Vec<PathBuf> = selection.files.iter().map(|f| src_dir.join(f)).collect();
    if !stale::is_stale(Staleness::MtimeCompare, &link_target, &inputs, &selection.libs)? {
        return Ok(None);
    }

    let c_and_asm: Vec<&String> = selection
        .files
        .iter()
        .filter(|f| f.ends_with(".c") || f.ends_with(".s"))
        .collect();

    let objects: Vec<PathBuf> = c_and_asm
        .par_iter()
        .map(|f| compile_one(ctx, &src_dir, subtree, f))
        .collect::<Result<Vec<_>>>()?;

    let target_sources: Vec<&String> = selection
        .files
        .iter()
        .filter(|f| f.ends_with(TARGET_LANG_EXT))
        .collect();

    let target_object = if matches!(kind, TargetKind::TargetPackage | TargetKind::TargetCommand)
        && !target_sources.is_empty()
    {
        Some(compile_target_lang(ctx, &src_dir, subtree, kind, &target_sources)?)
    } else {
        None
    };

    let mut all_objects = objects.clone();
    all_objects.extend(target_object.clone());

    link(ctx, subtree, kind, &link_target, &all_objects, &selection.libs)?;

    if subtree == RUNTIME_SUBTREE {
        runtime_post_link_side_copies(ctx, &src_dir)?;
    }

    Ok(Some(BuildOutcome { objects: all_objects, link_target }))
}

fn compile_one(ctx: &PlatformContext, src_dir: &Path, subtree: &str, file: &str) -> Result<PathBuf> {
    let abs = src_dir.join(file);
    let stem = file_stem(file);
    let out = object_path(ctx, subtree, stem, !file.ends_with(".s"));
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent).context(CreateDirSnafu { path: parent.to_path_buf() })?;
    }

    if file.ends_with(".s") {
        let asm = format!("{}a", ctx.arch_letter);
        let args = vec![
            "-I".to_string(),
            ctx.work_dir.path().to_string_lossy().into_owned(),
            format!("-DTARGETOS_{}", ctx.target_os),
            // Preserved literally: the reference assembler defines the arch
            // macro using the OS value in both positions.
            format!("-DTARGETARCH_{}", ctx.target_os),
            "-o".to_string(),
            out.to_string_lossy().into_owned(),
            abs.to_string_lossy().into_owned(),
        ];
        check_exit(&asm, &args, src_dir)?;
    } else {
        let mut args = c_compiler_flags(ctx, src_dir);
        let basename = abs.file_name().unwrap().to_string_lossy().into_owned();
        args.extend(extra_defines(ctx, &basename));
        args.push("-o".to_string());
        args.push(out.to_string_lossy().into_owned());
        args.push(abs.to_string_lossy().into_owned());
        check_exit("cc", &args, src_dir)?;
    }
    Ok(out)
}

fn compile_target_lang(
    ctx: &PlatformContext,
    src_dir: &Path,
    subtree: &str,
    kind: TargetKind,
    sources: &[&String],
) -> Result<PathBuf> {
    let compiler = format!("{}g", ctx.arch_letter);
    let package_path = if kind == TargetKind::TargetCommand {
        "main".to_string()
    } else {
        subtree.strip_prefix("pkg/").unwrap_or(subtree).to_string()
    };

    let mut args = vec!["-p".to_string(), package_path];
    if subtree == RUNTIME_SUBTREE {
        args.push("-+".to_string());
    }
    for s in sources {
        args.push(src_dir.join(s.as_str()).to_string_lossy().into_owned());
    }

    let out = ctx.work_dir.path().join(format!("_target_.{}", ctx.arch_letter));
    args.push("-o".to_string());
    args.push(out.to_string_lossy().into_owned());

    check_exit(&compiler, &args, src_dir)?;
    Ok(out)
}

fn link_target_path(ctx: &PlatformContext, subtree: &str, kind: TargetKind) -> PathBuf {
    let name = subtree.rsplit('/').next().unwrap_or(subtree);
    match kind {
        TargetKind::CLibrary => {
            let libname = if name.starts_with("lib") { name.to_string() } else { format!("lib{name}") };
            ctx.root_dir.join("pkg").join("obj").join(format!("{libname}.a"))
        }
        TargetKind::TargetPackage => {
            let subdir = subtree.strip_prefix("pkg/").unwrap_or(subtree);
            ctx.root_dir
                .join("pkg")
                .join(format!("{}_{}", ctx.target_os, ctx.target_arch))
                .join(format!("{subdir}.a"))
        }
        TargetKind::TargetCommand => {
            ctx.root_dir.join("bin").join("tool").join(format!("pm_bootstrap{}", ctx.exe_suffix()))
        }
        TargetKind::CCommand => {
            ctx.root_dir.join("bin").join("tool").join(format!("{name}{}", ctx.exe_suffix()))
        }
    }
}

fn link(
    ctx: &PlatformContext,
    subtree: &str,
    kind: TargetKind,
    target: &Path,
    objects: &[PathBuf],
    libs: &[PathBuf],
) -> Result<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).context(CreateDirSnafu { path: parent.to_path_buf() })?;
    }
    if target.exists() {
        std::fs::remove_file(target).context(RemoveSnafu { path: target.to_path_buf() })?;
    }

    match kind {
        TargetKind::CLibrary => {
            let mut args = vec!["rsc".to_string(), target.to_string_lossy().into_owned()];
            args.extend(objects.iter().map(|o| o.to_string_lossy().into_owned()));
            check_exit("ar", &args, &ctx.root_dir)
        }
        TargetKind::TargetPackage => {
            let mut args = vec!["grc".to_string(), target.to_string_lossy().into_owned()];
            args.extend(objects.iter().map(|o| o.to_string_lossy().into_owned()));
            check_exit("pack", &args, &ctx.root_dir)
        }
        TargetKind::TargetCommand => {
            let linker = format!("{}l", ctx.arch_letter);
            let mut args = vec!["-o".to_string(), target.to_string_lossy().into_owned()];
            args.extend(objects.iter().map(|o| o.to_string_lossy().into_owned()));
            check_exit(&linker, &args, &ctx.root_dir)
        }
        TargetKind::CCommand => {
            let mut args = vec!["-o".to_string(), target.to_string_lossy().into_owned()];
            args.extend(objects.iter().map(|o| o.to_string_lossy().into_owned()));
            args.extend(libs.iter().map(|l| l.to_string_lossy().into_owned()));
            args.push("-lm".to_string());
            let _ = subtree;
            check_exit("cc", &args, &ctx.root_dir)
        }
    }
}

fn runtime_pre_generate_side_copies(ctx: &PlatformContext, src_dir: &Path) -> Result<()> {
    let copies = [
        (format!("arch_{}.h", ctx.target_arch), "arch.h"),
        (format!("defs_{}_{}.h", ctx.target_os, ctx.target_arch), "defs.h"),
        (format!("os_{}.h", ctx.target_os), "os.h"),
        (format!("signals_{}.h", ctx.target_os), "signals.h"),
    ];
    for (from, to) in copies {
        let src = src_dir.join(&from);
        if src.exists() {
            let dst = ctx.work_dir.path().join(to);
            std::fs::copy(&src, &dst).context(CopySnafu { from: src, to: dst })?;
        }
    }
    Ok(())
}

/// Copies the generated `zasm_<os>_<arch>.h` into the work directory. Must
/// run after the generators produce it and before the compile phase, since
/// compiles pass `-I <workDir>`.
fn runtime_post_generate_side_copies(ctx: &PlatformContext, src_dir: &Path) -> Result<()> {
    let zasm = src_dir.join(format!("zasm_{}_{}.h", ctx.target_os, ctx.target_arch));
    if zasm.exists() {
        let dst = ctx.work_dir.path().join("zasm.h");
        std::fs::copy(&zasm, &dst).context(CopySnafu { from: zasm, to: dst })?;
    }
    Ok(())
}

fn runtime_post_link_side_copies(ctx: &PlatformContext, src_dir: &Path) -> Result<()> {
    let pkg_dir = ctx.root_dir.join("pkg").join(format!("{}_{}", ctx.target_os, ctx.target_arch));
    std::fs::create_dir_all(&pkg_dir).context(CreateDirSnafu { path: pkg_dir.clone() })?;
    for header in ["runtime.h", "cgocall.h"] {
        let src = src_dir.join(header);
        if src.exists() {
            let dst = pkg_dir.join(header);
            std::fs::copy(&src, &dst).context(CopySnafu { from: src, to: dst })?;
        }
    }
    Ok(())
}

fn translate_mixed_syntax_files(ctx: &PlatformContext, src_dir: &Path, selection: &mut Selection) -> Result<()> {
    let translator = PassthroughTranslator;
    let mixed: Vec<String> = selection
        .files
        .iter()
        .filter(|f| f.ends_with(MIXED_SYNTAX_EXT))
        .cloned()
        .collect();

    for file in mixed {
        let src = src_dir.join(&file);
        let stem = file_stem(&file);
        let translated_name = format!("z{stem}_{}.c", ctx.target_arch);
        let dst = src_dir.join(&translated_name);
        translator.translate(&src, &dst).context(TranslateSnafu)?;
        selection.files.push(translated_name);
    }

    let mut seen = std::collections::HashSet::new();
    selection.files.retain(|f| seen.insert(f.clone()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_matches_prefix_rules() {
        assert_eq!(classify("libsys"), TargetKind::CLibrary);
        assert_eq!(classify("cmd/cc"), TargetKind::CLibrary);
        assert_eq!(classify("cmd/gc"), TargetKind::CLibrary);
        assert_eq!(classify(PACKAGE_MANAGER_SUBTREE), TargetKind::TargetCommand);
        assert_eq!(classify("pkg/io"), TargetKind::TargetPackage);
        assert_eq!(classify("cmd/pack"), TargetKind::CCommand);
    }

    use crate::platform::Overrides;

    fn ctx(host_os: &str) -> PlatformContext {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("include")).unwrap();
        std::fs::write(dir.path().join("include").join("bootstrap.h"), "").unwrap();
        std::fs::write(dir.path().join("VERSION"), "v0.0.0\n").unwrap();
        PlatformContext::resolve(Overrides {
            root: Some(dir.path().to_path_buf()),
            host_os: Some(host_os.into()),
            host_arch: Some("amd64".into()),
            target_os: Some("linux".into()),
            target_arch: Some("amd64".into()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn object_placement_follows_host_os_for_c_objects() {
        let darwin = ctx("darwin");
        let placed = object_path(&darwin, "cmd/8l", "foo", true);
        assert_eq!(placed, darwin.root_dir.join("pkg/obj/cmd/8l/foo.o"));

        let linux = ctx("linux");
        let placed = object_path(&linux, "cmd/8l", "foo", true);
        assert_eq!(placed, linux.work_dir.path().join("foo.o"));
    }

    #[test]
    fn assembly_objects_stay_in_work_dir_even_on_darwin() {
        let darwin = ctx("darwin");
        let placed = object_path(&darwin, "cmd/8l", "foo", false);
        assert_eq!(placed, darwin.work_dir.path().join("foo.o"));
    }
}
