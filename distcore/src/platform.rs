//! Process-wide, read-only platform configuration.
//!
//! [`PlatformContext`] is built exactly once via [`PlatformContext::resolve`]
//! and then passed around by reference. Nothing in this module mutates it
//! after construction, matching the "immutable configuration struct" framing
//! recorded in the design notes.

use std::path::{Path, PathBuf};

use snafu::{ensure, ResultExt, Snafu};

use crate::version::{self, VersionError};
use crate::workdir::WorkDir;

/// Recognized operating systems, in table order. Index corresponds to no
/// other table; only architectures are positionally significant.
pub const RECOGNIZED_OS: &[&str] = &["linux", "darwin", "windows"];

/// Recognized architectures, in table order.
pub const RECOGNIZED_ARCH: &[&str] = &["arm", "amd64", "x86"];

/// Arch-letter table, positionally parallel to [`RECOGNIZED_ARCH`]: the i-th
/// recognized architecture maps to the i-th letter here.
pub const ARCH_LETTERS: &[char] = &['5', '6', '8'];

#[derive(Debug, Snafu)]
pub enum PlatformError {
    #[snafu(display(
        "unrecognized target OS '{os}'; expected one of {RECOGNIZED_OS:?}"
    ))]
    UnrecognizedOs { os: String },

    #[snafu(display(
        "unrecognized target architecture '{arch}'; expected one of {RECOGNIZED_ARCH:?}"
    ))]
    UnrecognizedArch { arch: String },

    #[snafu(display(
        "root '{}' does not look like a source tree (missing {})",
        root.display(), marker.display(),
    ))]
    RootMarkerMissing { root: PathBuf, marker: PathBuf },

    #[snafu(display("failed to resolve version under '{}': {source}", root.display()))]
    Version { root: PathBuf, source: VersionError },

    #[snafu(display("failed to create scratch work directory: {source}"))]
    WorkDir { source: std::io::Error },
}

type Result<T, E = PlatformError> = std::result::Result<T, E>;

/// Environment overrides used to build a [`PlatformContext`]. Production code
/// builds this from `std::env::var`; tests build it directly so no process
/// environment is touched.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub root: Option<PathBuf>,
    pub bin_dir: Option<PathBuf>,
    pub host_os: Option<String>,
    pub host_arch: Option<String>,
    pub target_os: Option<String>,
    pub target_arch: Option<String>,
    pub final_root: Option<PathBuf>,
    pub experiment: Option<String>,
}

impl Overrides {
    /// Reads the fixed set of recognized environment variables.
    pub fn from_env() -> Self {
        Overrides {
            root: std::env::var_os("DIST_ROOT").map(PathBuf::from),
            bin_dir: std::env::var_os("DIST_BIN").map(PathBuf::from),
            host_os: std::env::var("DIST_HOST_OS").ok(),
            host_arch: std::env::var("DIST_HOST_ARCH").ok(),
            target_os: std::env::var("DIST_TARGET_OS").ok(),
            target_arch: std::env::var("DIST_TARGET_ARCH").ok(),
            final_root: std::env::var_os("DIST_ROOT_FINAL").map(PathBuf::from),
            experiment: std::env::var("DIST_EXPERIMENT").ok(),
        }
    }
}

#[derive(Debug)]
pub struct PlatformContext {
    pub host_os: String,
    pub host_arch: String,
    pub target_os: String,
    pub target_arch: String,
    pub arch_letter: char,
    pub root_dir: PathBuf,
    pub bin_dir: PathBuf,
    pub final_root_dir: PathBuf,
    pub work_dir: WorkDir,
    pub version_string: String,
    pub experiment: String,
}

fn host_default(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

impl PlatformContext {
    /// Resolves a complete, validated platform context from `overrides`,
    /// falling back to compile-time host detection and spec-mandated
    /// defaults. Performs the root smoke test and resolves the version
    /// string. Writes `ROOT`, `TARGET_ARCH`, `TARGET_OS`, `LANG`, `LANGUAGE`
    /// into the process environment exactly once, on success.
    pub fn resolve(overrides: Overrides) -> Result<Self> {
        let root_dir = overrides
            .root
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        let marker = root_dir.join("include").join("bootstrap.h");
        ensure!(
            marker.exists(),
            RootMarkerMissingSnafu {
                root: root_dir.clone(),
                marker
            }
        );

        let detected_host_os = host_default(std::env::consts::OS).to_string();
        let detected_host_arch = match std::env::consts::ARCH {
            "x86" => "x86",
            "x86_64" => "amd64",
            "arm" | "aarch64" => "arm",
            other => other,
        }
        .to_string();

        let host_os = overrides.host_os.unwrap_or(detected_host_os);
        let host_arch = overrides.host_arch.unwrap_or(detected_host_arch);
        let target_os = overrides.target_os.unwrap_or_else(|| host_os.clone());
        let target_arch = overrides.target_arch.unwrap_or_else(|| host_arch.clone());

        ensure!(
            RECOGNIZED_OS.contains(&target_os.as_str()),
            UnrecognizedOsSnafu { os: target_os.clone() }
        );
        ensure!(
            RECOGNIZED_ARCH.contains(&target_arch.as_str()),
            UnrecognizedArchSnafu { arch: target_arch.clone() }
        );

        let arch_letter = arch_letter_for(&target_arch)
            .expect("validated above: target_arch is in RECOGNIZED_ARCH");

        let bin_dir = overrides.bin_dir.unwrap_or_else(|| root_dir.join("bin"));
        let final_root_dir = overrides.final_root.unwrap_or_else(|| root_dir.clone());
        let experiment = overrides.experiment.unwrap_or_default();

        let version_string = version::resolve(&root_dir, &version::HgSourceControl)
            .context(VersionSnafu { root: root_dir.clone() })?;

        let work_dir = WorkDir::create(&root_dir).context(WorkDirSnafu)?;

        std::env::set_var("ROOT", &root_dir);
        std::env::set_var("TARGET_ARCH", &target_arch);
        std::env::set_var("TARGET_OS", &target_os);
        std::env::set_var("LANG", "C");
        std::env::set_var("LANGUAGE", "en_US.UTF8");

        Ok(PlatformContext {
            host_os,
            host_arch,
            target_os,
            target_arch,
            arch_letter,
            root_dir,
            bin_dir,
            final_root_dir,
            work_dir,
            version_string,
            experiment,
        })
    }

    pub fn src_dir(&self, subtree: &str) -> PathBuf {
        self.root_dir.join("src").join(subtree)
    }

    pub fn exe_suffix(&self) -> &'static str {
        if self.target_os == "windows" {
            ".exe"
        } else {
            ""
        }
    }

    pub fn is_darwin_host(&self) -> bool {
        self.host_os == "darwin"
    }

    pub fn substitute_placeholders(&self, token: &str) -> String {
        token
            .replace("$ROOT", &self.root_dir.to_string_lossy())
            .replace("$TARGET_OS", &self.target_os)
            .replace("$TARGET_ARCH", &self.target_arch)
    }

    pub fn resolve_pattern(&self, pattern: &str) -> String {
        pattern.replacen("%s", &self.arch_letter.to_string(), 1)
    }
}

pub fn arch_letter_for(arch: &str) -> Option<char> {
    RECOGNIZED_ARCH
        .iter()
        .position(|a| *a == arch)
        .map(|i| ARCH_LETTERS[i])
}

pub fn header_marker_path(root: &Path) -> PathBuf {
    root.join("include").join("bootstrap.h")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arch_letter_correspondence() {
        for (i, arch) in RECOGNIZED_ARCH.iter().enumerate() {
            assert_eq!(arch_letter_for(arch), Some(ARCH_LETTERS[i]));
        }
        assert_eq!(arch_letter_for("sparc"), None);
    }

    #[test]
    fn placeholder_substitution() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("include")).unwrap();
        std::fs::write(dir.path().join("include").join("bootstrap.h"), "").unwrap();
        std::fs::write(dir.path().join("VERSION"), "v1.0.0\n").unwrap();

        let ctx = PlatformContext::resolve(Overrides {
            root: Some(dir.path().to_path_buf()),
            host_os: Some("linux".into()),
            host_arch: Some("amd64".into()),
            target_os: Some("linux".into()),
            target_arch: Some("amd64".into()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            ctx.substitute_placeholders("$ROOT/lib/$TARGET_OS/$TARGET_ARCH/x.a"),
            format!(
                "{}/lib/linux/amd64/x.a",
                dir.path().to_string_lossy()
            )
        );
        assert_eq!(ctx.resolve_pattern("cmd/%sl"), "cmd/6l");
    }

    #[test]
    fn unrecognized_target_os_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("include")).unwrap();
        std::fs::write(dir.path().join("include").join("bootstrap.h"), "").unwrap();
        std::fs::write(dir.path().join("VERSION"), "v1.0.0\n").unwrap();

        let err = PlatformContext::resolve(Overrides {
            root: Some(dir.path().to_path_buf()),
            host_os: Some("linux".into()),
            host_arch: Some("amd64".into()),
            target_os: Some("plan9".into()),
            target_arch: Some("amd64".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, PlatformError::UnrecognizedOs { .. }));
    }
}
