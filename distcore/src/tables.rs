//! Static build-rule data: dependency tweaks, generator bindings, build order,
//! and the clean list. Nothing here is mutated after the process starts.

/// A single token inside a [`DepRule`]'s token list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepToken {
    /// A bare relative (or absolute) path, added to the file list verbatim.
    Path(&'static str),
    /// A directory whose contents should be expanded and added (`dir/*`).
    Glob(&'static str),
    /// Remove every currently listed file whose basename starts with this.
    Exclude(&'static str),
    /// A `.a` archive, added to the link-libraries list instead of the file list.
    Lib(&'static str),
}

/// A dependency tweak applying to every subtree whose path starts with `prefix`.
#[derive(Debug, Clone)]
pub struct DepRule {
    pub prefix: &'static str,
    pub tokens: &'static [DepToken],
}

/// The subtree that holds the package-manager command sources.
pub const PACKAGE_MANAGER_SUBTREE: &str = "cmd/pm";

/// The subtree that holds the runtime package sources.
pub const RUNTIME_SUBTREE: &str = "pkg/runtime";

/// Recognized source file suffixes. Anything else is dropped during selection.
pub const SOURCE_SUFFIXES: &[&str] = &[".c", ".h", ".s", ".tgt", ".mix"];

/// Extension used by target-language source files.
pub const TARGET_LANG_EXT: &str = ".tgt";

/// Extension used by mixed-syntax source files that require translation to C.
pub const MIXED_SYNTAX_EXT: &str = ".mix";

/// Files whose build-tag scan is skipped because they are documentation only.
pub const DOCUMENTATION_ONLY_FILES: &[&str] = &["cmd/pm/doc.tgt"];

use DepToken::*;

pub const DEP_TABLE: &[DepRule] = &[
    DepRule {
        prefix: "libsys",
        tokens: &[Glob("$TARGET_OS/*"), Glob("$TARGET_ARCH/*")],
    },
    DepRule {
        prefix: "libio",
        tokens: &[Glob("*"), Exclude("test")],
    },
    DepRule {
        prefix: "libobj",
        tokens: &[Glob("*"), Lib("$ROOT/lib/libdisasm.a")],
    },
    DepRule {
        prefix: "cmd/cc",
        tokens: &[Glob("*"), Lib("$ROOT/lib/libsys.a"), Lib("$ROOT/lib/libobj.a")],
    },
    DepRule {
        prefix: "cmd/gc",
        tokens: &[Glob("*"), Lib("$ROOT/lib/libsys.a")],
    },
    DepRule {
        prefix: "cmd/%sa",
        tokens: &[Glob("*"), Lib("$ROOT/lib/libsys.a"), Lib("$ROOT/lib/libobj.a")],
    },
    DepRule {
        prefix: "cmd/%sc",
        tokens: &[Glob("*"), Lib("$ROOT/lib/libsys.a"), Lib("$ROOT/lib/libobj.a")],
    },
    DepRule {
        prefix: "cmd/%sg",
        tokens: &[Glob("*"), Lib("$ROOT/lib/libsys.a")],
    },
    DepRule {
        prefix: "cmd/%sl",
        tokens: &[Glob("*"), Lib("$ROOT/lib/libsys.a"), Lib("$ROOT/lib/libobj.a")],
    },
    DepRule {
        prefix: "pkg/runtime",
        tokens: &[
            Glob("*"),
            Path("$TARGET_OS/$TARGET_ARCH/vlop.s"),
            Exclude("vlop_"),
        ],
    },
    DepRule {
        prefix: "cmd/pm",
        tokens: &[Glob("*")],
    },
];

pub struct GenBinding {
    pub name_prefix: &'static str,
    pub generator: &'static str,
}

/// `namePrefix` -> generator name. The generator itself is dispatched by
/// [`crate::generate::dispatch`]; this table only records the binding.
pub const GEN_TABLE: &[GenBinding] = &[
    GenBinding { name_prefix: "opcodes.h", generator: "gen_opcode_table" },
    GenBinding { name_prefix: "enumnames.c", generator: "gen_enum_table" },
    GenBinding { name_prefix: "zasm_", generator: "gen_target_asm_header" },
    GenBinding { name_prefix: "ztargetarch_", generator: "gen_target_arch_const" },
    GenBinding { name_prefix: "ztargetos_", generator: "gen_target_os_const" },
    GenBinding { name_prefix: "zruntime_defs_", generator: "gen_runtime_defs" },
    GenBinding { name_prefix: "zversion.tgt", generator: "gen_version_stamp" },
];

/// Fixed sequential build order. `%s` is replaced by the current arch letter.
pub const BUILD_ORDER: &[&str] = &[
    "libsys",
    "libio",
    "libobj",
    "cmd/nm",
    "cmd/pack",
    "cmd/cc",
    "cmd/gc",
    "cmd/%sl",
    "cmd/%sa",
    "cmd/%sc",
    "cmd/%sg",
    "pkg/runtime",
    "pkg/sync",
    "pkg/io",
    "pkg/os",
    "pkg/fmt",
    "pkg/strings",
    "pkg/bytes",
    "pkg/errors",
    "cmd/pm",
];

/// Subtrees visited by `clean`, independent of `BUILD_ORDER` (it includes
/// every arch-letter variant of the toolchain commands, not just the one
/// selected for the current target).
pub const CLEAN_LIST: &[&str] = &[
    "libsys",
    "libio",
    "libobj",
    "cmd/nm",
    "cmd/pack",
    "cmd/cc",
    "cmd/gc",
    "cmd/5a", "cmd/5c", "cmd/5g", "cmd/5l",
    "cmd/6a", "cmd/6c", "cmd/6g", "cmd/6l",
    "cmd/8a", "cmd/8c", "cmd/8g", "cmd/8l",
    "pkg/runtime",
    "pkg/sync",
    "pkg/io",
    "pkg/os",
    "pkg/fmt",
    "pkg/strings",
    "pkg/bytes",
    "pkg/errors",
    "cmd/pm",
];

/// Obsolete binaries removed from `bin/` (and conditionally `binDir`) by setup.
pub const OBSOLETE_TOOL_BINARIES: &[&str] = &["5a", "6a", "8a", "5c", "6c", "8c", "prof", "cov"];
