use anyhow::{bail, Context, Result};
use clap::Parser;
use distcore::{Overrides, PlatformContext};

/// Build one or more subtrees. With no arguments, the subtree is inferred
/// from the current working directory.
#[derive(Debug, Parser)]
pub(crate) struct Install {
    dirs: Vec<String>,
}

impl Install {
    pub(crate) fn run(&self) -> Result<()> {
        let ctx = PlatformContext::resolve(Overrides::from_env())?;

        let subtrees = if self.dirs.is_empty() {
            vec![infer_subtree_from_cwd(&ctx)?]
        } else {
            self.dirs.clone()
        };

        for subtree in subtrees {
            distcore::install_subtree(&ctx, &subtree)
                .with_context(|| format!("failed to install '{subtree}'"))?;
        }
        Ok(())
    }
}

fn infer_subtree_from_cwd(ctx: &PlatformContext) -> Result<String> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let src_root = ctx.root_dir.join("src");
    match cwd.strip_prefix(&src_root) {
        Ok(rel) if !rel.as_os_str().is_empty() => Ok(rel.to_string_lossy().into_owned()),
        _ => bail!(
            "current directory '{}' is not under '{}'; pass a subtree explicitly",
            cwd.display(),
            src_root.display()
        ),
    }
}
