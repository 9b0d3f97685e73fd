use anyhow::Result;
use clap::Parser;
use distcore::{Overrides, PlatformContext};

/// Print an installation summary.
#[derive(Debug, Parser)]
pub(crate) struct Banner {}

impl Banner {
    pub(crate) fn run(&self) -> Result<()> {
        let ctx = PlatformContext::resolve(Overrides::from_env())?;

        println!(
            "installed {} toolchain for {}/{} under {}",
            ctx.version_string,
            ctx.target_os,
            ctx.target_arch,
            ctx.root_dir.display()
        );

        if !bin_dir_on_path(&ctx.bin_dir) {
            println!(
                "warning: {} is not in your PATH",
                ctx.bin_dir.display()
            );
        }

        if ctx.is_darwin_host() {
            println!("note: install a debugger that understands pkg/obj layout for best results");
        }

        if ctx.final_root_dir != ctx.root_dir {
            println!(
                "note: this tree is staged; it will ultimately run from {}",
                ctx.final_root_dir.display()
            );
        }

        Ok(())
    }
}

fn bin_dir_on_path(bin_dir: &std::path::Path) -> bool {
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).any(|p| p == bin_dir))
        .unwrap_or(false)
}
