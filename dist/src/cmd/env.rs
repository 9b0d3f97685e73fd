use anyhow::Result;
use clap::Parser;
use distcore::{Overrides, PlatformContext};

/// Print resolved environment variables.
#[derive(Debug, Parser)]
pub(crate) struct Env {
    /// Also print PATH, prefixed with the tool binary directory.
    #[clap(short = 'p')]
    path: bool,
    /// Use `set NAME=VAL` formatting instead of `NAME="VAL"`.
    #[clap(short = 'w')]
    windows_format: bool,
}

impl Env {
    pub(crate) fn run(&self) -> Result<()> {
        let ctx = PlatformContext::resolve(Overrides::from_env())?;

        let mut vars = vec![
            ("ROOT".to_string(), ctx.root_dir.to_string_lossy().into_owned()),
            ("TARGET_ARCH".to_string(), ctx.target_arch.clone()),
            ("TARGET_OS".to_string(), ctx.target_os.clone()),
        ];

        if self.path {
            let sep = if ctx.target_os == "windows" { ';' } else { ':' };
            let existing = std::env::var("PATH").unwrap_or_default();
            let path = format!("{}{sep}{existing}", ctx.bin_dir.display());
            vars.push(("PATH".to_string(), path));
        }

        for (name, value) in vars {
            if self.windows_format {
                println!("set {name}={value}");
            } else {
                println!("{name}=\"{value}\"");
            }
        }
        Ok(())
    }
}
