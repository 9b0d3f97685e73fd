use anyhow::Result;
use clap::Parser;
use distcore::{Overrides, PlatformContext};

/// Print the resolved version string.
#[derive(Debug, Parser)]
pub(crate) struct Version {}

impl Version {
    pub(crate) fn run(&self) -> Result<()> {
        let ctx = PlatformContext::resolve(Overrides::from_env())?;
        println!("{}", ctx.version_string);
        Ok(())
    }
}
