use anyhow::Result;
use clap::Parser;
use distcore::{Overrides, PlatformContext};

/// Remove generated files and prior build artifacts.
#[derive(Debug, Parser)]
pub(crate) struct Clean {}

impl Clean {
    pub(crate) fn run(&self) -> Result<()> {
        let ctx = PlatformContext::resolve(Overrides::from_env())?;
        distcore::setup::clean(&ctx)?;
        Ok(())
    }
}
