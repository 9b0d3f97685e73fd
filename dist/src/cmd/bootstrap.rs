use anyhow::Result;
use clap::Parser;
use distcore::{Overrides, PlatformContext};

/// Clean, set up, then build the fixed toolchain build order, producing
/// `bin/tool/pm_bootstrap`.
#[derive(Debug, Parser)]
pub(crate) struct Bootstrap {}

impl Bootstrap {
    pub(crate) fn run(&self) -> Result<()> {
        let ctx = PlatformContext::resolve(Overrides::from_env())?;
        distcore::bootstrap(&ctx)?;
        Ok(())
    }
}
