//! Bootstrap orchestrator: walks the fixed build order sequentially,
//! invoking the builder on each resolved subtree.

use log::info;
use snafu::Snafu;

use crate::builder::{self, BuildError};
use crate::platform::PlatformContext;
use crate::setup::{self, SetupError};
use crate::tables::BUILD_ORDER;

#[derive(Debug, Snafu)]
pub enum OrchestratorError {
    #[snafu(display("{source}"))]
    Setup { source: SetupError },
    #[snafu(display("building '{subtree}': {source}"))]
    Build { subtree: String, source: BuildError },
}

type Result<T, E = OrchestratorError> = std::result::Result<T, E>;

impl From<SetupError> for OrchestratorError {
    fn from(source: SetupError) -> Self {
        OrchestratorError::Setup { source }
    }
}

/// Runs `clean`, then `setup`, then builds every subtree in [`BUILD_ORDER`],
/// substituting `%s` with the current arch letter. Strictly sequential
/// across subtrees; parallelism is confined to each subtree's compile phase.
pub fn bootstrap(ctx: &PlatformContext) -> Result<()> {
    setup::clean(ctx)?;
    setup::prepare(ctx)?;

    for pattern in BUILD_ORDER {
        let subtree = ctx.resolve_pattern(pattern);
        install_subtree(ctx, &subtree)?;
    }
    Ok(())
}

/// Builds a single subtree, used by both `bootstrap` and the `install`
/// subcommand.
pub fn install_subtree(ctx: &PlatformContext, subtree: &str) -> Result<()> {
    info!("installing {subtree}");
    match builder::build_subtree(ctx, subtree) {
        Ok(Some(_)) => info!("{subtree}: built"),
        Ok(None) => info!("{subtree}: up to date"),
        Err(source) => {
            return Err(OrchestratorError::Build { subtree: subtree.to_string(), source })
        }
    }
    Ok(())
}
