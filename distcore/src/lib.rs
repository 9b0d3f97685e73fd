//! Engine for the bootstrap build driver: platform resolution, build-rule
//! tables, source selection, staleness, generation, compilation/linking, and
//! the orchestrator that drives them over a fixed subtree order.

pub mod builder;
pub mod buildtag;
pub mod generate;
pub mod orchestrator;
pub mod platform;
pub mod select;
pub mod setup;
pub mod stale;
pub mod tables;
pub mod translate;
pub mod version;
pub mod workdir;

pub use builder::{BuildError, BuildOutcome, TargetKind};
pub use orchestrator::{bootstrap, install_subtree, OrchestratorError};
pub use platform::{Overrides, PlatformContext, PlatformError};
