mod banner;
mod bootstrap;
mod clean;
mod env;
mod install;
mod version;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use env_logger::Builder;
use log::LevelFilter;

/// A self-contained bootstrap build driver.
#[derive(Debug, Parser)]
#[clap(about, long_about = None)]
pub(crate) struct Args {
    /// Increase verbosity; may be repeated.
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub(crate) verbose: u8,

    #[clap(subcommand)]
    pub(crate) subcommand: Subcommand,
}

#[derive(Debug, Parser)]
pub(crate) enum Subcommand {
    /// Print resolved environment variables.
    Env(env::Env),
    /// Clean, set up, then build the fixed toolchain build order.
    Bootstrap(bootstrap::Bootstrap),
    /// Build one or more subtrees.
    Install(install::Install),
    /// Remove generated files and prior build artifacts.
    Clean(clean::Clean),
    /// Print an installation summary.
    Banner(banner::Banner),
    /// Print the resolved version string.
    Version(version::Version),
    /// Print usage and exit.
    Usage,
}

pub(crate) fn run(args: Args) -> Result<()> {
    match args.subcommand {
        Subcommand::Env(c) => c.run(),
        Subcommand::Bootstrap(c) => c.run(),
        Subcommand::Install(c) => c.run(),
        Subcommand::Clean(c) => c.run(),
        Subcommand::Banner(c) => c.run(),
        Subcommand::Version(c) => c.run(),
        Subcommand::Usage => {
            Args::command().print_long_help()?;
            std::process::exit(2);
        }
    }
}

/// Initializes the logger from the repeated `-v` count when `RUST_LOG` is
/// not present. If present, `RUST_LOG` overrides the flag.
pub(crate) fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    match std::env::var(env_logger::DEFAULT_FILTER_ENV).ok() {
        Some(_) => {
            Builder::from_default_env().init();
        }
        None => {
            Builder::new()
                .filter(Some(env!("CARGO_CRATE_NAME")), level)
                .init();
        }
    }
}
