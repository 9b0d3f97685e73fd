mod cmd;

use clap::Parser;

fn main() {
    let args = cmd::Args::parse();
    cmd::init_logger(args.verbose);

    if let Err(e) = cmd::run(args) {
        eprintln!("error: {e:?}");
        std::process::exit(1);
    }
}
