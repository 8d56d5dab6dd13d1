// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use clap::Parser;
use pose_extract::cli::args::{Cli, Commands};
use pose_extract::cli::extract::run_extraction;

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract(args) => run_extraction(&args),
    }
}
