//! CLI command definitions

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Run specs and stream their results
    Run {
        /// Spec directories or files to execute
        #[arg(required = true)]
        specs: Vec<String>,

        /// Print every response as a JSON line instead of a summary
        #[arg(long)]
        json: bool,
    },
}
