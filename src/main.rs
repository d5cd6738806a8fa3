//! Execution API CLI
//!
//! Submits spec directories to a running execution server and prints the
//! lifecycle stream as it arrives.

use clap::Parser;
use execution_api::{cli, commands::Commands, common::logging};

#[derive(Parser)]
#[command(name = "execution-api", about = "Run specs through the execution API")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    logging::init_cli();

    let cli = Cli::parse();

    match cli::dispatch(cli.command).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
