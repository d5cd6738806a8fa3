//! CLI command handling
//!
//! Submits runs to the execution server and renders the response stream.

mod report;

use futures_util::StreamExt;

use crate::commands::Commands;
use crate::common::Result;
use crate::ipc::ExecutionClient;

use report::Report;

/// Dispatch a CLI command, returning the process exit code
pub async fn dispatch(command: Commands) -> Result<i32> {
    match command {
        Commands::Run { specs, json } => {
            let client = ExecutionClient::connect().await?;
            let responses = client.execute(specs).await?;
            futures_util::pin_mut!(responses);

            let mut report = Report::new(json);
            while let Some(response) = responses.next().await {
                let text = report.render(&response?)?;
                if !text.is_empty() {
                    println!("{}", text);
                }
            }

            Ok(report.exit_code())
        }
    }
}
