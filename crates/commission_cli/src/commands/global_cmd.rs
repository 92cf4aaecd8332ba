use std::path::{Path, PathBuf};

use clap::Subcommand;
use commission_manager::{CommissionDocument, GlobalChangeSummary};
use tracing::{debug, instrument};

use super::context::{read_document, render_json, CommandContext};
use crate::errors::Error;

#[cfg(test)]
#[path = "global_cmd_tests.rs"]
mod tests;

/// Subcommands for the global commission configuration
#[derive(Subcommand, Debug)]
pub enum GlobalCommands {
    /// Show the global commissions
    Show,

    /// Replace the global commissions and reconcile every user override
    Set {
        /// JSON file holding the complete commission document
        #[arg(short, long)]
        file: PathBuf,
    },
}

/// Execute the global command
#[instrument]
pub async fn execute(cmd: GlobalCommands, config_path: Option<&str>) -> Result<(), Error> {
    let context = CommandContext::load(config_path)?;
    match cmd {
        GlobalCommands::Show => match show_global(&context).await? {
            Some(document) => println!("{}", render_json(&document)?),
            None => println!("No global commissions configured"),
        },
        GlobalCommands::Set { file } => {
            let summary = set_global(&context, &file).await?;
            println!("Global commissions updated");
            println!("{}", render_json(&summary)?);
        }
    }
    Ok(())
}

/// The global commissions, `None` when never configured.
pub async fn show_global(context: &CommandContext) -> Result<Option<CommissionDocument>, Error> {
    Ok(context.service.get_global().await?)
}

/// Replaces the global commissions with the document stored in `file`.
///
/// # Errors
///
/// Returns `Error::LoadFile` for an unreadable file and `Error::Commission`
/// when the document is malformed or rejected by the engine.
pub async fn set_global(
    context: &CommandContext,
    file: &Path,
) -> Result<GlobalChangeSummary, Error> {
    let document = read_document(file)?;
    debug!(message = "Submitting global commissions", file = ?file);
    Ok(context
        .service
        .set_global(&context.actor(), &document)
        .await?)
}
