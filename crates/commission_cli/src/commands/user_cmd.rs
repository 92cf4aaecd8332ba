use std::path::{Path, PathBuf};

use clap::Subcommand;
use commission_manager::{
    CommissionDocument, CommissionError, CustomizedUser, UserCommissionLookup, UserIdentity,
};
use tracing::{debug, info, instrument};

use super::context::{parse_user_id, read_document, render_json, CommandContext};
use crate::errors::Error;

#[cfg(test)]
#[path = "user_cmd_tests.rs"]
mod tests;

/// Subcommands for per-user commissions
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Show the stored override of a user
    Show {
        /// Id of the user
        user_id: i64,
    },

    /// Show the commissions that apply to a user, global values filled in
    Effective {
        /// Id of the user
        user_id: i64,
    },

    /// Replace the override of a user
    Set {
        /// Id of the user
        user_id: i64,

        /// JSON file holding the complete commission document
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Remove every customization of a user
    Reset {
        /// Id of the user
        user_id: i64,
    },

    /// List users with customized commissions
    List,

    /// Add a user to the data file
    Register {
        /// Id of the user
        user_id: i64,

        /// Email address of the user
        #[arg(short, long)]
        email: String,

        /// Register the user without a settings record
        #[arg(long)]
        without_settings: bool,
    },
}

/// Execute the user command
#[instrument]
pub async fn execute(cmd: UserCommands, config_path: Option<&str>) -> Result<(), Error> {
    let context = CommandContext::load(config_path)?;
    match cmd {
        UserCommands::Show { user_id } => match show_user(&context, user_id).await? {
            UserCommissionLookup::Customized(document) => println!("{}", render_json(&document)?),
            UserCommissionLookup::NotCustomized => {
                println!("User {} has no custom commissions", user_id)
            }
            UserCommissionLookup::UserNotFound => {
                return Err(CommissionError::UserNotFound {
                    user_id: parse_user_id(user_id)?,
                }
                .into())
            }
        },
        UserCommands::Effective { user_id } => match effective_user(&context, user_id).await? {
            Some(document) => println!("{}", render_json(&document)?),
            None => println!("No commissions configured"),
        },
        UserCommands::Set { user_id, file } => {
            set_user(&context, user_id, &file).await?;
            println!("Commissions of user {} updated", user_id);
        }
        UserCommands::Reset { user_id } => {
            reset_user(&context, user_id).await?;
            println!("Commissions of user {} reset", user_id);
        }
        UserCommands::List => {
            let users = list_users(&context).await?;
            if users.is_empty() {
                println!("No users with custom commissions");
            } else {
                println!("{}", render_json(&users)?);
            }
        }
        UserCommands::Register {
            user_id,
            email,
            without_settings,
        } => {
            register_user(&context, user_id, &email, !without_settings).await?;
            println!("User {} registered", user_id);
        }
    }
    Ok(())
}

pub async fn show_user(
    context: &CommandContext,
    user_id: i64,
) -> Result<UserCommissionLookup, Error> {
    let user_id = parse_user_id(user_id)?;
    Ok(context.service.get_user_override(user_id).await?)
}

pub async fn effective_user(
    context: &CommandContext,
    user_id: i64,
) -> Result<Option<CommissionDocument>, Error> {
    let user_id = parse_user_id(user_id)?;
    Ok(context.service.effective_user_commissions(user_id).await?)
}

/// Replaces the override of a user with the document stored in `file`.
pub async fn set_user(context: &CommandContext, user_id: i64, file: &Path) -> Result<(), Error> {
    let user_id = parse_user_id(user_id)?;
    let document = read_document(file)?;
    debug!(message = "Submitting user commissions", user_id = %user_id, file = ?file);
    Ok(context
        .service
        .set_user_override(&context.actor(), user_id, &document)
        .await?)
}

pub async fn reset_user(context: &CommandContext, user_id: i64) -> Result<(), Error> {
    let user_id = parse_user_id(user_id)?;
    Ok(context
        .service
        .reset_user_override(&context.actor(), user_id)
        .await?)
}

pub async fn list_users(context: &CommandContext) -> Result<Vec<CustomizedUser>, Error> {
    Ok(context.service.list_customized_users().await?)
}

/// Adds a user to the data file, replacing any record with the same id.
pub async fn register_user(
    context: &CommandContext,
    user_id: i64,
    email: &str,
    with_settings: bool,
) -> Result<(), Error> {
    let user_id = parse_user_id(user_id)?;
    if email.trim().is_empty() {
        return Err(Error::InvalidArguments("email must not be empty".to_string()));
    }

    context
        .repository
        .register_user(UserIdentity::new(user_id, email.trim()), with_settings)
        .await?;
    info!(message = "Registered user", user_id = %user_id);
    Ok(())
}
