//! User commands - activity flag and review listings

use clap::{ArgAction, Args, Subcommand};
use serde_json::json;

use super::{print_json, Context};

/// Manage users
#[derive(Args, Debug)]
pub struct UserArgs {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Mark a user active or inactive
    SetActive {
        /// User id
        id: String,

        /// New flag: true or false
        #[arg(action = ArgAction::Set)]
        active: bool,
    },

    /// List the pull requests a user currently reviews
    Reviews {
        /// User id
        id: String,
    },
}

impl UserArgs {
    /// Execute the user command
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let service = ctx.service();

        match &self.command {
            UserCommand::SetActive { id, active } => {
                let user = ctx.guard(service.set_user_active(id, *active)).await?;
                print_json(&json!({ "user": user }))
            }
            UserCommand::Reviews { id } => {
                let prs = ctx.guard(service.list_prs_for_reviewer(id)).await?;
                print_json(&json!({
                    "user_id": id,
                    "pull_requests": prs,
                }))
            }
        }
    }
}
