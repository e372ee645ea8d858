//! Pull request commands

use clap::{Args, Subcommand};
use serde_json::json;

use super::{print_json, Context};

/// Manage pull requests and their reviewers
#[derive(Args, Debug)]
pub struct PrArgs {
    #[command(subcommand)]
    command: PrCommand,
}

#[derive(Subcommand, Debug)]
enum PrCommand {
    /// Open a pull request and assign reviewers from the author's team
    Create {
        /// Pull request id
        id: String,

        /// Pull request title
        name: String,

        /// Author's user id
        #[arg(long)]
        author: String,
    },

    /// Show a pull request and its reviewers
    Get {
        /// Pull request id
        id: String,
    },

    /// Mark a pull request merged
    Merge {
        /// Pull request id
        id: String,
    },

    /// Replace one reviewer with another member of their team
    Reassign {
        /// Pull request id
        id: String,

        /// Reviewer to replace
        #[arg(long)]
        old: String,
    },
}

impl PrArgs {
    /// Execute the pr command
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let service = ctx.service();

        match &self.command {
            PrCommand::Create { id, name, author } => {
                let pr = ctx.guard(service.create_pr(id, name, author)).await?;
                print_json(&json!({ "pr": pr }))
            }
            PrCommand::Get { id } => {
                let pr = ctx.guard(service.get_pr(id)).await?;
                print_json(&json!({ "pr": pr }))
            }
            PrCommand::Merge { id } => {
                let pr = ctx.guard(service.merge_pr(id)).await?;
                print_json(&json!({ "pr": pr }))
            }
            PrCommand::Reassign { id, old } => {
                let outcome = ctx.guard(service.reassign_reviewer(id, old)).await?;
                print_json(&json!({
                    "pr": outcome.pull_request,
                    "replaced_by": outcome.replaced_by,
                }))
            }
        }
    }
}
