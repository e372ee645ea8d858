//! Stats command - live assignment counts per user

use clap::Args;
use serde_json::json;

use super::{print_json, Context};

/// Show live assignment counts per user
#[derive(Args, Debug)]
pub struct StatsArgs {}

impl StatsArgs {
    /// Execute the stats command
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let assignments = ctx.guard(ctx.service().assignment_stats()).await?;
        print_json(&json!({ "assignments": assignments }))
    }
}
