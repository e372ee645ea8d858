//! Team commands - create, inspect and deactivate teams

use clap::{Args, Subcommand};
use rota_core::CascadeReport;
use rota_db::TeamMember;
use serde_json::{json, Value};

use super::{print_json, Context};

/// Manage teams
#[derive(Args, Debug)]
pub struct TeamArgs {
    #[command(subcommand)]
    command: TeamCommand,
}

#[derive(Subcommand, Debug)]
enum TeamCommand {
    /// Create a team and upsert its members
    Add {
        /// Team name
        name: String,

        /// Member as id:username or id:username:inactive (repeatable)
        #[arg(long = "member", value_parser = parse_member)]
        members: Vec<TeamMember>,
    },

    /// Show a team and its members
    Get {
        /// Team name
        name: String,
    },

    /// Deactivate every member and fix up their open reviews
    Deactivate {
        /// Team name
        name: String,
    },
}

impl TeamArgs {
    /// Execute the team command
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let service = ctx.service();

        match &self.command {
            TeamCommand::Add { name, members } => {
                let team = ctx.guard(service.create_team(name, members)).await?;
                print_json(&json!({ "team": team }))
            }
            TeamCommand::Get { name } => {
                let team = ctx.guard(service.get_team(name)).await?;
                print_json(&json!({ "team": team }))
            }
            TeamCommand::Deactivate { name } => {
                // The cascade watches the token itself so it can report partial totals
                let report = service.mass_deactivate(name, ctx.cancel_token()).await?;
                print_json(&deactivation_body(name, &report)?)
            }
        }
    }
}

/// Cascade totals with the team name alongside
fn deactivation_body(team_name: &str, report: &CascadeReport) -> serde_json::Result<Value> {
    let mut body = serde_json::to_value(report)?;
    body["team_name"] = json!(team_name);
    Ok(body)
}

fn parse_member(s: &str) -> Result<TeamMember, String> {
    let mut parts = s.splitn(3, ':');
    let id = parts.next().unwrap_or_default().trim();
    let username = parts.next().map(str::trim).unwrap_or_default();

    if id.is_empty() || username.is_empty() {
        return Err(format!("expected id:username[:inactive], got {:?}", s));
    }

    let active = match parts.next().map(str::trim) {
        None | Some("active") => true,
        Some("inactive") => false,
        Some(other) => return Err(format!("unknown member flag {:?}", other)),
    };

    Ok(TeamMember::new(id, username).with_active(active))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_member() {
        let member = parse_member("u1:Alice").unwrap();
        assert_eq!(member.user_id, "u1");
        assert_eq!(member.username, "Alice");
        assert!(member.is_active);

        let member = parse_member("u2:Bob:inactive").unwrap();
        assert!(!member.is_active);

        assert!(parse_member("u3").is_err());
        assert!(parse_member(":Carol").is_err());
        assert!(parse_member("u4:Dan:retired").is_err());
    }

    #[test]
    fn test_deactivation_body() {
        let report = CascadeReport {
            reassigned: 1,
            removed: 2,
        };
        let body = deactivation_body("backend", &report).unwrap();
        assert_eq!(
            body,
            json!({ "team_name": "backend", "reassigned": 1, "removed": 2 })
        );
    }
}
