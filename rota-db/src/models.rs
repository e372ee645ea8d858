//! Data models for database records

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// A member of a team as stored in the users table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TeamMember {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

impl TeamMember {
    /// Create an active team member
    pub fn new(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            is_active: true,
        }
    }

    /// Set the active flag
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }
}

/// A team and its members, ordered by user id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub team_name: String,
    pub members: Vec<TeamMember>,
}

/// A user record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
}

/// Pull request status
///
/// `Merged` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrStatus {
    Open,
    Merged,
}

impl PrStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrStatus::Open => "OPEN",
            PrStatus::Merged => "MERGED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PrStatus::Merged)
    }
}

impl fmt::Display for PrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(PrStatus::Open),
            "MERGED" => Ok(PrStatus::Merged),
            other => Err(Error::InvalidData(format!("Unknown PR status: {}", other))),
        }
    }
}

/// Full pull request view including its current reviewers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    #[serde(rename = "pull_request_id")]
    pub id: String,
    #[serde(rename = "pull_request_name")]
    pub name: String,
    pub author_id: String,
    pub status: PrStatus,
    /// Current reviewer ids, ordered by id
    #[serde(rename = "assigned_reviewers")]
    pub reviewers: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "mergedAt", skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    /// Whether the given user currently reviews this PR
    pub fn has_reviewer(&self, user_id: &str) -> bool {
        self.reviewers.iter().any(|r| r == user_id)
    }
}

/// Short pull request view used in reviewer listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestSummary {
    #[serde(rename = "pull_request_id")]
    pub id: String,
    #[serde(rename = "pull_request_name")]
    pub name: String,
    pub author_id: String,
    pub status: PrStatus,
}

/// Number of live reviewer assignments held by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AssignmentCount {
    pub user_id: String,
    pub count: i64,
}

/// A reviewer assignment on an open PR, joined with the PR author
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct OpenAssignment {
    pub pull_request_id: String,
    pub reviewer_id: String,
    pub author_id: String,
}

/// Raw pull_requests row
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct PullRequestRow {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequestRow {
    pub(crate) fn into_summary(self) -> crate::Result<PullRequestSummary> {
        Ok(PullRequestSummary {
            status: self.status.parse()?,
            id: self.pull_request_id,
            name: self.pull_request_name,
            author_id: self.author_id,
        })
    }

    pub(crate) fn into_pull_request(self, reviewers: Vec<String>) -> crate::Result<PullRequest> {
        Ok(PullRequest {
            status: self.status.parse()?,
            id: self.pull_request_id,
            name: self.pull_request_name,
            author_id: self.author_id,
            reviewers,
            created_at: self.created_at,
            merged_at: self.merged_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pr_status_round_trip() {
        assert_eq!("OPEN".parse::<PrStatus>().unwrap(), PrStatus::Open);
        assert_eq!("MERGED".parse::<PrStatus>().unwrap(), PrStatus::Merged);
        assert!("closed".parse::<PrStatus>().is_err());
        assert!(PrStatus::Merged.is_terminal());
        assert!(!PrStatus::Open.is_terminal());
    }

    #[test]
    fn test_pull_request_serialization() {
        let pr = PullRequest {
            id: "pr-1".to_string(),
            name: "Add feature".to_string(),
            author_id: "u1".to_string(),
            status: PrStatus::Open,
            reviewers: vec!["u2".to_string(), "u3".to_string()],
            created_at: Utc::now(),
            merged_at: None,
        };

        let json = serde_json_value(&pr);
        assert_eq!(json["pull_request_id"], "pr-1");
        assert_eq!(json["status"], "OPEN");
        assert_eq!(json["assigned_reviewers"][1], "u3");
        assert!(json.get("mergedAt").is_none());
        assert!(pr.has_reviewer("u2"));
        assert!(!pr.has_reviewer("u1"));
    }

    fn serde_json_value<T: Serialize>(value: &T) -> serde_json::Value {
        serde_json::to_value(value).unwrap()
    }

    #[test]
    fn test_team_member_builder() {
        let member = TeamMember::new("u1", "Alice").with_active(false);
        assert_eq!(member.user_id, "u1");
        assert!(!member.is_active);
    }
}
