//! Review service
//!
//! Single entry point for team, user and pull request operations. Holds the
//! store handle and the candidate picker shared by every assignment path.

use std::sync::Arc;

use chrono::Utc;
use rota_db::{AssignmentCount, Database, PullRequest, PullRequestSummary, Team, TeamMember, User};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::assignment::{
    Allocator, CandidatePicker, Cascade, CascadeReport, Coordinator, RandomPicker, Reassignment,
};
use crate::error::{Entity, Error};
use crate::Result;

/// Reviewer assignment operations over a [`Database`]
#[derive(Clone)]
pub struct ReviewService {
    db: Database,
    picker: Arc<dyn CandidatePicker>,
}

impl ReviewService {
    /// Service with an unseeded random picker
    pub fn new(db: Database) -> Self {
        Self::with_picker(db, RandomPicker::new())
    }

    /// Service with a caller-supplied picker
    pub fn with_picker(db: Database, picker: impl CandidatePicker + 'static) -> Self {
        Self {
            db,
            picker: Arc::new(picker),
        }
    }

    /// Underlying store
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Create a team and upsert its members
    ///
    /// Members that already exist elsewhere are moved into this team with the
    /// given username and active flag.
    pub async fn create_team(&self, team_name: &str, members: &[TeamMember]) -> Result<Team> {
        let teams = self.db.teams();
        if teams.exists(team_name).await? {
            return Err(Error::TeamExists(team_name.to_string()));
        }

        teams
            .create_with_members(team_name, members)
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    Error::TeamExists(team_name.to_string())
                } else {
                    Error::Database(e)
                }
            })?;

        info!(team = team_name, members = members.len(), "Created team");
        self.get_team(team_name).await
    }

    /// Get a team and its members
    pub async fn get_team(&self, team_name: &str) -> Result<Team> {
        self.db
            .teams()
            .find(team_name)
            .await?
            .ok_or_else(|| Error::not_found(Entity::Team, team_name))
    }

    /// Set a user's active flag
    ///
    /// Existing assignments are left alone; only future eligibility changes.
    pub async fn set_user_active(&self, user_id: &str, active: bool) -> Result<User> {
        let user = self
            .db
            .users()
            .set_active(user_id, active)
            .await?
            .ok_or_else(|| Error::not_found(Entity::User, user_id))?;

        info!(user_id, active, "Updated user activity");
        Ok(user)
    }

    /// Create a PR and assign its initial reviewers
    pub async fn create_pr(&self, id: &str, name: &str, author_id: &str) -> Result<PullRequest> {
        Allocator::new(&self.db, self.picker.as_ref())
            .create_pr(id, name, author_id)
            .await
    }

    /// Get a PR with its current reviewers
    pub async fn get_pr(&self, id: &str) -> Result<PullRequest> {
        self.db
            .pull_requests()
            .find(id)
            .await?
            .ok_or_else(|| Error::not_found(Entity::PullRequest, id))
    }

    /// Merge a PR; merging an already merged PR returns it unchanged
    pub async fn merge_pr(&self, id: &str) -> Result<PullRequest> {
        if !self.db.pull_requests().merge(id, Utc::now()).await? {
            return Err(Error::not_found(Entity::PullRequest, id));
        }

        let pr = self.get_pr(id).await?;
        info!(pull_request_id = id, merged_at = ?pr.merged_at, "Merged pull request");
        Ok(pr)
    }

    /// Replace one reviewer of an open PR
    pub async fn reassign_reviewer(
        &self,
        pull_request_id: &str,
        old_user_id: &str,
    ) -> Result<Reassignment> {
        Coordinator::new(&self.db, self.picker.as_ref())
            .reassign(pull_request_id, old_user_id)
            .await
    }

    /// PRs the user currently reviews, in any status
    ///
    /// An unknown user simply has no reviews.
    pub async fn list_prs_for_reviewer(&self, user_id: &str) -> Result<Vec<PullRequestSummary>> {
        Ok(self.db.pull_requests().list_for_reviewer(user_id).await?)
    }

    /// Live assignment counts per user
    pub async fn assignment_stats(&self) -> Result<Vec<AssignmentCount>> {
        Ok(self.db.reviewers().counts().await?)
    }

    /// Deactivate every member of a team and fix up their open reviews
    pub async fn mass_deactivate(
        &self,
        team_name: &str,
        cancel: &CancellationToken,
    ) -> Result<CascadeReport> {
        Cascade::new(&self.db, self.picker.as_ref())
            .deactivate_team(team_name, cancel)
            .await
    }
}
