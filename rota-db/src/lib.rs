//! Database layer for Rota
//!
//! Persists teams, users, pull requests and reviewer assignments in SQLite.
//! Uniqueness constraints and per-statement transactions are what make
//! "create once" and "assign once" hold under concurrent callers.

mod connection;
pub mod error;
pub mod models;
pub mod repos;

pub use connection::{Database, DatabaseConfig};
pub use error::{Error, Result};
pub use models::{
    AssignmentCount, OpenAssignment, PrStatus, PullRequest, PullRequestSummary, Team, TeamMember,
    User,
};
pub use repos::{
    NewPullRequest, PairChange, PullRequestRepository, ReviewerRepository, TeamRepository,
    UserRepository,
};

impl Database {
    /// Get the team repository
    pub fn teams(&self) -> TeamRepository<'_> {
        TeamRepository::new(self.pool())
    }

    /// Get the user repository
    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(self.pool())
    }

    /// Get the pull request repository
    pub fn pull_requests(&self) -> PullRequestRepository<'_> {
        PullRequestRepository::new(self.pool())
    }

    /// Get the reviewer assignment repository
    pub fn reviewers(&self) -> ReviewerRepository<'_> {
        ReviewerRepository::new(self.pool())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tempfile::TempDir;

    /// Fresh database in its own temp directory; keep the `TempDir` alive
    pub async fn setup_db() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::connect(DatabaseConfig::new(dir.path().join("test.db")))
            .await
            .unwrap();
        (dir, db)
    }

    /// Create a team whose members are named after their ids
    pub async fn seed_team(db: &Database, team_name: &str, members: &[(&str, bool)]) {
        let members: Vec<TeamMember> = members
            .iter()
            .map(|(id, active)| TeamMember::new(*id, format!("User {}", id)).with_active(*active))
            .collect();
        db.teams()
            .create_with_members(team_name, &members)
            .await
            .unwrap();
    }
}
