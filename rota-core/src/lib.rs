//! Rota Core - reviewer assignment for team-based pull request review
//!
//! Picks reviewers for new pull requests from the author's team, swaps
//! reviewers on request, and cleans up open reviews when a whole team is
//! deactivated. All consistency comes from conditional writes in the store;
//! nothing here holds locks or caches reads.

pub mod assignment;
pub mod config;
pub mod error;
pub mod service;

pub use assignment::{
    Allocator, CandidatePicker, Cascade, CascadeReport, Coordinator, Eligibility, OrderedPicker,
    RandomPicker, Reassignment, REVIEWERS_PER_PR,
};
pub use config::Config;
pub use error::{Entity, Error, ErrorKind, Result};
pub use service::ReviewService;

pub use tokio_util::sync::CancellationToken;

#[cfg(test)]
pub(crate) mod test_support {
    use rota_db::{Database, DatabaseConfig, TeamMember};
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
