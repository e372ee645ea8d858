//! Initial reviewer allocation for new pull requests

use std::collections::BTreeSet;

use rota_db::{Database, NewPullRequest, PullRequest};
use tracing::{debug, info};

use super::{CandidatePicker, Eligibility};
use crate::error::{Entity, Error};
use crate::Result;

/// Maximum reviewers assigned when a PR is created
pub const REVIEWERS_PER_PR: usize = 2;

/// Creates pull requests with up to [`REVIEWERS_PER_PR`] reviewers from the author's team
pub struct Allocator<'a> {
    db: &'a Database,
    picker: &'a dyn CandidatePicker,
}

impl<'a> Allocator<'a> {
    pub fn new(db: &'a Database, picker: &'a dyn CandidatePicker) -> Self {
        Self { db, picker }
    }

    /// Create an OPEN pull request and assign its initial reviewers
    ///
    /// Fewer than two eligible teammates is not an error; the PR is created
    /// with whoever is available. The PR row and its reviewer pairs are
    /// written together.
    pub async fn create_pr(&self, id: &str, name: &str, author_id: &str) -> Result<PullRequest> {
        if self.db.pull_requests().exists(id).await? {
            return Err(Error::PrExists(id.to_string()));
        }

        let team_name = self
            .db
            .users()
            .team_of(author_id)
            .await?
            .ok_or_else(|| Error::not_found(Entity::User, author_id))?;

        let exclude = BTreeSet::from([author_id.to_string()]);
        let reviewers = Eligibility::new(self.db, self.picker)
            .pick(&team_name, &exclude, REVIEWERS_PER_PR)
            .await?;

        if reviewers.len() < REVIEWERS_PER_PR {
            debug!(
                pull_request_id = id,
                team = %team_name,
                assigned = reviewers.len(),
                "Author's team has too few eligible reviewers"
            );
        }

        let new_pr = NewPullRequest::new(id, name, author_id);
        self.db
            .pull_requests()
            .create_with_reviewers(&new_pr, &reviewers)
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    Error::PrExists(id.to_string())
                } else {
                    Error::Database(e)
                }
            })?;

        info!(
            pull_request_id = id,
            author_id,
            ?reviewers,
            "Created pull request"
        );

        self.db
            .pull_requests()
            .find(id)
            .await?
            .ok_or_else(|| Error::not_found(Entity::PullRequest, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::{OrderedPicker, RandomPicker};
    use crate::test_support::{seed_team, setup_db};
    use rota_db::PrStatus;

    #[tokio::test]
    async fn test_create_assigns_two_teammates() {
        let (_dir, db) = setup_db().await;
        seed_team(&db, "backend", &[("u1", true), ("u2", true), ("u3", true), ("u4", true)]).await;
        seed_team(&db, "frontend", &[("f1", true)]).await;

        let picker = RandomPicker::seeded(11);
        let pr = Allocator::new(&db, &picker)
            .create_pr("pr-1", "Add search", "u1")
            .await
            .unwrap();

        assert_eq!(pr.id, "pr-1");
        assert_eq!(pr.name, "Add search");
        assert_eq!(pr.author_id, "u1");
        assert_eq!(pr.status, PrStatus::Open);
        assert!(pr.merged_at.is_none());
        assert_eq!(pr.reviewers.len(), 2);
        assert!(!pr.has_reviewer("u1"));
        assert!(!pr.has_reviewer("f1"));
    }

    #[tokio::test]
    async fn test_create_with_one_candidate() {
        let (_dir, db) = setup_db().await;
        seed_team(&db, "backend", &[("u1", true), ("u2", true), ("u3", false)]).await;

        let pr = Allocator::new(&db, &OrderedPicker)
            .create_pr("pr-1", "Fix", "u1")
            .await
            .unwrap();
        assert_eq!(pr.reviewers, vec!["u2".to_string()]);
    }

    #[tokio::test]
    async fn test_create_with_no_candidates() {
        let (_dir, db) = setup_db().await;
        seed_team(&db, "solo", &[("u1", true)]).await;

        let pr = Allocator::new(&db, &OrderedPicker)
            .create_pr("pr-1", "Fix", "u1")
            .await
            .unwrap();
        assert!(pr.reviewers.is_empty());
        assert_eq!(pr.status, PrStatus::Open);
    }

    #[tokio::test]
    async fn test_inactive_author_may_open_pr() {
        let (_dir, db) = setup_db().await;
        seed_team(&db, "backend", &[("u1", false), ("u2", true)]).await;

        let pr = Allocator::new(&db, &OrderedPicker)
            .create_pr("pr-1", "Fix", "u1")
            .await
            .unwrap();
        assert_eq!(pr.reviewers, vec!["u2".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() {
        let (_dir, db) = setup_db().await;
        seed_team(&db, "backend", &[("u1", true), ("u2", true)]).await;
        let allocator = Allocator::new(&db, &OrderedPicker);

        allocator.create_pr("pr-1", "Fix", "u1").await.unwrap();
        let err = allocator.create_pr("pr-1", "Other", "u2").await.unwrap_err();
        assert!(matches!(err, Error::PrExists(ref id) if id == "pr-1"));

        // first PR untouched
        let pr = db.pull_requests().find("pr-1").await.unwrap().unwrap();
        assert_eq!(pr.name, "Fix");
        assert_eq!(pr.author_id, "u1");
    }

    #[tokio::test]
    async fn test_unknown_author_is_not_found() {
        let (_dir, db) = setup_db().await;

        let err = Allocator::new(&db, &OrderedPicker)
            .create_pr("pr-1", "Fix", "ghost")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::NotFound {
                entity: Entity::User,
                ..
            }
        ));
        assert!(!db.pull_requests().exists("pr-1").await.unwrap());
    }
}
