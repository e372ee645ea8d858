//! Reviewer reassignment

use std::collections::BTreeSet;

use rota_db::{Database, PairChange, PullRequest};
use tracing::info;

use super::{CandidatePicker, Eligibility};
use crate::error::{Entity, Error};
use crate::Result;

/// Outcome of a successful reassignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassignment {
    /// The PR after the swap
    pub pull_request: PullRequest,
    /// Reviewer that took over
    pub replaced_by: String,
}

/// Swaps one reviewer of an open PR for another member of the departing reviewer's team
pub struct Coordinator<'a> {
    db: &'a Database,
    picker: &'a dyn CandidatePicker,
}

impl<'a> Coordinator<'a> {
    pub fn new(db: &'a Database, picker: &'a dyn CandidatePicker) -> Self {
        Self { db, picker }
    }

    /// Replace `old_user_id` on `pull_request_id`
    ///
    /// Preconditions are checked in order: the PR exists, it is OPEN, and
    /// `old_user_id` currently reviews it. The replacement excludes the author,
    /// every current reviewer and the departing reviewer. The swap itself is
    /// conditional, so a concurrent reassignment or merge that lands first
    /// surfaces as `NotAssigned` or `PrMerged` here.
    pub async fn reassign(&self, pull_request_id: &str, old_user_id: &str) -> Result<Reassignment> {
        let pr = self.load(pull_request_id).await?;

        if pr.status.is_terminal() {
            return Err(Error::PrMerged(pull_request_id.to_string()));
        }
        if !pr.has_reviewer(old_user_id) {
            return Err(self.not_assigned(pull_request_id, old_user_id));
        }

        let team_name = self
            .db
            .users()
            .team_of(old_user_id)
            .await?
            .ok_or_else(|| Error::not_found(Entity::User, old_user_id))?;

        let mut exclude: BTreeSet<String> = pr.reviewers.iter().cloned().collect();
        exclude.insert(old_user_id.to_string());
        exclude.insert(pr.author_id.clone());

        let replacement = Eligibility::new(self.db, self.picker)
            .pick_one(&team_name, &exclude)
            .await?
            .ok_or_else(|| Error::NoCandidate {
                pull_request_id: pull_request_id.to_string(),
                user_id: old_user_id.to_string(),
            })?;

        match self
            .db
            .reviewers()
            .replace(pull_request_id, old_user_id, &replacement)
            .await?
        {
            PairChange::Applied => {}
            PairChange::NotAssigned => return Err(self.not_assigned(pull_request_id, old_user_id)),
            PairChange::PrMerged => return Err(Error::PrMerged(pull_request_id.to_string())),
        }

        info!(
            pull_request_id,
            old_reviewer = old_user_id,
            new_reviewer = %replacement,
            "Reassigned reviewer"
        );

        Ok(Reassignment {
            pull_request: self.load(pull_request_id).await?,
            replaced_by: replacement,
        })
    }

    async fn load(&self, pull_request_id: &str) -> Result<PullRequest> {
        self.db
            .pull_requests()
            .find(pull_request_id)
            .await?
            .ok_or_else(|| Error::not_found(Entity::PullRequest, pull_request_id))
    }

    fn not_assigned(&self, pull_request_id: &str, user_id: &str) -> Error {
        Error::NotAssigned {
            pull_request_id: pull_request_id.to_string(),
            user_id: user_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::{Allocator, OrderedPicker};
    use crate::test_support::{seed_team, setup_db};
    use chrono::Utc;

    async fn seeded_pr(db: &Database) -> PullRequest {
        // OrderedPicker assigns u2 and u3
        seed_team(db, "backend", &[("u1", true), ("u2", true), ("u3", true), ("u4", true)]).await;
        Allocator::new(db, &OrderedPicker)
            .create_pr("pr-1", "Add search", "u1")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_reassign_swaps_in_remaining_teammate() {
        let (_dir, db) = setup_db().await;
        let pr = seeded_pr(&db).await;
        assert_eq!(pr.reviewers, vec!["u2".to_string(), "u3".to_string()]);

        let outcome = Coordinator::new(&db, &OrderedPicker)
            .reassign("pr-1", "u2")
            .await
            .unwrap();

        assert_eq!(outcome.replaced_by, "u4");
        assert_eq!(
            outcome.pull_request.reviewers,
            vec!["u3".to_string(), "u4".to_string()]
        );
    }

    #[tokio::test]
    async fn test_reassign_uses_departing_reviewers_team() {
        let (_dir, db) = setup_db().await;
        seed_team(&db, "backend", &[("u1", true), ("u2", true)]).await;
        seed_team(&db, "frontend", &[("f1", true), ("f2", true)]).await;
        Allocator::new(&db, &OrderedPicker)
            .create_pr("pr-1", "Fix", "u1")
            .await
            .unwrap();

        // move u2 to frontend after assignment
        let mut u2 = db.users().find("u2").await.unwrap().unwrap();
        u2.team_name = "frontend".to_string();
        db.users().upsert(&u2).await.unwrap();

        let outcome = Coordinator::new(&db, &OrderedPicker)
            .reassign("pr-1", "u2")
            .await
            .unwrap();
        assert_eq!(outcome.replaced_by, "f1");
    }

    #[tokio::test]
    async fn test_reassign_without_candidate() {
        let (_dir, db) = setup_db().await;
        seeded_pr(&db).await;
        db.users().set_active("u4", false).await.unwrap();

        let err = Coordinator::new(&db, &OrderedPicker)
            .reassign("pr-1", "u2")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoCandidate { .. }));

        // nothing changed
        let reviewers = db.reviewers().reviewers_of("pr-1").await.unwrap();
        assert_eq!(reviewers, vec!["u2".to_string(), "u3".to_string()]);
    }

    #[tokio::test]
    async fn test_reassign_precondition_order() {
        let (_dir, db) = setup_db().await;
        seeded_pr(&db).await;
        let coordinator = Coordinator::new(&db, &OrderedPicker);

        let err = coordinator.reassign("missing", "u2").await.unwrap_err();
        assert!(matches!(
            err,
            Error::NotFound {
                entity: Entity::PullRequest,
                ..
            }
        ));

        let err = coordinator.reassign("pr-1", "u4").await.unwrap_err();
        assert!(matches!(err, Error::NotAssigned { .. }));

        db.pull_requests().merge("pr-1", Utc::now()).await.unwrap();

        // merged wins over not-assigned
        let err = coordinator.reassign("pr-1", "u4").await.unwrap_err();
        assert!(matches!(err, Error::PrMerged(_)));
        let err = coordinator.reassign("pr-1", "u2").await.unwrap_err();
        assert!(matches!(err, Error::PrMerged(_)));
    }

    #[tokio::test]
    async fn test_author_is_never_a_replacement() {
        let (_dir, db) = setup_db().await;
        seed_team(&db, "backend", &[("u1", true), ("u2", true), ("u3", true)]).await;
        Allocator::new(&db, &OrderedPicker)
            .create_pr("pr-1", "Fix", "u1")
            .await
            .unwrap();

        let err = Coordinator::new(&db, &OrderedPicker)
            .reassign("pr-1", "u2")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoCandidate { .. }));
    }
}
