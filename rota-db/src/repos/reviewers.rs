//! Reviewer assignment repository
//!
//! Every mutation of `pr_reviewers` after PR creation goes through
//! [`ReviewerRepository::replace`] or [`ReviewerRepository::remove`]. Both are
//! conditional on the pair still existing and the PR still being OPEN, and
//! both commit atomically on their own.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::models::AssignmentCount;
use crate::Result;

/// Insert reviewer pairs in a single statement, skipping pairs that already exist
///
/// Returns the number of pairs actually written.
pub(crate) async fn insert_pairs(
    conn: &mut SqliteConnection,
    pull_request_id: &str,
    user_ids: &[String],
) -> Result<u64> {
    if user_ids.is_empty() {
        return Ok(0);
    }

    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new("INSERT OR IGNORE INTO pr_reviewers (pull_request_id, user_id) ");
    query.push_values(user_ids, |mut row, user_id| {
        row.push_bind(pull_request_id.to_string())
            .push_bind(user_id.clone());
    });

    let result = query.build().execute(conn).await?;
    Ok(result.rows_affected())
}

/// Result of a conditional reviewer mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairChange {
    /// The old pair was removed (and the new pair written, for a replace)
    Applied,
    /// The old pair was no longer present; nothing changed
    NotAssigned,
    /// The PR is MERGED; nothing changed
    PrMerged,
}

const DELETE_OPEN_PAIR: &str = "DELETE FROM pr_reviewers
     WHERE pull_request_id = ? AND user_id = ?
       AND EXISTS (
           SELECT 1 FROM pull_requests
           WHERE pull_request_id = pr_reviewers.pull_request_id AND status = 'OPEN'
       )";

/// Repository for managing reviewer assignments
pub struct ReviewerRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ReviewerRepository<'a> {
    /// Create a new reviewer repository
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Current reviewers of a PR, ordered by user id
    pub async fn reviewers_of(&self, pull_request_id: &str) -> Result<Vec<String>> {
        sqlx::query_scalar(
            "SELECT user_id FROM pr_reviewers WHERE pull_request_id = ? ORDER BY user_id",
        )
        .bind(pull_request_id)
        .fetch_all(self.pool)
        .await
        .map_err(Into::into)
    }

    /// Atomically replace `(pr, old_user)` with `(pr, new_user)`
    ///
    /// The new pair is written only if the old pair was deleted, and only
    /// while the PR is OPEN. An already-present new pair is left as is.
    pub async fn replace(
        &self,
        pull_request_id: &str,
        old_user_id: &str,
        new_user_id: &str,
    ) -> Result<PairChange> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(DELETE_OPEN_PAIR)
            .bind(pull_request_id)
            .bind(old_user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            let change = Self::explain_miss(&mut tx, pull_request_id).await?;
            tx.rollback().await?;
            return Ok(change);
        }

        insert_pairs(&mut tx, pull_request_id, &[new_user_id.to_string()]).await?;
        tx.commit().await?;
        Ok(PairChange::Applied)
    }

    /// Atomically delete `(pr, user)` while the PR is OPEN
    pub async fn remove(&self, pull_request_id: &str, user_id: &str) -> Result<PairChange> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(DELETE_OPEN_PAIR)
            .bind(pull_request_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            let change = Self::explain_miss(&mut tx, pull_request_id).await?;
            tx.rollback().await?;
            return Ok(change);
        }

        tx.commit().await?;
        Ok(PairChange::Applied)
    }

    /// Why a conditional delete matched nothing
    async fn explain_miss(
        conn: &mut SqliteConnection,
        pull_request_id: &str,
    ) -> Result<PairChange> {
        let merged: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                 SELECT 1 FROM pull_requests WHERE pull_request_id = ? AND status = 'MERGED'
             )",
        )
        .bind(pull_request_id)
        .fetch_one(conn)
        .await?;

        Ok(if merged {
            PairChange::PrMerged
        } else {
            PairChange::NotAssigned
        })
    }

    /// Live assignment counts per user, ordered by user id
    pub async fn counts(&self) -> Result<Vec<AssignmentCount>> {
        sqlx::query_as::<_, AssignmentCount>(
            "SELECT user_id, cnt AS count FROM stats_assignments ORDER BY user_id",
        )
        .fetch_all(self.pool)
        .await
        .map_err(Into::into)
    }

    /// Total number of live assignment rows
    pub async fn total(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pr_reviewers")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::pull_requests::NewPullRequest;
    use crate::test_support::{seed_team, setup_db};
    use crate::Database;
    use chrono::Utc;

    async fn seed_pr(db: &Database, id: &str, reviewers: &[&str]) {
        let reviewers: Vec<String> = reviewers.iter().map(|r| r.to_string()).collect();
        db.pull_requests()
            .create_with_reviewers(&NewPullRequest::new(id, "Test", "u1"), &reviewers)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_replace_swaps_pair() {
        let (_dir, db) = setup_db().await;
        seed_team(&db, "backend", &[("u1", true), ("u2", true), ("u3", true), ("u4", true)]).await;
        seed_pr(&db, "pr-1", &["u2", "u3"]).await;

        let repo = db.reviewers();
        let change = repo.replace("pr-1", "u2", "u4").await.unwrap();
        assert_eq!(change, PairChange::Applied);
        assert_eq!(repo.reviewers_of("pr-1").await.unwrap(), vec!["u3", "u4"]);
    }

    #[tokio::test]
    async fn test_replace_missing_pair_changes_nothing() {
        let (_dir, db) = setup_db().await;
        seed_team(&db, "backend", &[("u1", true), ("u2", true), ("u3", true), ("u4", true)]).await;
        seed_pr(&db, "pr-1", &["u2"]).await;

        let repo = db.reviewers();
        let change = repo.replace("pr-1", "u3", "u4").await.unwrap();
        assert_eq!(change, PairChange::NotAssigned);
        assert_eq!(repo.reviewers_of("pr-1").await.unwrap(), vec!["u2"]);
    }

    #[tokio::test]
    async fn test_replace_into_existing_pair_is_tolerated() {
        let (_dir, db) = setup_db().await;
        seed_team(&db, "backend", &[("u1", true), ("u2", true), ("u3", true)]).await;
        seed_pr(&db, "pr-1", &["u2", "u3"]).await;

        let repo = db.reviewers();
        let change = repo.replace("pr-1", "u2", "u3").await.unwrap();
        assert_eq!(change, PairChange::Applied);
        assert_eq!(repo.reviewers_of("pr-1").await.unwrap(), vec!["u3"]);
    }

    #[tokio::test]
    async fn test_merged_pr_is_frozen() {
        let (_dir, db) = setup_db().await;
        seed_team(&db, "backend", &[("u1", true), ("u2", true), ("u3", true)]).await;
        seed_pr(&db, "pr-1", &["u2"]).await;
        db.pull_requests().merge("pr-1", Utc::now()).await.unwrap();

        let repo = db.reviewers();
        assert_eq!(repo.replace("pr-1", "u2", "u3").await.unwrap(), PairChange::PrMerged);
        assert_eq!(repo.remove("pr-1", "u2").await.unwrap(), PairChange::PrMerged);
        assert_eq!(repo.reviewers_of("pr-1").await.unwrap(), vec!["u2"]);
    }

    #[tokio::test]
    async fn test_remove() {
        let (_dir, db) = setup_db().await;
        seed_team(&db, "backend", &[("u1", true), ("u2", true)]).await;
        seed_pr(&db, "pr-1", &["u2"]).await;

        let repo = db.reviewers();
        assert_eq!(repo.remove("pr-1", "u2").await.unwrap(), PairChange::Applied);
        assert!(repo.reviewers_of("pr-1").await.unwrap().is_empty());
        assert_eq!(repo.remove("pr-1", "u2").await.unwrap(), PairChange::NotAssigned);
    }

    #[tokio::test]
    async fn test_insert_pairs_skips_existing_and_repeated_pairs() {
        let (_dir, db) = setup_db().await;
        seed_team(&db, "backend", &[("u1", true), ("u2", true), ("u3", true)]).await;
        seed_pr(&db, "pr-1", &["u2"]).await;

        let mut conn = db.pool().acquire().await.unwrap();
        let batch = vec!["u2".to_string(), "u3".to_string(), "u3".to_string()];
        assert_eq!(insert_pairs(&mut conn, "pr-1", &batch).await.unwrap(), 1);
        assert_eq!(insert_pairs(&mut conn, "pr-1", &batch).await.unwrap(), 0);
        assert_eq!(insert_pairs(&mut conn, "pr-1", &[]).await.unwrap(), 0);
        drop(conn);

        assert_eq!(db.reviewers().reviewers_of("pr-1").await.unwrap(), vec!["u2", "u3"]);
    }

    #[tokio::test]
    async fn test_counts_sum_to_total() {
        let (_dir, db) = setup_db().await;
        seed_team(&db, "backend", &[("u1", true), ("u2", true), ("u3", true)]).await;
        seed_pr(&db, "pr-1", &["u2", "u3"]).await;
        seed_pr(&db, "pr-2", &["u2"]).await;

        let repo = db.reviewers();
        let counts = repo.counts().await.unwrap();
        assert_eq!(
            counts,
            vec![
                AssignmentCount { user_id: "u2".to_string(), count: 2 },
                AssignmentCount { user_id: "u3".to_string(), count: 1 },
            ]
        );
        let sum: i64 = counts.iter().map(|c| c.count).sum();
        assert_eq!(sum, repo.total().await.unwrap());
    }
}
