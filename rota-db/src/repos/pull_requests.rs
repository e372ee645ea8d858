//! Pull request repository

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::models::{OpenAssignment, PullRequest, PullRequestRow, PullRequestSummary};
use crate::repos::reviewers::{insert_pairs, ReviewerRepository};
use crate::Result;

/// Input for creating a pull request together with its initial reviewers
#[derive(Debug, Clone)]
pub struct NewPullRequest {
    pub id: String,
    pub name: String,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
}

impl NewPullRequest {
    /// Create a new pull request input stamped with the current time
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        author_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            author_id: author_id.into(),
            created_at: Utc::now(),
        }
    }
}

/// Repository for managing pull requests
pub struct PullRequestRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PullRequestRepository<'a> {
    /// Create a new pull request repository
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Check whether a pull request exists
    pub async fn exists(&self, id: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM pull_requests WHERE pull_request_id = ?)",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Insert an OPEN pull request and its reviewers in one transaction
    ///
    /// Reviewer rows go in as one insert-or-ignore batch, so a duplicate pair
    /// is a no-op.
    /// Fails with a unique violation if the PR id is taken.
    pub async fn create_with_reviewers(
        &self,
        pr: &NewPullRequest,
        reviewers: &[String],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO pull_requests
                (pull_request_id, pull_request_name, author_id, status, created_at)
             VALUES (?, ?, ?, 'OPEN', ?)",
        )
        .bind(&pr.id)
        .bind(&pr.name)
        .bind(&pr.author_id)
        .bind(pr.created_at)
        .execute(&mut *tx)
        .await?;

        insert_pairs(&mut tx, &pr.id, reviewers).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Get the full view of a pull request, including current reviewers
    pub async fn find(&self, id: &str) -> Result<Option<PullRequest>> {
        let row = sqlx::query_as::<_, PullRequestRow>(
            "SELECT pull_request_id, pull_request_name, author_id, status, created_at, merged_at
             FROM pull_requests WHERE pull_request_id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => {
                let reviewers = ReviewerRepository::new(self.pool).reviewers_of(id).await?;
                Ok(Some(row.into_pull_request(reviewers)?))
            }
            None => Ok(None),
        }
    }

    /// Mark a pull request MERGED
    ///
    /// The merge timestamp is set only on the first merge. Returns `false`
    /// if the PR does not exist.
    pub async fn merge(&self, id: &str, merged_at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE pull_requests
             SET status = 'MERGED', merged_at = COALESCE(merged_at, ?)
             WHERE pull_request_id = ?",
        )
        .bind(merged_at)
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List the pull requests a user currently reviews, ordered by PR id
    pub async fn list_for_reviewer(&self, user_id: &str) -> Result<Vec<PullRequestSummary>> {
        let rows = sqlx::query_as::<_, PullRequestRow>(
            "SELECT p.pull_request_id, p.pull_request_name, p.author_id, p.status,
                    p.created_at, p.merged_at
             FROM pull_requests p
             JOIN pr_reviewers r ON p.pull_request_id = r.pull_request_id
             WHERE r.user_id = ?
             ORDER BY p.pull_request_id",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(PullRequestRow::into_summary).collect()
    }

    /// Every (open PR, reviewer) pair whose reviewer is one of `user_ids`
    pub async fn open_assignments_for(&self, user_ids: &[String]) -> Result<Vec<OpenAssignment>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT r.pull_request_id, r.user_id AS reviewer_id, p.author_id
             FROM pr_reviewers r
             JOIN pull_requests p ON p.pull_request_id = r.pull_request_id
             WHERE p.status = 'OPEN' AND r.user_id IN (",
        );
        let mut ids = query.separated(", ");
        for id in user_ids {
            ids.push_bind(id.clone());
        }
        ids.push_unseparated(")");
        query.push(" ORDER BY r.pull_request_id, r.user_id");

        query
            .build_query_as::<OpenAssignment>()
            .fetch_all(self.pool)
            .await
            .map_err(Into::into)
    }
}
