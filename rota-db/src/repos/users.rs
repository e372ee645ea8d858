//! User repository: upserts, active flag, and eligible reviewer pools

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::models::{TeamMember, User};
use crate::Result;

const UPSERT_USER: &str = "INSERT INTO users (user_id, username, team_name, is_active)
     VALUES (?, ?, ?, ?)
     ON CONFLICT (user_id) DO UPDATE SET
        username = excluded.username,
        team_name = excluded.team_name,
        is_active = excluded.is_active";

/// Upsert a team member on an existing connection or transaction
pub(crate) async fn upsert_member(
    conn: &mut SqliteConnection,
    team_name: &str,
    member: &TeamMember,
) -> Result<()> {
    sqlx::query(UPSERT_USER)
        .bind(&member.user_id)
        .bind(&member.username)
        .bind(team_name)
        .bind(member.is_active)
        .execute(conn)
        .await?;
    Ok(())
}

/// Repository for managing users
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or update a user; the team must already exist
    pub async fn upsert(&self, user: &User) -> Result<()> {
        sqlx::query(UPSERT_USER)
            .bind(&user.user_id)
            .bind(&user.username)
            .bind(&user.team_name)
            .bind(user.is_active)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Find a user by id
    pub async fn find(&self, user_id: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT user_id, username, team_name, is_active FROM users WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await
        .map_err(Into::into)
    }

    /// Get the team a user currently belongs to
    pub async fn team_of(&self, user_id: &str) -> Result<Option<String>> {
        sqlx::query_scalar("SELECT team_name FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(self.pool)
            .await
            .map_err(Into::into)
    }

    /// Set a user's active flag, returning the updated user or `None` if unknown
    pub async fn set_active(&self, user_id: &str, active: bool) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET is_active = ? WHERE user_id = ?
             RETURNING user_id, username, team_name, is_active",
        )
        .bind(active)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await
        .map_err(Into::into)
    }

    /// Active members of `team_name` not in `exclude`, ordered by user id
    ///
    /// Read straight from the store on every call. Picking among the
    /// returned ids is left to the caller.
    pub async fn eligible_candidates(
        &self,
        team_name: &str,
        exclude: &[String],
    ) -> Result<Vec<String>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT user_id FROM users WHERE is_active = 1 AND team_name = ");
        query.push_bind(team_name.to_string());

        if !exclude.is_empty() {
            query.push(" AND user_id NOT IN (");
            let mut ids = query.separated(", ");
            for id in exclude {
                ids.push_bind(id.clone());
            }
            ids.push_unseparated(")");
        }

        query.push(" ORDER BY user_id");

        query
            .build_query_scalar::<String>()
            .fetch_all(self.pool)
            .await
            .map_err(Into::into)
    }
}
