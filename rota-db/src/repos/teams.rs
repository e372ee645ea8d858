//! Team repository: team rows and their member lists

use sqlx::SqlitePool;

use crate::models::{Team, TeamMember};
use crate::repos::users::upsert_member;
use crate::Result;

/// Repository for managing teams
pub struct TeamRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TeamRepository<'a> {
    /// Create a new team repository
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Check whether a team row exists
    pub async fn exists(&self, team_name: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM teams WHERE team_name = ?)")
                .bind(team_name)
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }

    /// Insert a team and upsert all of its members in one transaction
    ///
    /// Fails with a unique violation if the team already exists.
    pub async fn create_with_members(&self, team_name: &str, members: &[TeamMember]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO teams (team_name) VALUES (?)")
            .bind(team_name)
            .execute(&mut *tx)
            .await?;

        for member in members {
            upsert_member(&mut tx, team_name, member).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Get a team with its members, or `None` if no such team exists
    ///
    /// A team row with no members is returned with an empty member list.
    pub async fn find(&self, team_name: &str) -> Result<Option<Team>> {
        let members = self.members(team_name).await?;

        if members.is_empty() && !self.exists(team_name).await? {
            return Ok(None);
        }

        Ok(Some(Team {
            team_name: team_name.to_string(),
            members,
        }))
    }

    /// List the members of a team, ordered by user id
    pub async fn members(&self, team_name: &str) -> Result<Vec<TeamMember>> {
        sqlx::query_as::<_, TeamMember>(
            "SELECT user_id, username, is_active FROM users WHERE team_name = ? ORDER BY user_id",
        )
        .bind(team_name)
        .fetch_all(self.pool)
        .await
        .map_err(Into::into)
    }

    /// List member ids of a team, optionally only the active ones
    pub async fn member_ids(&self, team_name: &str, only_active: bool) -> Result<Vec<String>> {
        let sql = if only_active {
            "SELECT user_id FROM users WHERE team_name = ? AND is_active = 1 ORDER BY user_id"
        } else {
            "SELECT user_id FROM users WHERE team_name = ? ORDER BY user_id"
        };

        sqlx::query_scalar(sql)
            .bind(team_name)
            .fetch_all(self.pool)
            .await
            .map_err(Into::into)
    }

    /// Mark every member of a team inactive, returning the number of rows flipped
    pub async fn deactivate_all(&self, team_name: &str) -> Result<u64> {
        let result =
            sqlx::query("UPDATE users SET is_active = 0 WHERE team_name = ? AND is_active = 1")
                .bind(team_name)
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}
