//! Error types for Rota
//!
//! Domain outcomes each have their own variant so callers can match on them.
//! Store failures arrive as [`Error::Database`] and are never retried here.

use thiserror::Error;

/// Result type alias for Rota operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Rota operations
#[derive(Error, Debug)]
pub enum Error {
    /// A required entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },

    /// A team with this name already exists
    #[error("Team already exists: {0}")]
    TeamExists(String),

    /// A pull request with this id already exists
    #[error("Pull request already exists: {0}")]
    PrExists(String),

    /// The pull request is merged and can no longer change
    #[error("Pull request is merged: {0}")]
    PrMerged(String),

    /// The user is not currently a reviewer of the pull request
    #[error("{user_id} is not assigned to pull request {pull_request_id}")]
    NotAssigned {
        pull_request_id: String,
        user_id: String,
    },

    /// No active teammate is available to take over a review
    #[error("No replacement candidate for {user_id} on pull request {pull_request_id}")]
    NoCandidate {
        pull_request_id: String,
        user_id: String,
    },

    /// The operation was cancelled; work committed before that point stays
    #[error("Operation cancelled after {reassigned} reassigned and {removed} removed")]
    Cancelled { reassigned: u64, removed: u64 },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Store failure
    #[error(transparent)]
    Database(#[from] rota_db::Error),
}

/// Kind of entity named in a [`Error::NotFound`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Team,
    User,
    PullRequest,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Entity::Team => "Team",
            Entity::User => "User",
            Entity::PullRequest => "Pull request",
        })
    }
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidState,
    PreconditionFailed,
    ResourceExhausted,
    Cancelled,
    Infrastructure,
}

impl ErrorKind {
    /// Whether this is an expected business outcome rather than a fault
    pub fn is_domain(&self) -> bool {
        !matches!(self, ErrorKind::Cancelled | ErrorKind::Infrastructure)
    }
}

impl Error {
    pub(crate) fn not_found(entity: Entity, id: impl Into<String>) -> Self {
        Error::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::TeamExists(_) | Error::PrExists(_) => ErrorKind::AlreadyExists,
            Error::PrMerged(_) => ErrorKind::InvalidState,
            Error::NotAssigned { .. } => ErrorKind::PreconditionFailed,
            Error::NoCandidate { .. } => ErrorKind::ResourceExhausted,
            Error::Cancelled { .. } => ErrorKind::Cancelled,
            Error::Config(_) | Error::Database(_) => ErrorKind::Infrastructure,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "NOT_FOUND",
            Error::TeamExists(_) => "TEAM_EXISTS",
            Error::PrExists(_) => "PR_EXISTS",
            Error::PrMerged(_) => "PR_MERGED",
            Error::NotAssigned { .. } => "NOT_ASSIGNED",
            Error::NoCandidate { .. } => "NO_CANDIDATE",
            Error::Cancelled { .. } => "CANCELLED",
            Error::Config(_) => "CONFIG",
            Error::Database(_) => "INTERNAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_distinct_per_outcome() {
        let merged = Error::PrMerged("pr-1".to_string());
        assert_eq!(merged.kind(), ErrorKind::InvalidState);
        assert_eq!(merged.code(), "PR_MERGED");

        let missing = Error::not_found(Entity::PullRequest, "pr-9");
        assert_eq!(missing.kind(), ErrorKind::NotFound);
        assert_eq!(missing.to_string(), "Pull request not found: pr-9");

        let not_assigned = Error::NotAssigned {
            pull_request_id: "pr-1".to_string(),
            user_id: "u2".to_string(),
        };
        assert_eq!(not_assigned.kind(), ErrorKind::PreconditionFailed);

        let none = Error::NoCandidate {
            pull_request_id: "pr-1".to_string(),
            user_id: "u2".to_string(),
        };
        assert_eq!(none.kind(), ErrorKind::ResourceExhausted);
        assert_eq!(none.code(), "NO_CANDIDATE");

        assert_eq!(Error::TeamExists("t".into()).kind(), ErrorKind::AlreadyExists);
        assert_eq!(Error::PrExists("p".into()).code(), "PR_EXISTS");
    }

    #[test]
    fn test_infrastructure_is_not_domain() {
        let db = Error::Database(rota_db::Error::InvalidData("bad row".to_string()));
        assert_eq!(db.kind(), ErrorKind::Infrastructure);
        assert!(!db.kind().is_domain());

        let cancelled = Error::Cancelled {
            reassigned: 1,
            removed: 2,
        };
        assert!(!cancelled.kind().is_domain());
        assert!(Error::PrMerged("x".into()).kind().is_domain());
    }
}
