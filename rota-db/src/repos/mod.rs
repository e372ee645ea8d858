//! Repository modules for database operations

pub mod pull_requests;
pub mod reviewers;
pub mod teams;
pub mod users;

pub use pull_requests::{NewPullRequest, PullRequestRepository};
pub use reviewers::{PairChange, ReviewerRepository};
pub use teams::TeamRepository;
pub use users::UserRepository;
