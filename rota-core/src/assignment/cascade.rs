//! Mass deactivation of a team
//!
//! Every member of the team is flipped inactive in one statement, then each
//! open-PR assignment held by a member that was active beforehand is handled
//! in its own transaction: swapped for an eligible teammate if there is one,
//! otherwise dropped. Earlier pairs stay committed if a later one fails or
//! the run is cancelled.

use std::collections::BTreeSet;

use rota_db::{Database, OpenAssignment, PairChange};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{CandidatePicker, Eligibility};
use crate::error::{Entity, Error};
use crate::Result;

/// Totals reported by a cascade run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    /// Pairs that got a replacement reviewer
    pub reassigned: u64,
    /// Pairs dropped for lack of a replacement
    pub removed: u64,
}

/// What happened to a single (PR, reviewer) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PairOutcome {
    Reassigned(String),
    Removed,
    /// The pair was gone or its PR merged before we got to it
    Skipped,
}

/// Runs the mass deactivation cascade
pub struct Cascade<'a> {
    db: &'a Database,
    picker: &'a dyn CandidatePicker,
}

impl<'a> Cascade<'a> {
    pub fn new(db: &'a Database, picker: &'a dyn CandidatePicker) -> Self {
        Self { db, picker }
    }

    /// Deactivate `team_name` and ripple the change through open PRs
    ///
    /// A team with no members at all is `NotFound`. A team whose members are
    /// all inactive already is a no-op reporting zero. Cancellation is honoured
    /// between pairs and reports the totals committed so far.
    pub async fn deactivate_team(
        &self,
        team_name: &str,
        cancel: &CancellationToken,
    ) -> Result<CascadeReport> {
        let teams = self.db.teams();
        let snapshot = teams.member_ids(team_name, true).await?;

        if snapshot.is_empty() {
            if teams.member_ids(team_name, false).await?.is_empty() {
                return Err(Error::not_found(Entity::Team, team_name));
            }
            debug!(team = team_name, "Team already fully inactive");
            return Ok(CascadeReport::default());
        }

        let mut report = CascadeReport::default();
        if cancel.is_cancelled() {
            return Err(cancelled(report));
        }

        let flipped = teams.deactivate_all(team_name).await?;
        info!(team = team_name, flipped, "Deactivated team members");

        let affected = self
            .db
            .pull_requests()
            .open_assignments_for(&snapshot)
            .await?;
        debug!(team = team_name, pairs = affected.len(), "Collected open assignments");

        for assignment in &affected {
            if cancel.is_cancelled() {
                warn!(
                    team = team_name,
                    reassigned = report.reassigned,
                    removed = report.removed,
                    "Cascade cancelled"
                );
                return Err(cancelled(report));
            }

            match self.ripple_pair(team_name, assignment).await? {
                PairOutcome::Reassigned(_) => report.reassigned += 1,
                PairOutcome::Removed => report.removed += 1,
                PairOutcome::Skipped => {}
            }
        }

        info!(
            team = team_name,
            reassigned = report.reassigned,
            removed = report.removed,
            "Cascade finished"
        );
        Ok(report)
    }

    /// Handle one (PR, reviewer) pair against the current store state
    pub(crate) async fn ripple_pair(
        &self,
        team_name: &str,
        assignment: &OpenAssignment,
    ) -> Result<PairOutcome> {
        let pr_id = assignment.pull_request_id.as_str();
        let reviewer = assignment.reviewer_id.as_str();

        let current = self.db.reviewers().reviewers_of(pr_id).await?;
        if !current.iter().any(|r| r == reviewer) {
            warn!(pull_request_id = pr_id, reviewer, "Pair vanished, skipping");
            return Ok(PairOutcome::Skipped);
        }

        let mut exclude: BTreeSet<String> = current.into_iter().collect();
        exclude.insert(assignment.author_id.clone());

        let candidate = Eligibility::new(self.db, self.picker)
            .pick_one(team_name, &exclude)
            .await?;

        let outcome = match candidate {
            Some(replacement) => {
                match self.db.reviewers().replace(pr_id, reviewer, &replacement).await? {
                    PairChange::Applied => PairOutcome::Reassigned(replacement),
                    PairChange::NotAssigned | PairChange::PrMerged => PairOutcome::Skipped,
                }
            }
            None => match self.db.reviewers().remove(pr_id, reviewer).await? {
                PairChange::Applied => PairOutcome::Removed,
                PairChange::NotAssigned | PairChange::PrMerged => PairOutcome::Skipped,
            },
        };

        if outcome == PairOutcome::Skipped {
            warn!(pull_request_id = pr_id, reviewer, "Pair changed underneath cascade, skipping");
        } else {
            debug!(pull_request_id = pr_id, reviewer, ?outcome, "Processed pair");
        }
        Ok(outcome)
    }
}

fn cancelled(report: CascadeReport) -> Error {
    Error::Cancelled {
        reassigned: report.reassigned,
        removed: report.removed,
    }
}
