//! Eligible reviewer resolution
//!
//! A candidate is an active member of the given team who is not in the
//! exclusion set. The pool is read from the store on every call; choosing
//! among it is delegated to a [`CandidatePicker`] so tests can swap in a
//! seeded or fully deterministic picker.

use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rota_db::Database;
use tracing::debug;

use crate::Result;

/// Uniform pick of distinct ids from an eligible pool
pub trait CandidatePicker: Send + Sync {
    /// Choose `min(count, pool.len())` distinct ids from `pool`
    fn pick(&self, pool: &[String], count: usize) -> Vec<String>;
}

/// Uniformly random picker backed by `rand`
#[derive(Debug)]
pub struct RandomPicker {
    rng: Mutex<StdRng>,
}

impl Default for RandomPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomPicker {
    /// Picker seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible picker
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl CandidatePicker for RandomPicker {
    fn pick(&self, pool: &[String], count: usize) -> Vec<String> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        pool.choose_multiple(&mut *rng, count).cloned().collect()
    }
}

/// Deterministic picker: takes the first ids of the pool in store order (by id)
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderedPicker;

impl CandidatePicker for OrderedPicker {
    fn pick(&self, pool: &[String], count: usize) -> Vec<String> {
        pool.iter().take(count).cloned().collect()
    }
}

/// Resolves eligible reviewers for a team
pub struct Eligibility<'a> {
    db: &'a Database,
    picker: &'a dyn CandidatePicker,
}

impl<'a> Eligibility<'a> {
    pub fn new(db: &'a Database, picker: &'a dyn CandidatePicker) -> Self {
        Self { db, picker }
    }

    /// Pick up to `count` distinct eligible members of `team_name`
    ///
    /// An empty result means nobody is eligible.
    pub async fn pick(
        &self,
        team_name: &str,
        exclude: &BTreeSet<String>,
        count: usize,
    ) -> Result<Vec<String>> {
        let exclude: Vec<String> = exclude.iter().cloned().collect();
        let pool = self.db.users().eligible_candidates(team_name, &exclude).await?;
        let picked = self.picker.pick(&pool, count);

        debug!(
            team = team_name,
            pool = pool.len(),
            excluded = exclude.len(),
            ?picked,
            "Resolved reviewer candidates"
        );
        Ok(picked)
    }

    /// Pick one eligible member, or `None` if the pool is empty
    pub async fn pick_one(
        &self,
        team_name: &str,
        exclude: &BTreeSet<String>,
    ) -> Result<Option<String>> {
        Ok(self.pick(team_name, exclude, 1).await?.into_iter().next())
    }
}
