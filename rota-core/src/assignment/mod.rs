//! Reviewer assignment engine
//!
//! - [`eligibility`]: who may review, and how one is chosen
//! - [`allocator`]: initial reviewers for a new PR
//! - [`reassign`]: swapping one reviewer for another
//! - [`cascade`]: deactivating a whole team

mod allocator;
mod cascade;
mod eligibility;
mod reassign;

pub use allocator::{Allocator, REVIEWERS_PER_PR};
pub use cascade::{Cascade, CascadeReport};
pub use eligibility::{CandidatePicker, Eligibility, OrderedPicker, RandomPicker};
pub use reassign::{Coordinator, Reassignment};
