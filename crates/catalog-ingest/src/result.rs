//! Outcome accounting for fetch runs.
//!
//! [`DatabaseOperationResult`] is the per-unit-of-work snapshot returned by
//! every processing step. Results compose by addition, so the outcome of a
//! whole run is the sum of its pages, ids or list entries.
//!
//! [`OperationProgress`] is the live counter set a [`crate::ProgressReporter`]
//! keeps for one top-level invocation.

use serde::Serialize;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Which bucket a single item landed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Inserted,
    Updated,
    Skipped,
    Error,
}

/// Aggregated outcome of a unit of work
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatabaseOperationResult {
    pub inserted: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errors: u64,
    /// Ids written (inserted or updated), in processing order
    pub ids: Vec<u32>,
    /// Ids that failed, in processing order; feed these back into list mode
    pub failed_ids: Vec<u32>,
}

impl DatabaseOperationResult {
    /// Result of a single item
    pub fn single(id: u32, outcome: Outcome) -> Self {
        let mut result = Self::default();
        result.record(id, outcome);
        result
    }

    pub fn inserted(id: u32) -> Self {
        Self::single(id, Outcome::Inserted)
    }

    pub fn updated(id: u32) -> Self {
        Self::single(id, Outcome::Updated)
    }

    pub fn skipped(id: u32) -> Self {
        Self::single(id, Outcome::Skipped)
    }

    pub fn error(id: u32) -> Self {
        Self::single(id, Outcome::Error)
    }

    /// `count` errors with no attributable ids, used when a whole page fails
    pub fn errors(count: u64) -> Self {
        Self {
            errors: count,
            ..Self::default()
        }
    }

    /// Count one item into its bucket
    pub fn record(&mut self, id: u32, outcome: Outcome) {
        match outcome {
            Outcome::Inserted => {
                self.inserted += 1;
                self.ids.push(id);
            }
            Outcome::Updated => {
                self.updated += 1;
                self.ids.push(id);
            }
            Outcome::Skipped => self.skipped += 1,
            Outcome::Error => {
                self.errors += 1;
                self.failed_ids.push(id);
            }
        }
    }

    /// Fold another result into this one
    pub fn merge(&mut self, other: DatabaseOperationResult) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.errors += other.errors;
        self.ids.extend(other.ids);
        self.failed_ids.extend(other.failed_ids);
    }

    /// Number of items accounted for across all buckets
    pub fn total(&self) -> u64 {
        self.inserted + self.updated + self.skipped + self.errors
    }
}

impl Add for DatabaseOperationResult {
    type Output = DatabaseOperationResult;

    fn add(mut self, rhs: DatabaseOperationResult) -> Self::Output {
        self.merge(rhs);
        self
    }
}

impl AddAssign for DatabaseOperationResult {
    fn add_assign(&mut self, rhs: DatabaseOperationResult) {
        self.merge(rhs);
    }
}

impl Sum for DatabaseOperationResult {
    fn sum<I: Iterator<Item = DatabaseOperationResult>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl fmt::Display for DatabaseOperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "inserted={} updated={} skipped={} errors={}",
            self.inserted, self.updated, self.skipped, self.errors
        )
    }
}

/// Live counters for one top-level invocation; never persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OperationProgress {
    /// Expected units of work; cosmetic
    pub total: u64,
    pub processed: u64,
    pub inserted: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errors: u64,
}

impl OperationProgress {
    /// Advance by `processed` units whose buckets are given by `delta`
    pub fn absorb(&mut self, processed: u64, delta: &DatabaseOperationResult) {
        self.processed += processed;
        self.inserted += delta.inserted;
        self.updated += delta.updated;
        self.skipped += delta.skipped;
        self.errors += delta.errors;
    }

    /// True when every processed unit landed in exactly one bucket
    pub fn is_balanced(&self) -> bool {
        self.inserted + self.updated + self.skipped + self.errors == self.processed
    }
}

impl fmt::Display for OperationProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} processed (inserted={} updated={} skipped={} errors={})",
            self.processed, self.total, self.inserted, self.updated, self.skipped, self.errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_matches_whole() {
        let parts = vec![
            DatabaseOperationResult::inserted(1),
            DatabaseOperationResult::skipped(2),
            DatabaseOperationResult::updated(3) + DatabaseOperationResult::error(4),
        ];
        let whole: DatabaseOperationResult = parts.clone().into_iter().sum();

        assert_eq!(whole.inserted, 1);
        assert_eq!(whole.updated, 1);
        assert_eq!(whole.skipped, 1);
        assert_eq!(whole.errors, 1);
        assert_eq!(whole.ids, vec![1, 3]);
        assert_eq!(whole.failed_ids, vec![4]);
        assert_eq!(whole.total(), 4);

        // grouping does not matter
        let regrouped = parts[0].clone() + (parts[1].clone() + parts[2].clone());
        assert_eq!(regrouped, whole);
    }

    #[test]
    fn test_page_failure_has_no_ids() {
        let charged = DatabaseOperationResult::errors(25);
        assert_eq!(charged.errors, 25);
        assert!(charged.failed_ids.is_empty());
    }

    #[test]
    fn test_progress_balance() {
        let mut progress = OperationProgress::default();
        progress.absorb(2, &(DatabaseOperationResult::inserted(1) + DatabaseOperationResult::skipped(2)));
        assert!(progress.is_balanced());

        progress.absorb(3, &DatabaseOperationResult::inserted(3));
        assert!(!progress.is_balanced());
    }

    #[test]
    fn test_summary_line() {
        let result = DatabaseOperationResult::inserted(1) + DatabaseOperationResult::skipped(2);
        assert_eq!(result.to_string(), "inserted=1 updated=0 skipped=1 errors=0");
    }
}
