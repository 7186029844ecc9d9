//! Per-record synchronization outcomes.
//!
//! Synchronization is best-effort at record granularity: each record's
//! outcome is collected independently and the batch result is a summary,
//! never an error that erases partial progress.

use std::fmt;

/// Outcome of synchronizing one reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The event was inserted.
    Inserted { event_id: String },
    /// The reservation produced no event (filtered or unparseable).
    Skipped { reason: String },
    /// The insertion was attempted and failed.
    Failed { reason: String },
}

/// One reservation's entry in the sync report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordReport {
    pub purchase_id: String,
    pub outcome: RecordOutcome,
}

/// Summary of one synchronization run.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Events removed by the purge pass.
    pub deleted: usize,
    /// Per-reservation outcomes, in input order.
    pub records: Vec<RecordReport>,
}

impl SyncReport {
    pub fn inserted(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Inserted { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&RecordOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.outcome)).count()
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inserted, {} skipped, {} failed, {} deleted",
            self.inserted(),
            self.skipped(),
            self.failed(),
            self.deleted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_display() {
        let report = SyncReport {
            deleted: 4,
            records: vec![
                RecordReport {
                    purchase_id: "SMZ0001".into(),
                    outcome: RecordOutcome::Inserted {
                        event_id: "ev-1".into(),
                    },
                },
                RecordReport {
                    purchase_id: "SMZ0002".into(),
                    outcome: RecordOutcome::Skipped {
                        reason: "status not in allow-list".into(),
                    },
                },
                RecordReport {
                    purchase_id: "SMZ0003".into(),
                    outcome: RecordOutcome::Failed {
                        reason: "server error".into(),
                    },
                },
            ],
        };

        assert_eq!(report.inserted(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.to_string(), "1 inserted, 1 skipped, 1 failed, 4 deleted");
    }
}
