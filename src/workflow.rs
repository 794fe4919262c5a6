//! Evaluation record lifecycle.
//!
//! ```text
//! draft ──submit──▶ submitted ──request_withdrawal──▶ withdrawal_requested
//!   ▲                   │                                   │
//!   │                return                         approve_withdrawal
//!   │                   ▼                                   │
//!   └────reassess──── returned ◀────────────────────────────┘
//! ```
//!
//! Returned records may also be submitted again directly.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use thiserror::Error;

use crate::dataset::{score_in_range, Dataset, EvaluationRecord, RecordStatus};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    #[error("record {0} not found")]
    RecordNotFound(u64),

    #[error("record {id} is {status}, only {expected} records can be {action}")]
    InvalidStatus {
        id: u64,
        status: RecordStatus,
        expected: RecordStatus,
        action: &'static str,
    },

    #[error("record {id} is {status}, only draft or returned records can be submitted")]
    NotSubmittable { id: u64, status: RecordStatus },

    #[error("administrator '{0}' cannot take part in evaluations")]
    AdminParticipant(String),

    #[error("record {id} is missing scores for: {}", .missing.join(", "))]
    MissingScores { id: u64, missing: Vec<String> },

    #[error("record {id}: dimension '{dimension}' is scored more than once")]
    DuplicateScore { id: u64, dimension: String },

    #[error("record {id}: unknown dimension '{dimension}'")]
    UnknownDimension { id: u64, dimension: String },

    #[error("record {id}: score {score} for '{dimension}' must be between 1 and 5")]
    ScoreOutOfRange { id: u64, dimension: String, score: f64 },

    #[error("evaluator '{evaluator}' has no records in task {task_id}")]
    NoRecords { task_id: u32, evaluator: String },

    #[error("withdrawal already requested for task {task_id}, do not request it twice")]
    WithdrawalAlreadyRequested { task_id: u32 },

    #[error("record {id} is {status}; withdrawal requires every record in the task to be submitted")]
    NotWithdrawable { id: u64, status: RecordStatus },

    #[error("a withdrawal reason is required")]
    MissingReason,

    #[error("no {0}")]
    NothingToDo(&'static str),
}

/// Which pending withdrawal requests to approve in one go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithdrawalScope {
    Task(u32),
    Evaluator { task_id: u32, evaluator: String },
    All,
}

impl WithdrawalScope {
    fn matches(&self, record: &EvaluationRecord) -> bool {
        match self {
            WithdrawalScope::Task(task_id) => record.task_id == *task_id,
            WithdrawalScope::Evaluator { task_id, evaluator } => {
                record.task_id == *task_id && record.evaluator == *evaluator
            }
            WithdrawalScope::All => true,
        }
    }
}

fn find_record(dataset: &Dataset, id: u64) -> Result<&EvaluationRecord, WorkflowError> {
    dataset.record(id).ok_or(WorkflowError::RecordNotFound(id))
}

fn find_record_mut(dataset: &mut Dataset, id: u64) -> Result<&mut EvaluationRecord, WorkflowError> {
    dataset
        .records
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or(WorkflowError::RecordNotFound(id))
}

fn expect_status(
    record: &EvaluationRecord,
    expected: RecordStatus,
    action: &'static str,
) -> Result<(), WorkflowError> {
    if record.status == expected {
        Ok(())
    } else {
        Err(WorkflowError::InvalidStatus {
            id: record.id,
            status: record.status,
            expected,
            action,
        })
    }
}

/// Every dimension scored exactly once, nothing unknown, all in range.
fn check_scores(dataset: &Dataset, record: &EvaluationRecord) -> Result<(), WorkflowError> {
    let mut seen = HashSet::new();
    for entry in &record.scores {
        if !dataset.dimensions.iter().any(|d| d.name == entry.dimension) {
            return Err(WorkflowError::UnknownDimension {
                id: record.id,
                dimension: entry.dimension.clone(),
            });
        }
        if !seen.insert(entry.dimension.as_str()) {
            return Err(WorkflowError::DuplicateScore {
                id: record.id,
                dimension: entry.dimension.clone(),
            });
        }
        if !score_in_range(entry.score) {
            return Err(WorkflowError::ScoreOutOfRange {
                id: record.id,
                dimension: entry.dimension.clone(),
                score: entry.score,
            });
        }
    }

    let missing: Vec<String> = dataset
        .dimensions
        .iter()
        .filter(|d| !seen.contains(d.name.as_str()))
        .map(|d| d.name.clone())
        .collect();
    if !missing.is_empty() {
        return Err(WorkflowError::MissingScores {
            id: record.id,
            missing,
        });
    }
    Ok(())
}

/// Submit a draft or returned record.
pub fn submit(dataset: &mut Dataset, id: u64, now: DateTime<Utc>) -> Result<(), WorkflowError> {
    let record = find_record(dataset, id)?;
    if !matches!(record.status, RecordStatus::Draft | RecordStatus::Returned) {
        return Err(WorkflowError::NotSubmittable {
            id,
            status: record.status,
        });
    }
    for participant in [&record.evaluator, &record.evaluatee] {
        if dataset.is_admin(participant) {
            return Err(WorkflowError::AdminParticipant(participant.clone()));
        }
    }
    check_scores(dataset, record)?;

    let record = find_record_mut(dataset, id)?;
    record.status = RecordStatus::Submitted;
    record.submitted_at = Some(now);
    record.withdrawal_reason = None;
    tracing::info!(record = id, "evaluation submitted");
    Ok(())
}

/// Ask to withdraw all of an evaluator's submitted records in a task.
///
/// Either every record moves to `withdrawal_requested` or none does.
pub fn request_withdrawal(
    dataset: &mut Dataset,
    task_id: u32,
    evaluator: &str,
    reason: &str,
) -> Result<usize, WorkflowError> {
    let in_scope = |r: &EvaluationRecord| r.task_id == task_id && r.evaluator == evaluator;

    let records: Vec<&EvaluationRecord> =
        dataset.records.iter().filter(|r| in_scope(*r)).collect();
    if records.is_empty() {
        return Err(WorkflowError::NoRecords {
            task_id,
            evaluator: evaluator.to_string(),
        });
    }
    for record in &records {
        match record.status {
            RecordStatus::Submitted => {}
            RecordStatus::WithdrawalRequested => {
                return Err(WorkflowError::WithdrawalAlreadyRequested { task_id })
            }
            status => {
                return Err(WorkflowError::NotWithdrawable {
                    id: record.id,
                    status,
                })
            }
        }
    }
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(WorkflowError::MissingReason);
    }

    let mut count = 0;
    for record in dataset.records.iter_mut().filter(|r| in_scope(&**r)) {
        record.status = RecordStatus::WithdrawalRequested;
        record.withdrawal_reason = Some(reason.to_string());
        count += 1;
    }
    tracing::info!(task = task_id, evaluator, count, "withdrawal requested");
    Ok(count)
}

/// Approve one withdrawal request; the record becomes editable again.
pub fn approve_withdrawal(dataset: &mut Dataset, id: u64) -> Result<(), WorkflowError> {
    let record = find_record_mut(dataset, id)?;
    expect_status(record, RecordStatus::WithdrawalRequested, "approved for withdrawal")?;
    record.status = RecordStatus::Returned;
    tracing::info!(record = id, "withdrawal approved");
    Ok(())
}

/// Approve every pending withdrawal request in `scope`.
pub fn approve_withdrawals(
    dataset: &mut Dataset,
    scope: &WithdrawalScope,
) -> Result<usize, WorkflowError> {
    let mut approved = Vec::new();
    for record in dataset
        .records
        .iter_mut()
        .filter(|r| r.status == RecordStatus::WithdrawalRequested && scope.matches(r))
    {
        record.status = RecordStatus::Returned;
        approved.push(record.id);
    }

    if approved.is_empty() {
        return Err(WorkflowError::NothingToDo("pending withdrawal requests"));
    }
    tracing::info!(?scope, records = ?approved, "withdrawals approved");
    Ok(approved.len())
}

/// Send one submitted record back to its evaluator.
pub fn return_record(dataset: &mut Dataset, id: u64) -> Result<(), WorkflowError> {
    let record = find_record_mut(dataset, id)?;
    expect_status(record, RecordStatus::Submitted, "returned")?;
    record.status = RecordStatus::Returned;
    tracing::info!(record = id, "evaluation returned");
    Ok(())
}

/// Send back all of an evaluator's submitted records in a task.
pub fn return_batch(
    dataset: &mut Dataset,
    task_id: u32,
    evaluator: &str,
) -> Result<usize, WorkflowError> {
    let mut count = 0;
    for record in dataset.records.iter_mut().filter(|r| {
        r.task_id == task_id && r.evaluator == evaluator && r.status == RecordStatus::Submitted
    }) {
        record.status = RecordStatus::Returned;
        count += 1;
    }

    if count == 0 {
        return Err(WorkflowError::NothingToDo("submitted records to return"));
    }
    tracing::info!(task = task_id, evaluator, count, "evaluations returned");
    Ok(count)
}

/// Reopen every returned record of an evaluator as a draft.
pub fn reassess(dataset: &mut Dataset, evaluator: &str) -> Result<usize, WorkflowError> {
    let mut count = 0;
    for record in dataset
        .records
        .iter_mut()
        .filter(|r| r.evaluator == evaluator && r.status == RecordStatus::Returned)
    {
        record.status = RecordStatus::Draft;
        record.submitted_at = None;
        count += 1;
    }

    if count == 0 {
        return Err(WorkflowError::NothingToDo("returned records to reassess"));
    }
    tracing::info!(evaluator, count, "evaluations reopened");
    Ok(count)
}
