//! Evaluator x evaluatee matrix of record totals for one task.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::dataset::Dataset;
use crate::scoring::engine::round2;
use crate::scoring::Role;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participant {
    pub employee_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub evaluatee: Participant,
    /// One cell per entry in [`EvaluationSummary::evaluators`]; `None` when
    /// that evaluator has not scored this evaluatee
    pub scores: Vec<Option<f64>>,
    pub average: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationSummary {
    pub evaluators: Vec<Participant>,
    pub rows: Vec<SummaryRow>,
}

impl EvaluationSummary {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Build the score matrix for a task from its latest submitted records.
///
/// With `evaluator_role` set only evaluators holding that role are counted.
/// Rows and columns follow roster order.
pub fn build_summary(
    dataset: &Dataset,
    task_id: u32,
    evaluator_role: Option<Role>,
    scale_factor: f64,
) -> EvaluationSummary {
    let mut cells: HashMap<(&str, &str), f64> = HashMap::new();
    let mut evaluator_ids = HashSet::new();
    let mut evaluatee_ids = HashSet::new();

    for record in dataset.latest_submitted(task_id) {
        let Some(evaluator) = dataset.employee(&record.evaluator) else {
            tracing::warn!(record = record.id, evaluator = %record.evaluator, "unknown evaluator");
            continue;
        };
        if dataset.employee(&record.evaluatee).is_none() {
            tracing::warn!(record = record.id, evaluatee = %record.evaluatee, "unknown evaluatee");
            continue;
        }
        if evaluator_role.is_some_and(|role| evaluator.role != role) {
            continue;
        }

        let total = record.total_score(&dataset.dimensions, scale_factor);
        cells.insert((record.evaluatee.as_str(), record.evaluator.as_str()), total);
        evaluator_ids.insert(record.evaluator.as_str());
        evaluatee_ids.insert(record.evaluatee.as_str());
    }

    if cells.is_empty() {
        return EvaluationSummary::default();
    }

    let participant = |id: &str| {
        dataset.employee(id).map(|e| Participant {
            employee_id: e.employee_id.clone(),
            name: e.name.clone(),
        })
    };
    let in_roster_order = |ids: &HashSet<&str>| -> Vec<Participant> {
        dataset
            .employees
            .iter()
            .filter(|e| ids.contains(e.employee_id.as_str()))
            .filter_map(|e| participant(&e.employee_id))
            .collect()
    };

    let evaluators = in_roster_order(&evaluator_ids);
    let rows = in_roster_order(&evaluatee_ids)
        .into_iter()
        .map(|evaluatee| {
            let scores: Vec<Option<f64>> = evaluators
                .iter()
                .map(|evaluator| {
                    cells
                        .get(&(evaluatee.employee_id.as_str(), evaluator.employee_id.as_str()))
                        .copied()
                })
                .collect();
            let given: Vec<f64> = scores.iter().flatten().copied().collect();
            let average = if given.is_empty() {
                0.0
            } else {
                round2(given.iter().sum::<f64>() / given.len() as f64)
            };
            SummaryRow {
                evaluatee,
                scores,
                average,
            }
        })
        .collect();

    EvaluationSummary { evaluators, rows }
}
