use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::scoring::engine::round2;
use crate::scoring::{Evaluatee, Role, ScoreSample};

/// A snapshot of everything the evaluation system knows about.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Dataset {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub records: Vec<EvaluationRecord>,
}

/// A quarterly evaluation round.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Task {
    pub id: u32,
    pub name: String,
    pub year: i32,
    pub quarter: u8,
}

impl Task {
    /// Sort key: earlier year first, then earlier quarter.
    pub fn period(&self) -> (i32, u8) {
        (self.year, self.quarter)
    }
}

/// A weighted scoring category. Weights across all dimensions sum to 1.0.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Dimension {
    pub name: String,
    pub weight: f64,
}

fn default_role() -> Role {
    Role::Peer
}

fn default_coefficient() -> f64 {
    1.0
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Employee {
    pub employee_id: String,
    pub name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default = "default_role")]
    pub role: Role,
    /// Multiplier applied to the weighted score (e.g. 1.1 for senior posts)
    #[serde(default = "default_coefficient")]
    pub position_coefficient: f64,
    /// Frozen employees are kept for history but excluded from results
    #[serde(default, skip_serializing_if = "is_false")]
    pub frozen: bool,
    /// Administrators never evaluate or get evaluated
    #[serde(default, skip_serializing_if = "is_false")]
    pub admin: bool,
}

impl Employee {
    pub fn to_evaluatee(&self) -> Evaluatee {
        Evaluatee {
            employee_id: self.employee_id.clone(),
            name: self.name.clone(),
            position: self.position.clone(),
            position_coefficient: self.position_coefficient,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Draft,
    #[default]
    Submitted,
    WithdrawalRequested,
    Returned,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordStatus::Draft => "draft",
            RecordStatus::Submitted => "submitted",
            RecordStatus::WithdrawalRequested => "withdrawal_requested",
            RecordStatus::Returned => "returned",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DimensionScore {
    pub dimension: String,
    /// Raw score on the 5-point scale
    pub score: f64,
}

/// One evaluator's scores for one evaluatee in one task.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluationRecord {
    pub id: u64,
    pub evaluator: String,
    pub evaluatee: String,
    pub task_id: u32,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdrawal_reason: Option<String>,
    #[serde(default)]
    pub scores: Vec<DimensionScore>,
}

impl EvaluationRecord {
    /// Dimension-weighted score on the 5-point scale.
    ///
    /// Scores for dimensions that no longer exist are ignored. Returns 0 when
    /// none of the scored dimensions carry weight.
    pub fn weighted_score(&self, dimensions: &[Dimension]) -> f64 {
        let mut total = 0.0;
        let mut total_weight = 0.0;
        for entry in &self.scores {
            match dimensions.iter().find(|d| d.name == entry.dimension) {
                Some(dimension) => {
                    total += entry.score * dimension.weight;
                    total_weight += dimension.weight;
                }
                None => tracing::warn!(
                    record = self.id,
                    dimension = %entry.dimension,
                    "score references unknown dimension"
                ),
            }
        }

        if total_weight == 0.0 {
            return 0.0;
        }
        if total_weight > 1.0001 {
            tracing::warn!(
                record = self.id,
                total_weight = %format!("{:.4}", total_weight),
                "dimension weights exceed 100%"
            );
        }
        total
    }

    /// Record total on the 100-point scale, capped at 100.
    pub fn total_score(&self, dimensions: &[Dimension], scale_factor: f64) -> f64 {
        round2((self.weighted_score(dimensions) * scale_factor).min(100.0))
    }
}

impl Dataset {
    pub fn employee(&self, employee_id: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.employee_id == employee_id)
    }

    pub fn task(&self, id: u32) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn record(&self, id: u64) -> Option<&EvaluationRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Tasks newest first.
    pub fn tasks_by_period(&self) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.tasks.iter().collect();
        tasks.sort_by(|a, b| b.period().cmp(&a.period()));
        tasks
    }

    /// Pick the task to work on: the requested one, or the only one there is.
    pub fn resolve_task(&self, requested: Option<u32>) -> Result<&Task> {
        if let Some(id) = requested {
            return match self.task(id) {
                Some(task) => Ok(task),
                None => bail!("Task {} not found in dataset", id),
            };
        }

        match self.tasks.as_slice() {
            [only] => Ok(only),
            [] => bail!("Dataset contains no tasks"),
            _ => {
                let choices = self
                    .tasks_by_period()
                    .iter()
                    .map(|t| format!("{} ({})", t.id, t.name))
                    .collect::<Vec<_>>()
                    .join(", ");
                bail!("Dataset contains several tasks, pick one with --task: {}", choices)
            }
        }
    }

    pub fn is_admin(&self, employee_id: &str) -> bool {
        self.employee(employee_id).is_some_and(|e| e.admin)
    }

    /// Employees ranked in results: regular staff who are neither frozen nor
    /// administrators. Roster order is preserved.
    pub fn evaluatees(&self) -> Vec<Evaluatee> {
        self.employees
            .iter()
            .filter(|e| e.role == Role::Peer && !e.frozen && !e.admin)
            .map(Employee::to_evaluatee)
            .collect()
    }

    /// Submitted records for a task, keeping only the newest record (highest
    /// id) per evaluator/evaluatee pair. Records involving administrators are
    /// dropped. Output is ordered by record id.
    pub fn latest_submitted(&self, task_id: u32) -> Vec<&EvaluationRecord> {
        let mut latest: HashMap<(&str, &str), &EvaluationRecord> = HashMap::new();
        for record in &self.records {
            if record.task_id != task_id || record.status != RecordStatus::Submitted {
                continue;
            }
            if self.is_admin(&record.evaluator) || self.is_admin(&record.evaluatee) {
                continue;
            }
            let key = (record.evaluator.as_str(), record.evaluatee.as_str());
            match latest.get(&key) {
                Some(existing) if existing.id >= record.id => {}
                _ => {
                    latest.insert(key, record);
                }
            }
        }

        let mut records: Vec<&EvaluationRecord> = latest.into_values().collect();
        records.sort_by_key(|r| r.id);
        records
    }

    /// Aggregator input for a task: one sample per latest submitted record,
    /// tagged with the evaluator's role.
    pub fn score_samples(&self, task_id: u32) -> Vec<ScoreSample> {
        self.latest_submitted(task_id)
            .into_iter()
            .filter_map(|record| {
                let Some(evaluator) = self.employee(&record.evaluator) else {
                    tracing::warn!(
                        record = record.id,
                        evaluator = %record.evaluator,
                        "skipping record from unknown evaluator"
                    );
                    return None;
                };
                Some(ScoreSample {
                    evaluatee: record.evaluatee.clone(),
                    role: evaluator.role,
                    score: record.weighted_score(&self.dimensions),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dimensions() -> Vec<Dimension> {
        vec![
            Dimension { name: "quality".to_string(), weight: 0.5 },
            Dimension { name: "teamwork".to_string(), weight: 0.3 },
            Dimension { name: "initiative".to_string(), weight: 0.2 },
        ]
    }

    fn employee(id: &str, role: Role) -> Employee {
        Employee {
            employee_id: id.to_string(),
            name: format!("Name {}", id),
            position: "Analyst".to_string(),
            role,
            position_coefficient: 1.0,
            frozen: false,
            admin: false,
        }
    }

    fn record(id: u64, evaluator: &str, evaluatee: &str, scores: [f64; 3]) -> EvaluationRecord {
        EvaluationRecord {
            id,
            evaluator: evaluator.to_string(),
            evaluatee: evaluatee.to_string(),
            task_id: 1,
            status: RecordStatus::Submitted,
            submitted_at: None,
            withdrawal_reason: None,
            scores: dimensions()
                .iter()
                .zip(scores)
                .map(|(d, score)| DimensionScore { dimension: d.name.clone(), score })
                .collect(),
        }
    }

    fn sample_dataset() -> Dataset {
        let mut admin = employee("10000", Role::Peer);
        admin.admin = true;
        let mut frozen = employee("p3", Role::Peer);
        frozen.frozen = true;
        Dataset {
            tasks: vec![Task { id: 1, name: "2024 Q1".to_string(), year: 2024, quarter: 1 }],
            dimensions: dimensions(),
            employees: vec![
                employee("h1", Role::DepartmentHead),
                employee("l1", Role::Leader),
                employee("p1", Role::Peer),
                employee("p2", Role::Peer),
                frozen,
                admin,
            ],
            records: vec![],
        }
    }

    #[test]
    fn test_weighted_score() {
        let r = record(1, "h1", "p1", [5.0, 4.0, 3.0]);
        // 2.5 + 1.2 + 0.6
        assert!((r.weighted_score(&dimensions()) - 4.3).abs() < 1e-9);
        assert_eq!(r.total_score(&dimensions(), 20.0), 86.0);
    }

    #[test]
    fn test_weighted_score_no_weight_is_zero() {
        let mut r = record(1, "h1", "p1", [5.0, 4.0, 3.0]);
        for s in &mut r.scores {
            s.dimension = "retired".to_string();
        }
        assert_eq!(r.weighted_score(&dimensions()), 0.0);
    }

    #[test]
    fn test_total_score_capped_at_hundred() {
        let heavy = vec![Dimension { name: "quality".to_string(), weight: 1.5 }];
        let r = record(1, "h1", "p1", [5.0, 5.0, 5.0]);
        assert_eq!(r.total_score(&heavy, 20.0), 100.0);
    }

    #[test]
    fn test_evaluatees_excludes_frozen_admin_and_managers() {
        let dataset = sample_dataset();
        let ids: Vec<_> = dataset.evaluatees().into_iter().map(|e| e.employee_id).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
    }

    #[test]
    fn test_latest_submitted_deduplicates_by_highest_id() {
        let mut dataset = sample_dataset();
        dataset.records = vec![
            record(7, "h1", "p1", [5.0, 5.0, 5.0]),
            record(3, "h1", "p1", [1.0, 1.0, 1.0]),
            record(5, "l1", "p1", [4.0, 4.0, 4.0]),
        ];
        let latest = dataset.latest_submitted(1);
        let ids: Vec<_> = latest.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![5, 7]);
    }

    #[test]
    fn test_latest_submitted_skips_other_status_task_and_admin() {
        let mut dataset = sample_dataset();
        let mut returned = record(1, "h1", "p1", [5.0, 5.0, 5.0]);
        returned.status = RecordStatus::Returned;
        let mut other_task = record(2, "h1", "p2", [5.0, 5.0, 5.0]);
        other_task.task_id = 2;
        let from_admin = record(3, "10000", "p1", [5.0, 5.0, 5.0]);
        let kept = record(4, "l1", "p2", [3.0, 3.0, 3.0]);
        dataset.records = vec![returned, other_task, from_admin, kept];

        let ids: Vec<_> = dataset.latest_submitted(1).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![4]);
    }

    #[test]
    fn test_score_samples_tag_evaluator_role() {
        let mut dataset = sample_dataset();
        dataset.records = vec![
            record(1, "h1", "p1", [5.0, 4.0, 3.0]),
            record(2, "l1", "p1", [4.0, 4.0, 4.0]),
            record(3, "stranger", "p1", [1.0, 1.0, 1.0]),
        ];
        let samples = dataset.score_samples(1);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].role, Role::DepartmentHead);
        assert_eq!(samples[1].role, Role::Leader);
        assert!((samples[1].score - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_task() {
        let mut dataset = sample_dataset();
        assert_eq!(dataset.resolve_task(None).unwrap().id, 1);
        assert!(dataset.resolve_task(Some(9)).is_err());

        dataset.tasks.push(Task { id: 2, name: "2024 Q2".to_string(), year: 2024, quarter: 2 });
        let err = dataset.resolve_task(None).unwrap_err().to_string();
        assert!(err.contains("--task"));
        // newest first
        assert!(err.find("2 (2024 Q2)").unwrap() < err.find("1 (2024 Q1)").unwrap());
        assert_eq!(dataset.resolve_task(Some(2)).unwrap().name, "2024 Q2");

        dataset.tasks.clear();
        assert!(dataset.resolve_task(None).is_err());
    }

    #[test]
    fn test_employee_defaults() {
        let yaml = r#"
employee_id: "0007"
name: Li Lei
"#;
        let employee: Employee = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(employee.role, Role::Peer);
        assert_eq!(employee.position_coefficient, 1.0);
        assert!(!employee.frozen);
        assert!(!employee.admin);
        assert_eq!(employee.position, "");
    }

    #[test]
    fn test_record_status_serde() {
        let status: RecordStatus = serde_json::from_str("\"withdrawal_requested\"").unwrap();
        assert_eq!(status, RecordStatus::WithdrawalRequested);
        assert_eq!(RecordStatus::default(), RecordStatus::Submitted);
        assert_eq!(RecordStatus::Returned.to_string(), "returned");
    }
}
