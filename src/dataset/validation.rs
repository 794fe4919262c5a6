use std::collections::HashSet;

use super::types::Dataset;

pub const MIN_SCORE: f64 = 1.0;
pub const MAX_SCORE: f64 = 5.0;

const WEIGHT_TOLERANCE: f64 = 0.001;

pub fn score_in_range(score: f64) -> bool {
    (MIN_SCORE..=MAX_SCORE).contains(&score)
}

/// Check a dataset for referential and range problems.
/// Returns all validation errors at once (not just the first).
pub fn validate_dataset(dataset: &Dataset) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    let mut task_ids = HashSet::new();
    for task in &dataset.tasks {
        if !task_ids.insert(task.id) {
            errors.push(format!("tasks: duplicate task id {}", task.id));
        }
        if !(1..=4).contains(&task.quarter) {
            errors.push(format!(
                "tasks[{}].quarter: must be between 1 and 4, got {}",
                task.id, task.quarter
            ));
        }
    }

    let mut dimension_names = HashSet::new();
    for dimension in &dataset.dimensions {
        if !dimension_names.insert(dimension.name.as_str()) {
            errors.push(format!("dimensions: duplicate dimension '{}'", dimension.name));
        }
        if !dimension.weight.is_finite() || dimension.weight < 0.0 {
            errors.push(format!(
                "dimensions['{}'].weight: must be a non-negative number, got {}",
                dimension.name, dimension.weight
            ));
        }
    }
    if !dataset.dimensions.is_empty() {
        let total: f64 = dataset.dimensions.iter().map(|d| d.weight).sum();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            errors.push(format!("dimensions: weights must sum to 1.0, got {:.4}", total));
        }
    }

    let mut employee_ids = HashSet::new();
    for employee in &dataset.employees {
        if !employee_ids.insert(employee.employee_id.as_str()) {
            errors.push(format!(
                "employees: duplicate employee id '{}'",
                employee.employee_id
            ));
        }
        let coefficient = employee.position_coefficient;
        if !coefficient.is_finite() || coefficient <= 0.0 {
            errors.push(format!(
                "employees['{}'].position_coefficient: must be positive, got {}",
                employee.employee_id, coefficient
            ));
        }
    }

    let mut record_ids = HashSet::new();
    for record in &dataset.records {
        let at = format!("records[{}]", record.id);
        if !record_ids.insert(record.id) {
            errors.push(format!("records: duplicate record id {}", record.id));
        }
        if !task_ids.contains(&record.task_id) {
            errors.push(format!("{}.task_id: unknown task {}", at, record.task_id));
        }
        if !employee_ids.contains(record.evaluator.as_str()) {
            errors.push(format!("{}.evaluator: unknown employee '{}'", at, record.evaluator));
        }
        if !employee_ids.contains(record.evaluatee.as_str()) {
            errors.push(format!("{}.evaluatee: unknown employee '{}'", at, record.evaluatee));
        }
        for entry in &record.scores {
            if !dimension_names.contains(entry.dimension.as_str()) {
                errors.push(format!(
                    "{}.scores: unknown dimension '{}'",
                    at, entry.dimension
                ));
            }
            if !score_in_range(entry.score) {
                errors.push(format!(
                    "{}.scores['{}']: must be between {} and {}, got {}",
                    at, entry.dimension, MIN_SCORE, MAX_SCORE, entry.score
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
