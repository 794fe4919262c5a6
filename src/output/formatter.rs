use std::io::IsTerminal;
use owo_colors::OwoColorize;
use terminal_size::{Width, terminal_size};

use crate::scoring::{EvaluateeResult, Role, Tier};
use crate::summary::EvaluationSummary;

const SCORE_WIDTH: usize = 8;
const NAME_WIDTH: usize = 10;
const MIN_POSITION_WIDTH: usize = 8;
const MISSING_CELL: &str = "-";

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a 0-100 score with two decimals
pub fn format_score(score: f64) -> String {
    format!("{:.2}", score)
}

fn format_cell(score: Option<f64>) -> String {
    score.map(format_score).unwrap_or_else(|| MISSING_CELL.to_string())
}

/// Short column header for a role bucket
fn role_header(role: Role) -> &'static str {
    match role {
        Role::DepartmentHead => "Head",
        Role::DepartmentManager => "Manager",
        Role::Peer => "Peer",
        Role::Leader => "Leader",
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Left-align by character count
fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(width - len))
    }
}

fn paint_tier(tier: Tier, use_colors: bool) -> String {
    let letter = tier.to_string();
    if !use_colors {
        return letter;
    }
    match tier {
        Tier::A => letter.green().bold().to_string(),
        Tier::B => letter.cyan().to_string(),
        Tier::C => letter.yellow().to_string(),
        Tier::D => letter.red().to_string(),
    }
}

/// Width of the position column given the terminal width (if any)
fn position_width(results: &[EvaluateeResult], term_width: Option<usize>) -> usize {
    let longest = results
        .iter()
        .map(|r| r.position.chars().count())
        .max()
        .unwrap_or(0)
        .max("Position".len());

    // rank(4) + name + 6 score columns + tier(4), two-space separators
    let fixed = 4 + NAME_WIDTH + (SCORE_WIDTH + 2) * 6 + 4 + 4;
    match term_width {
        Some(width) if width > fixed + MIN_POSITION_WIDTH => longest.min(width - fixed),
        Some(_) => longest.min(MIN_POSITION_WIDTH),
        None => longest,
    }
}

/// Format ranked results as a table with a header row.
/// Columns: rank, name, position, one score per role, weighted, final, tier
pub fn format_results_table(results: &[EvaluateeResult], use_colors: bool) -> String {
    if results.is_empty() {
        return "No evaluatees found.".to_string();
    }

    let pos_width = position_width(results, get_terminal_width());

    let mut header = format!(
        "{:>4}  {}  {}",
        "Rank",
        pad("Name", NAME_WIDTH),
        pad("Position", pos_width)
    );
    for role in Role::ALL {
        header.push_str(&format!("  {:>w$}", role_header(role), w = SCORE_WIDTH));
    }
    header.push_str(&format!(
        "  {:>w$}  {:>w$}  Tier",
        "Weighted",
        "Final",
        w = SCORE_WIDTH
    ));

    let mut lines = Vec::with_capacity(results.len() + 1);
    lines.push(if use_colors {
        header.bold().to_string()
    } else {
        header
    });

    for result in results {
        let rank = format!("{:>3}.", result.rank);
        let mut line = format!(
            "{}  {}  {}",
            if use_colors { rank.dimmed().to_string() } else { rank },
            pad(&result.name, NAME_WIDTH),
            pad(&truncate(&result.position, pos_width), pos_width)
        );
        for (_, score) in result.buckets.iter() {
            line.push_str(&format!("  {:>w$}", format_score(score), w = SCORE_WIDTH));
        }
        let final_score = format!("{:>w$}", format_score(result.final_score), w = SCORE_WIDTH);
        line.push_str(&format!(
            "  {:>w$}  {}  {}",
            format_score(result.weighted_score),
            if use_colors { final_score.bold().to_string() } else { final_score },
            paint_tier(result.tier, use_colors),
            w = SCORE_WIDTH
        ));
        lines.push(line);
    }

    lines.join("\n")
}

/// Format ranked results as tab-separated values for scripting
/// (header row, no colors)
pub fn format_results_tsv(results: &[EvaluateeResult]) -> String {
    let mut lines = vec![[
        "rank",
        "employee_id",
        "name",
        "position",
        "position_coefficient",
        "department_head_score",
        "department_manager_score",
        "peer_score",
        "leader_score",
        "weighted_score",
        "final_score",
        "tier",
    ]
    .join("\t")];

    for result in results {
        let mut fields = vec![
            result.rank.to_string(),
            result.employee_id.clone(),
            result.name.clone(),
            result.position.clone(),
            result.position_coefficient.to_string(),
        ];
        fields.extend(result.buckets.iter().map(|(_, score)| format_score(score)));
        fields.push(format_score(result.weighted_score));
        fields.push(format_score(result.final_score));
        fields.push(result.tier.to_string());
        lines.push(fields.join("\t"));
    }

    lines.join("\n")
}

pub fn format_results_json(results: &[EvaluateeResult]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(results)?)
}

/// Format the evaluator x evaluatee matrix. One row per evaluatee, one
/// column per evaluator, plus the row average.
pub fn format_summary_table(summary: &EvaluationSummary, use_colors: bool) -> String {
    if summary.is_empty() {
        return "No submitted evaluations found.".to_string();
    }

    let first_width = summary
        .rows
        .iter()
        .map(|row| row.evaluatee.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(NAME_WIDTH);
    let widths: Vec<usize> = summary
        .evaluators
        .iter()
        .map(|e| e.name.chars().count().max(SCORE_WIDTH))
        .collect();

    let mut header = pad("Evaluatee", first_width);
    for (evaluator, width) in summary.evaluators.iter().zip(&widths) {
        header.push_str("  ");
        header.push_str(&pad(&evaluator.name, *width));
    }
    header.push_str(&format!("  {:>w$}", "Average", w = SCORE_WIDTH));

    let mut lines = vec![if use_colors {
        header.bold().to_string()
    } else {
        header
    }];

    for row in &summary.rows {
        let mut line = pad(&row.evaluatee.name, first_width);
        for (cell, width) in row.scores.iter().zip(&widths) {
            let text = format!("{:>w$}", format_cell(*cell), w = *width);
            line.push_str("  ");
            if use_colors && cell.is_none() {
                line.push_str(&text.dimmed().to_string());
            } else {
                line.push_str(&text);
            }
        }
        let average = format!("{:>w$}", format_score(row.average), w = SCORE_WIDTH);
        line.push_str("  ");
        if use_colors {
            line.push_str(&average.bold().to_string());
        } else {
            line.push_str(&average);
        }
        lines.push(line);
    }

    lines.join("\n")
}

/// Tab-separated matrix with evaluator ids in the header row
pub fn format_summary_tsv(summary: &EvaluationSummary) -> String {
    let mut header = vec!["evaluatee".to_string()];
    header.extend(summary.evaluators.iter().map(|e| e.employee_id.clone()));
    header.push("average".to_string());

    let mut lines = vec![header.join("\t")];
    for row in &summary.rows {
        let mut fields = vec![row.evaluatee.employee_id.clone()];
        fields.extend(row.scores.iter().map(|cell| format_cell(*cell)));
        fields.push(format_score(row.average));
        lines.push(fields.join("\t"));
    }

    lines.join("\n")
}

pub fn format_summary_json(summary: &EvaluationSummary) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}
