use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use std::fmt::Display;
use std::path::{Path, PathBuf};

use perf360::config::Config;
use perf360::dataset::{self, Dataset};
use perf360::output;
use perf360::scoring::{self, DepartmentRating, Role};
use perf360::summary;
use perf360::workflow::{self, WithdrawalScope, WorkflowError};

const EXIT_SUCCESS: i32 = 0;
const EXIT_DATA: i32 = 2;
const EXIT_WORKFLOW: i32 = 3;
const EXIT_CONFIG: i32 = 4;

#[derive(ValueEnum, Debug, Clone, Copy, Default)]
enum OutputFormat {
    #[default]
    Table,
    Tsv,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank evaluatees and assign tiers for a task
    Results {
        /// Dataset file (JSON or YAML); defaults to `dataset` from config
        #[arg(long)]
        data: Option<PathBuf>,
        /// Task id (required when the dataset holds several tasks)
        #[arg(long)]
        task: Option<u32>,
        /// Department rating: A-D or 甲/乙/丙/丁
        #[arg(long)]
        rating: Option<DepartmentRating>,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Evaluator x evaluatee matrix of submitted totals
    Summary {
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long)]
        task: Option<u32>,
        /// Only count evaluators with this role
        #[arg(long)]
        evaluator_role: Option<Role>,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Validate config and dataset
    Check {
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Submit a draft or returned record
    Submit {
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long)]
        record: u64,
    },
    /// Ask to withdraw all of an evaluator's submissions for a task
    Withdraw {
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long)]
        task: u32,
        #[arg(long)]
        evaluator: String,
        #[arg(long)]
        reason: String,
    },
    /// Approve pending withdrawal requests
    #[command(group(ArgGroup::new("target").required(true).args(["record", "task", "all"])))]
    ApproveWithdrawal {
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long)]
        record: Option<u64>,
        #[arg(long)]
        task: Option<u32>,
        /// Limit a task-wide approval to one evaluator
        #[arg(long, requires = "task")]
        evaluator: Option<String>,
        #[arg(long)]
        all: bool,
    },
    /// Send submitted records back to their evaluator
    #[command(group(ArgGroup::new("target").required(true).args(["record", "task"])))]
    Return {
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long)]
        record: Option<u64>,
        #[arg(long, requires = "evaluator")]
        task: Option<u32>,
        #[arg(long, requires = "task")]
        evaluator: Option<String>,
    },
    /// Reopen an evaluator's returned records as drafts
    Reassess {
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long)]
        evaluator: String,
    },
    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

#[derive(Parser, Debug)]
#[command(name = "perf360")]
#[command(about = "Multi-rater performance evaluation scoring", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/perf360/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn fail(code: i32, what: &str, err: impl Display) -> ! {
    eprintln!("{}: {}", what, err);
    std::process::exit(code);
}

fn print_errors(heading: &str, errors: &[String]) {
    eprintln!("{}:", heading);
    for error in errors {
        eprintln!("  - {}", error);
    }
}

fn main() {
    let cli = Cli::parse();
    perf360::logging::init_tracing(cli.verbose);

    if let Commands::Init { force } = cli.command {
        let path = match cli.config {
            Some(path) => path,
            None => perf360::config::get_config_path()
                .unwrap_or_else(|e| fail(EXIT_CONFIG, "Config error", format!("{:#}", e))),
        };
        if let Err(e) = perf360::config::write_default_config(&path, force) {
            fail(EXIT_CONFIG, "Config error", format!("{:#}", e));
        }
        println!("Config written to {}", path.display());
        std::process::exit(EXIT_SUCCESS);
    }

    let config = match perf360::config::load_config(cli.config) {
        Ok(c) => c,
        Err(e) => fail(EXIT_CONFIG, "Config error", format!("{:#}", e)),
    };

    // Validate scoring config at startup
    let scoring = config.scoring();
    if let Err(errors) = scoring::validate_scoring(&scoring) {
        print_errors("Scoring config errors", &errors);
        std::process::exit(EXIT_CONFIG);
    }

    match cli.command {
        Commands::Results { data, task, rating, format, output: target } => {
            let path = dataset_path(data, &config);
            let dataset = load(&path);
            warn_invalid(&dataset);
            let task = dataset
                .resolve_task(task)
                .unwrap_or_else(|e| fail(EXIT_DATA, "Dataset error", e));
            let rating = rating.unwrap_or_else(|| config.department_rating());
            tracing::info!(task = task.id, %rating, label = rating.label(), "computing results");

            let results = scoring::aggregate(
                &dataset.evaluatees(),
                &dataset.score_samples(task.id),
                rating,
                &scoring,
            );
            let colors = target.is_none() && output::should_use_colors();
            let rendered = match format {
                OutputFormat::Table => Ok(output::format_results_table(&results, colors)),
                OutputFormat::Tsv => Ok(output::format_results_tsv(&results)),
                OutputFormat::Json => output::format_results_json(&results),
            };
            emit(rendered, target.as_deref());
        }
        Commands::Summary { data, task, evaluator_role, format, output: target } => {
            let path = dataset_path(data, &config);
            let dataset = load(&path);
            let task = dataset
                .resolve_task(task)
                .unwrap_or_else(|e| fail(EXIT_DATA, "Dataset error", e));

            let summary =
                summary::build_summary(&dataset, task.id, evaluator_role, scoring.scale_factor);
            let colors = target.is_none() && output::should_use_colors();
            let rendered = match format {
                OutputFormat::Table => Ok(output::format_summary_table(&summary, colors)),
                OutputFormat::Tsv => Ok(output::format_summary_tsv(&summary)),
                OutputFormat::Json => output::format_summary_json(&summary),
            };
            emit(rendered, target.as_deref());
        }
        Commands::Check { data } => {
            let path = dataset_path(data, &config);
            let dataset = load(&path);
            if let Err(errors) = dataset::validate_dataset(&dataset) {
                print_errors(&format!("Dataset errors in {}", path.display()), &errors);
                std::process::exit(EXIT_DATA);
            }
            println!(
                "{}: {} tasks, {} employees, {} records OK",
                path.display(),
                dataset.tasks.len(),
                dataset.employees.len(),
                dataset.records.len()
            );
        }
        Commands::Submit { data, record } => {
            mutate(data, &config, |ds| {
                workflow::submit(ds, record, chrono::Utc::now())?;
                Ok(format!("Submitted record {}", record))
            });
        }
        Commands::Withdraw { data, task, evaluator, reason } => {
            mutate(data, &config, |ds| {
                let count = workflow::request_withdrawal(ds, task, &evaluator, &reason)?;
                Ok(format!("Requested withdrawal of {} records", count))
            });
        }
        Commands::ApproveWithdrawal { data, record, task, evaluator, all } => {
            mutate(data, &config, |ds| {
                if let Some(id) = record {
                    workflow::approve_withdrawal(ds, id)?;
                    return Ok(format!("Returned record {}", id));
                }
                let scope = match (task, evaluator) {
                    (Some(task_id), Some(evaluator)) => WithdrawalScope::Evaluator { task_id, evaluator },
                    (Some(task_id), None) => WithdrawalScope::Task(task_id),
                    _ if all => WithdrawalScope::All,
                    _ => return Err(WorkflowError::NothingToDo("withdrawal target")),
                };
                let count = workflow::approve_withdrawals(ds, &scope)?;
                Ok(format!("Returned {} records", count))
            });
        }
        Commands::Return { data, record, task, evaluator } => {
            mutate(data, &config, |ds| match (record, task, evaluator) {
                (Some(id), _, _) => {
                    workflow::return_record(ds, id)?;
                    Ok(format!("Returned record {}", id))
                }
                (None, Some(task_id), Some(evaluator)) => {
                    let count = workflow::return_batch(ds, task_id, &evaluator)?;
                    Ok(format!("Returned {} records", count))
                }
                _ => Err(WorkflowError::NothingToDo("return target")),
            });
        }
        Commands::Reassess { data, evaluator } => {
            mutate(data, &config, |ds| {
                let count = workflow::reassess(ds, &evaluator)?;
                Ok(format!("Reopened {} records as drafts", count))
            });
        }
        // handled before config load
        Commands::Init { .. } => {}
    }

    std::process::exit(EXIT_SUCCESS);
}

fn dataset_path(data: Option<PathBuf>, config: &Config) -> PathBuf {
    match data.or_else(|| config.dataset.clone()) {
        Some(path) => path,
        None => {
            eprintln!("No dataset given.");
            eprintln!("Pass --data FILE or add to ~/.config/perf360/config.yaml:");
            eprintln!("  dataset: /path/to/data.json");
            std::process::exit(EXIT_CONFIG);
        }
    }
}

fn load(path: &Path) -> Dataset {
    dataset::load_dataset(path).unwrap_or_else(|e| fail(EXIT_DATA, "Dataset error", format!("{:#}", e)))
}

/// Results still compute on a dataset with problems; surface them as warnings.
fn warn_invalid(dataset: &Dataset) {
    if let Err(errors) = dataset::validate_dataset(dataset) {
        for error in errors {
            tracing::warn!("{}", error);
        }
    }
}

fn emit(rendered: anyhow::Result<String>, target: Option<&Path>) {
    let text = rendered.unwrap_or_else(|e| fail(EXIT_DATA, "Output error", format!("{:#}", e)));
    match target {
        Some(path) => {
            if let Err(e) = output::write_output(path, &text) {
                fail(EXIT_DATA, "Output error", format!("{:#}", e));
            }
        }
        None => println!("{}", text),
    }
}

/// Load the dataset, apply one workflow action, save on success.
fn mutate<F>(data: Option<PathBuf>, config: &Config, action: F)
where
    F: FnOnce(&mut Dataset) -> Result<String, WorkflowError>,
{
    let path = dataset_path(data, config);
    let mut dataset = load(&path);

    let message = action(&mut dataset).unwrap_or_else(|e| fail(EXIT_WORKFLOW, "Rejected", e));

    if let Err(e) = dataset::save_dataset(&path, &dataset) {
        fail(EXIT_DATA, "Dataset error", format!("{:#}", e));
    }
    println!("{}", message);
}
