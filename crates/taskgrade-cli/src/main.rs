//! Task grading CLI.
//!
//! Provides the `taskgrade` binary for working with DSL programs and task
//! files. Results are printed as JSON to stdout; diagnostics go to stderr.
//!
//! Exit codes: 0 = success, 1 = failing verdict or runtime failure,
//! 2 = invalid program, task or configuration, 3 = I/O error.
//!
//! Limits and log level come from `TASKGRADE_*` environment variables (see
//! [`taskgrade_cli::config`]); `--max-steps` and `--max-output-size` override
//! them for a single invocation.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value as Json};

use taskgrade_cli::{Config, ServiceError, TaskService};
use taskgrade_core::{parse_program_with_limits, TaskDefinition};
use taskgrade_eval::{
    evaluate_submission, validate_task_definition, EvalError, ExecutionResult, Interpreter, InterpreterConfig, Verdict,
};
use taskgrade_storage::{InMemoryStore, NewUser, TaskId, UserId, UserRole};

/// Task grading tools for the JSON DSL.
#[derive(Parser)]
#[command(name = "taskgrade", about = "Run and grade JSON DSL programs")]
struct Cli {
    /// Override the step limit for each run.
    #[arg(long, global = true)]
    max_steps: Option<u64>,

    /// Override the output size limit for each run.
    #[arg(long, global = true)]
    max_output_size: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Validate a program document and print its canonical form.
    Check {
        /// Path to the program JSON file.
        program: PathBuf,
    },

    /// Run a program against one input.
    Run {
        /// Path to the program JSON file.
        program: PathBuf,

        /// Input as an inline JSON document (default: null).
        #[arg(long, conflicts_with = "input_file")]
        input: Option<String>,

        /// Path to a JSON file holding the input.
        #[arg(long)]
        input_file: Option<PathBuf>,

        /// Include the execution trace in the output.
        #[arg(long)]
        trace: bool,
    },

    /// Grade a submitted program against a task's test cases.
    Grade {
        /// Path to a task JSON file with `dslProgram` and `testCases`.
        #[arg(short, long)]
        task: PathBuf,

        /// Path to the submitted program JSON file.
        #[arg(short, long)]
        submission: PathBuf,
    },

    /// Check that a task's reference program passes its own test cases.
    ValidateTask {
        /// Path to a task JSON file with `dslProgram` and `testCases`.
        task: PathBuf,
    },

    /// Load a task catalog and list its published tasks.
    List {
        /// Path to a JSON array of task entries.
        #[arg(short, long)]
        catalog: PathBuf,
    },

    /// Submit a program for one task of a catalog and print the stored result.
    Submit {
        /// Path to a JSON array of task entries.
        #[arg(short, long)]
        catalog: PathBuf,

        /// Position of the task in the catalog.
        #[arg(long)]
        task_index: usize,

        /// Path to the submitted program JSON file.
        #[arg(short, long)]
        submission: PathBuf,

        /// Display name of the submitting player (default: placeholder user).
        #[arg(long)]
        user: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };
    if let Some(max_steps) = cli.max_steps {
        config.limits.max_steps = max_steps;
    }
    if let Some(max_output_size) = cli.max_output_size {
        config.limits.max_output_size = max_output_size;
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(config.log_level)
        .init();

    let exit_code = match cli.command {
        Commands::Check { program } => run_check(&config, &program),
        Commands::Run {
            program,
            input,
            input_file,
            trace,
        } => run_program(&config, &program, input.as_deref(), input_file.as_deref(), trace),
        Commands::Grade { task, submission } => run_grade(&config, &task, &submission),
        Commands::ValidateTask { task } => run_validate_task(&config, &task),
        Commands::List { catalog } => run_list(&config, &catalog),
        Commands::Submit {
            catalog,
            task_index,
            submission,
            user,
        } => run_submit(&config, &catalog, task_index, &submission, user),
    };
    process::exit(exit_code);
}

/// Execute the check subcommand.
///
/// Returns exit code: 0 = valid, 2 = invalid program, 3 = I/O error.
fn run_check(config: &Config, path: &Path) -> i32 {
    let doc = match read_json(path) {
        Ok(doc) => doc,
        Err(code) => return code,
    };
    match parse_program_with_limits(&doc, &config.parse_limits) {
        Ok(program) => {
            print_json(&json!({
                "valid": true,
                "commands": program.command_count(),
                "depth": program.nesting_depth(),
                "canonical": program.to_json(),
            }));
            0
        }
        Err(e) => {
            eprintln!("Invalid program: {}", e);
            2
        }
    }
}

/// Execute the run subcommand.
///
/// Returns exit code: 0 = completed, 1 = runtime failure,
/// 2 = invalid program or input, 3 = I/O error.
fn run_program(config: &Config, path: &Path, input: Option<&str>, input_file: Option<&Path>, trace: bool) -> i32 {
    let doc = match read_json(path) {
        Ok(doc) => doc,
        Err(code) => return code,
    };
    let program = match parse_program_with_limits(&doc, &config.parse_limits) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("Invalid program: {}", e);
            return 2;
        }
    };
    let input = match (input, input_file) {
        (Some(text), _) => match serde_json::from_str(text) {
            Ok(input) => input,
            Err(e) => {
                eprintln!("Error: --input is not valid JSON: {}", e);
                return 2;
            }
        },
        (None, Some(file)) => match read_json(file) {
            Ok(input) => input,
            Err(code) => return code,
        },
        (None, None) => Json::Null,
    };

    let mut interp = Interpreter::new(
        &program,
        InterpreterConfig {
            limits: config.limits,
            trace_enabled: trace,
        },
    );
    let result = interp.run(&input);
    let (mut report, code) = match result {
        ExecutionResult::Completed(output) => (json!({"output": output.to_json()}), 0),
        ExecutionResult::Failed(error) => (json!({"error": error}), 1),
    };
    report["steps"] = json!(interp.steps_taken());
    if let Some(entries) = interp.trace() {
        report["trace"] = json!(entries);
    }
    print_json(&report);
    code
}

/// Execute the grade subcommand.
///
/// Returns exit code: 0 = success verdict, 1 = failure verdict,
/// 2 = invalid task or submission, 3 = I/O error.
fn run_grade(config: &Config, task_path: &Path, submission_path: &Path) -> i32 {
    let task = match read_task(task_path) {
        Ok(task) => task,
        Err(code) => return code,
    };
    let submitted = match read_json(submission_path) {
        Ok(doc) => doc,
        Err(code) => return code,
    };
    match evaluate_submission(&task, &submitted, &config.eval_options()) {
        Ok(evaluation) => {
            print_json(&evaluation);
            verdict_code(evaluation.verdict())
        }
        Err(e) => eval_error_code(&e),
    }
}

/// Execute the validate-task subcommand.
///
/// Returns exit code: 0 = valid, 2 = invalid task, 3 = I/O error.
fn run_validate_task(config: &Config, path: &Path) -> i32 {
    let task = match read_task(path) {
        Ok(task) => task,
        Err(code) => return code,
    };
    match validate_task_definition(&task, &config.eval_options()) {
        Ok(validated) => {
            print_json(&json!({
                "valid": true,
                "cases": validated.cases.len(),
                "commands": validated.program.command_count(),
            }));
            0
        }
        Err(e) => eval_error_code(&e),
    }
}

/// Execute the list subcommand.
///
/// Returns exit code: 0 = listed, 2 = invalid catalog, 3 = I/O error.
fn run_list(config: &Config, catalog_path: &Path) -> i32 {
    let service = match load_catalog(config, catalog_path) {
        Ok((service, _)) => service,
        Err(code) => return code,
    };
    match service.list_published_tasks() {
        Ok(tasks) => {
            print_json(&tasks);
            0
        }
        Err(e) => service_error_code(&e),
    }
}

/// Execute the submit subcommand.
///
/// Returns exit code: 0 = success verdict, 1 = failure verdict,
/// 2 = invalid catalog, task index or submission, 3 = I/O error.
fn run_submit(config: &Config, catalog_path: &Path, task_index: usize, submission_path: &Path, user: Option<String>) -> i32 {
    let (mut service, task_ids) = match load_catalog(config, catalog_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let Some(&task_id) = task_ids.get(task_index) else {
        eprintln!("Error: task index {} is out of range ({} tasks in catalog)", task_index, task_ids.len());
        return 2;
    };
    let submitted = match read_json(submission_path) {
        Ok(doc) => doc,
        Err(code) => return code,
    };

    let user_id = match user {
        Some(display_name) => {
            let registered = service.register_user(NewUser {
                auth_user_id: None,
                display_name,
                role: UserRole::Player,
            });
            match registered {
                Ok(user) => user.id,
                Err(e) => return service_error_code(&e),
            }
        }
        None => UserId::PLACEHOLDER,
    };

    match service.submit_solution(task_id, user_id, submitted) {
        Ok(outcome) => {
            print_json(&outcome);
            verdict_code(outcome.evaluation.verdict())
        }
        Err(e) => service_error_code(&e),
    }
}

/// Builds an in-memory service holding every task of the catalog file.
fn load_catalog(config: &Config, path: &Path) -> Result<(TaskService<InMemoryStore>, Vec<TaskId>), i32> {
    let catalog = read_json(path)?;
    let mut service = TaskService::new(InMemoryStore::new(), config.eval_options());
    match service.import_catalog(&catalog) {
        Ok(tasks) => {
            let ids = tasks.iter().map(|task| task.id).collect();
            Ok((service, ids))
        }
        Err(e) => Err(service_error_code(&e)),
    }
}

fn read_task(path: &Path) -> Result<TaskDefinition, i32> {
    let doc = read_json(path)?;
    serde_json::from_value(doc).map_err(|e| {
        eprintln!("Error: '{}' is not a task definition: {}", path.display(), e);
        2
    })
}

/// Reads and decodes a JSON file. Unreadable files map to exit code 3,
/// undecodable ones to 2.
fn read_json(path: &Path) -> Result<Json, i32> {
    let text = fs::read_to_string(path).map_err(|e| {
        eprintln!("Error: failed to read '{}': {}", path.display(), e);
        3
    })?;
    serde_json::from_str(&text).map_err(|e| {
        eprintln!("Error: '{}' is not valid JSON: {}", path.display(), e);
        2
    })
}

fn print_json<T: Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize result: {}\"}}", e));
    println!("{}", json);
}

fn verdict_code(verdict: Verdict) -> i32 {
    match verdict {
        Verdict::Success => 0,
        Verdict::Failure => 1,
    }
}

fn eval_error_code(error: &EvalError) -> i32 {
    match error {
        EvalError::ReferenceFailed { summary } => {
            eprintln!("Invalid task: {}", error);
            print_json(summary);
        }
        EvalError::SubmittedProgram(_) => eprintln!("Invalid submission: {}", error),
        EvalError::ReferenceProgram(_) | EvalError::Configuration(_) => eprintln!("Invalid task: {}", error),
    }
    2
}

fn service_error_code(error: &ServiceError) -> i32 {
    match error {
        ServiceError::Evaluation(e) => eval_error_code(e),
        ServiceError::InvalidRequest(_) | ServiceError::NotFound(_) => {
            eprintln!("Error: {}", error);
            2
        }
        ServiceError::Storage(_) => {
            eprintln!("Storage error: {}", error);
            1
        }
    }
}
