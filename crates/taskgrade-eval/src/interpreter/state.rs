//! Interpreter state and command execution.
//!
//! The [`Interpreter`] walks a parsed [`Program`] block by block. Each run gets
//! a fresh [`ExecutionState`] holding the variable bindings, the output
//! accumulator and the step counter, so one interpreter can be reused for
//! several inputs without leaking state between them.
//!
//! Control flow is structured: `break` unwinds to the innermost loop through
//! the `Flow` value returned by each command. Recursion depth is bounded by
//! the parser's nesting limit.

use std::collections::HashMap;

use serde_json::Value as Json;

use taskgrade_core::{Command, Program, Value, INPUT_VARIABLE};

use super::error::RuntimeError;
use super::eval::{eval_condition, eval_expr};
use super::trace::TraceEntry;

/// Resource bounds for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of steps (command dispatches plus loop iterations).
    pub max_steps: u64,
    /// Maximum total weight of all emitted values.
    pub max_output_size: usize,
    /// Maximum weight of any single constructed value.
    pub max_value_size: usize,
    /// Maximum container nesting of any value, input included.
    pub max_value_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_steps: 10_000,
            max_output_size: 65_536,
            max_value_size: 65_536,
            max_value_depth: 128,
        }
    }
}

/// Configuration for the interpreter.
#[derive(Debug, Clone, Default)]
pub struct InterpreterConfig {
    pub limits: Limits,
    /// Whether to record execution traces.
    pub trace_enabled: bool,
}

/// Mutable state of one run: variables, emitted values and the step counter.
#[derive(Debug, Clone)]
pub struct ExecutionState {
    variables: HashMap<String, Value>,
    emitted: Vec<Value>,
    output_weight: usize,
    steps: u64,
}

impl ExecutionState {
    /// Creates a state with `input` bound to the given value.
    pub fn new(input: Value) -> Self {
        let mut variables = HashMap::new();
        variables.insert(INPUT_VARIABLE.to_string(), input);
        ExecutionState {
            variables,
            emitted: Vec::new(),
            output_weight: 0,
            steps: 0,
        }
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn bind(&mut self, name: &str, value: Value) {
        self.variables.insert(name.to_string(), value);
    }

    /// Charges one step, failing once the counter has reached the limit.
    fn charge(&mut self, limits: &Limits) -> Result<(), RuntimeError> {
        if self.steps >= limits.max_steps {
            return Err(RuntimeError::StepLimitExceeded {
                limit: limits.max_steps,
            });
        }
        self.steps += 1;
        Ok(())
    }

    fn emit(&mut self, value: Value, limits: &Limits) -> Result<(), RuntimeError> {
        let weight = self.output_weight.saturating_add(value.weight());
        if weight > limits.max_output_size {
            return Err(RuntimeError::OutputTooLarge {
                limit: limits.max_output_size,
            });
        }
        self.output_weight = weight;
        self.emitted.push(value);
        Ok(())
    }
}

/// Values emitted by a completed run, in emission order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Output {
    values: Vec<Value>,
}

impl Output {
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// The output document compared against a test case's expected value.
    ///
    /// No emits gives `null`, a single emit gives that value, and several
    /// emits give an array in emission order.
    pub fn to_json(&self) -> Json {
        match self.values.as_slice() {
            [] => Json::Null,
            [single] => single.to_json(),
            many => Json::Array(many.iter().map(Value::to_json).collect()),
        }
    }
}

/// Outcome of running a program against one input.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    Completed(Output),
    /// The run trapped. Anything emitted before the trap is discarded.
    Failed(RuntimeError),
}

impl ExecutionResult {
    pub fn is_completed(&self) -> bool {
        matches!(self, ExecutionResult::Completed(_))
    }

    pub fn into_result(self) -> Result<Output, RuntimeError> {
        match self {
            ExecutionResult::Completed(output) => Ok(output),
            ExecutionResult::Failed(error) => Err(error),
        }
    }
}

/// How a command finished: normally, or by breaking out of the innermost loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Normal,
    Break,
}

/// Executes a parsed program against inputs.
pub struct Interpreter<'p> {
    program: &'p Program,
    config: InterpreterConfig,
    /// Steps charged by the most recent run.
    steps_taken: u64,
    /// Execution trace of the most recent run (when enabled).
    trace: Option<Vec<TraceEntry>>,
}

impl<'p> Interpreter<'p> {
    pub fn new(program: &'p Program, config: InterpreterConfig) -> Self {
        let trace = if config.trace_enabled {
            Some(Vec::new())
        } else {
            None
        };

        Interpreter {
            program,
            config,
            steps_taken: 0,
            trace,
        }
    }

    /// Runs the program with `input` bound to the given JSON document.
    ///
    /// Resets the step counter and trace from any previous run.
    pub fn run(&mut self, input: &Json) -> ExecutionResult {
        self.steps_taken = 0;
        if let Some(trace) = &mut self.trace {
            trace.clear();
        }

        let max_depth = self.config.limits.max_value_depth;
        if json_depth_exceeds(input, max_depth) {
            return ExecutionResult::Failed(RuntimeError::ValueTooDeep { limit: max_depth });
        }
        let input = match Value::from_json(input) {
            Ok(value) => value,
            Err(_) => {
                return ExecutionResult::Failed(RuntimeError::NumericOverflow {
                    operation: INPUT_VARIABLE.to_string(),
                })
            }
        };

        let mut state = ExecutionState::new(input);
        let program = self.program;
        let outcome = self.exec_block(program.commands(), &mut state);
        self.steps_taken = state.steps;

        match outcome {
            // Break is rejected outside loops at parse time, so a top-level
            // Break cannot happen; treat it like normal completion.
            Ok(_) => ExecutionResult::Completed(Output {
                values: state.emitted,
            }),
            Err(error) => ExecutionResult::Failed(error),
        }
    }

    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    /// Returns the trace of the most recent run, if tracing is enabled.
    pub fn trace(&self) -> Option<&[TraceEntry]> {
        self.trace.as_deref()
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    fn exec_block(&mut self, commands: &[Command], state: &mut ExecutionState) -> Result<Flow, RuntimeError> {
        for command in commands {
            if self.exec_command(command, state)? == Flow::Break {
                return Ok(Flow::Break);
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_command(&mut self, command: &Command, state: &mut ExecutionState) -> Result<Flow, RuntimeError> {
        let limits = self.config.limits;
        state.charge(&limits)?;

        match command {
            Command::Assign { var, value } => {
                let value = eval_expr(value, state, &limits)?;
                self.record(state, command, Some(var.as_str()), Some(&value));
                state.bind(var, value);
                Ok(Flow::Normal)
            }

            Command::Emit { value } => {
                let value = eval_expr(value, state, &limits)?;
                self.record(state, command, None, Some(&value));
                state.emit(value, &limits)?;
                Ok(Flow::Normal)
            }

            Command::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.record(state, command, None, None);
                if eval_condition(cond, state, &limits)? {
                    self.exec_block(then_branch, state)
                } else {
                    self.exec_block(else_branch, state)
                }
            }

            Command::While { cond, body } => {
                self.record(state, command, None, None);
                loop {
                    state.charge(&limits)?;
                    if !eval_condition(cond, state, &limits)? {
                        break;
                    }
                    if self.exec_block(body, state)? == Flow::Break {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }

            Command::Loop { body } => {
                self.record(state, command, None, None);
                loop {
                    state.charge(&limits)?;
                    if self.exec_block(body, state)? == Flow::Break {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }

            Command::ForEach { var, iterable, body } => {
                let items = match eval_expr(iterable, state, &limits)? {
                    Value::List(items) => items,
                    other => return Err(RuntimeError::type_mismatch("list", other.type_name())),
                };
                self.record(state, command, None, None);
                for item in items {
                    state.charge(&limits)?;
                    state.bind(var, item);
                    if self.exec_block(body, state)? == Flow::Break {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }

            Command::Break => {
                self.record(state, command, None, None);
                Ok(Flow::Break)
            }
        }
    }

    fn record(&mut self, state: &ExecutionState, command: &Command, variable: Option<&str>, value: Option<&Value>) {
        if let Some(trace) = &mut self.trace {
            trace.push(TraceEntry {
                step: state.steps,
                op: command.op_name(),
                variable: variable.map(str::to_string),
                value: value.map(Value::to_json),
            });
        }
    }
}

/// Whether `json` nests containers deeper than `max`. Stops descending once
/// the limit is passed.
fn json_depth_exceeds(json: &Json, max: usize) -> bool {
    match json {
        Json::Array(items) => max == 0 || items.iter().any(|item| json_depth_exceeds(item, max - 1)),
        Json::Object(map) => max == 0 || map.values().any(|item| json_depth_exceeds(item, max - 1)),
        _ => false,
    }
}

/// Runs `program` against `input` with the given limits and no tracing.
pub fn run(program: &Program, input: &Json, limits: &Limits) -> ExecutionResult {
    let config = InterpreterConfig {
        limits: *limits,
        trace_enabled: false,
    };
    Interpreter::new(program, config).run(input)
}
