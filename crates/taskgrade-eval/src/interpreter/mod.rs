//! Sandboxed execution engine for DSL programs.
//!
//! Runs a parsed [`Program`](taskgrade_core::Program) against one JSON input,
//! producing either the emitted output or a typed runtime failure.
//!
//! # Architecture
//!
//! - [`Interpreter`] holds a reference to a program and runs it against
//!   inputs, exposing the step count and optional trace of the last run.
//! - [`ExecutionState`] is the per-run state: variables, emitted values and
//!   the step counter.
//! - [`Limits`] bounds steps, total output weight, and the weight and nesting
//!   of any single value.
//! - [`RuntimeError`] captures trap conditions (overflow, type mismatch,
//!   exhausted step budget, and so on).
//! - [`TraceEntry`] records each command dispatch when tracing is enabled.
//!
//! The language is closed: programs cannot perform I/O, reach the host
//! environment, or load code. Everything a program observes comes from its
//! `input` variable.
//!
//! # Usage
//!
//! ```ignore
//! let program = parse_program(&doc)?;
//! let mut interp = Interpreter::new(&program, InterpreterConfig::default());
//! match interp.run(&input) {
//!     ExecutionResult::Completed(output) => { /* compare output.to_json() */ }
//!     ExecutionResult::Failed(error) => { /* report error */ }
//! }
//! ```

pub mod error;
pub mod eval;
pub mod state;
pub mod trace;

pub use error::RuntimeError;
pub use state::{run, ExecutionResult, ExecutionState, Interpreter, InterpreterConfig, Limits, Output};
pub use trace::TraceEntry;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value as Json};
    use taskgrade_core::{parse_program, Program};

    fn program(commands: Json) -> Program {
        parse_program(&json!({"version": 1, "commands": commands})).unwrap()
    }

    fn run_default(commands: Json, input: Json) -> ExecutionResult {
        run(&program(commands), &input, &Limits::default())
    }

    fn output_of(commands: Json, input: Json) -> Json {
        match run_default(commands, input) {
            ExecutionResult::Completed(output) => output.to_json(),
            ExecutionResult::Failed(error) => panic!("run failed: {error}"),
        }
    }

    fn error_of(commands: Json, input: Json) -> RuntimeError {
        match run_default(commands, input) {
            ExecutionResult::Failed(error) => error,
            ExecutionResult::Completed(output) => panic!("expected failure, got {:?}", output),
        }
    }

    #[test]
    fn assign_then_emit_sum() {
        let out = output_of(
            json!([
                {"op": "assign", "var": "x", "value": 1},
                {"op": "emit", "value": {"add": ["x", 1]}}
            ]),
            json!({}),
        );
        assert_eq!(out, json!(2));
    }

    #[test]
    fn assign_then_emit_variable() {
        let out = output_of(
            json!([
                {"op": "assign", "var": "x", "value": 2},
                {"op": "emit", "value": "x"}
            ]),
            json!(null),
        );
        assert_eq!(out, json!(2));
    }

    #[test]
    fn self_wrapping_list_hits_depth_limit() {
        let commands = json!([
            {"op": "assign", "var": "x", "value": []},
            {"op": "loop", "body": [{"op": "assign", "var": "x", "value": ["x"]}]}
        ]);
        assert_eq!(error_of(commands.clone(), json!(null)), RuntimeError::ValueTooDeep { limit: 128 });

        // A larger step budget does not change the outcome.
        let limits = Limits {
            max_steps: 200_000,
            ..Limits::default()
        };
        assert_eq!(
            run(&program(commands), &json!(null), &limits),
            ExecutionResult::Failed(RuntimeError::ValueTooDeep { limit: 128 })
        );
    }

    #[test]
    fn deeply_nested_input_is_rejected() {
        let mut input = json!(0);
        for _ in 0..200 {
            input = json!([input]);
        }
        assert_eq!(
            run_default(json!([{"op": "emit", "value": "input"}]), input),
            ExecutionResult::Failed(RuntimeError::ValueTooDeep { limit: 128 })
        );

        let mut shallow = json!(0);
        for _ in 0..128 {
            shallow = json!([shallow]);
        }
        assert!(run_default(json!([]), shallow).is_completed());
    }

    #[test]
    fn output_collapses_by_emit_count() {
        assert_eq!(output_of(json!([]), json!(null)), Json::Null);
        assert_eq!(
            output_of(
                json!([{"op": "emit", "value": 1}, {"op": "emit", "value": {"lit": "two"}}]),
                json!(null)
            ),
            json!([1, "two"])
        );
    }

    #[test]
    fn identity_program_emits_input() {
        let out = output_of(json!([{"op": "emit", "value": "input"}]), json!({"a": 1, "b": [true]}));
        assert_eq!(out, json!({"a": 1, "b": [true]}));
    }

    #[test]
    fn infinite_loop_stops_at_exactly_the_step_limit() {
        let program = program(json!([{"op": "loop", "body": []}]));
        let config = InterpreterConfig {
            limits: Limits {
                max_steps: 1000,
                ..Limits::default()
            },
            trace_enabled: false,
        };
        let mut interp = Interpreter::new(&program, config);
        let result = interp.run(&json!({}));
        assert_eq!(result, ExecutionResult::Failed(RuntimeError::StepLimitExceeded { limit: 1000 }));
        assert_eq!(interp.steps_taken(), 1000);
    }

    #[test]
    fn steps_count_dispatches_and_iterations() {
        let program = program(json!([
            {"op": "assign", "var": "i", "value": 0},
            {"op": "while", "cond": {"lt": ["i", 3]}, "body": [
                {"op": "assign", "var": "i", "value": {"add": ["i", 1]}}
            ]}
        ]));
        let mut interp = Interpreter::new(&program, InterpreterConfig::default());
        assert!(interp.run(&json!(null)).is_completed());
        // assign + while + 4 condition checks + 3 body assigns
        assert_eq!(interp.steps_taken(), 9);
    }

    #[test]
    fn while_loop_accumulates() {
        let out = output_of(
            json!([
                {"op": "assign", "var": "n", "value": {"get": ["input", {"lit": "n"}]}},
                {"op": "assign", "var": "acc", "value": 1},
                {"op": "while", "cond": {"gt": ["n", 0]}, "body": [
                    {"op": "assign", "var": "acc", "value": {"mul": ["acc", "n"]}},
                    {"op": "assign", "var": "n", "value": {"sub": ["n", 1]}}
                ]},
                {"op": "emit", "value": "acc"}
            ]),
            json!({"n": 5}),
        );
        assert_eq!(out, json!(120));
    }

    #[test]
    fn for_each_and_break() {
        let out = output_of(
            json!([
                {"op": "assign", "var": "total", "value": 0},
                {"op": "for_each", "var": "x", "in": "input", "body": [
                    {"op": "if", "cond": {"gt": ["x", 10]}, "then": [{"op": "break"}]},
                    {"op": "assign", "var": "total", "value": {"add": ["total", "x"]}}
                ]},
                {"op": "emit", "value": "total"}
            ]),
            json!([1, 2, 3, 50, 4]),
        );
        assert_eq!(out, json!(6));
    }

    #[test]
    fn loop_exits_through_break() {
        let out = output_of(
            json!([
                {"op": "assign", "var": "xs", "value": []},
                {"op": "loop", "body": [
                    {"op": "if", "cond": {"ge": [{"len": "xs"}, 3]}, "then": [{"op": "break"}]},
                    {"op": "assign", "var": "xs", "value": {"push": ["xs", {"len": "xs"}]}}
                ]},
                {"op": "emit", "value": "xs"}
            ]),
            json!(null),
        );
        assert_eq!(out, json!([0, 1, 2]));
    }

    #[test]
    fn if_else_selects_one_branch() {
        let commands = json!([
            {"op": "if", "cond": {"eq": ["input", 0]},
             "then": [{"op": "emit", "value": {"lit": "zero"}}],
             "else": [{"op": "emit", "value": {"lit": "other"}}]}
        ]);
        assert_eq!(output_of(commands.clone(), json!(0)), json!("zero"));
        assert_eq!(output_of(commands, json!(7)), json!("other"));
    }

    #[test]
    fn non_bool_condition_is_a_type_mismatch() {
        let err = error_of(json!([{"op": "if", "cond": 1, "then": []}]), json!(null));
        assert_eq!(
            err,
            RuntimeError::TypeMismatch {
                expected: "bool".into(),
                actual: "int".into()
            }
        );
    }

    #[test]
    fn variable_bound_in_skipped_branch_is_undefined() {
        let err = error_of(
            json!([
                {"op": "if", "cond": false, "then": [{"op": "assign", "var": "y", "value": 1}]},
                {"op": "emit", "value": "y"}
            ]),
            json!(null),
        );
        assert_eq!(err, RuntimeError::UndefinedVariable { name: "y".into() });
    }

    #[test]
    fn overflow_traps() {
        let err = error_of(
            json!([{"op": "emit", "value": {"add": ["input", 1]}}]),
            json!(i64::MAX),
        );
        assert_eq!(
            err,
            RuntimeError::NumericOverflow {
                operation: "add".into()
            }
        );
    }

    #[test]
    fn unrepresentable_input_is_rejected() {
        let err = error_of(json!([]), json!(u64::MAX));
        assert!(matches!(err, RuntimeError::NumericOverflow { .. }));
    }

    #[test]
    fn output_size_is_bounded() {
        let program = program(json!([
            {"op": "loop", "body": [{"op": "emit", "value": {"lit": "0123456789"}}]}
        ]));
        let limits = Limits {
            max_output_size: 100,
            ..Limits::default()
        };
        assert_eq!(
            run(&program, &json!(null), &limits),
            ExecutionResult::Failed(RuntimeError::OutputTooLarge { limit: 100 })
        );
    }

    #[test]
    fn doubling_concat_hits_value_limit() {
        let err = error_of(
            json!([
                {"op": "assign", "var": "s", "value": {"lit": "ab"}},
                {"op": "loop", "body": [{"op": "assign", "var": "s", "value": {"concat": ["s", "s"]}}]}
            ]),
            json!(null),
        );
        assert_eq!(err, RuntimeError::ValueTooLarge { limit: 65_536 });
    }

    #[test]
    fn trace_records_each_dispatch() {
        let program = program(json!([
            {"op": "assign", "var": "x", "value": 2},
            {"op": "emit", "value": "x"}
        ]));
        let config = InterpreterConfig {
            trace_enabled: true,
            ..InterpreterConfig::default()
        };
        let mut interp = Interpreter::new(&program, config);
        let output = interp.run(&json!(null)).into_result().unwrap();
        assert_eq!(output.to_json(), json!(2));

        let trace = interp.trace().unwrap();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace[0].step, 1);
        assert_eq!(trace[0].op, "assign");
        assert_eq!(trace[0].variable.as_deref(), Some("x"));
        assert_eq!(trace[1].op, "emit");
        assert_eq!(trace[1].value, Some(json!(2)));
    }

    #[test]
    fn trace_disabled_by_default() {
        let program = program(json!([]));
        let mut interp = Interpreter::new(&program, InterpreterConfig::default());
        interp.run(&json!(null));
        assert!(interp.trace().is_none());
    }

    #[test]
    fn reruns_do_not_share_state() {
        let program = program(json!([{"op": "emit", "value": "input"}]));
        let mut interp = Interpreter::new(&program, InterpreterConfig::default());
        let first = interp.run(&json!(1));
        let second = interp.run(&json!(2));
        assert_eq!(first.into_result().unwrap().to_json(), json!(1));
        assert_eq!(second.into_result().unwrap().to_json(), json!(2));
        assert_eq!(interp.steps_taken(), 1);
    }
}
