//! The validated DSL program model.
//!
//! A [`Program`] is an ordered sequence of [`Command`]s. Commands own their
//! nested bodies, so a program is a plain tree with no shared state: it can be
//! handed to any number of concurrent evaluations by reference.
//!
//! Programs are only constructed by [`crate::parse::parse_program`], which
//! enforces the structural invariants (known shapes, no forward references,
//! size and depth bounds). [`Program::to_json`] produces the canonical
//! document form, which parses back to an equal program.

use indexmap::IndexMap;
use serde_json::json;

use crate::ops::{BinaryOp, UnaryOp};
use crate::parse::PROGRAM_VERSION;
use crate::value::Value;

/// An immutable, validated DSL program.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    commands: Vec<Command>,
}

/// One executable command. The variant fully determines its operands.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `{"op": "assign", "var": name, "value": expr}`
    Assign { var: String, value: Expr },
    /// `{"op": "emit", "value": expr}`: append to the output accumulator.
    Emit { value: Expr },
    /// `{"op": "if", "cond": expr, "then": [...], "else": [...]}`
    If {
        cond: Expr,
        then_branch: Vec<Command>,
        else_branch: Vec<Command>,
    },
    /// `{"op": "while", "cond": expr, "body": [...]}`
    While { cond: Expr, body: Vec<Command> },
    /// `{"op": "loop", "body": [...]}`: runs until a `break`.
    Loop { body: Vec<Command> },
    /// `{"op": "for_each", "var": name, "in": expr, "body": [...]}`
    ForEach {
        var: String,
        iterable: Expr,
        body: Vec<Command>,
    },
    /// `{"op": "break"}`: leave the innermost loop.
    Break,
}

/// A side-effect free expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Var(String),
    /// Builds a list from element expressions (a bare JSON array).
    List(Vec<Expr>),
    /// Builds a map from field expressions (`{"object": {...}}`).
    Object(IndexMap<String, Expr>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `{"set": [target, key, value]}`: a copy of a map with `key` bound, or
    /// of a list with the element at index `key` replaced.
    Set {
        target: Box<Expr>,
        key: Box<Expr>,
        value: Box<Expr>,
    },
}

impl Program {
    pub(crate) fn new(commands: Vec<Command>) -> Self {
        Program { commands }
    }

    /// Top-level commands in execution order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Total number of commands, nested bodies included.
    pub fn command_count(&self) -> usize {
        count_commands(&self.commands)
    }

    /// Deepest control-flow nesting level (0 for straight-line programs).
    pub fn nesting_depth(&self) -> usize {
        block_depth(&self.commands)
    }

    /// Serializes the program to its canonical JSON document.
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "version": PROGRAM_VERSION,
            "commands": block_to_json(&self.commands),
        })
    }
}

impl Command {
    /// The `op` tag of this command.
    pub fn op_name(&self) -> &'static str {
        match self {
            Command::Assign { .. } => "assign",
            Command::Emit { .. } => "emit",
            Command::If { .. } => "if",
            Command::While { .. } => "while",
            Command::Loop { .. } => "loop",
            Command::ForEach { .. } => "for_each",
            Command::Break => "break",
        }
    }

    /// Nested command bodies, in source order.
    pub fn bodies(&self) -> Vec<&[Command]> {
        match self {
            Command::If {
                then_branch,
                else_branch,
                ..
            } => vec![then_branch.as_slice(), else_branch.as_slice()],
            Command::While { body, .. } | Command::Loop { body } | Command::ForEach { body, .. } => {
                vec![body.as_slice()]
            }
            Command::Assign { .. } | Command::Emit { .. } | Command::Break => Vec::new(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Command::Assign { var, value } => {
                json!({ "op": "assign", "var": var, "value": value.to_json() })
            }
            Command::Emit { value } => json!({ "op": "emit", "value": value.to_json() }),
            Command::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let mut doc = json!({
                    "op": "if",
                    "cond": cond.to_json(),
                    "then": block_to_json(then_branch),
                });
                if !else_branch.is_empty() {
                    doc["else"] = block_to_json(else_branch);
                }
                doc
            }
            Command::While { cond, body } => {
                json!({ "op": "while", "cond": cond.to_json(), "body": block_to_json(body) })
            }
            Command::Loop { body } => json!({ "op": "loop", "body": block_to_json(body) }),
            Command::ForEach {
                var,
                iterable,
                body,
            } => json!({
                "op": "for_each",
                "var": var,
                "in": iterable.to_json(),
                "body": block_to_json(body),
            }),
            Command::Break => json!({ "op": "break" }),
        }
    }
}

impl Expr {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            // Scalars are written bare; strings and containers need `lit` so
            // they are not read back as variable references or constructors.
            Expr::Literal(value) => match value {
                Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) => value.to_json(),
                Value::Str(_) | Value::List(_) | Value::Map(_) => json!({ "lit": value.to_json() }),
            },
            Expr::Var(name) => serde_json::Value::String(name.clone()),
            Expr::List(items) => serde_json::Value::Array(items.iter().map(Expr::to_json).collect()),
            Expr::Object(fields) => {
                let fields: serde_json::Map<String, serde_json::Value> = fields
                    .iter()
                    .map(|(key, expr)| (key.clone(), expr.to_json()))
                    .collect();
                json!({ "object": fields })
            }
            Expr::Unary { op, operand } => json!({ op.keyword(): operand.to_json() }),
            Expr::Binary { op, lhs, rhs } => {
                json!({ op.keyword(): [lhs.to_json(), rhs.to_json()] })
            }
            Expr::Set { target, key, value } => {
                json!({ "set": [target.to_json(), key.to_json(), value.to_json()] })
            }
        }
    }

    /// Nesting depth of this expression (a literal or variable is 1).
    pub fn depth(&self) -> usize {
        1 + match self {
            Expr::Literal(_) | Expr::Var(_) => 0,
            Expr::List(items) => items.iter().map(Expr::depth).max().unwrap_or(0),
            Expr::Object(fields) => fields.values().map(Expr::depth).max().unwrap_or(0),
            Expr::Unary { operand, .. } => operand.depth(),
            Expr::Binary { lhs, rhs, .. } => lhs.depth().max(rhs.depth()),
            Expr::Set { target, key, value } => target.depth().max(key.depth()).max(value.depth()),
        }
    }
}

fn block_to_json(block: &[Command]) -> serde_json::Value {
    serde_json::Value::Array(block.iter().map(Command::to_json).collect())
}

fn count_commands(block: &[Command]) -> usize {
    block
        .iter()
        .map(|command| {
            1 + command
                .bodies()
                .into_iter()
                .map(count_commands)
                .sum::<usize>()
        })
        .sum()
}

fn block_depth(block: &[Command]) -> usize {
    block
        .iter()
        .map(|command| {
            command
                .bodies()
                .into_iter()
                .map(|body| 1 + block_depth(body))
                .max()
                .unwrap_or(0)
        })
        .max()
        .unwrap_or(0)
}
