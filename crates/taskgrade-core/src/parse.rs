//! Program Representation: JSON document → validated [`Program`].
//!
//! The parser is the only place where stored or submitted program documents
//! are trusted. It checks the document version, matches every command against
//! exactly one known shape, rejects forward references to variables, and
//! bounds both program size and nesting depth so the interpreter never has to
//! deal with unbounded structure.
//!
//! Parsing is pure: the same document always yields the same [`Program`] or
//! the same [`ParseError`].
//!
//! # Variable scoping
//!
//! Variables live in one flat namespace. A reference is valid when a
//! textually earlier `assign` or `for_each` binds the name, or the name is
//! the predefined `input`. Binding inside a branch that may not run is still
//! accepted here; the interpreter reports `UndefinedVariable` if the branch
//! was skipped at runtime.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::{Map, Value as Json};

use crate::error::ParseError;
use crate::ops::{BinaryOp, UnaryOp};
use crate::program::{Command, Expr, Program};
use crate::value::Value;

/// The only program document version understood by this crate.
pub const PROGRAM_VERSION: u64 = 1;

/// Name of the variable bound to the test case input.
pub const INPUT_VARIABLE: &str = "input";

/// Structural bounds enforced while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLimits {
    /// Maximum number of commands, nested bodies included. Default: 1000.
    pub max_commands: usize,
    /// Maximum control-flow nesting depth. Default: 16.
    pub max_depth: usize,
    /// Maximum expression nesting depth. Default: 32.
    pub max_expr_depth: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        ParseLimits {
            max_commands: 1000,
            max_depth: 16,
            max_expr_depth: 32,
        }
    }
}

/// Parses a program document with the default [`ParseLimits`].
pub fn parse_program(doc: &Json) -> Result<Program, ParseError> {
    parse_program_with_limits(doc, &ParseLimits::default())
}

/// Parses a program document, enforcing the given limits.
pub fn parse_program_with_limits(doc: &Json, limits: &ParseLimits) -> Result<Program, ParseError> {
    let object = doc.as_object().ok_or_else(|| ParseError::MalformedDocument {
        reason: format!("expected a JSON object, got {}", json_kind(doc)),
    })?;

    match object.get("version") {
        None => {
            return Err(ParseError::MalformedDocument {
                reason: "missing 'version' field".into(),
            })
        }
        Some(version) if version.as_u64() == Some(PROGRAM_VERSION) => {}
        Some(version) => {
            return Err(ParseError::UnsupportedVersion {
                found: version.to_string(),
            })
        }
    }

    let commands = match object.get("commands") {
        Some(Json::Array(items)) => items,
        Some(other) => {
            return Err(ParseError::MalformedDocument {
                reason: format!("'commands' must be an array, got {}", json_kind(other)),
            })
        }
        None => {
            return Err(ParseError::MalformedDocument {
                reason: "missing 'commands' field".into(),
            })
        }
    };

    if let Some(key) = object.keys().find(|k| *k != "version" && *k != "commands") {
        return Err(ParseError::MalformedDocument {
            reason: format!("unexpected top-level field '{key}'"),
        });
    }

    let mut parser = Parser::new(limits);
    let mut parsed = Vec::with_capacity(commands.len());
    for (index, item) in commands.iter().enumerate() {
        let command = parser.parse_command(item, 0).map_err(|failure| match failure {
            Failure::Invalid(reason) => ParseError::InvalidCommand { index, reason },
            Failure::TooLarge => ParseError::ProgramTooLarge {
                limit: limits.max_commands,
            },
            Failure::TooDeep => ParseError::ProgramTooDeep {
                limit: limits.max_depth,
            },
        })?;
        parsed.push(command);
    }

    Ok(Program::new(parsed))
}

/// Internal failure, converted to a [`ParseError`] at the top level where the
/// command index is known.
#[derive(Debug)]
enum Failure {
    Invalid(String),
    TooLarge,
    TooDeep,
}

impl Failure {
    /// Prefixes an `Invalid` reason with the location it came from.
    fn within(self, location: &str) -> Failure {
        match self {
            Failure::Invalid(reason) => Failure::Invalid(format!("{location}: {reason}")),
            other => other,
        }
    }
}

fn invalid(reason: impl Into<String>) -> Failure {
    Failure::Invalid(reason.into())
}

struct Parser<'l> {
    limits: &'l ParseLimits,
    command_count: usize,
    defined: HashSet<String>,
    loop_depth: usize,
}

impl<'l> Parser<'l> {
    fn new(limits: &'l ParseLimits) -> Self {
        let mut defined = HashSet::new();
        defined.insert(INPUT_VARIABLE.to_string());
        Parser {
            limits,
            command_count: 0,
            defined,
            loop_depth: 0,
        }
    }

    fn parse_command(&mut self, json: &Json, depth: usize) -> Result<Command, Failure> {
        self.command_count += 1;
        if self.command_count > self.limits.max_commands {
            return Err(Failure::TooLarge);
        }

        let object = json
            .as_object()
            .ok_or_else(|| invalid(format!("expected a command object, got {}", json_kind(json))))?;
        let op = match object.get("op") {
            Some(Json::String(op)) => op.as_str(),
            Some(other) => return Err(invalid(format!("'op' must be a string, got {}", json_kind(other)))),
            None => return Err(invalid("missing 'op' field")),
        };

        match op {
            "assign" => {
                expect_fields(object, op, &["var", "value"], &[])?;
                let var = variable_name(object, "var")?;
                let value = self.parse_field_expr(object, "value")?;
                self.defined.insert(var.clone());
                Ok(Command::Assign { var, value })
            }
            "emit" => {
                expect_fields(object, op, &["value"], &[])?;
                let value = self.parse_field_expr(object, "value")?;
                Ok(Command::Emit { value })
            }
            "if" => {
                expect_fields(object, op, &["cond", "then"], &["else"])?;
                let cond = self.parse_field_expr(object, "cond")?;
                let then_branch = self.parse_body(object, "then", depth)?;
                let else_branch = match object.get("else") {
                    Some(_) => self.parse_body(object, "else", depth)?,
                    None => Vec::new(),
                };
                Ok(Command::If {
                    cond,
                    then_branch,
                    else_branch,
                })
            }
            "while" => {
                expect_fields(object, op, &["cond", "body"], &[])?;
                let cond = self.parse_field_expr(object, "cond")?;
                let body = self.parse_loop_body(object, depth)?;
                Ok(Command::While { cond, body })
            }
            "loop" => {
                expect_fields(object, op, &["body"], &[])?;
                let body = self.parse_loop_body(object, depth)?;
                Ok(Command::Loop { body })
            }
            "for_each" => {
                expect_fields(object, op, &["var", "in", "body"], &[])?;
                let var = variable_name(object, "var")?;
                let iterable = self.parse_field_expr(object, "in")?;
                self.defined.insert(var.clone());
                let body = self.parse_loop_body(object, depth)?;
                Ok(Command::ForEach {
                    var,
                    iterable,
                    body,
                })
            }
            "break" => {
                expect_fields(object, op, &[], &[])?;
                if self.loop_depth == 0 {
                    return Err(invalid("'break' outside of a loop"));
                }
                Ok(Command::Break)
            }
            other => Err(invalid(format!("unknown op '{other}'"))),
        }
    }

    fn parse_loop_body(&mut self, object: &Map<String, Json>, depth: usize) -> Result<Vec<Command>, Failure> {
        self.loop_depth += 1;
        let body = self.parse_body(object, "body", depth);
        self.loop_depth -= 1;
        body
    }

    fn parse_body(
        &mut self,
        object: &Map<String, Json>,
        field: &str,
        depth: usize,
    ) -> Result<Vec<Command>, Failure> {
        let items = match object.get(field) {
            Some(Json::Array(items)) => items,
            Some(other) => {
                return Err(invalid(format!(
                    "'{field}' must be an array of commands, got {}",
                    json_kind(other)
                )))
            }
            None => return Err(invalid(format!("missing '{field}' field"))),
        };

        let inner = depth + 1;
        if inner > self.limits.max_depth {
            return Err(Failure::TooDeep);
        }

        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                self.parse_command(item, inner)
                    .map_err(|f| f.within(&format!("{field}[{i}]")))
            })
            .collect()
    }

    fn parse_field_expr(&mut self, object: &Map<String, Json>, field: &str) -> Result<Expr, Failure> {
        let json = object
            .get(field)
            .ok_or_else(|| invalid(format!("missing '{field}' field")))?;
        self.parse_expr(json, 1).map_err(|f| f.within(field))
    }

    fn parse_expr(&self, json: &Json, depth: usize) -> Result<Expr, Failure> {
        if depth > self.limits.max_expr_depth {
            return Err(invalid(format!(
                "expression nested deeper than {}",
                self.limits.max_expr_depth
            )));
        }

        match json {
            Json::Null | Json::Bool(_) | Json::Number(_) => Ok(Expr::Literal(literal(json)?)),
            Json::String(name) => self.variable(name),
            Json::Array(items) => items
                .iter()
                .map(|item| self.parse_expr(item, depth + 1))
                .collect::<Result<Vec<_>, _>>()
                .map(Expr::List),
            Json::Object(map) => {
                let mut entries = map.iter();
                let (key, arg) = match (entries.next(), entries.next()) {
                    (Some(entry), None) => entry,
                    _ => {
                        return Err(invalid(
                            "expression objects must have exactly one operator key",
                        ))
                    }
                };
                self.parse_operator(key, arg, depth)
            }
        }
    }

    fn parse_operator(&self, key: &str, arg: &Json, depth: usize) -> Result<Expr, Failure> {
        match key {
            "lit" => Ok(Expr::Literal(literal(arg)?)),
            "var" => match arg {
                Json::String(name) => self.variable(name),
                other => Err(invalid(format!("'var' expects a string, got {}", json_kind(other)))),
            },
            "object" => {
                let fields = arg
                    .as_object()
                    .ok_or_else(|| invalid(format!("'object' expects an object, got {}", json_kind(arg))))?;
                let mut parsed = IndexMap::with_capacity(fields.len());
                for (field, expr) in fields {
                    parsed.insert(field.clone(), self.parse_expr(expr, depth + 1)?);
                }
                Ok(Expr::Object(parsed))
            }
            "set" => {
                let [target, key, value] = operands::<3>(key, arg)?;
                Ok(Expr::Set {
                    target: Box::new(self.parse_expr(target, depth + 1)?),
                    key: Box::new(self.parse_expr(key, depth + 1)?),
                    value: Box::new(self.parse_expr(value, depth + 1)?),
                })
            }
            _ => {
                if let Some(op) = UnaryOp::from_keyword(key) {
                    return Ok(Expr::Unary {
                        op,
                        operand: Box::new(self.parse_expr(arg, depth + 1)?),
                    });
                }
                if let Some(op) = BinaryOp::from_keyword(key) {
                    let [lhs, rhs] = operands::<2>(key, arg)?;
                    return Ok(Expr::Binary {
                        op,
                        lhs: Box::new(self.parse_expr(lhs, depth + 1)?),
                        rhs: Box::new(self.parse_expr(rhs, depth + 1)?),
                    });
                }
                Err(invalid(format!("unknown operator '{key}'")))
            }
        }
    }

    fn variable(&self, name: &str) -> Result<Expr, Failure> {
        if name.is_empty() {
            return Err(invalid("variable names must not be empty"));
        }
        if !self.defined.contains(name) {
            return Err(invalid(format!(
                "variable '{name}' is referenced before any assignment"
            )));
        }
        Ok(Expr::Var(name.to_string()))
    }
}

/// Checks that `object` holds exactly `op`, the required fields, and any of
/// the optional ones.
fn expect_fields(
    object: &Map<String, Json>,
    op: &str,
    required: &[&str],
    optional: &[&str],
) -> Result<(), Failure> {
    for field in required {
        if !object.contains_key(*field) {
            return Err(invalid(format!("'{op}' requires field '{field}'")));
        }
    }
    for key in object.keys() {
        if key != "op" && !required.contains(&key.as_str()) && !optional.contains(&key.as_str()) {
            return Err(invalid(format!("unexpected field '{key}' for '{op}'")));
        }
    }
    Ok(())
}

fn variable_name(object: &Map<String, Json>, field: &str) -> Result<String, Failure> {
    match object.get(field) {
        Some(Json::String(name)) if !name.is_empty() => Ok(name.clone()),
        Some(Json::String(_)) => Err(invalid(format!("'{field}' must not be empty"))),
        Some(other) => Err(invalid(format!("'{field}' must be a string, got {}", json_kind(other)))),
        None => Err(invalid(format!("missing '{field}' field"))),
    }
}

fn operands<'j, const N: usize>(key: &str, arg: &'j Json) -> Result<[&'j Json; N], Failure> {
    let items = arg
        .as_array()
        .ok_or_else(|| invalid(format!("'{key}' expects an array of {N} operands")))?;
    let refs: Vec<&Json> = items.iter().collect();
    refs.try_into().map_err(|refs: Vec<&Json>| {
        invalid(format!("'{key}' expects {N} operands, got {}", refs.len()))
    })
}

fn literal(json: &Json) -> Result<Value, Failure> {
    Value::from_json(json).map_err(|e| invalid(e.to_string()))
}

pub(crate) fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
