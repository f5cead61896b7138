//! Operator enums used by DSL expressions.
//!
//! Every operator has a fixed JSON keyword. An operator expression is an
//! object with exactly one key, e.g. `{"add": [a, b]}` or `{"not": a}`.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Grouped operator families
// ---------------------------------------------------------------------------

/// Binary arithmetic operators.
///
/// Integers use checked `i64` arithmetic and floats must stay finite; both
/// operands must have the same numeric kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    /// Integer division truncates toward zero.
    Div,
    Rem,
}

/// Comparison operators.
///
/// `Eq`/`Ne` accept any two values. Ordering comparisons accept two integers,
/// two floats, or two strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Short-circuiting boolean operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicOp {
    And,
    Or,
}

/// Single-operand operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Numeric negation.
    Neg,
    /// Boolean negation.
    Not,
    /// Length of a list, string (in chars), or map.
    Len,
}

/// Two-operand operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Arith(ArithOp),
    Compare(CmpOp),
    Logic(LogicOp),
    /// `get [container, key]`: list index or map key lookup.
    Get,
    /// `concat [a, b]`: two strings or two lists.
    Concat,
    /// `push [list, item]`: a new list with `item` appended.
    Push,
}

impl UnaryOp {
    pub const ALL: [UnaryOp; 3] = [UnaryOp::Neg, UnaryOp::Not, UnaryOp::Len];

    /// The JSON keyword for this operator.
    pub fn keyword(self) -> &'static str {
        match self {
            UnaryOp::Neg => "neg",
            UnaryOp::Not => "not",
            UnaryOp::Len => "len",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.keyword() == keyword)
    }
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 16] = [
        BinaryOp::Arith(ArithOp::Add),
        BinaryOp::Arith(ArithOp::Sub),
        BinaryOp::Arith(ArithOp::Mul),
        BinaryOp::Arith(ArithOp::Div),
        BinaryOp::Arith(ArithOp::Rem),
        BinaryOp::Compare(CmpOp::Eq),
        BinaryOp::Compare(CmpOp::Ne),
        BinaryOp::Compare(CmpOp::Lt),
        BinaryOp::Compare(CmpOp::Le),
        BinaryOp::Compare(CmpOp::Gt),
        BinaryOp::Compare(CmpOp::Ge),
        BinaryOp::Logic(LogicOp::And),
        BinaryOp::Logic(LogicOp::Or),
        BinaryOp::Get,
        BinaryOp::Concat,
        BinaryOp::Push,
    ];

    /// The JSON keyword for this operator.
    pub fn keyword(self) -> &'static str {
        match self {
            BinaryOp::Arith(ArithOp::Add) => "add",
            BinaryOp::Arith(ArithOp::Sub) => "sub",
            BinaryOp::Arith(ArithOp::Mul) => "mul",
            BinaryOp::Arith(ArithOp::Div) => "div",
            BinaryOp::Arith(ArithOp::Rem) => "rem",
            BinaryOp::Compare(CmpOp::Eq) => "eq",
            BinaryOp::Compare(CmpOp::Ne) => "ne",
            BinaryOp::Compare(CmpOp::Lt) => "lt",
            BinaryOp::Compare(CmpOp::Le) => "le",
            BinaryOp::Compare(CmpOp::Gt) => "gt",
            BinaryOp::Compare(CmpOp::Ge) => "ge",
            BinaryOp::Logic(LogicOp::And) => "and",
            BinaryOp::Logic(LogicOp::Or) => "or",
            BinaryOp::Get => "get",
            BinaryOp::Concat => "concat",
            BinaryOp::Push => "push",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.keyword() == keyword)
    }
}
