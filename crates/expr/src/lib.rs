//! Expression evaluator: typed value expression trees over a packed
//! record, supporting constants, attribute references, the
//! comparison/logical operators `{=, <, AND, OR}`, and `NOT`.


use catalog::Schema;
use common::{DbError, DbResult};
use types::Value;

/// Binary operators the evaluator supports: equality and less-than
/// comparisons, plus the two logical connectives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Eq,
    Lt,
    And,
    Or,
}

/// Unary operators. Logical NOT is the only one supported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
    Not,
}

/// Expression abstract syntax tree, evaluated against one packed record
/// plus the schema that describes it.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Const(Value),
    AttrRef(usize),
    BinOp(BinOp, Box<Expr>, Box<Expr>),
    UnOp(UnOp, Box<Expr>),
}

impl Expr {
    pub fn attr(i: usize) -> Self {
        Expr::AttrRef(i)
    }

    pub fn eq(left: Expr, right: Expr) -> Self {
        Expr::BinOp(BinOp::Eq, Box::new(left), Box::new(right))
    }

    pub fn lt(left: Expr, right: Expr) -> Self {
        Expr::BinOp(BinOp::Lt, Box::new(left), Box::new(right))
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::BinOp(BinOp::And, Box::new(left), Box::new(right))
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::BinOp(BinOp::Or, Box::new(left), Box::new(right))
    }

    pub fn not(inner: Expr) -> Self {
        Expr::UnOp(UnOp::Not, Box::new(inner))
    }
}

/// Evaluate `expr` against `record`, laid out per `schema`. Comparisons
/// return `Bool`; `AND`/`OR`/`NOT` require `Bool` operands.
pub fn eval(expr: &Expr, schema: &Schema, record: &[u8]) -> DbResult<Value> {
    match expr {
        Expr::Const(v) => Ok(v.clone()),
        Expr::AttrRef(i) => schema.get_attr(record, *i),
        Expr::UnOp(UnOp::Not, inner) => {
            let v = eval(inner, schema, record)?;
            let b = require_bool(&v, "NOT")?;
            Ok(Value::Bool(!b))
        }
        Expr::BinOp(op, left, right) => {
            let lv = eval(left, schema, record)?;
            let rv = eval(right, schema, record)?;
            eval_binop(*op, &lv, &rv)
        }
    }
}

fn eval_binop(op: BinOp, l: &Value, r: &Value) -> DbResult<Value> {
    match op {
        BinOp::And | BinOp::Or => {
            let lb = require_bool(l, "AND/OR")?;
            let rb = require_bool(r, "AND/OR")?;
            Ok(Value::Bool(match op {
                BinOp::And => lb && rb,
                BinOp::Or => lb || rb,
                _ => unreachable!(),
            }))
        }
        BinOp::Eq => {
            let eq = l.eq_same_type(r).ok_or_else(|| {
                DbError::SerializationError(format!("incompatible types for =: {l:?}, {r:?}"))
            })?;
            Ok(Value::Bool(eq))
        }
        BinOp::Lt => {
            let ord = l.cmp_same_type(r).ok_or_else(|| {
                DbError::SerializationError(format!("incompatible types for <: {l:?}, {r:?}"))
            })?;
            Ok(Value::Bool(ord == std::cmp::Ordering::Less))
        }
    }
}

fn require_bool(v: &Value, op_name: &str) -> DbResult<bool> {
    v.as_bool()
        .ok_or_else(|| DbError::SerializationError(format!("{op_name} expects bool, got {v:?}")))
}
