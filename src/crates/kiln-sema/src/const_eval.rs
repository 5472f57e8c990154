// const_eval.rs
//
// Compile-time expressions: generic constraints, value arguments, array
// lengths and parameter defaults.

use kiln_identity::{Identifier, Interner, Span};

use crate::errors::SemanticError;
use crate::generic::BindingFrame;
use crate::types::{ConstValue, GenericArg, Ty};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstExprKind {
    Int(i64),
    Bool(bool),
    /// A type operand, compared with `==` and `!=` only.
    Type(Ty),
    Param(Identifier),
    Unary(UnaryOp, Box<ConstExpr>),
    Binary(BinaryOp, Box<ConstExpr>, Box<ConstExpr>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstExpr {
    pub kind: ConstExprKind,
    pub span: Span,
}

impl ConstExpr {
    pub fn new(kind: ConstExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Literal standing for an already evaluated argument.
    pub fn literal(arg: &GenericArg, span: Span) -> Self {
        let kind = match arg {
            GenericArg::Type(ty) => ConstExprKind::Type(ty.clone()),
            GenericArg::Value(ConstValue::Int(v)) => ConstExprKind::Int(*v),
            GenericArg::Value(ConstValue::Bool(v)) => ConstExprKind::Bool(*v),
        };
        Self::new(kind, span)
    }

    /// Replace parameters bound in `frame` by their arguments.
    pub fn bind(&self, frame: &BindingFrame) -> ConstExpr {
        let kind = match &self.kind {
            ConstExprKind::Param(name) => match frame.get(name.name) {
                Some(arg) => return ConstExpr::literal(arg, self.span),
                None => ConstExprKind::Param(*name),
            },
            ConstExprKind::Unary(op, operand) => {
                ConstExprKind::Unary(*op, Box::new(operand.bind(frame)))
            }
            ConstExprKind::Binary(op, lhs, rhs) => {
                ConstExprKind::Binary(*op, Box::new(lhs.bind(frame)), Box::new(rhs.bind(frame)))
            }
            other => other.clone(),
        };
        ConstExpr::new(kind, self.span)
    }
}

fn eval_error(reason: impl Into<String>, span: Span) -> SemanticError {
    SemanticError::ConstEval {
        reason: reason.into(),
        span: span.into(),
    }
}

/// Evaluate `expr`, looking parameters up in `frame`.
pub fn eval(
    expr: &ConstExpr,
    frame: Option<&BindingFrame>,
    interner: &Interner,
) -> Result<GenericArg, SemanticError> {
    match &expr.kind {
        ConstExprKind::Int(v) => Ok(GenericArg::Value(ConstValue::Int(*v))),
        ConstExprKind::Bool(v) => Ok(GenericArg::Value(ConstValue::Bool(*v))),
        ConstExprKind::Type(ty) => Ok(GenericArg::Type(ty.clone())),
        ConstExprKind::Param(name) => frame
            .and_then(|frame| frame.get(name.name))
            .cloned()
            .ok_or_else(|| SemanticError::UnboundParameter {
                name: name.as_str(interner).to_string(),
                span: name.span.into(),
            }),
        ConstExprKind::Unary(op, operand) => {
            let value = eval(operand, frame, interner)?;
            match (op, value) {
                (UnaryOp::Neg, GenericArg::Value(ConstValue::Int(v))) => v
                    .checked_neg()
                    .map(|v| GenericArg::Value(ConstValue::Int(v)))
                    .ok_or_else(|| eval_error("integer overflow", expr.span)),
                (UnaryOp::Not, GenericArg::Value(ConstValue::Bool(v))) => {
                    Ok(GenericArg::Value(ConstValue::Bool(!v)))
                }
                (UnaryOp::Neg, other) => Err(eval_error(
                    format!("cannot negate a {}", other.describe()),
                    expr.span,
                )),
                (UnaryOp::Not, other) => Err(eval_error(
                    format!("cannot apply '!' to a {}", other.describe()),
                    expr.span,
                )),
            }
        }
        ConstExprKind::Binary(op, lhs, rhs) => eval_binary(*op, lhs, rhs, expr.span, frame, interner),
    }
}

fn eval_binary(
    op: BinaryOp,
    lhs: &ConstExpr,
    rhs: &ConstExpr,
    span: Span,
    frame: Option<&BindingFrame>,
    interner: &Interner,
) -> Result<GenericArg, SemanticError> {
    use ConstValue::{Bool, Int};

    let left = eval(lhs, frame, interner)?;

    // Short-circuit before the right operand is evaluated.
    match (op, &left) {
        (BinaryOp::And, GenericArg::Value(Bool(false))) => return Ok(GenericArg::Value(Bool(false))),
        (BinaryOp::Or, GenericArg::Value(Bool(true))) => return Ok(GenericArg::Value(Bool(true))),
        _ => {}
    }

    let right = eval(rhs, frame, interner)?;
    let mismatch = || {
        eval_error(
            format!(
                "cannot apply '{}' to {} and {}",
                op.as_str(),
                left.describe(),
                right.describe()
            ),
            span,
        )
    };

    let value = match op {
        BinaryOp::Eq | BinaryOp::Ne => {
            let same_kind = match (&left, &right) {
                (GenericArg::Type(_), GenericArg::Type(_)) => true,
                (GenericArg::Value(a), GenericArg::Value(b)) => a.value_type() == b.value_type(),
                _ => false,
            };
            if !same_kind {
                return Err(mismatch());
            }
            Bool((left == right) == (op == BinaryOp::Eq))
        }
        BinaryOp::And | BinaryOp::Or => match (&left, &right) {
            (GenericArg::Value(Bool(_)), GenericArg::Value(Bool(b))) => Bool(*b),
            _ => return Err(mismatch()),
        },
        _ => {
            let (GenericArg::Value(Int(a)), GenericArg::Value(Int(b))) = (&left, &right) else {
                return Err(mismatch());
            };
            let (a, b) = (*a, *b);
            let overflow = || eval_error("integer overflow", span);
            match op {
                BinaryOp::Add => Int(a.checked_add(b).ok_or_else(overflow)?),
                BinaryOp::Sub => Int(a.checked_sub(b).ok_or_else(overflow)?),
                BinaryOp::Mul => Int(a.checked_mul(b).ok_or_else(overflow)?),
                BinaryOp::Div | BinaryOp::Rem if b == 0 => {
                    return Err(eval_error("division by zero", span));
                }
                BinaryOp::Div => Int(a.checked_div(b).ok_or_else(overflow)?),
                BinaryOp::Rem => Int(a.checked_rem(b).ok_or_else(overflow)?),
                BinaryOp::Lt => Bool(a < b),
                BinaryOp::Le => Bool(a <= b),
                BinaryOp::Gt => Bool(a > b),
                BinaryOp::Ge => Bool(a >= b),
                BinaryOp::Eq | BinaryOp::Ne | BinaryOp::And | BinaryOp::Or => {
                    return Err(mismatch());
                }
            }
        }
    };
    Ok(GenericArg::Value(value))
}

/// Evaluate to a non-negative integer, as array lengths need.
pub fn eval_len(
    expr: &ConstExpr,
    frame: Option<&BindingFrame>,
    interner: &Interner,
) -> Result<u64, SemanticError> {
    match eval(expr, frame, interner)? {
        GenericArg::Value(ConstValue::Int(v)) => u64::try_from(v)
            .map_err(|_| eval_error(format!("array length {v} is negative"), expr.span)),
        other => Err(eval_error(
            format!("expected an int, found a {}", other.describe()),
            expr.span,
        )),
    }
}

/// Evaluate a constraint to a boolean.
pub fn eval_bool(
    expr: &ConstExpr,
    frame: Option<&BindingFrame>,
    interner: &Interner,
) -> Result<bool, SemanticError> {
    match eval(expr, frame, interner)? {
        GenericArg::Value(ConstValue::Bool(v)) => Ok(v),
        other => Err(eval_error(
            format!("expected a bool, found a {}", other.describe()),
            expr.span,
        )),
    }
}
