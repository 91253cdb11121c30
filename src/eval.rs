use std::collections::HashMap;
use std::hash::BuildHasher;

use crate::ast::{BinaryOp, CType, Expr, UnaryOp};
use crate::config::Config;
use crate::error::Reason;
use crate::literal;
use crate::parser::LiteralParser;
use crate::value::{
    FloatLiteral, FloatPrecision, IntLiteral, IntWidth, LiteralValue, Radix, Signedness,
    StrLiteral, Verdict,
};

/// Identifier lookup used when a body names another macro.
pub trait Scope {
    fn lookup(&self, ident: &str) -> Option<&LiteralValue>;
}

impl<S: BuildHasher> Scope for HashMap<String, LiteralValue, S> {
    fn lookup(&self, ident: &str) -> Option<&LiteralValue> {
        self.get(ident)
    }
}

/// Classify a macro body with the default configuration.
pub fn classify<S: Scope + ?Sized>(body: &str, scope: &S) -> Verdict {
    classify_with(Config::default(), body, scope)
}

pub fn classify_with<S: Scope + ?Sized>(config: Config, body: &str, scope: &S) -> Verdict {
    Evaluator::new(scope, config).classify(body)
}

/// Folds a parsed body into a single literal value
pub struct Evaluator<'s, S: Scope + ?Sized> {
    scope: &'s S,
    config: Config,
}

/// Operand of an arithmetic operator after character promotion
enum Number {
    Int(IntLiteral),
    Float(FloatLiteral),
}

impl<'s, S: Scope + ?Sized> Evaluator<'s, S> {
    pub fn new(scope: &'s S, config: Config) -> Self {
        Self { scope, config }
    }

    pub fn classify(&self, body: &str) -> Verdict {
        let body = body.trim();
        if body.is_empty() {
            return Verdict::Invalid(Reason::EmptyBody);
        }
        LiteralParser::parse_expression(body, self.config.max_depth)
            .and_then(|expr| self.eval(&expr))
            .into()
    }

    pub fn eval(&self, expr: &Expr) -> Result<LiteralValue, Reason> {
        let wchar = self.config.wchar_width;
        match expr {
            Expr::Number(token) => literal::parse_number(token),
            Expr::Char(token) => literal::parse_char(token, wchar).map(LiteralValue::Char),
            Expr::Str(token) => literal::parse_string(token, wchar).map(LiteralValue::Str),
            Expr::Identifier(name) => self
                .scope
                .lookup(name)
                .cloned()
                .ok_or(Reason::UnknownIdentifier),
            Expr::Juxtaposition(items) => self.eval_juxtaposition(items),
            Expr::Unary(op, operand) => self.eval_unary(*op, self.eval_number(operand)?),
            Expr::Cast(ty, operand) => Ok(cast(*ty, self.eval_number(operand)?)),
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval_number(lhs)?;
                let rhs = self.eval_number(rhs)?;
                eval_binary(*op, lhs, rhs)
            }
        }
    }

    /// Concatenates adjacent strings. Any non-string operand among them is an
    /// encoding mismatch; a run with no strings at all is not a literal.
    fn eval_juxtaposition(&self, items: &[Expr]) -> Result<LiteralValue, Reason> {
        let values = items
            .iter()
            .map(|item| self.eval(item))
            .collect::<Result<Vec<_>, _>>()?;

        if !values.iter().any(|v| matches!(v, LiteralValue::Str(_))) {
            return Err(Reason::Syntax);
        }
        let mut strings = values.iter().map(|v| match v {
            LiteralValue::Str(s) => Ok(s),
            _ => Err(Reason::EncodingMismatch),
        });

        let mut joined: StrLiteral = match strings.next() {
            Some(first) => first?.clone(),
            None => return Err(Reason::Syntax),
        };
        for s in strings {
            joined.concat(s?)?;
        }
        Ok(LiteralValue::Str(joined))
    }

    /// Character constants take part in arithmetic as their unsigned code, so
    /// `'\xff'` is 255 rather than the -1 of a signed `char` target.
    fn eval_number(&self, expr: &Expr) -> Result<Number, Reason> {
        match self.eval(expr)? {
            LiteralValue::Int(i) => Ok(Number::Int(i)),
            LiteralValue::Float(f) => Ok(Number::Float(f)),
            LiteralValue::Char(c) => Ok(Number::Int(IntLiteral::new(c.value.code() as i64))),
            LiteralValue::Str(_) => Err(Reason::TypeMismatch),
        }
    }

    fn eval_unary(&self, op: UnaryOp, operand: Number) -> Result<LiteralValue, Reason> {
        let value = match (op, operand) {
            (UnaryOp::Not, Number::Int(i)) => LiteralValue::Int(IntLiteral::new((i.value == 0) as i64)),
            (UnaryOp::Not, Number::Float(f)) => LiteralValue::Int(IntLiteral::new((f.value == 0.0) as i64)),
            (UnaryOp::Plus, Number::Float(f)) => LiteralValue::Float(f),
            (UnaryOp::Neg, Number::Float(f)) => LiteralValue::Float(FloatLiteral {
                value: -f.value,
                ..f
            }),
            (UnaryOp::BitNot, Number::Float(_)) => return Err(Reason::SuffixConflict),
            (op, Number::Int(i)) => {
                let i = promote(i);
                let value = match op {
                    UnaryOp::Neg => i.value.wrapping_neg(),
                    UnaryOp::BitNot => !i.value,
                    _ => i.value,
                };
                LiteralValue::Int(normalize(IntLiteral { value, ..i }))
            }
        };
        Ok(value)
    }
}

/// Integer promotion: types narrower than `int` become `int`.
fn promote(i: IntLiteral) -> IntLiteral {
    if i.width < IntWidth::Int {
        IntLiteral {
            width: IntWidth::Int,
            signedness: Signedness::Signed,
            ..i
        }
    } else {
        i
    }
}

/// Unsigned results wrap at their width, signed results widen until they fit.
fn normalize(mut i: IntLiteral) -> IntLiteral {
    if i.is_unsigned() {
        return i.truncate();
    }
    while !IntLiteral::fits(i.value, i.width, i.signedness) {
        i.width = match i.width {
            IntWidth::Char | IntWidth::Short => IntWidth::Int,
            _ => IntWidth::Long,
        };
    }
    i
}

/// Type both operands are converted to before a binary operation.
fn common_type(a: IntLiteral, b: IntLiteral) -> (IntWidth, Signedness) {
    let (a, b) = (promote(a), promote(b));
    if a.signedness == b.signedness {
        return (a.width.max(b.width), a.signedness);
    }
    let (unsigned, signed) = if a.is_unsigned() { (a, b) } else { (b, a) };
    if unsigned.width >= signed.width {
        (unsigned.width, Signedness::Unsigned)
    } else if signed.width.bits() > unsigned.width.bits() {
        (signed.width, Signedness::Signed)
    } else {
        (signed.width, Signedness::Unsigned)
    }
}

fn int_to_float(i: IntLiteral) -> f64 {
    if i.is_unsigned() {
        i.as_u64() as f64
    } else {
        i.value as f64
    }
}

fn cast(ty: CType, operand: Number) -> LiteralValue {
    match (ty, operand) {
        (CType::Float(precision), Number::Int(i)) => LiteralValue::Float(FloatLiteral {
            value: int_to_float(i),
            precision,
        }),
        (CType::Float(precision), Number::Float(f)) => {
            LiteralValue::Float(FloatLiteral { precision, ..f })
        }
        (CType::Bool, operand) => {
            let truth = match operand {
                Number::Int(i) => i.value != 0,
                Number::Float(f) => f.value != 0.0,
            };
            LiteralValue::Int(IntLiteral {
                value: truth as i64,
                width: IntWidth::Char,
                signedness: Signedness::Unsigned,
                radix: Radix::Decimal,
            })
        }
        (CType::Int(width, signedness), operand) => {
            let (value, radix) = match operand {
                Number::Int(i) => (i.value, i.radix),
                Number::Float(f) if signedness == Signedness::Unsigned => {
                    (f.value as u64 as i64, Radix::Decimal)
                }
                Number::Float(f) => (f.value as i64, Radix::Decimal),
            };
            LiteralValue::Int(
                IntLiteral {
                    value,
                    width,
                    signedness,
                    radix,
                }
                .truncate(),
            )
        }
    }
}

fn eval_binary(op: BinaryOp, lhs: Number, rhs: Number) -> Result<LiteralValue, Reason> {
    match (lhs, rhs) {
        (Number::Int(a), Number::Int(b)) => eval_int(op, a, b).map(LiteralValue::Int),
        (lhs, rhs) => {
            if op.is_integral() {
                return Err(Reason::SuffixConflict);
            }
            let (a, pa) = float_operand(lhs);
            let (b, pb) = float_operand(rhs);
            let value = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                _ => return Err(Reason::SuffixConflict),
            };
            let precision = match (pa, pb) {
                (Some(pa), Some(pb)) => wider(pa, pb),
                (Some(p), None) | (None, Some(p)) => p,
                (None, None) => FloatPrecision::Double,
            };
            Ok(LiteralValue::Float(FloatLiteral { value, precision }))
        }
    }
}

fn float_operand(n: Number) -> (f64, Option<FloatPrecision>) {
    match n {
        Number::Int(i) => (int_to_float(i), None),
        Number::Float(f) => (f.value, Some(f.precision)),
    }
}

fn wider(a: FloatPrecision, b: FloatPrecision) -> FloatPrecision {
    use FloatPrecision::*;
    match (a, b) {
        (Extended, _) | (_, Extended) => Extended,
        (Double, _) | (_, Double) => Double,
        _ => Single,
    }
}

fn eval_int(op: BinaryOp, a: IntLiteral, b: IntLiteral) -> Result<IntLiteral, Reason> {
    // shifts take the promoted type of the left operand
    let (width, signedness) = match op {
        BinaryOp::Shl | BinaryOp::Shr => {
            let a = promote(a);
            (a.width, a.signedness)
        }
        _ => common_type(a, b),
    };
    let convert = |i: IntLiteral| {
        IntLiteral {
            width,
            signedness,
            ..i
        }
        .truncate()
    };
    let (x, y) = (convert(a).value, convert(b).value);
    let unsigned = signedness == Signedness::Unsigned;

    let value = match op {
        BinaryOp::Add => x.wrapping_add(y),
        BinaryOp::Sub => x.wrapping_sub(y),
        BinaryOp::Mul => x.wrapping_mul(y),
        BinaryOp::Div | BinaryOp::Rem if y == 0 => return Err(Reason::DivisionByZero),
        BinaryOp::Div if unsigned => ((x as u64) / (y as u64)) as i64,
        BinaryOp::Div => x.wrapping_div(y),
        BinaryOp::Rem if unsigned => ((x as u64) % (y as u64)) as i64,
        BinaryOp::Rem => x.wrapping_rem(y),
        BinaryOp::Shl => x.wrapping_shl(b.value as u32),
        BinaryOp::Shr if unsigned => ((x as u64).wrapping_shr(b.value as u32)) as i64,
        BinaryOp::Shr => x.wrapping_shr(b.value as u32),
        BinaryOp::BitAnd => x & y,
        BinaryOp::BitXor => x ^ y,
        BinaryOp::BitOr => x | y,
    };
    Ok(normalize(IntLiteral {
        value,
        width,
        signedness,
        radix: Radix::Decimal,
    }))
}
