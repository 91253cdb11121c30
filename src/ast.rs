use crate::value::{FloatPrecision, IntWidth, Signedness};

/// A parsed `#define` line
#[derive(Debug, Clone, PartialEq)]
pub struct Define<'a> {
    pub name: &'a str,
    /// Parameter names of a function-like macro
    pub params: Option<Vec<&'a str>>,
    pub body: &'a str,
}

/// Parsed macro body. Literal tokens are kept raw and decoded on evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'a> {
    /// pp-number token: integer or floating constant
    Number(&'a str),
    Char(&'a str),
    Str(&'a str),
    Identifier(&'a str),
    /// Adjacent operands, only meaningful for string concatenation
    Juxtaposition(Vec<Expr<'a>>),
    Unary(UnaryOp, Box<Expr<'a>>),
    Cast(CType, Box<Expr<'a>>),
    Binary(BinaryOp, Box<Expr<'a>>, Box<Expr<'a>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    BitNot,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    BitAnd,
    BitXor,
    BitOr,
}

impl BinaryOp {
    /// Operators that reject floating operands
    pub fn is_integral(self) -> bool {
        !matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div
        )
    }
}

/// Target type of a cast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CType {
    Bool,
    Int(IntWidth, Signedness),
    Float(FloatPrecision),
}

impl CType {
    /// Builds a type from its keywords, e.g. `["unsigned", "long", "int"]`.
    pub fn from_words(words: &[&str]) -> Option<Self> {
        let words: Vec<&str> = words
            .iter()
            .copied()
            .filter(|w| !matches!(*w, "const" | "volatile"))
            .collect();

        if let [word] = words.as_slice() {
            if let Some(ty) = Self::from_typedef(word) {
                return Some(ty);
            }
        }

        let count = |name: &str| words.iter().filter(|w| **w == name).count();
        let (signed, unsigned) = (count("signed"), count("unsigned"));
        let (char_, short, int, long) = (count("char"), count("short"), count("int"), count("long"));
        let (float, double) = (count("float"), count("double"));
        if signed + unsigned + char_ + short + int + long + float + double != words.len()
            || signed + unsigned > 1
            || char_.max(short).max(int) > 1
            || char_ == 1 && short + int + long > 0
            || short == 1 && long > 0
        {
            return None;
        }

        if float + double > 0 {
            return match (float, double, long, words.len()) {
                (1, 0, 0, 1) => Some(CType::Float(FloatPrecision::Single)),
                (0, 1, 0, 1) => Some(CType::Float(FloatPrecision::Double)),
                (0, 1, 1, 2) => Some(CType::Float(FloatPrecision::Extended)),
                _ => None,
            };
        }

        let width = match (char_, short, long) {
            (1, 0, 0) => IntWidth::Char,
            (0, 1, 0) => IntWidth::Short,
            (0, 0, 0) => IntWidth::Int,
            (0, 0, 1) => IntWidth::Long,
            (0, 0, 2) => IntWidth::LongLong,
            _ => return None,
        };
        if words.is_empty() {
            return None;
        }
        let signedness = if unsigned == 1 {
            Signedness::Unsigned
        } else {
            Signedness::Signed
        };
        Some(CType::Int(width, signedness))
    }

    fn from_typedef(name: &str) -> Option<Self> {
        use IntWidth::*;
        use Signedness::*;
        Some(match name {
            "_Bool" | "bool" => CType::Bool,
            "int8_t" => CType::Int(Char, Signed),
            "int16_t" => CType::Int(Short, Signed),
            "int32_t" => CType::Int(Int, Signed),
            "int64_t" | "intptr_t" => CType::Int(Long, Signed),
            "uint8_t" => CType::Int(Char, Unsigned),
            "uint16_t" => CType::Int(Short, Unsigned),
            "uint32_t" => CType::Int(Int, Unsigned),
            "uint64_t" | "uintptr_t" | "size_t" => CType::Int(Long, Unsigned),
            _ => return None,
        })
    }
}
