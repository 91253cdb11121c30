use std::fmt::{self, Display, Write};

use crate::config::WcharWidth;
use crate::error::Reason;

/// A C character value.
///
/// Characters that are valid Unicode scalar values are kept as `char`; raw
/// escape values with no such mapping (8-bit bytes, surrogates, etc.) are kept
/// as their numeric unit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CChar {
    Char(char),
    Raw(u64),
}

impl CChar {
    /// Numeric value of the character, as used in arithmetic.
    pub fn code(self) -> u64 {
        match self {
            CChar::Char(c) => c as u64,
            CChar::Raw(n) => n,
        }
    }

    /// Maps an escape value onto a character: ASCII stays a `char`, the rest is raw.
    pub fn from_escape(value: u64) -> Self {
        match value {
            0..=0x7f => CChar::Char(value as u8 as char),
            _ => CChar::Raw(value),
        }
    }
}

/// Encoding selected by a character or string literal prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// No prefix
    Narrow,
    /// `u8`
    Utf8,
    /// `L`
    Wide,
    /// `u`
    Utf16,
    /// `U`
    Utf32,
}

impl Encoding {
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "" => Some(Encoding::Narrow),
            "u8" => Some(Encoding::Utf8),
            "L" => Some(Encoding::Wide),
            "u" => Some(Encoding::Utf16),
            "U" => Some(Encoding::Utf32),
            _ => None,
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            Encoding::Narrow => "",
            Encoding::Utf8 => "u8",
            Encoding::Wide => "L",
            Encoding::Utf16 => "u",
            Encoding::Utf32 => "U",
        }
    }

    /// Bits in one code unit of this encoding.
    pub fn unit_bits(self, wchar: WcharWidth) -> u32 {
        match (self, wchar) {
            (Encoding::Narrow | Encoding::Utf8, _) => 8,
            (Encoding::Utf16, _) | (Encoding::Wide, WcharWidth::Utf16) => 16,
            (Encoding::Utf32, _) | (Encoding::Wide, WcharWidth::Utf32) => 32,
        }
    }

    /// Encoding of two adjacent string segments once concatenated.
    ///
    /// Unprefixed segments adopt the other segment's encoding, and `L` adopts
    /// `u` or `U` since the width of `wchar_t` is not fixed. Any other pair of
    /// distinct explicit encodings cannot be joined.
    pub fn reconcile(self, other: Encoding) -> Option<Encoding> {
        use Encoding::*;
        match (self, other) {
            (Narrow, e) | (e, Narrow) => Some(e),
            (a, b) if a == b => Some(a),
            (Wide, e @ (Utf16 | Utf32)) | (e @ (Utf16 | Utf32), Wide) => Some(e),
            _ => None,
        }
    }
}

/// Width hint of an integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntWidth {
    Char,
    Short,
    Int,
    Long,
    LongLong,
}

impl IntWidth {
    pub fn bits(self) -> u32 {
        match self {
            IntWidth::Char => 8,
            IntWidth::Short => 16,
            IntWidth::Int => 32,
            IntWidth::Long | IntWidth::LongLong => 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signedness {
    Signed,
    Unsigned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Radix {
    Binary,
    Octal,
    Decimal,
    Hexadecimal,
}

impl Radix {
    pub fn base(self) -> u32 {
        match self {
            Radix::Binary => 2,
            Radix::Octal => 8,
            Radix::Decimal => 10,
            Radix::Hexadecimal => 16,
        }
    }
}

/// An integer value with its C type hints.
///
/// Values between `i64::MAX` and `u64::MAX` are stored bit-cast; use
/// [`IntLiteral::as_u64`] for unsigned values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntLiteral {
    pub value: i64,
    pub width: IntWidth,
    pub signedness: Signedness,
    /// Radix the value was written in; computed values are decimal
    pub radix: Radix,
}

impl IntLiteral {
    pub fn new(value: i64) -> Self {
        Self {
            value,
            width: IntWidth::Int,
            signedness: Signedness::Signed,
            radix: Radix::Decimal,
        }
    }

    pub fn is_unsigned(&self) -> bool {
        self.signedness == Signedness::Unsigned
    }

    pub fn as_u64(&self) -> u64 {
        self.value as u64
    }

    /// Whether `value` is representable with the given hints.
    pub fn fits(value: i64, width: IntWidth, signedness: Signedness) -> bool {
        let bits = width.bits();
        if bits == 64 {
            return true;
        }
        match signedness {
            Signedness::Signed => {
                let half = 1i64 << (bits - 1);
                (-half..half).contains(&value)
            }
            Signedness::Unsigned => (value as u64) >> bits == 0,
        }
    }

    /// Reduces the value to the hinted width, sign-extending signed values.
    pub fn truncate(mut self) -> Self {
        let bits = self.width.bits();
        if bits < 64 {
            let mask = (1u64 << bits) - 1;
            let raw = self.value as u64 & mask;
            self.value = match self.signedness {
                Signedness::Unsigned => raw as i64,
                Signedness::Signed => ((raw << (64 - bits)) as i64) >> (64 - bits),
            };
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatPrecision {
    /// `f` suffix
    Single,
    Double,
    /// `l` suffix
    Extended,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatLiteral {
    pub value: f64,
    pub precision: FloatPrecision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharLiteral {
    pub value: CChar,
    pub encoding: Encoding,
}

/// A string value; segments of a concatenation are flattened in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StrLiteral {
    pub chars: Vec<CChar>,
    pub encoding: Encoding,
}

impl StrLiteral {
    /// Appends `other`, reconciling the two encodings.
    pub fn concat(&mut self, other: &StrLiteral) -> Result<(), Reason> {
        self.encoding = self
            .encoding
            .reconcile(other.encoding)
            .ok_or(Reason::EncodingMismatch)?;
        self.chars.extend_from_slice(&other.chars);
        Ok(())
    }

    /// Code units of the string in its encoding, without a terminator.
    pub fn code_units(&self, wchar: WcharWidth) -> Vec<u32> {
        let bits = self.encoding.unit_bits(wchar);
        let mut units = Vec::with_capacity(self.chars.len());
        for c in &self.chars {
            match *c {
                CChar::Char(c) if bits == 8 => {
                    let mut buf = [0u8; 4];
                    units.extend(c.encode_utf8(&mut buf).bytes().map(u32::from));
                }
                CChar::Char(c) if bits == 16 => {
                    let mut buf = [0u16; 2];
                    units.extend(c.encode_utf16(&mut buf).iter().map(|&u| u32::from(u)));
                }
                CChar::Char(c) => units.push(c as u32),
                CChar::Raw(n) => units.push(n as u32),
            }
        }
        units
    }

    /// The string as text, or `None` if it holds raw values.
    pub fn to_text(&self) -> Option<String> {
        self.chars
            .iter()
            .map(|c| match c {
                CChar::Char(c) => Some(*c),
                CChar::Raw(_) => None,
            })
            .collect()
    }
}

/// Normalized value of a macro body.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Int(IntLiteral),
    Float(FloatLiteral),
    Char(CharLiteral),
    Str(StrLiteral),
}

impl LiteralValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            LiteralValue::Int(i) => Some(i.value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            LiteralValue::Float(f) => Some(f.value),
            _ => None,
        }
    }

    pub fn as_char(&self) -> Option<CChar> {
        match self {
            LiteralValue::Char(c) => Some(c.value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&StrLiteral> {
        match self {
            LiteralValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Outcome of classifying one macro body.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Valid(LiteralValue),
    Invalid(Reason),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid(_))
    }

    pub fn value(&self) -> Option<&LiteralValue> {
        match self {
            Verdict::Valid(v) => Some(v),
            Verdict::Invalid(_) => None,
        }
    }

    pub fn reason(&self) -> Option<Reason> {
        match self {
            Verdict::Valid(_) => None,
            Verdict::Invalid(r) => Some(*r),
        }
    }
}

impl From<Result<LiteralValue, Reason>> for Verdict {
    fn from(result: Result<LiteralValue, Reason>) -> Self {
        match result {
            Ok(v) => Verdict::Valid(v),
            Err(r) => Verdict::Invalid(r),
        }
    }
}

// Rendering produces C source that classifies back to the same value.

impl Display for IntLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // A signed minimum has no literal form: its magnitude types as a wider
        // or unsigned constant, so it is written as a cast like the narrow widths.
        let is_min = !self.is_unsigned() && self.value == i64::MIN >> (64 - self.width.bits());
        let cast = match self.width {
            IntWidth::Char => Some("char"),
            IntWidth::Short => Some("short"),
            IntWidth::Int if is_min => Some("int"),
            IntWidth::Long if is_min => Some("long"),
            IntWidth::LongLong if is_min => Some("long long"),
            _ => None,
        };
        if let Some(ty) = cast {
            let sign = match self.signedness {
                Signedness::Signed => "signed",
                Signedness::Unsigned => "unsigned",
            };
            write!(f, "({sign} {ty})")?;
        }

        let magnitude = if self.is_unsigned() || self.value >= 0 {
            self.value as u64
        } else {
            f.write_char('-')?;
            self.value.unsigned_abs()
        };
        match self.radix {
            Radix::Binary => write!(f, "0b{magnitude:b}")?,
            Radix::Octal if magnitude == 0 => f.write_str("00")?,
            Radix::Octal => write!(f, "0{magnitude:o}")?,
            Radix::Decimal => write!(f, "{magnitude}")?,
            Radix::Hexadecimal => write!(f, "0x{magnitude:x}")?,
        }

        if cast.is_none() {
            if self.is_unsigned() {
                f.write_char('u')?;
            }
            match self.width {
                IntWidth::Long => f.write_char('l')?,
                IntWidth::LongLong => f.write_str("ll")?,
                _ => {}
            }
        }
        Ok(())
    }
}

impl Display for FloatLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_nan() {
            return f.write_str("(0.0/0.0)");
        }
        if self.value.is_infinite() {
            f.write_str(if self.value < 0.0 { "-1e999" } else { "1e999" })?;
        } else {
            write!(f, "{:?}", self.value)?;
        }
        match self.precision {
            FloatPrecision::Single => f.write_char('f'),
            FloatPrecision::Double => Ok(()),
            FloatPrecision::Extended => f.write_char('l'),
        }
    }
}

/// Writes one character of a quoted literal. Returns whether the output ended
/// in a hex escape, which would swallow a following hex digit.
fn write_escaped(f: &mut fmt::Formatter<'_>, c: CChar, quote: char) -> Result<bool, fmt::Error> {
    match c {
        CChar::Char(c) if c == quote || c == '\\' => write!(f, "\\{c}")?,
        CChar::Char('\n') => f.write_str("\\n")?,
        CChar::Char('\t') => f.write_str("\\t")?,
        CChar::Char(c) if !c.is_control() => f.write_char(c)?,
        other => {
            let n = other.code();
            if n <= 0o777 {
                write!(f, "\\{n:03o}")?;
            } else {
                write!(f, "\\x{n:x}")?;
                return Ok(true);
            }
        }
    }
    Ok(false)
}

impl Display for CharLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'", self.encoding.prefix())?;
        write_escaped(f, self.value, '\'')?;
        f.write_char('\'')
    }
}

impl Display for StrLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\"", self.encoding.prefix())?;
        let mut after_hex = false;
        for &c in &self.chars {
            if after_hex && matches!(c, CChar::Char(h) if h.is_ascii_hexdigit()) {
                f.write_str("\" \"")?;
            }
            after_hex = write_escaped(f, c, '"')?;
        }
        f.write_char('"')
    }
}

impl Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Int(i) => i.fmt(f),
            LiteralValue::Float(x) => x.fmt(f),
            LiteralValue::Char(c) => c.fmt(f),
            LiteralValue::Str(s) => s.fmt(f),
        }
    }
}
