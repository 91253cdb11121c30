//! Decoding of single C literal tokens.
//!
//! # integers
//! Binary, octal, decimal and hexadecimal are supported. Values are read into
//! `u64` and stored as `i64`, bit-cast when above `i64::MAX`. Suffixes pick the
//! width and signedness hints, following the C rules for the type of an
//! integer constant.
//!
//! # reals
//! Decimal and hexadecimal floating constants are read into `f64`. A decimal
//! integer with an `f` suffix is a float.
//!
//! # characters and strings
//! Escape sequences are supported. Hex and octal escapes that map to an ASCII
//! character become that character, anything else keeps its raw value. Escapes
//! must fit one code unit of the literal's encoding.

use std::str::FromStr;

use crate::config::WcharWidth;
use crate::error::Reason;
use crate::value::{
    CChar, CharLiteral, Encoding, FloatLiteral, FloatPrecision, IntLiteral, IntWidth,
    LiteralValue, Radix, Signedness, StrLiteral,
};

/// Decode a pp-number token into an integer or floating literal.
pub fn parse_number(token: &str) -> Result<LiteralValue, Reason> {
    if is_float(token) {
        parse_float(token).map(LiteralValue::Float)
    } else {
        parse_int(token).map(LiteralValue::Int)
    }
}

fn hex_body(token: &str) -> Option<&str> {
    token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
}

fn is_float(token: &str) -> bool {
    match hex_body(token) {
        Some(body) => body.contains(['.', 'p', 'P']),
        None => token.contains(['.', 'e', 'E']) || token.ends_with(['f', 'F']),
    }
}

/// Parse an integer constant.
pub fn parse_int(token: &str) -> Result<IntLiteral, Reason> {
    let (radix, body) = if let Some(body) = hex_body(token) {
        (Radix::Hexadecimal, body)
    } else if let Some(body) = token
        .strip_prefix("0b")
        .or_else(|| token.strip_prefix("0B"))
    {
        (Radix::Binary, body)
    } else if token.starts_with('0') && token[1..].starts_with(|c: char| c.is_ascii_digit()) {
        (Radix::Octal, token)
    } else {
        (Radix::Decimal, token)
    };

    let split = body
        .find(|c: char| match radix {
            Radix::Hexadecimal => !c.is_ascii_hexdigit(),
            _ => !c.is_ascii_digit(),
        })
        .unwrap_or(body.len());
    let (digits, suffix) = body.split_at(split);
    if digits.is_empty() {
        return Err(Reason::MalformedDigit);
    }

    let base = radix.base();
    let mut value: u64 = 0;
    for c in digits.chars() {
        let digit = c.to_digit(base).ok_or(Reason::MalformedDigit)?;
        value = value
            .checked_mul(base as u64)
            .and_then(|v| v.checked_add(digit as u64))
            .ok_or(Reason::Overflow)?;
    }

    let (unsigned, longs) = parse_int_suffix(suffix)?;
    let (width, signedness) = int_type(value, radix, unsigned, longs);
    Ok(IntLiteral {
        value: value as i64,
        width,
        signedness,
        radix,
    })
}

/// Returns whether `u` was present and how many `l`s were.
fn parse_int_suffix(suffix: &str) -> Result<(bool, usize), Reason> {
    if suffix.contains(|c: char| !matches!(c, 'u' | 'U' | 'l' | 'L')) {
        return Err(Reason::MalformedDigit);
    }
    let unsigned = suffix.chars().filter(|c| matches!(c, 'u' | 'U')).count();
    let longs = suffix.len() - unsigned;
    if unsigned > 1 || longs > 2 {
        return Err(Reason::SuffixConflict);
    }
    // `ll` must be a single token of matching case
    if longs == 2 && !(suffix.contains("ll") || suffix.contains("LL")) {
        let ell = suffix.replace(['u', 'U'], "");
        if ell != "ll" && ell != "LL" {
            return Err(Reason::SuffixConflict);
        }
    }
    Ok((unsigned == 1, longs))
}

/// First type of the C candidate list able to hold `value`.
fn int_type(value: u64, radix: Radix, unsigned: bool, longs: usize) -> (IntWidth, Signedness) {
    let widths = [IntWidth::Int, IntWidth::Long, IntWidth::LongLong];
    for width in widths.into_iter().skip(longs) {
        let bits = width.bits();
        if !unsigned && value < 1u64 << (bits - 1) {
            return (width, Signedness::Signed);
        }
        let fits_unsigned = bits == 64 || value >> bits == 0;
        if (unsigned || radix != Radix::Decimal) && fits_unsigned {
            return (width, Signedness::Unsigned);
        }
    }
    (IntWidth::LongLong, Signedness::Unsigned)
}

/// Parse a floating constant.
pub fn parse_float(token: &str) -> Result<FloatLiteral, Reason> {
    let hex = hex_body(token);
    let strip_suffix = match hex {
        Some(body) => body.contains(['p', 'P']),
        None => true,
    };
    let (number, precision) = match token.chars().last() {
        Some('f' | 'F') if strip_suffix => (&token[..token.len() - 1], FloatPrecision::Single),
        Some('l' | 'L') if strip_suffix => (&token[..token.len() - 1], FloatPrecision::Extended),
        _ => (token, FloatPrecision::Double),
    };
    if number.ends_with(['u', 'U', 'l', 'L']) {
        return Err(Reason::SuffixConflict);
    }

    let value = match hex {
        Some(_) => parse_hex_float(&number[2..])?,
        None => parse_decimal_float(number)?,
    };
    Ok(FloatLiteral { value, precision })
}

fn parse_decimal_float(number: &str) -> Result<f64, Reason> {
    let (mantissa, exponent) = match number.find(['e', 'E']) {
        Some(pos) => (&number[..pos], Some(&number[pos + 1..])),
        None => (number, None),
    };

    let mut parts = mantissa.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    let fraction = parts.next().unwrap_or("");
    let valid_mantissa = !(whole.is_empty() && fraction.is_empty())
        && whole.chars().all(|c| c.is_ascii_digit())
        && fraction.chars().all(|c| c.is_ascii_digit());
    if !valid_mantissa || !exponent.is_none_or(is_exponent) {
        return Err(Reason::MalformedDigit);
    }
    f64::from_str(number).map_err(|_| Reason::MalformedDigit)
}

fn is_exponent(exponent: &str) -> bool {
    let digits = exponent
        .strip_prefix(['+', '-'])
        .unwrap_or(exponent);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn parse_hex_float(body: &str) -> Result<f64, Reason> {
    let pos = body.find(['p', 'P']).ok_or(Reason::MalformedDigit)?;
    let (mantissa, exponent) = (&body[..pos], &body[pos + 1..]);
    if !is_exponent(exponent) || mantissa.is_empty() || mantissa == "." {
        return Err(Reason::MalformedDigit);
    }

    let mut value = 0f64;
    let mut scale = 0i32;
    let mut seen_dot = false;
    for c in mantissa.chars() {
        if c == '.' && !seen_dot {
            seen_dot = true;
            continue;
        }
        let digit = c.to_digit(16).ok_or(Reason::MalformedDigit)?;
        value = value * 16.0 + digit as f64;
        if seen_dot {
            scale -= 4;
        }
    }
    let exponent = i32::from_str(exponent).map_err(|_| Reason::Overflow)?;
    Ok(value * 2f64.powi(exponent.saturating_add(scale)))
}

/// Splits `u"abc"` into `("u", "abc")`.
fn split_quoted(token: &str, quote: char) -> Result<(&str, &str), Reason> {
    let open = token.find(quote).ok_or(Reason::Syntax)?;
    let body = token[open + 1..]
        .strip_suffix(quote)
        .ok_or(Reason::Syntax)?;
    Ok((&token[..open], body))
}

fn fits_unit(c: CChar, bits: u32) -> bool {
    match (c, bits) {
        (CChar::Char(c), 8) => c.is_ascii(),
        (CChar::Char(c), 16) => c.len_utf16() == 1,
        (CChar::Char(_), _) => true,
        (CChar::Raw(n), bits) => bits >= 64 || n >> bits == 0,
    }
}

/// Parse a character constant.
///
/// An unprefixed constant whose value needs more than one narrow unit is
/// given the wide encoding.
pub fn parse_char(token: &str, wchar: WcharWidth) -> Result<CharLiteral, Reason> {
    let (prefix, body) = split_quoted(token, '\'')?;
    let mut encoding = Encoding::from_prefix(prefix).ok_or(Reason::Syntax)?;
    let chars = decode_body(body, encoding.unit_bits(wchar))?;
    let value = match chars.as_slice() {
        [c] => *c,
        _ => return Err(Reason::Syntax),
    };

    if !fits_unit(value, encoding.unit_bits(wchar)) {
        if encoding != Encoding::Narrow {
            return Err(Reason::EncodingMismatch);
        }
        encoding = Encoding::Wide;
        if !fits_unit(value, encoding.unit_bits(wchar)) {
            return Err(Reason::EncodingMismatch);
        }
    }
    Ok(CharLiteral { value, encoding })
}

/// Parse a single string literal token.
pub fn parse_string(token: &str, wchar: WcharWidth) -> Result<StrLiteral, Reason> {
    let (prefix, body) = split_quoted(token, '"')?;
    let encoding = Encoding::from_prefix(prefix).ok_or(Reason::Syntax)?;
    Ok(StrLiteral {
        chars: decode_body(body, encoding.unit_bits(wchar))?,
        encoding,
    })
}

fn simple_escape(c: char) -> Option<char> {
    Some(match c {
        '\'' | '"' | '?' | '\\' => c,
        'a' => '\x07',
        'b' => '\x08',
        'f' => '\x0c',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'v' => '\x0b',
        _ => return None,
    })
}

fn unicode_escape(digits: &str, len: usize) -> Result<CChar, Reason> {
    if digits.len() != len || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Reason::InvalidEscape);
    }
    u32::from_str_radix(digits, 16)
        .ok()
        .and_then(char::from_u32)
        .map(CChar::Char)
        .ok_or(Reason::InvalidEscape)
}

/// Decodes the characters between the quotes of a literal.
fn decode_body(body: &str, unit_bits: u32) -> Result<Vec<CChar>, Reason> {
    let mut out = Vec::with_capacity(body.len());
    let mut rest = body;
    while let Some(c) = rest.chars().next() {
        rest = &rest[c.len_utf8()..];
        if c != '\\' {
            out.push(CChar::Char(c));
            continue;
        }

        let e = rest.chars().next().ok_or(Reason::InvalidEscape)?;
        rest = &rest[e.len_utf8()..];
        let decoded = if let Some(s) = simple_escape(e) {
            CChar::Char(s)
        } else if e.is_digit(8) {
            let len = 1 + rest.chars().take(2).take_while(|c| c.is_digit(8)).count();
            let digits = &body[body.len() - rest.len() - 1..][..len];
            rest = &rest[len - 1..];
            let n = u64::from_str_radix(digits, 8).map_err(|_| Reason::InvalidEscape)?;
            CChar::from_escape(n)
        } else if e == 'x' {
            let len = rest.find(|c: char| !c.is_ascii_hexdigit()).unwrap_or(rest.len());
            let (digits, tail) = rest.split_at(len);
            rest = tail;
            let n = u64::from_str_radix(digits, 16).map_err(|_| Reason::InvalidEscape)?;
            CChar::from_escape(n)
        } else if e == 'u' || e == 'U' {
            let len = if e == 'u' { 4 } else { 8 };
            let digits = rest.get(..len).ok_or(Reason::InvalidEscape)?;
            rest = &rest[len..];
            unicode_escape(digits, len)?
        } else {
            return Err(Reason::InvalidEscape);
        };

        if let CChar::Raw(_) = decoded {
            if !fits_unit(decoded, unit_bits) {
                return Err(Reason::InvalidEscape);
            }
        }
        out.push(decoded);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(token: &str) -> IntLiteral {
        parse_int(token).unwrap()
    }

    #[test]
    fn test_int_radixes() {
        assert_eq!(int("456").value, 456);
        assert_eq!(int("0").value, 0);
        assert_eq!(int("0b1").value, 1);
        assert_eq!(int("0x2").value, 2);
        assert_eq!(int("0XfF").value, 255);
        assert_eq!(int("077").value, 63);
        assert_eq!(int("077").radix, Radix::Octal);
        assert_eq!(int("0u").radix, Radix::Decimal);
    }

    #[test]
    fn test_int_suffixes() {
        let lit = int("124u");
        assert_eq!(lit.value, 124);
        assert_eq!(lit.signedness, Signedness::Unsigned);
        assert_eq!(lit.width, IntWidth::Int);

        let lit = int("125uL");
        assert_eq!((lit.width, lit.signedness), (IntWidth::Long, Signedness::Unsigned));

        let lit = int("126LuL");
        assert_eq!(lit.value, 126);
        assert_eq!((lit.width, lit.signedness), (IntWidth::LongLong, Signedness::Unsigned));

        assert_eq!(int("4ULL").width, IntWidth::LongLong);
        assert_eq!(parse_int("1uu"), Err(Reason::SuffixConflict));
        assert_eq!(parse_int("1lll"), Err(Reason::SuffixConflict));
        assert_eq!(parse_int("1lL"), Err(Reason::SuffixConflict));
        assert_eq!(parse_int("12a"), Err(Reason::MalformedDigit));
    }

    #[test]
    fn test_int_type_promotion() {
        assert_eq!(int("2147483648").width, IntWidth::Long);
        let lit = int("0xffffffff");
        assert_eq!((lit.width, lit.signedness), (IntWidth::Int, Signedness::Unsigned));
        let lit = int("18446744073709551615");
        assert_eq!(lit.value, -1);
        assert_eq!(lit.signedness, Signedness::Unsigned);
    }

    #[test]
    fn test_malformed_ints() {
        assert_eq!(parse_int("0b2"), Err(Reason::MalformedDigit));
        assert_eq!(parse_int("09"), Err(Reason::MalformedDigit));
        assert_eq!(parse_int("0x"), Err(Reason::MalformedDigit));
        assert_eq!(parse_int("18446744073709551616"), Err(Reason::Overflow));
    }

    #[test]
    fn test_floats() {
        let float = |t: &str| parse_number(t).unwrap().as_float().unwrap();
        assert_eq!(float("0."), 0.0);
        assert_eq!(float("1f"), 1.0);
        assert_eq!(float(".1"), 0.1);
        assert_eq!(float("2.0"), 2.0);
        assert_eq!(float("1e3"), 1000.0);
        assert_eq!(float("2e+3"), 2000.0);
        assert_eq!(float("1e-3"), 0.001);
        assert_eq!(float("1E2L"), 100.0);
        assert_eq!(float("0x1.8p1"), 3.0);
        assert_eq!(float("0x10p-2f"), 4.0);

        assert_eq!(parse_float("1f").unwrap().precision, FloatPrecision::Single);
        assert_eq!(parse_float("1.5u"), Err(Reason::SuffixConflict));
        assert_eq!(parse_float("1e"), Err(Reason::MalformedDigit));
        assert_eq!(parse_float("1.2.3"), Err(Reason::MalformedDigit));
        assert_eq!(parse_float("0x1.8"), Err(Reason::MalformedDigit));
    }

    #[test]
    fn test_chars() {
        let lit = parse_char("'A'", WcharWidth::Utf32).unwrap();
        assert_eq!(lit.value, CChar::Char('A'));
        assert_eq!(lit.encoding, Encoding::Narrow);

        let lit = parse_char(r"'\U0001f369'", WcharWidth::Utf32).unwrap();
        assert_eq!(lit.value, CChar::Char('\u{1f369}'));
        assert_eq!(lit.encoding, Encoding::Wide);

        let lit = parse_char(r"U'\xff'", WcharWidth::Utf32).unwrap();
        assert_eq!(lit.value, CChar::Raw(255));
        assert_eq!(lit.encoding, Encoding::Utf32);

        assert_eq!(parse_char(r"'\n'", WcharWidth::Utf32).unwrap().value, CChar::Char('\n'));
        assert_eq!(parse_char(r"'\101'", WcharWidth::Utf32).unwrap().value, CChar::Char('A'));
        assert_eq!(parse_char(r"'\377'", WcharWidth::Utf32).unwrap().value, CChar::Raw(255));
        assert_eq!(parse_char("'ab'", WcharWidth::Utf32), Err(Reason::Syntax));
        assert_eq!(parse_char(r"'\q'", WcharWidth::Utf32), Err(Reason::InvalidEscape));
        assert_eq!(parse_char(r"'\x100'", WcharWidth::Utf32), Err(Reason::InvalidEscape));
        assert_eq!(parse_char(r"'\ud800'", WcharWidth::Utf32), Err(Reason::InvalidEscape));
        assert_eq!(
            parse_char(r"u'\U0001f369'", WcharWidth::Utf32),
            Err(Reason::EncodingMismatch)
        );
        assert_eq!(
            parse_char(r"'\U0001f369'", WcharWidth::Utf16),
            Err(Reason::EncodingMismatch)
        );
    }

    #[test]
    fn test_strings() {
        let s = parse_string(r#"u"unicode""#, WcharWidth::Utf32).unwrap();
        assert_eq!(s.encoding, Encoding::Utf16);
        assert_eq!(s.to_text().as_deref(), Some("unicode"));

        let s = parse_string(r#""a\x41\0b\"""#, WcharWidth::Utf32).unwrap();
        assert_eq!(s.to_text().as_deref(), Some("aA\0b\""));

        let s = parse_string(r#"L"\x1234""#, WcharWidth::Utf32).unwrap();
        assert_eq!(s.chars, vec![CChar::Raw(0x1234)]);
        assert_eq!(
            parse_string(r#""\x1234""#, WcharWidth::Utf32),
            Err(Reason::InvalidEscape)
        );
        assert_eq!(parse_string(r#""abc\""#, WcharWidth::Utf32), Err(Reason::InvalidEscape));
    }
}
