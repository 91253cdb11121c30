use std::sync::LazyLock;

use pest::{
    Parser,
    iterators::{Pair, Pairs},
    pratt_parser::{Assoc, Op, PrattParser},
};
use pest_derive::Parser;

use crate::ast::{BinaryOp, CType, Define, Expr, UnaryOp};
use crate::error::Reason;

#[derive(Parser)]
#[grammar = "src/literal.pest"]
pub struct LiteralParser;

/// C operator precedence, lowest first
static PRATT: LazyLock<PrattParser<Rule>> = LazyLock::new(|| {
    PrattParser::new()
        .op(Op::infix(Rule::bit_or, Assoc::Left))
        .op(Op::infix(Rule::bit_xor, Assoc::Left))
        .op(Op::infix(Rule::bit_and, Assoc::Left))
        .op(Op::infix(Rule::shl, Assoc::Left) | Op::infix(Rule::shr, Assoc::Left))
        .op(Op::infix(Rule::add, Assoc::Left) | Op::infix(Rule::sub, Assoc::Left))
        .op(Op::infix(Rule::mul, Assoc::Left)
            | Op::infix(Rule::div, Assoc::Left)
            | Op::infix(Rule::rem, Assoc::Left))
        .op(Op::prefix(Rule::neg)
            | Op::prefix(Rule::pos)
            | Op::prefix(Rule::bit_not)
            | Op::prefix(Rule::not)
            | Op::prefix(Rule::cast))
});

impl LiteralParser {
    /// Parse a logical line holding a `#define` directive
    pub fn parse_define(line: &str) -> Result<Define<'_>, pest::error::Error<Rule>> {
        let pairs = LiteralParser::parse(Rule::define_line, line)?;
        let mut define = Define {
            name: "",
            params: None,
            body: "",
        };

        for pair in pairs.flat_map(|directive| directive.into_inner()) {
            match pair.as_rule() {
                Rule::define_head => {
                    for part in pair.into_inner() {
                        match part.as_rule() {
                            Rule::identifier => define.name = part.as_str(),
                            Rule::parameters => {
                                define.params =
                                    Some(part.into_inner().map(|p| p.as_str()).collect())
                            }
                            _ => {}
                        }
                    }
                }
                Rule::body => define.body = pair.as_str().trim(),
                _ => {}
            }
        }
        Ok(define)
    }

    /// Parse a macro body into an expression.
    ///
    /// Bodies whose parentheses nest deeper than `max_depth` are rejected
    /// before parsing. Every operator and group then counts as one level of
    /// the expression tree, and the operators of a flat chain count as nested,
    /// so the tree built from an accepted body is at most `max_depth` deep.
    pub fn parse_expression(body: &str, max_depth: usize) -> Result<Expr<'_>, Reason> {
        if paren_depth(body) > max_depth {
            return Err(Reason::NestingTooDeep);
        }

        let mut pairs = LiteralParser::parse(Rule::expression, body).map_err(|e| {
            log::debug!("unparsable body {body:?}: {e}");
            Reason::Syntax
        })?;
        let expr = pairs
            .next()
            .and_then(|expression| expression.into_inner().next())
            .ok_or(Reason::Syntax)?;
        Self::parse_expr(expr.into_inner(), max_depth)
    }

    /// `budget` is the number of tree levels still allowed below this point.
    fn parse_expr(pairs: Pairs<'_, Rule>, budget: usize) -> Result<Expr<'_>, Reason> {
        let operators = pairs.clone().filter(|pair| is_operator(pair.as_rule())).count();
        let Some(budget) = budget.checked_sub(operators) else {
            return Err(Reason::NestingTooDeep);
        };

        PRATT
            .map_primary(|primary| Self::parse_primary(primary, budget))
            .map_prefix(|op, rhs| {
                let rhs = Box::new(rhs?);
                Ok(match op.as_rule() {
                    Rule::neg => Expr::Unary(UnaryOp::Neg, rhs),
                    Rule::pos => Expr::Unary(UnaryOp::Plus, rhs),
                    Rule::bit_not => Expr::Unary(UnaryOp::BitNot, rhs),
                    Rule::not => Expr::Unary(UnaryOp::Not, rhs),
                    Rule::cast => Expr::Cast(Self::parse_cast(op)?, rhs),
                    _ => return Err(Reason::Syntax),
                })
            })
            .map_infix(|lhs, op, rhs| {
                let op = match op.as_rule() {
                    Rule::add => BinaryOp::Add,
                    Rule::sub => BinaryOp::Sub,
                    Rule::mul => BinaryOp::Mul,
                    Rule::div => BinaryOp::Div,
                    Rule::rem => BinaryOp::Rem,
                    Rule::shl => BinaryOp::Shl,
                    Rule::shr => BinaryOp::Shr,
                    Rule::bit_and => BinaryOp::BitAnd,
                    Rule::bit_xor => BinaryOp::BitXor,
                    Rule::bit_or => BinaryOp::BitOr,
                    _ => return Err(Reason::Syntax),
                };
                Ok(Expr::Binary(op, Box::new(lhs?), Box::new(rhs?)))
            })
            .parse(pairs)
    }

    fn parse_primary(pair: Pair<'_, Rule>, budget: usize) -> Result<Expr<'_>, Reason> {
        match pair.as_rule() {
            Rule::number => Ok(Expr::Number(pair.as_str())),
            Rule::char_lit => Ok(Expr::Char(pair.as_str())),
            Rule::string_lit => Ok(Expr::Str(pair.as_str())),
            Rule::identifier => Ok(Expr::Identifier(pair.as_str())),
            Rule::group => {
                let inner = pair.into_inner().next().ok_or(Reason::Syntax)?;
                let budget = budget.checked_sub(1).ok_or(Reason::NestingTooDeep)?;
                Self::parse_expr(inner.into_inner(), budget)
            }
            Rule::juxtaposition => pair
                .into_inner()
                .map(|atom| Self::parse_primary(atom, budget))
                .collect::<Result<Vec<_>, _>>()
                .map(Expr::Juxtaposition),
            _ => Err(Reason::Syntax),
        }
    }

    fn parse_cast(pair: Pair<'_, Rule>) -> Result<CType, Reason> {
        let words: Vec<&str> = pair
            .into_inner()
            .flat_map(|type_name| type_name.into_inner())
            .map(|word| word.as_str())
            .collect();
        CType::from_words(&words).ok_or(Reason::Syntax)
    }
}

fn is_operator(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::cast
            | Rule::neg
            | Rule::pos
            | Rule::bit_not
            | Rule::not
            | Rule::shl
            | Rule::shr
            | Rule::add
            | Rule::sub
            | Rule::mul
            | Rule::div
            | Rule::rem
            | Rule::bit_and
            | Rule::bit_xor
            | Rule::bit_or
    )
}

/// Deepest parenthesis nesting outside of quoted literals
fn paren_depth(body: &str) -> usize {
    let (mut depth, mut max) = (0usize, 0usize);
    let mut quote = None;
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(_), '\\') => {
                chars.next();
            }
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => {
                depth += 1;
                max = max.max(depth);
            }
            (None, ')') => depth = depth.saturating_sub(1),
            (None, _) => {}
        }
    }
    max
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(body: &str) -> Expr<'_> {
        LiteralParser::parse_expression(body, 100).unwrap()
    }

    #[test]
    fn test_parse_simple_define() {
        let define = LiteralParser::parse_define("#define Int_456 456").unwrap();
        assert_eq!(
            define,
            Define {
                name: "Int_456",
                params: None,
                body: "456"
            }
        );
    }

    #[test]
    fn test_parse_define_with_params() {
        let define = LiteralParser::parse_define("#define FAIL_1(x, y) 3").unwrap();
        assert_eq!(define.name, "FAIL_1");
        assert_eq!(define.params, Some(vec!["x", "y"]));
        assert_eq!(define.body, "3");

        let define = LiteralParser::parse_define("#define NONE() 3").unwrap();
        assert_eq!(define.params, Some(vec![]));
    }

    #[test]
    fn test_parse_define_object_like_parens() {
        let define = LiteralParser::parse_define("  #  define Int_n3 ((-3))  ").unwrap();
        assert_eq!(define.name, "Int_n3");
        assert_eq!(define.params, None);
        assert_eq!(define.body, "((-3))");
    }

    #[test]
    fn test_parse_define_empty_body() {
        let define = LiteralParser::parse_define("#define FAIL_2").unwrap();
        assert_eq!(define.name, "FAIL_2");
        assert_eq!(define.body, "");
    }

    #[test]
    fn test_parse_define_rejects_other_lines() {
        assert!(LiteralParser::parse_define("#include <stdio.h>").is_err());
        assert!(LiteralParser::parse_define("#defineX 1").is_err());
        assert!(LiteralParser::parse_define("int x = 1;").is_err());
        assert!(LiteralParser::parse_define("#define 3 4").is_err());
    }

    #[test]
    fn test_parse_precedence() {
        // 1 | (8 ^ (6 & (2 << 1)))
        match expr("1|8^6&2<<1") {
            Expr::Binary(BinaryOp::BitOr, lhs, rhs) => {
                assert_eq!(*lhs, Expr::Number("1"));
                assert!(matches!(*rhs, Expr::Binary(BinaryOp::BitXor, _, _)));
            }
            _ => panic!("Expected bit_or at the root"),
        }
    }

    #[test]
    fn test_parse_unary_minus_chain() {
        assert_eq!(
            expr("-3-2"),
            Expr::Binary(
                BinaryOp::Sub,
                Box::new(Expr::Unary(UnaryOp::Neg, Box::new(Expr::Number("3")))),
                Box::new(Expr::Number("2")),
            )
        );
    }

    #[test]
    fn test_parse_groups_vanish() {
        assert_eq!(
            expr("(((1)<<4ULL))"),
            Expr::Binary(
                BinaryOp::Shl,
                Box::new(Expr::Number("1")),
                Box::new(Expr::Number("4ULL")),
            )
        );
    }

    #[test]
    fn test_parse_juxtaposition() {
        assert_eq!(
            expr(r#"(Str_concat L"_identifier")"#),
            Expr::Juxtaposition(vec![
                Expr::Identifier("Str_concat"),
                Expr::Str(r#"L"_identifier""#),
            ])
        );
        assert_eq!(
            expr(r#"u"con" L"cat""#),
            Expr::Juxtaposition(vec![Expr::Str(r#"u"con""#), Expr::Str(r#"L"cat""#)])
        );
    }

    #[test]
    fn test_parse_literal_tokens() {
        assert_eq!(expr("1e-3"), Expr::Number("1e-3"));
        assert_eq!(expr(".1"), Expr::Number(".1"));
        assert_eq!(expr(r"U'\xff'"), Expr::Char(r"U'\xff'"));
        assert_eq!(expr(r#""a\"b""#), Expr::Str(r#""a\"b""#));
        assert_eq!(expr("UNKNOWN"), Expr::Identifier("UNKNOWN"));
    }

    #[test]
    fn test_parse_cast() {
        assert_eq!(
            expr("(unsigned char)-1"),
            Expr::Cast(
                CType::Int(crate::value::IntWidth::Char, crate::value::Signedness::Unsigned),
                Box::new(Expr::Unary(UnaryOp::Neg, Box::new(Expr::Number("1")))),
            )
        );
        assert_eq!(LiteralParser::parse_expression("(long short)1", 100), Err(Reason::Syntax));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(LiteralParser::parse_expression("1 +", 100), Err(Reason::Syntax));
        assert_eq!(LiteralParser::parse_expression("(1", 100), Err(Reason::Syntax));
        assert_eq!(LiteralParser::parse_expression("1 < 2", 100), Err(Reason::Syntax));
        assert_eq!(
            LiteralParser::parse_expression("((((1))))", 3),
            Err(Reason::NestingTooDeep)
        );
    }

    #[test]
    fn test_operator_chains_count_towards_depth() {
        let chain = vec!["1"; 101].join("+");
        assert!(LiteralParser::parse_expression(&chain, 100).is_ok());

        let chain = vec!["1"; 10_000].join("+");
        assert_eq!(
            LiteralParser::parse_expression(&chain, 100),
            Err(Reason::NestingTooDeep)
        );
        let prefixes = "~".repeat(10_000) + "1";
        assert_eq!(
            LiteralParser::parse_expression(&prefixes, 100),
            Err(Reason::NestingTooDeep)
        );
        assert_eq!(
            LiteralParser::parse_expression("(1 + (2 + 3))", 3),
            Err(Reason::NestingTooDeep)
        );
        assert!(LiteralParser::parse_expression("(1 + (2 + 3))", 4).is_ok());
    }

    #[test]
    fn test_paren_depth_skips_literals() {
        assert_eq!(paren_depth(r#"("(((" ')')"#), 1);
        assert_eq!(paren_depth(r#"("\"((")"#), 1);
    }
}
