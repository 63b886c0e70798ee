use crate::expression::Expression;
use crate::value::{Operator, Value, VariableKind};

use pest::error::ErrorVariant;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "grammar.pest"] // relative to project `src`
struct FormulaParser;

pub type ParseError = pest::error::Error<Rule>;

impl Expression {
    /// Parse a formula written as text, e.g. `"IMG_" + $index * #4`.
    ///
    /// Only tokens are checked here. Bracket and operator balance is left to
    /// [`Expression::compile`], the same as for an expression built value by
    /// value.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let mut values: Vec<Value> = Vec::new();
        let elements = FormulaParser::parse(Rule::formula, input)?.flat_map(|p| p.into_inner());

        for pair in elements {
            let value = match pair.as_rule() {
                Rule::int_literal => Value::Int(int_value(&pair, pair.as_str())?),
                Rule::negative_int => {
                    // `a -1` is a subtraction; `(-1` and `* -1` are literals.
                    if values.last().is_some_and(ends_operand) {
                        values.push(Value::Operator(Operator::Sub));
                        Value::Int(int_value(&pair, &pair.as_str()[1..])?)
                    } else {
                        Value::Int(int_value(&pair, pair.as_str())?)
                    }
                }
                Rule::format_spec => Value::Format(int_value(&pair, &pair.as_str()[1..])?),
                Rule::variable => Value::Variable(VariableKind::from_name(&pair.as_str()[1..])),
                Rule::string_literal => {
                    let inner = pair.into_inner().as_str();
                    Value::Str(unescape(inner))
                }
                Rule::open_bracket => Value::OpenBracket,
                Rule::close_bracket => Value::CloseBracket,
                Rule::add => Value::Operator(Operator::Add),
                Rule::subtract => Value::Operator(Operator::Sub),
                Rule::multiply => Value::Operator(Operator::Mul),
                Rule::divide => Value::Operator(Operator::Div),
                Rule::EOI => continue,
                x => unreachable!("Unexpected formula rule {x:?}"),
            };
            values.push(value);
        }

        Ok(values.into())
    }
}

fn ends_operand(value: &Value) -> bool {
    value.is_operand() || *value == Value::CloseBracket
}

fn int_value(pair: &Pair<Rule>, digits: &str) -> Result<i64, ParseError> {
    digits.parse().map_err(|_| {
        ParseError::new_from_span(
            ErrorVariant::CustomError {
                message: format!("{} does not fit in a 64-bit integer", pair.as_str()),
            },
            pair.as_span(),
        )
    })
}

fn unescape(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use Operator::*;

    fn op(op: Operator) -> Value {
        Value::Operator(op)
    }

    #[test]
    fn parse_every_token_kind() {
        let expr = Expression::parse(r#"( "IMG_" + $index * #4 ) - 1 / $name"#).unwrap();
        assert_eq!(
            expr.values(),
            &[
                Value::OpenBracket,
                Value::string("IMG_"),
                op(Add),
                Value::Variable(VariableKind::Index),
                op(Mul),
                Value::Format(4),
                Value::CloseBracket,
                op(Sub),
                Value::Int(1),
                op(Div),
                Value::Variable(VariableKind::OriginFileName),
            ]
        );
    }

    #[test]
    fn whitespace_is_optional() {
        let spaced = Expression::parse("(3 + 4) * 2").unwrap();
        let packed = Expression::parse("(3+4)*2").unwrap();
        assert_eq!(spaced, packed);
    }

    #[test]
    fn minus_before_digits() {
        let expr = Expression::parse("3-1").unwrap();
        assert_eq!(expr.values(), &[Value::Int(3), op(Sub), Value::Int(1)]);

        let expr = Expression::parse("(2) -1").unwrap();
        assert_eq!(
            expr.values(),
            &[
                Value::OpenBracket,
                Value::Int(2),
                Value::CloseBracket,
                op(Sub),
                Value::Int(1)
            ]
        );

        let expr = Expression::parse("2 * -3").unwrap();
        assert_eq!(expr.values(), &[Value::Int(2), op(Mul), Value::Int(-3)]);

        let expr = Expression::parse("-9223372036854775808").unwrap();
        assert_eq!(expr.values(), &[Value::Int(i64::MIN)]);
    }

    #[test]
    fn string_escapes() {
        let expr = Expression::parse(r#""say \"hi\" \\ bye""#).unwrap();
        assert_eq!(expr.values(), &[Value::string(r#"say "hi" \ bye"#)]);

        let expr = Expression::parse(r#""""#).unwrap();
        assert_eq!(expr.values(), &[Value::string("")]);
    }

    #[test]
    fn unknown_variables_parse() {
        let expr = Expression::parse("$stem").unwrap();
        assert_eq!(
            expr.values(),
            &[Value::Variable(VariableKind::Unknown("stem".into()))]
        );
    }

    #[test]
    fn unbalanced_text_still_parses() {
        let expr = Expression::parse("( 1 +").unwrap();
        assert_eq!(expr.len(), 3);
        assert!(expr.compile().is_err());
    }

    #[test]
    fn render_parses_back() {
        let source = r#"( "a \"q\"" + $name ) * #3 + -4 - 5 / $index"#;
        let expr = Expression::parse(source).unwrap();
        let reparsed = Expression::parse(&expr.to_string()).unwrap();
        assert_eq!(expr, reparsed);
    }

    #[test]
    fn parse_errors() {
        assert!(Expression::parse("3 % 4").is_err());
        assert!(Expression::parse(r#""unterminated"#).is_err());
        assert!(Expression::parse("$").is_err());
        assert!(Expression::parse("#").is_err());

        let err = Expression::parse("99999999999999999999").unwrap_err();
        assert!(err.to_string().contains("64-bit"), "{err}");
    }
}
