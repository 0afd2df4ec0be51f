use pest::{iterators::Pair, Parser};
use pest_derive::Parser;
use serde_json::{Map, Value};

use crate::error::ParseError;

#[derive(Parser)]
#[grammar = "process/literal.pest"]
struct LiteralParser;

/// Parse a literal structure (`[{'dato': '2024-01-05'}, ...]`) into a JSON value.
/// Tuples become arrays; non-string dict keys are rendered to text.
pub fn parse_literal(input: &str) -> Result<Value, ParseError> {
    let mut pairs = LiteralParser::parse(Rule::literal, input)
        .map_err(|e| ParseError::Literal(e.to_string()))?;
    let literal = pairs
        .next()
        .ok_or_else(|| ParseError::Literal("empty input".into()))?;
    literal
        .into_inner()
        .find(|p| p.as_rule() != Rule::EOI)
        .map(to_value)
        .ok_or_else(|| ParseError::Literal("empty input".into()))
}

fn to_value(pair: Pair<'_, Rule>) -> Value {
    match pair.as_rule() {
        Rule::dict => {
            let mut map = Map::new();
            for entry in pair.into_inner() {
                let mut kv = entry.into_inner();
                let (Some(k), Some(v)) = (kv.next(), kv.next()) else {
                    continue;
                };
                let key = match to_value(k) {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                map.insert(key, to_value(v));
            }
            Value::Object(map)
        }
        Rule::list | Rule::tuple => Value::Array(pair.into_inner().map(to_value).collect()),
        Rule::string => {
            let inner = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
            Value::String(unescape(inner))
        }
        Rule::number => {
            let s = pair.as_str();
            s.parse::<i64>()
                .map(Value::from)
                .or_else(|_| s.parse::<f64>().map(Value::from))
                .unwrap_or(Value::Null)
        }
        Rule::boolean => Value::Bool(pair.as_str() == "True"),
        _ => Value::Null,
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
