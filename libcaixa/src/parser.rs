use crate::address::RangeRef;
use anyhow::{anyhow, Result};
use pest::iterators::Pair;
use pest::Parser;

#[derive(Parser)]
#[grammar = "sheet.pest"]
pub struct SheetParser;

/// Parse a single A1 reference such as `Q4`, `G:I` or `AY5:BA`.
pub fn parse_a1(input: &str) -> Result<RangeRef> {
    let mut a1 = SheetParser::parse(Rule::a1, input)
        .map_err(|e| anyhow!(format!("invalid A1 reference '{}': {}", input, e)))?;
    let range = a1
        .next()
        .and_then(|pair| pair.into_inner().next())
        .ok_or(anyhow!(format!("invalid A1 reference '{}'", input)))?;
    RangeRef::parse(range)
}

/// Parse an options document, one `option "key" "value"` per line.
pub fn parse_options(input: &str) -> Result<Vec<(String, String)>> {
    let document = SheetParser::parse(Rule::options, input)?
        .next()
        .ok_or(anyhow!("empty options document"))?;

    let mut options = Vec::new();
    for option in document.into_inner() {
        match option.as_rule() {
            Rule::option => {
                let statement = option.as_str().to_string();
                let mut pairs = option.into_inner();
                let key = pairs
                    .next()
                    .ok_or(anyhow!(format!("missing option key: {}", statement)))?;
                let val = pairs
                    .next()
                    .ok_or(anyhow!(format!("missing option value: {}", statement)))?;
                options.push((unescape(inner_str(key)?), unescape(inner_str(val)?)));
            }
            Rule::EOI => (),
            _ => return Err(anyhow!(format!("unexpected token: {}", option.as_str()))),
        }
    }

    Ok(options)
}

pub fn inner_str(token: Pair<Rule>) -> Result<&str> {
    let whole = token.as_str();
    token
        .into_inner()
        .next()
        .map(|inner| inner.as_str())
        .ok_or(anyhow!(format!("expected inner token in '{}'", whole)))
}

fn unescape(s: &str) -> String {
    s.replace("\\\"", "\"").replace("\\\\", "\\")
}
