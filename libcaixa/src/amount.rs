use crate::sheet::Value;

/// Amount of a ledger cell. Numbers pass through, text in pt-BR notation
/// (`"R$ 1.234,56"`) is normalized, anything unreadable counts as zero.
pub fn parse_amount(raw: &Value) -> f64 {
    match raw {
        Value::Number(n) => *n,
        Value::Text(s) => parse_amount_str(s),
        Value::Empty | Value::Date(_) => 0f64,
    }
}

pub fn parse_amount_str(raw: &str) -> f64 {
    let mut s: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, 'R' | '$') && !c.is_whitespace())
        .collect();

    match (s.contains(','), s.contains('.')) {
        (true, true) => s = s.replace('.', "").replacen(',', ".", 1),
        (true, false) => s = s.replacen(',', ".", 1),
        // a lone dot is left alone, "1.234" stays 1.234
        _ => (),
    }

    if s.is_empty() {
        return 0f64;
    }
    match s.parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => 0f64,
    }
}

/// pt-BR rendering with two to three decimals, `1234.5` becomes `1.234,50`
/// and `1234.567` stays `1.234,567`.
pub fn format_brl(amount: f64) -> String {
    let fixed = format!("{:.3}", amount.abs());
    let (int, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "000"));
    let frac = frac.strip_suffix('0').unwrap_or(frac);

    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (idx, digit) in int.chars().enumerate() {
        if idx > 0 && (int.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let negative = amount < 0f64 && fixed.chars().any(|c| c != '0' && c != '.');
    format!("{}{},{}", if negative { "-" } else { "" }, grouped, frac)
}
