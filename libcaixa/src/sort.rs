use crate::layout::{Field, Layout};
use crate::sheet::Value;

use std::cmp::Ordering;

/// One column of a composite sort key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortKey {
    /// Absolute sheet column.
    pub column: u32,
    pub ascending: bool,
}

/// Named one-shot orderings of the ledger table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortPreset {
    /// Cash date, due date, account, payment method, amount, entry date.
    ByCash,
    /// Due date, then cash date.
    ByDueDate,
}

impl SortPreset {
    pub fn fields(&self) -> &'static [Field] {
        match self {
            SortPreset::ByCash => &[
                Field::CashDate,
                Field::DueDate,
                Field::Account,
                Field::PaymentMethod,
                Field::Amount,
                Field::EntryDate,
            ],
            SortPreset::ByDueDate => &[Field::DueDate, Field::CashDate],
        }
    }

    pub fn keys(&self, layout: &Layout) -> Vec<SortKey> {
        self.fields()
            .iter()
            .map(|&field| SortKey {
                column: layout.column_of(field),
                ascending: true,
            })
            .collect()
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Number(_) | Value::Date(_) => 0,
        Value::Text(s) if !s.is_empty() => 1,
        _ => 2,
    }
}

/// Ascending order of two cells: numbers and dates by serial, then text
/// ignoring case, blanks last.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match rank(a).cmp(&rank(b)) {
        Ordering::Equal => (),
        other => return other,
    }
    match (a.serial(), b.serial()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        _ => a.to_text().to_lowercase().cmp(&b.to_text().to_lowercase()),
    }
}

fn compare_key(a: &Value, b: &Value, ascending: bool) -> Ordering {
    // blanks stay at the bottom in both directions
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ if ascending => compare_values(a, b),
        _ => compare_values(b, a),
    }
}

/// Stable permutation of `rows` under `keys`; each row starts at `first_column`.
pub fn order(rows: &[Vec<Value>], first_column: u32, keys: &[SortKey]) -> Vec<usize> {
    let cell = |row: &Vec<Value>, column: u32| -> Value {
        column
            .checked_sub(first_column)
            .and_then(|idx| row.get(idx as usize))
            .cloned()
            .unwrap_or_default()
    };

    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by(|&a, &b| {
        keys.iter()
            .map(|key| {
                compare_key(
                    &cell(&rows[a], key.column),
                    &cell(&rows[b], key.column),
                    key.ascending,
                )
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
    order
}
