use crate::amount::parse_amount;
use crate::layout::Layout;
use crate::sheet::{Sheet, Value};

/// One ledger row as the balance and paint passes see it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LedgerEntry {
    pub row: u32,
    pub entry_date: Value,
    pub due_date: Value,
    pub cash_date: Value,
    pub account: String,
    pub payment_method: String,
    pub amount: f64,
    pub status: String,
    pub visible: bool,
}

impl LedgerEntry {
    pub fn new(account: &str, amount: f64) -> Self {
        LedgerEntry {
            account: account.to_string(),
            amount,
            visible: true,
            ..Default::default()
        }
    }

    pub fn with_cash_date(mut self, date: Value) -> Self {
        self.cash_date = date;
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Cleared through cash.
    pub fn is_realized(&self) -> bool {
        self.cash_date.is_truthy()
    }

    pub fn read(sheet: &Sheet, layout: &Layout, row: u32) -> Self {
        LedgerEntry {
            row,
            entry_date: sheet.get(row, layout.entry_date).clone(),
            due_date: sheet.get(row, layout.due_date).clone(),
            cash_date: sheet.get(row, layout.cash_date).clone(),
            account: sheet.get(row, layout.account).to_text(),
            payment_method: sheet.get(row, layout.payment_method).to_text(),
            amount: parse_amount(sheet.get(row, layout.amount)),
            status: sheet
                .get(row, layout.status)
                .as_str()
                .unwrap_or_default()
                .to_string(),
            visible: !sheet.is_row_hidden(row),
        }
    }
}

/// Last row below the header with an account or an amount, or the header
/// row itself when the table is empty.
pub fn last_data_row(sheet: &Sheet, layout: &Layout) -> u32 {
    (layout.first_data_row()..=sheet.last_row())
        .rev()
        .find(|&row| !sheet.get(row, layout.account).is_empty() || !sheet.get(row, layout.amount).is_empty())
        .unwrap_or(layout.header_row)
}

/// Entries from the first data row through `last_row`.
pub fn read_entries(sheet: &Sheet, layout: &Layout, last_row: u32) -> Vec<LedgerEntry> {
    (layout.first_data_row()..=last_row)
        .map(|row| LedgerEntry::read(sheet, layout, row))
        .collect()
}
