use crate::entry::LedgerEntry;

/// Derived totals of one pass over the ledger.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Balances {
    /// Running total of the selected account, one per entry.
    pub selected: Vec<f64>,
    /// Running total of every entry.
    pub global: Vec<f64>,
    /// Selected-account total of the entries cleared through cash.
    pub realized: f64,
}

/// Recompute running balances in entry order.
///
/// Returns `None`, leaving any previous balances in place, when no account
/// is selected.
pub fn recompute(entries: &[LedgerEntry], selected_account: &str) -> Option<Balances> {
    if selected_account.is_empty() {
        return None;
    }

    let mut balances = Balances {
        selected: Vec::with_capacity(entries.len()),
        global: Vec::with_capacity(entries.len()),
        realized: 0f64,
    };
    let (mut selected, mut global) = (0f64, 0f64);

    for entry in entries {
        let is_selected = entry.account == selected_account;
        global += entry.amount;
        if is_selected {
            selected += entry.amount;
            if entry.is_realized() {
                balances.realized += entry.amount;
            }
        }
        balances.selected.push(selected);
        balances.global.push(global);
    }

    Some(balances)
}

/// Sum of the entries the host currently shows, i.e. not filtered out.
pub fn visible_total(entries: &[LedgerEntry]) -> f64 {
    entries
        .iter()
        .filter(|entry| entry.visible)
        .map(|entry| entry.amount)
        .sum()
}
