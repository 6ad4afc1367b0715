use crate::sheet::Value;

use indexmap::IndexMap;
use std::fmt;

/// The two reference tables kept on the reference sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Projects,
    Accounts,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 2] = [ReferenceKind::Projects, ReferenceKind::Accounts];

    pub fn cache_key(&self) -> &'static str {
        match self {
            ReferenceKind::Projects => "cadastro_projetos",
            ReferenceKind::Accounts => "cadastro_contas",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Projects => write!(f, "projects"),
            ReferenceKind::Accounts => write!(f, "accounts"),
        }
    }
}

/// Fixed-width rows copied verbatim off the reference sheet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferenceTable {
    rows: Vec<Vec<Value>>,
}

impl ReferenceTable {
    pub fn new(rows: Vec<Vec<Value>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row(&self, idx: usize) -> Option<&[Value]> {
        self.rows.get(idx).map(|r| r.as_slice())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First row whose leading cell equals `key` once both are trimmed.
    pub fn find_by_key(&self, key: &str) -> Option<&[Value]> {
        let key = key.trim();
        self.rows
            .iter()
            .find(|row| {
                row.first()
                    .is_some_and(|first| first.is_truthy() && first.to_text().trim() == key)
            })
            .map(|r| r.as_slice())
    }
}

/// Normalized lookup key of a cell: trimmed, lowercased, `None` when blank.
pub fn lookup_key(value: &Value) -> Option<String> {
    if !value.is_truthy() {
        return None;
    }
    let key = value.to_text().trim().to_lowercase();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Catch-all index from any cell text of a table to the first row holding it.
#[derive(Clone, Debug, Default)]
pub struct LookupIndex(IndexMap<String, usize>);

impl LookupIndex {
    pub fn build(table: &ReferenceTable) -> Self {
        let mut index = IndexMap::new();
        for (idx, row) in table.rows().iter().enumerate() {
            for key in row.iter().filter_map(lookup_key) {
                index.entry(key).or_insert(idx);
            }
        }
        LookupIndex(index)
    }

    pub fn lookup(&self, key: &str) -> Option<usize> {
        self.0.get(key).copied()
    }
}

/// Cells to copy into the ledger for an entered `value`, padded to `width`.
/// `None` on a miss, which leaves the ledger untouched.
pub fn hydrate(table: &ReferenceTable, index: &LookupIndex, value: &Value, width: usize) -> Option<Vec<Value>> {
    let row = table.row(index.lookup(&lookup_key(value)?)?)?;
    Some(
        (0..width)
            .map(|c| row.get(c).cloned().unwrap_or_default())
            .collect(),
    )
}
