use crate::error::BookError;
use crate::layout::ImportSpec;
use crate::lookup::ReferenceKind;
use crate::sheet::{Sheet, Value};

use anyhow::{Context, Result};
use std::collections::HashMap;

/// Read access to other spreadsheet documents.
pub trait RemoteSource {
    fn open_range(&self, source_id: &str, range: &str) -> Result<Vec<Vec<Value>>>;
}

/// Fixed grids keyed by `(source_id, range)`.
#[derive(Clone, Debug, Default)]
pub struct StaticSource(HashMap<(String, String), Vec<Vec<Value>>>);

impl StaticSource {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_range(mut self, source_id: &str, range: &str, grid: Vec<Vec<Value>>) -> Self {
        self.0.insert((source_id.to_string(), range.to_string()), grid);
        self
    }
}

impl RemoteSource for StaticSource {
    fn open_range(&self, source_id: &str, range: &str) -> Result<Vec<Vec<Value>>> {
        self.0
            .get(&(source_id.to_string(), range.to_string()))
            .cloned()
            .ok_or(anyhow::Error::msg(format!(
                "range {} not found in document `{}'",
                range, source_id
            )))
    }
}

#[derive(Debug, Default)]
pub struct ImportReport {
    /// Kinds written, with the number of rows each.
    pub imported: Vec<(ReferenceKind, usize)>,
    pub failed: Vec<BookError>,
}

impl ImportReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Fetch one source and write it at its anchor. Rows already written stay
/// written if a later step fails.
pub fn import_one<R: RemoteSource + ?Sized>(remote: &R, spec: &ImportSpec, target: &mut Sheet) -> Result<usize> {
    let grid = remote
        .open_range(&spec.source_id, &spec.source_range)
        .with_context(|| format!("opening {} in `{}'", spec.source_range, spec.source_id))?;
    if grid.first().map_or(true, |row| row.is_empty()) {
        return Err(anyhow::Error::msg(format!("{} is empty", spec.source_range)));
    }

    let row = spec.target.row.unwrap_or(1);
    target.clear(row, spec.target.column);
    target.set_values(row, spec.target.column, &grid);
    Ok(grid.len())
}
