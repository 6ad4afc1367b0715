use crate::address::{Area, CellRef, RangeRef};
use crate::amount::format_brl;
use crate::balance::{self, Balances};
use crate::cache::{CacheStore, Clock, MemoryCache, ReferenceCache, SystemClock};
use crate::date::parse_shorthand;
use crate::entry::{last_data_row, read_entries, LedgerEntry};
use crate::error::BookError;
use crate::import::{import_one, ImportReport, RemoteSource};
use crate::layout::Layout;
use crate::lookup::{hydrate, LookupIndex, ReferenceKind, ReferenceTable};
use crate::notify::{Notifier, TracingNotifier};
use crate::paint::RowPaint;
use crate::sheet::{Sheet, Value, Workbook};
use crate::sort::SortPreset;

use anyhow::{anyhow, Result};
use chrono::Datelike;
use tracing::{debug, error, info, instrument, warn};

/// A cell edit reported by the host after the new value landed in the sheet.
#[derive(Clone, Debug, PartialEq)]
pub struct Edit {
    pub sheet: String,
    pub row: u32,
    pub column: u32,
    pub value: Value,
}

/// Manual actions, in menu order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    UpdateBalances,
    ImportReference,
    PaintAll,
    RefreshFromReference,
    SortByCash,
    SortByDueDate,
    LastCashRow,
    ClearCache,
}

impl Action {
    pub const MENU: [Action; 8] = [
        Action::UpdateBalances,
        Action::ImportReference,
        Action::PaintAll,
        Action::RefreshFromReference,
        Action::SortByCash,
        Action::SortByDueDate,
        Action::LastCashRow,
        Action::ClearCache,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Action::UpdateBalances => "Update balances",
            Action::ImportReference => "Import reference data",
            Action::PaintAll => "Paint all",
            Action::RefreshFromReference => "Refresh ledger from reference",
            Action::SortByCash => "Sort by cash date",
            Action::SortByDueDate => "Sort by due date",
            Action::LastCashRow => "Go to last cash date row",
            Action::ClearCache => "Clear cache",
        }
    }
}

fn sheet_mut<'w>(workbook: &'w mut Workbook, name: &str) -> Result<&'w mut Sheet> {
    workbook
        .sheet_mut(name)
        .ok_or_else(|| anyhow::Error::from(BookError::MissingSheet(name.to_string())))
}

/// Reference table of `kind` as currently on the reference sheet; empty when
/// the sheet or its rows are missing.
pub fn read_reference(workbook: &Workbook, layout: &Layout, kind: ReferenceKind) -> ReferenceTable {
    let Some(sheet) = workbook.sheet(&layout.reference_sheet) else {
        return ReferenceTable::default();
    };
    match layout.reference_range(kind).area(sheet.last_row()) {
        Some(area) => ReferenceTable::new(sheet.values(area)),
        None => ReferenceTable::default(),
    }
}

fn write_summary(sheet: &mut Sheet, range: RangeRef, amount: f64, format: &str) {
    let Some(area) = range.area(range.start.row.unwrap_or(1)) else {
        return;
    };
    if !sheet.is_merged(area) {
        sheet.merge(area);
    }
    sheet.set_number_format(area, format);
    sheet.set(area.row, area.column, Value::Number(amount));
}

/// The bookkeeping workbook: ledger and reference sheets plus the hooks and
/// actions that keep the ledger's derived cells in shape.
pub struct Book<S: CacheStore = MemoryCache> {
    workbook: Workbook,
    layout: Layout,
    cache: ReferenceCache<S>,
    clock: Box<dyn Clock>,
    notifier: Box<dyn Notifier>,
    remote: Option<Box<dyn RemoteSource>>,
}

impl Book<MemoryCache> {
    pub fn new(workbook: Workbook) -> Self {
        Book::with_store(workbook, Layout::default(), MemoryCache::new())
    }
}

impl<S: CacheStore> Book<S> {
    pub fn with_store(workbook: Workbook, layout: Layout, store: S) -> Self {
        let ttl = layout.cache_ttl;
        Book {
            workbook,
            layout,
            cache: ReferenceCache::new(store, ttl),
            clock: Box::new(SystemClock),
            notifier: Box::new(TracingNotifier),
            remote: None,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn with_remote(mut self, remote: impl RemoteSource + 'static) -> Self {
        self.remote = Some(Box::new(remote));
        self
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    pub fn workbook_mut(&mut self) -> &mut Workbook {
        &mut self.workbook
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn cache(&self) -> &ReferenceCache<S> {
        &self.cache
    }

    pub fn set_option(&mut self, key: &str, val: &str) -> Result<()> {
        self.layout.set_option(key, val)?;
        self.cache.set_ttl(self.layout.cache_ttl);
        Ok(())
    }

    fn ledger(&self) -> Result<&Sheet> {
        self.workbook
            .sheet(&self.layout.ledger_sheet)
            .ok_or_else(|| anyhow::Error::from(BookError::MissingSheet(self.layout.ledger_sheet.clone())))
    }

    /// Write `value` the way a user typing it would, then run the edit hook.
    pub fn enter(&mut self, sheet: &str, row: u32, column: u32, value: Value) {
        if let Some(target) = self.workbook.sheet_mut(sheet) {
            target.set(row, column, value.clone());
        }
        self.on_edit(&Edit {
            sheet: sheet.to_string(),
            row,
            column,
            value,
        });
    }

    /// Per-edit hook. Never fails: anything that goes wrong is logged.
    pub fn on_edit(&mut self, edit: &Edit) {
        if let Err(err) = self.handle_edit(edit) {
            error!(
                sheet = %edit.sheet,
                row = edit.row,
                column = edit.column,
                "edit handler failed: {:#}",
                err
            );
        }
    }

    fn handle_edit(&mut self, edit: &Edit) -> Result<()> {
        if edit.sheet != self.layout.ledger_sheet || edit.value.is_empty() {
            return Ok(());
        }
        let (row, column) = (edit.row, edit.column);

        if row >= self.layout.first_data_row()
            && self.layout.is_date_column(column)
            && self.normalize_date(row, column, &edit.value)?
        {
            return Ok(());
        }

        for kind in ReferenceKind::ALL {
            if self.layout.hydrated_span(kind).contains_column(column) {
                self.hydrate_row(kind, row, &edit.value)?;
            }
        }

        if self.layout.selected_account_cell.is(row, column) {
            self.update_balances()?;
            return Ok(());
        }
        if column == self.layout.account || column == self.layout.amount {
            self.update_balances()?;
        }

        self.paint_row(row)
    }

    fn normalize_date(&mut self, row: u32, column: u32, value: &Value) -> Result<bool> {
        if let Value::Date(_) = value {
            return Ok(false);
        }
        let Some(date) = parse_shorthand(&value.to_text(), self.clock.now().year()) else {
            return Ok(false);
        };

        let layout = &self.layout;
        let sheet = sheet_mut(&mut self.workbook, &layout.ledger_sheet)?;
        sheet.set(row, column, Value::Date(date));
        sheet.set_number_format(Area::cell(row, column), &layout.date_format);
        debug!(row, column, %date, "date shorthand normalized");
        Ok(true)
    }

    fn hydrate_row(&mut self, kind: ReferenceKind, row: u32, value: &Value) -> Result<()> {
        let table = self.reference_table(kind)?;
        if table.is_empty() {
            return Ok(());
        }
        let index = LookupIndex::build(&table);
        let span = self.layout.hydrated_span(kind);
        let Some(cells) = hydrate(&table, &index, value, span.width() as usize) else {
            debug!(%kind, row, "lookup miss");
            return Ok(());
        };

        let sheet = sheet_mut(&mut self.workbook, &self.layout.ledger_sheet)?;
        sheet.set_values(row, span.first_column(), &[cells]);
        Ok(())
    }

    /// Reference table of `kind`, served from the cache while it is fresh.
    pub fn reference_table(&mut self, kind: ReferenceKind) -> Result<ReferenceTable> {
        let (workbook, layout) = (&self.workbook, &self.layout);
        self.cache.get(kind, || Ok(read_reference(workbook, layout, kind)))
    }

    /// Rewrite the running balance columns and the summary cells.
    ///
    /// `Ok(None)` when there is nothing to compute: no ledger rows or no
    /// selected account. Nothing is written in that case.
    #[instrument(skip(self))]
    pub fn update_balances(&mut self) -> Result<Option<Balances>> {
        let layout = &self.layout;
        let sheet = sheet_mut(&mut self.workbook, &layout.ledger_sheet)?;

        let last = last_data_row(sheet, layout);
        if last <= layout.header_row {
            debug!("ledger is empty");
            return Ok(None);
        }
        let cell = layout.selected_account_cell;
        let selected = sheet.get(cell.row.unwrap_or(1), cell.column).clone();
        if !selected.is_truthy() {
            debug!("no account selected");
            return Ok(None);
        }

        let entries = read_entries(sheet, layout, last);
        let Some(balances) = balance::recompute(&entries, &selected.to_text()) else {
            return Ok(None);
        };

        let column = |values: &[f64]| -> Vec<Vec<Value>> {
            values.iter().map(|&n| vec![Value::Number(n)]).collect()
        };
        let first = layout.first_data_row();
        sheet.set_values(first, layout.selected_balance, &column(&balances.selected));
        sheet.set_values(first, layout.global_balance, &column(&balances.global));

        let visible = balance::visible_total(&entries);
        write_summary(sheet, layout.realized_total_cell, balances.realized, &layout.currency_format);
        write_summary(sheet, layout.visible_total_cell, visible, &layout.currency_format);

        info!(
            account = %selected.to_text(),
            rows = entries.len(),
            realized = balances.realized,
            visible,
            "balances updated"
        );
        self.notifier.toast(
            "Balances",
            &format!(
                "Balances updated. Selected account (cash): R$ {} | Overall (visible rows): R$ {}",
                format_brl(balances.realized),
                format_brl(visible)
            ),
            5,
        );
        Ok(Some(balances))
    }

    /// Sum of the amounts on rows the host is currently showing.
    pub fn visible_total(&self) -> Result<f64> {
        let sheet = self.ledger()?;
        let last = last_data_row(sheet, &self.layout);
        Ok(balance::visible_total(&read_entries(sheet, &self.layout, last)))
    }

    /// Recolor one ledger row from its amount and status.
    pub fn paint_row(&mut self, row: u32) -> Result<()> {
        let layout = &self.layout;
        if row <= layout.header_row {
            return Ok(());
        }
        let sheet = sheet_mut(&mut self.workbook, &layout.ledger_sheet)?;
        let entry = LedgerEntry::read(sheet, layout, row);
        let paint = RowPaint::of(entry.amount, &entry.status);

        sheet.set_background(layout.paint_span.band(row, 1), Some(paint.base));
        if let Some(color) = paint.highlight {
            for span in &layout.highlight_spans {
                sheet.set_background(span.band(row, 1), Some(color));
            }
        }
        Ok(())
    }

    /// Recolor every ledger row and clear stale colors below the table.
    /// Returns the number of rows painted.
    #[instrument(skip(self))]
    pub fn paint_all(&mut self) -> Result<usize> {
        let layout = &self.layout;
        let sheet = sheet_mut(&mut self.workbook, &layout.ledger_sheet)?;
        let first = layout.first_data_row();
        let last = last_data_row(sheet, layout);

        if last < first {
            sheet.clear_backgrounds_from(first);
            warn!("nothing to paint below the header");
            self.notifier
                .toast(&layout.ledger_sheet, "No data to format (header only)", 3);
            return Ok(0);
        }

        let paints: Vec<RowPaint> = read_entries(sheet, layout, last)
            .iter()
            .map(|entry| RowPaint::of(entry.amount, &entry.status))
            .collect();
        let row_of = |offset: usize| first + offset as u32;

        for (offset, paint) in paints.iter().enumerate() {
            sheet.set_background(layout.paint_span.band(row_of(offset), 1), Some(paint.base));
        }
        if last < sheet.last_row() {
            let stale = sheet.last_row() - last;
            sheet.set_background(layout.paint_span.band(last + 1, stale), None);
        }
        for span in &layout.highlight_spans {
            for (offset, paint) in paints.iter().enumerate() {
                sheet.set_background(span.band(row_of(offset), 1), Some(paint.color()));
            }
        }
        for range in &layout.extra_highlights {
            let Some(area) = range.area(last) else {
                continue;
            };
            if area.row < first || area.row > last {
                continue;
            }
            for row in area.row..=area.bottom().min(last) {
                let paint = paints[(row - first) as usize];
                sheet.set_background(Area::new(row, area.column, 1, area.columns), Some(paint.color()));
            }
        }

        info!(rows = paints.len(), "ledger painted");
        self.notifier
            .toast(&layout.ledger_sheet, "Formatting applied", 3);
        Ok(paints.len())
    }

    /// Re-copy project and account fields of every ledger row from the
    /// reference sheet, matching on the first reference column. Returns the
    /// number of blocks rewritten.
    #[instrument(skip(self))]
    pub fn refresh_from_reference(&mut self) -> Result<usize> {
        let layout = &self.layout;
        if self.workbook.sheet(&layout.reference_sheet).is_none() {
            return Err(BookError::MissingSheet(layout.reference_sheet.clone()).into());
        }
        let tables: Vec<(ReferenceKind, ReferenceTable)> = ReferenceKind::ALL
            .iter()
            .map(|&kind| (kind, read_reference(&self.workbook, layout, kind)))
            .collect();

        let sheet = sheet_mut(&mut self.workbook, &layout.ledger_sheet)?;
        let last = last_data_row(sheet, layout);
        if last <= layout.header_row {
            self.notifier
                .toast("Batch update", "No ledger rows to update", 3);
            return Ok(0);
        }
        let first = layout.first_data_row();
        let rows = last - layout.header_row;

        let mut updated = 0;
        for (kind, table) in &tables {
            let span = layout.hydrated_span(*kind);
            let mut block = sheet.values(span.band(first, rows));
            for line in block.iter_mut() {
                let key = match line.first() {
                    Some(key) if key.is_truthy() => key.to_text(),
                    _ => continue,
                };
                if key.trim().is_empty() {
                    continue;
                }
                if let Some(found) = table.find_by_key(&key) {
                    for (c, cell) in line.iter_mut().enumerate() {
                        *cell = found.get(c).cloned().unwrap_or_default();
                    }
                    updated += 1;
                }
            }
            sheet.set_values(first, span.first_column(), &block);
        }

        info!(rows, updated, "ledger refreshed from reference");
        self.notifier.toast(
            "Batch update",
            "Project and account fields updated from the reference sheet",
            5,
        );
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub fn sort(&mut self, preset: SortPreset) -> Result<()> {
        let layout = &self.layout;
        let sheet = sheet_mut(&mut self.workbook, &layout.ledger_sheet)?;
        let last = sheet.last_row();
        if last <= layout.header_row {
            return Ok(());
        }

        let area = Area::new(
            layout.first_data_row(),
            1,
            last - layout.header_row,
            sheet.last_column().max(1),
        );
        sheet.sort(area, &preset.keys(layout));

        let message = match preset {
            SortPreset::ByCash => "Sorted by cash date",
            SortPreset::ByDueDate => "Sorted by due date",
        };
        info!(rows = area.rows, "{}", message);
        self.notifier.toast("Sorting", message, 3);
        Ok(())
    }

    /// Focus the cash date cell of the last row carrying one.
    pub fn last_cash_row(&mut self) -> Result<Option<CellRef>> {
        let sheet = self.ledger()?;
        let column = self.layout.cash_date;
        let found = (self.layout.first_data_row()..=sheet.last_row())
            .rev()
            .find(|&row| !sheet.get(row, column).is_empty());

        match found {
            Some(row) => {
                let cell = CellRef::new(column, row);
                self.workbook.activate(&self.layout.ledger_sheet, cell);
                debug!(%cell, "focused last cash date");
                self.notifier.toast(
                    "Navigation",
                    &format!("Focused on the last cash date row (row {})", row),
                    3,
                );
                Ok(Some(cell))
            }
            None => {
                self.notifier
                    .toast("Navigation", "No cash dates found", 3);
                Ok(None)
            }
        }
    }

    pub fn clear_cache(&mut self) {
        self.cache.invalidate();
        info!("reference cache cleared");
        self.notifier.toast("Cache", "Reference cache cleared", 3);
    }

    /// Pull every configured reference source into the reference sheet. A
    /// failing source is logged and skipped; the cache is cleared afterwards.
    #[instrument(skip(self, remote))]
    pub fn import_reference(&mut self, remote: &dyn RemoteSource) -> Result<ImportReport> {
        let layout = &self.layout;
        let Some(target) = self.workbook.sheet_mut(&layout.reference_sheet) else {
            error!(sheet = %layout.reference_sheet, "reference sheet not found");
            return Err(BookError::MissingSheet(layout.reference_sheet.clone()).into());
        };

        let mut report = ImportReport::default();
        for spec in &layout.imports {
            match import_one(remote, spec, target) {
                Ok(rows) => {
                    info!(kind = %spec.kind, rows, "reference data imported");
                    self.notifier
                        .toast("Import", &format!("Reference {} imported", spec.kind), 3);
                    report.imported.push((spec.kind, rows));
                }
                Err(err) => {
                    error!(kind = %spec.kind, "reference import failed: {:#}", err);
                    report.failed.push(BookError::Import {
                        kind: spec.kind,
                        reason: format!("{:#}", err),
                    });
                }
            }
        }

        self.clear_cache();
        Ok(report)
    }

    /// Run a menu action. A failure is also shown to the user.
    pub fn run(&mut self, action: Action) -> Result<()> {
        let result = self.dispatch(action);
        if let Err(err) = &result {
            error!(action = action.label(), "action failed: {:#}", err);
            self.notifier.toast(action.label(), &format!("{:#}", err), 5);
        }
        result
    }

    fn dispatch(&mut self, action: Action) -> Result<()> {
        match action {
            Action::UpdateBalances => self.update_balances().map(drop),
            Action::ImportReference => {
                let remote = self
                    .remote
                    .take()
                    .ok_or(anyhow!("no remote source configured"))?;
                let result = self.import_reference(remote.as_ref());
                self.remote = Some(remote);
                result.map(drop)
            }
            Action::PaintAll => self.paint_all().map(drop),
            Action::RefreshFromReference => self.refresh_from_reference().map(drop),
            Action::SortByCash => self.sort(SortPreset::ByCash),
            Action::SortByDueDate => self.sort(SortPreset::ByDueDate),
            Action::LastCashRow => self.last_cash_row().map(drop),
            Action::ClearCache => {
                self.clear_cache();
                Ok(())
            }
        }
    }
}
