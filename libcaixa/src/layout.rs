use crate::address::{column_index, CellRef, RangeRef};
use crate::error::BookError;
use crate::lookup::ReferenceKind;
use crate::parser::parse_options;

use anyhow::Result;
use std::time::Duration;

/// Ledger columns addressable by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    EntryDate,
    DueDate,
    CashDate,
    Account,
    PaymentMethod,
    Amount,
    SelectedBalance,
    GlobalBalance,
    Status,
}

/// Where an external reference grid is fetched from and where it lands.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportSpec {
    pub kind: ReferenceKind,
    pub source_id: String,
    pub source_range: String,
    pub target: CellRef,
}

/// Sheet geometry and fixed constants of the bookkeeping workbook.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    pub ledger_sheet: String,
    pub reference_sheet: String,
    pub header_row: u32,

    pub entry_date: u32,
    pub due_date: u32,
    pub cash_date: u32,
    pub account: u32,
    pub payment_method: u32,
    pub amount: u32,
    pub selected_balance: u32,
    pub global_balance: u32,
    pub status: u32,

    pub project_fields: RangeRef,
    pub account_fields: RangeRef,

    pub selected_account_cell: CellRef,
    pub realized_total_cell: RangeRef,
    pub visible_total_cell: RangeRef,

    pub paint_span: RangeRef,
    pub highlight_spans: Vec<RangeRef>,
    pub extra_highlights: Vec<RangeRef>,

    pub project_reference: RangeRef,
    pub account_reference: RangeRef,

    pub cache_ttl: Duration,
    pub date_format: String,
    pub currency_format: String,

    pub imports: Vec<ImportSpec>,
}

fn col(name: &str) -> u32 {
    column_index(name).unwrap_or(0)
}

fn range(first: &str, last: &str) -> RangeRef {
    RangeRef::columns(col(first), col(last))
}

impl Default for Layout {
    fn default() -> Self {
        Layout {
            ledger_sheet: "LD".to_string(),
            reference_sheet: "CADASTRO".to_string(),
            header_row: 4,

            entry_date: col("B"),
            due_date: col("C"),
            cash_date: col("D"),
            account: col("M"),
            payment_method: col("N"),
            amount: col("P"),
            selected_balance: col("Q"),
            global_balance: col("R"),
            status: col("S"),

            project_fields: range("G", "I"),
            account_fields: range("J", "L"),

            selected_account_cell: CellRef::new(col("Q"), 4),
            realized_total_cell: RangeRef {
                start: CellRef::new(col("O"), 1),
                end: Some(CellRef::new(col("P"), 1)),
            },
            visible_total_cell: RangeRef {
                start: CellRef::new(col("O"), 2),
                end: Some(CellRef::new(col("P"), 2)),
            },

            paint_span: range("A", "W"),
            highlight_spans: vec![range("D", "D"), range("F", "F"), range("P", "S")],
            extra_highlights: vec![],

            project_reference: RangeRef {
                start: CellRef::new(col("AY"), 5),
                end: Some(CellRef::column(col("BA"))),
            },
            account_reference: RangeRef {
                start: CellRef::new(col("J"), 5),
                end: Some(CellRef::column(col("L"))),
            },

            cache_ttl: Duration::from_secs(600),
            date_format: "dd/mm/yy".to_string(),
            currency_format: "\"R$\" #,##0.00".to_string(),

            imports: vec![
                ImportSpec {
                    kind: ReferenceKind::Accounts,
                    source_id: String::new(),
                    source_range: "CONTAS CONTÁBEIS!A:H".to_string(),
                    target: CellRef::new(col("A"), 2),
                },
                ImportSpec {
                    kind: ReferenceKind::Projects,
                    source_id: String::new(),
                    source_range: "LD!A:M".to_string(),
                    target: CellRef::new(col("AK"), 2),
                },
            ],
        }
    }
}

fn invalid(key: &str, val: &str) -> anyhow::Error {
    BookError::Option {
        key: key.to_string(),
        value: val.to_string(),
    }
    .into()
}

fn parse_column(key: &str, val: &str) -> Result<u32> {
    let range: RangeRef = val.parse().map_err(|_| invalid(key, val))?;
    if range.end.is_some() || range.start.row.is_some() {
        return Err(invalid(key, val));
    }
    Ok(range.start.column)
}

fn parse_span(key: &str, val: &str) -> Result<RangeRef> {
    let range: RangeRef = val.parse().map_err(|_| invalid(key, val))?;
    if !range.is_column_only() {
        return Err(invalid(key, val));
    }
    Ok(range)
}

fn parse_cell(key: &str, val: &str) -> Result<CellRef> {
    let cell = CellRef::try_from(val).map_err(|_| invalid(key, val))?;
    if cell.row.is_none() {
        return Err(invalid(key, val));
    }
    Ok(cell)
}

fn parse_range(key: &str, val: &str) -> Result<RangeRef> {
    val.parse().map_err(|_| invalid(key, val))
}

fn parse_list(key: &str, val: &str) -> Result<Vec<RangeRef>> {
    val.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_range(key, s))
        .collect()
}

impl Layout {
    /// Layout from `option "key" "value"` lines applied over the defaults.
    pub fn from_options(document: &str) -> Result<Layout> {
        let mut layout = Layout::default();
        for (key, val) in parse_options(document)? {
            layout.set_option(&key, &val)?;
        }
        Ok(layout)
    }

    pub fn set_option(&mut self, key: &str, val: &str) -> Result<()> {
        match key {
            "ledger_sheet" => self.ledger_sheet = val.to_string(),
            "reference_sheet" => self.reference_sheet = val.to_string(),
            "header_row" => self.header_row = val.trim().parse().map_err(|_| invalid(key, val))?,

            "entry_date_column" => self.entry_date = parse_column(key, val)?,
            "due_date_column" => self.due_date = parse_column(key, val)?,
            "cash_date_column" => self.cash_date = parse_column(key, val)?,
            "account_column" => self.account = parse_column(key, val)?,
            "payment_method_column" => self.payment_method = parse_column(key, val)?,
            "amount_column" => self.amount = parse_column(key, val)?,
            "selected_balance_column" => self.selected_balance = parse_column(key, val)?,
            "global_balance_column" => self.global_balance = parse_column(key, val)?,
            "status_column" => self.status = parse_column(key, val)?,

            "project_columns" => self.project_fields = parse_span(key, val)?,
            "account_columns" => self.account_fields = parse_span(key, val)?,

            "selected_account_cell" => self.selected_account_cell = parse_cell(key, val)?,
            "realized_total_cell" => self.realized_total_cell = parse_range(key, val)?,
            "visible_total_cell" => self.visible_total_cell = parse_range(key, val)?,

            "paint_columns" => self.paint_span = parse_span(key, val)?,
            "highlight_columns" => self.highlight_spans = parse_list(key, val)?,
            "extra_highlight_ranges" => self.extra_highlights = parse_list(key, val)?,

            "project_reference" => self.project_reference = parse_range(key, val)?,
            "account_reference" => self.account_reference = parse_range(key, val)?,

            "cache_ttl" => {
                let secs: u64 = val.trim().parse().map_err(|_| invalid(key, val))?;
                self.cache_ttl = Duration::from_secs(secs);
            }
            "date_format" => self.date_format = val.to_string(),
            "currency_format" => self.currency_format = val.to_string(),

            "accounts_source_id" => self.import_mut(ReferenceKind::Accounts).source_id = val.to_string(),
            "accounts_source_range" => {
                self.import_mut(ReferenceKind::Accounts).source_range = val.to_string()
            }
            "accounts_target" => self.import_mut(ReferenceKind::Accounts).target = parse_cell(key, val)?,
            "projects_source_id" => self.import_mut(ReferenceKind::Projects).source_id = val.to_string(),
            "projects_source_range" => {
                self.import_mut(ReferenceKind::Projects).source_range = val.to_string()
            }
            "projects_target" => self.import_mut(ReferenceKind::Projects).target = parse_cell(key, val)?,

            _ => return Err(invalid(key, val)),
        }
        Ok(())
    }

    fn import_mut(&mut self, kind: ReferenceKind) -> &mut ImportSpec {
        let idx = match self.imports.iter().position(|spec| spec.kind == kind) {
            Some(idx) => idx,
            None => {
                self.imports.push(ImportSpec {
                    kind,
                    source_id: String::new(),
                    source_range: String::new(),
                    target: CellRef::new(1, 1),
                });
                self.imports.len() - 1
            }
        };
        &mut self.imports[idx]
    }

    pub fn first_data_row(&self) -> u32 {
        self.header_row + 1
    }

    pub fn column_of(&self, field: Field) -> u32 {
        match field {
            Field::EntryDate => self.entry_date,
            Field::DueDate => self.due_date,
            Field::CashDate => self.cash_date,
            Field::Account => self.account,
            Field::PaymentMethod => self.payment_method,
            Field::Amount => self.amount,
            Field::SelectedBalance => self.selected_balance,
            Field::GlobalBalance => self.global_balance,
            Field::Status => self.status,
        }
    }

    /// Columns whose edits go through shorthand date normalization.
    pub fn is_date_column(&self, column: u32) -> bool {
        [self.entry_date, self.due_date, self.cash_date].contains(&column)
    }

    pub fn reference_range(&self, kind: ReferenceKind) -> RangeRef {
        match kind {
            ReferenceKind::Projects => self.project_reference,
            ReferenceKind::Accounts => self.account_reference,
        }
    }

    /// Ledger columns hydrated from the given reference table.
    pub fn hydrated_span(&self, kind: ReferenceKind) -> RangeRef {
        match kind {
            ReferenceKind::Projects => self.project_fields,
            ReferenceKind::Accounts => self.account_fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::address::{CellRef, RangeRef};
    use crate::error::BookError;
    use crate::layout::{Field, Layout};
    use crate::lookup::ReferenceKind;

    use anyhow::Result;
    use std::time::Duration;

    #[test]
    fn test_default_layout() {
        let layout = Layout::default();
        assert_eq!(layout.first_data_row(), 5);
        assert_eq!(layout.column_of(Field::Amount), 16);
        assert_eq!(layout.column_of(Field::Status), 19);
        assert!(layout.is_date_column(2));
        assert!(layout.is_date_column(4));
        assert!(!layout.is_date_column(5));
        assert_eq!(format!("{}", layout.project_reference), "AY5:BA");
        assert_eq!(format!("{}", layout.hydrated_span(ReferenceKind::Accounts)), "J:L");
        assert_eq!(layout.paint_span.width(), 23);
    }

    #[test]
    fn test_set_option() -> Result<()> {
        let mut layout = Layout::default();
        layout.set_option("header_row", "6")?;
        layout.set_option("amount_column", "T")?;
        layout.set_option("selected_account_cell", "B2")?;
        layout.set_option("extra_highlight_ranges", "B2182:C2183, C2574")?;
        layout.set_option("cache_ttl", "60")?;
        layout.set_option("projects_source_id", "sheet-id")?;

        assert_eq!(layout.first_data_row(), 7);
        assert_eq!(layout.amount, 20);
        assert_eq!(layout.selected_account_cell, CellRef::new(2, 2));
        assert_eq!(layout.extra_highlights.len(), 2);
        assert_eq!(layout.extra_highlights[1], "C2574".parse::<RangeRef>()?);
        assert_eq!(layout.cache_ttl, Duration::from_secs(60));
        assert_eq!(layout.imports[1].source_id, "sheet-id");
        Ok(())
    }

    #[test]
    fn test_reject_bad_options() {
        let mut layout = Layout::default();
        let err = layout.set_option("amount_column", "P5").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BookError>(),
            Some(BookError::Option { key, .. }) if key == "amount_column"
        ));
        assert!(layout.set_option("header_row", "four").is_err());
        assert!(layout.set_option("selected_account_cell", "Q").is_err());
        assert!(layout.set_option("no_such_option", "1").is_err());
        assert_eq!(layout, Layout::default());
    }

    #[test]
    fn test_from_options() -> Result<()> {
        let layout = Layout::from_options(
            r#"option "ledger_sheet" "Livro"
option "project_columns" "H:J"
"#,
        )?;
        assert_eq!(layout.ledger_sheet, "Livro");
        assert_eq!(layout.project_fields.first_column(), 8);
        assert_eq!(layout.reference_sheet, "CADASTRO");
        Ok(())
    }
}
