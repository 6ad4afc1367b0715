use crate::address::{Area, CellRef};
use crate::paint::Color;
use crate::sort::{self, SortKey};

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};

/// Primitive cell content as handed over by the spreadsheet host.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Date(NaiveDateTime),
}

impl Value {
    /// Blank in the host's sense: no content or an empty string.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Spreadsheet truthiness, `0` and `""` count as false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Empty => false,
            Value::Number(n) => *n != 0f64 && !n.is_nan(),
            Value::Text(s) => !s.is_empty(),
            Value::Date(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            Value::Empty => String::new(),
            Value::Number(n) => n.to_string(),
            Value::Text(s) => s.clone(),
            Value::Date(d) => d.format("%d/%m/%Y").to_string(),
        }
    }

    /// Numeric sort weight; dates count as day serials since 1899-12-30.
    pub fn serial(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Date(d) => {
                let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
                Some(d.signed_duration_since(epoch).num_seconds() as f64 / 86_400f64)
            }
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(d: NaiveDateTime) -> Self {
        Value::Date(d)
    }
}

static EMPTY: Value = Value::Empty;

/// In-memory stand-in for one host sheet. Rows and columns are 1-based.
#[derive(Clone, Debug, Default)]
pub struct Sheet {
    name: String,
    cells: Vec<Vec<Value>>,
    backgrounds: HashMap<(u32, u32), Color>,
    formats: HashMap<(u32, u32), String>,
    merges: Vec<Area>,
    hidden: BTreeSet<u32>,
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Build a sheet from a grid whose first row lands on row 1.
    pub fn from_rows(name: &str, rows: Vec<Vec<Value>>) -> Self {
        let mut sheet = Sheet::new(name);
        sheet.set_values(1, 1, &rows);
        sheet
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last row holding any non-blank value, 0 for an empty sheet.
    pub fn last_row(&self) -> u32 {
        self.cells
            .iter()
            .rposition(|row| row.iter().any(|v| !v.is_empty()))
            .map_or(0, |idx| idx as u32 + 1)
    }

    pub fn last_column(&self) -> u32 {
        self.cells
            .iter()
            .filter_map(|row| row.iter().rposition(|v| !v.is_empty()))
            .max()
            .map_or(0, |idx| idx as u32 + 1)
    }

    pub fn get(&self, row: u32, column: u32) -> &Value {
        if row == 0 || column == 0 {
            return &EMPTY;
        }
        self.cells
            .get(row as usize - 1)
            .and_then(|r| r.get(column as usize - 1))
            .unwrap_or(&EMPTY)
    }

    pub fn set(&mut self, row: u32, column: u32, value: Value) {
        if row == 0 || column == 0 {
            return;
        }
        let (r, c) = (row as usize - 1, column as usize - 1);
        if self.cells.len() <= r {
            self.cells.resize_with(r + 1, Vec::new);
        }
        let cells = &mut self.cells[r];
        if cells.len() <= c {
            cells.resize(c + 1, Value::Empty);
        }
        cells[c] = value;
    }

    pub fn clear(&mut self, row: u32, column: u32) {
        self.set(row, column, Value::Empty);
    }

    pub fn values(&self, area: Area) -> Vec<Vec<Value>> {
        (0..area.rows)
            .map(|r| {
                (0..area.columns)
                    .map(|c| self.get(area.row + r, area.column + c).clone())
                    .collect()
            })
            .collect()
    }

    pub fn set_values(&mut self, row: u32, column: u32, values: &[Vec<Value>]) {
        for (r, line) in values.iter().enumerate() {
            for (c, value) in line.iter().enumerate() {
                self.set(row + r as u32, column + c as u32, value.clone());
            }
        }
    }

    pub fn background(&self, row: u32, column: u32) -> Option<Color> {
        self.backgrounds.get(&(row, column)).copied()
    }

    /// Paint every cell of `area`, `None` clears the background.
    pub fn set_background(&mut self, area: Area, color: Option<Color>) {
        for cell in area.cells() {
            match color {
                Some(color) => self.backgrounds.insert(cell, color),
                None => self.backgrounds.remove(&cell),
            };
        }
    }

    /// Clear backgrounds of whole rows from `row` downwards.
    pub fn clear_backgrounds_from(&mut self, row: u32) {
        self.backgrounds.retain(|&(r, _), _| r < row);
    }

    pub fn number_format(&self, row: u32, column: u32) -> Option<&str> {
        self.formats.get(&(row, column)).map(|s| s.as_str())
    }

    pub fn set_number_format(&mut self, area: Area, format: &str) {
        for cell in area.cells() {
            self.formats.insert(cell, format.to_string());
        }
    }

    pub fn is_merged(&self, area: Area) -> bool {
        self.merges.iter().any(|m| m.contains(area.row, area.column))
    }

    pub fn merge(&mut self, area: Area) {
        if !self.merges.contains(&area) {
            self.merges.push(area);
        }
    }

    pub fn hide_row(&mut self, row: u32) {
        self.hidden.insert(row);
    }

    /// Hidden by the host, e.g. by an active filter.
    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.hidden.contains(&row)
    }

    /// Stable composite-key sort of the rows of `area`. Backgrounds and
    /// number formats inside the area travel with their rows.
    pub fn sort(&mut self, area: Area, keys: &[SortKey]) {
        if area.is_empty() {
            return;
        }
        let rows = self.values(area);
        let order = sort::order(&rows, area.column, keys);

        let mut moved_backgrounds = HashMap::new();
        let mut moved_formats = HashMap::new();
        for (target, &source) in order.iter().enumerate() {
            let (from, to) = (area.row + source as u32, area.row + target as u32);
            for column in area.column..=area.right() {
                if let Some(color) = self.backgrounds.get(&(from, column)) {
                    moved_backgrounds.insert((to, column), *color);
                }
                if let Some(fmt) = self.formats.get(&(from, column)) {
                    moved_formats.insert((to, column), fmt.clone());
                }
            }
        }
        self.backgrounds.retain(|&(r, c), _| !area.contains(r, c));
        self.formats.retain(|&(r, c), _| !area.contains(r, c));
        self.backgrounds.extend(moved_backgrounds);
        self.formats.extend(moved_formats);

        let sorted: Vec<Vec<Value>> = order.iter().map(|&idx| rows[idx].clone()).collect();
        self.set_values(area.row, area.column, &sorted);
    }
}

/// Named sheets, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct Workbook {
    sheets: IndexMap<String, Sheet>,
    active: Option<(String, CellRef)>,
}

impl Workbook {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn insert(&mut self, sheet: Sheet) {
        self.sheets.insert(sheet.name().to_string(), sheet);
    }

    pub fn with_sheet(mut self, sheet: Sheet) -> Self {
        self.insert(sheet);
        self
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.get(name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.get_mut(name)
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(|k| k.as_str())
    }

    /// Move the host's focus to `cell` on `sheet`.
    pub fn activate(&mut self, sheet: &str, cell: CellRef) {
        self.active = Some((sheet.to_string(), cell));
    }

    pub fn active(&self) -> Option<(&str, CellRef)> {
        self.active.as_ref().map(|(sheet, cell)| (sheet.as_str(), *cell))
    }
}

#[cfg(test)]
mod tests {
    use crate::address::{Area, CellRef};
    use crate::paint::Color;
    use crate::sheet::{Sheet, Value, Workbook};
    use crate::sort::SortKey;
    use chrono::NaiveDate;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Empty.is_truthy());
        assert!(!Value::Number(0f64).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from(" ").is_truthy());
        assert!(Value::Number(-3f64).is_truthy());
        assert!(Value::from("").is_empty());
        assert!(!Value::Number(0f64).is_empty());
    }

    #[test]
    fn test_serial_dates() {
        let d = NaiveDate::from_ymd_opt(1900, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(Value::Date(d).serial(), Some(2.5f64));
        assert_eq!(Value::from("x").serial(), None);
    }

    #[test]
    fn test_grid_bounds() {
        let mut sheet = Sheet::new("LD");
        assert_eq!(sheet.last_row(), 0);
        sheet.set(3, 5, Value::from("x"));
        sheet.set(7, 2, Value::from(""));
        assert_eq!(sheet.last_row(), 3);
        assert_eq!(sheet.last_column(), 5);
        assert_eq!(sheet.get(3, 5), &Value::from("x"));
        assert_eq!(sheet.get(30, 50), &Value::Empty);
    }

    #[test]
    fn test_backgrounds_and_merges() {
        let mut sheet = Sheet::new("LD");
        sheet.set_background(Area::new(1, 1, 2, 2), Some(Color::NEGATIVE));
        assert_eq!(sheet.background(2, 2), Some(Color::NEGATIVE));
        sheet.clear_backgrounds_from(2);
        assert_eq!(sheet.background(1, 2), Some(Color::NEGATIVE));
        assert_eq!(sheet.background(2, 2), None);

        let summary = Area::new(1, 15, 1, 2);
        assert!(!sheet.is_merged(summary));
        sheet.merge(summary);
        sheet.merge(summary);
        assert!(sheet.is_merged(summary));
    }

    #[test]
    fn test_sort_moves_formatting() {
        let mut sheet = Sheet::from_rows(
            "LD",
            vec![
                vec![Value::from("b"), Value::Number(2f64)],
                vec![Value::from("a"), Value::Number(1f64)],
            ],
        );
        sheet.set_background(Area::cell(1, 2), Some(Color::BALANCE));
        sheet.sort(
            Area::new(1, 1, 2, 2),
            &[SortKey {
                column: 1,
                ascending: true,
            }],
        );
        assert_eq!(sheet.get(1, 1), &Value::from("a"));
        assert_eq!(sheet.background(2, 2), Some(Color::BALANCE));
        assert_eq!(sheet.background(1, 2), None);
    }

    #[test]
    fn test_workbook_lookup() {
        let book = Workbook::new()
            .with_sheet(Sheet::new("LD"))
            .with_sheet(Sheet::new("CADASTRO"));
        assert!(book.sheet("LD").is_some());
        assert!(book.sheet("ld").is_none());
        assert_eq!(book.sheet_names().collect::<Vec<_>>(), vec!["LD", "CADASTRO"]);
    }
}
