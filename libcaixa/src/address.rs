use std::fmt;
use std::str::FromStr;

use crate::parser::Rule;
use anyhow::{anyhow, Result};
use pest::iterators::Pair;

/// 1-based column index of a column name, `A` is 1, `AA` is 27.
pub fn column_index(name: &str) -> Result<u32> {
    if name.is_empty() || name.len() > 3 {
        return Err(anyhow!(format!("invalid column name: '{}'", name)));
    }
    name.chars().try_fold(0u32, |acc, c| {
        if !c.is_ascii_alphabetic() {
            return Err(anyhow!(format!("invalid column name: '{}'", name)));
        }
        Ok(acc * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1))
    })
}

pub fn column_name(mut index: u32) -> String {
    let mut name = Vec::new();
    while index > 0 {
        let rem = (index - 1) % 26;
        name.push((b'A' + rem as u8) as char);
        index = (index - 1) / 26;
    }
    name.iter().rev().collect()
}

/// A cell or a whole column when `row` is absent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRef {
    pub column: u32,
    pub row: Option<u32>,
}

impl CellRef {
    pub fn new(column: u32, row: u32) -> Self {
        Self {
            column,
            row: Some(row),
        }
    }

    pub fn column(column: u32) -> Self {
        Self { column, row: None }
    }

    pub fn parse(token: Pair<'_, Rule>) -> Result<CellRef> {
        let whole = token.as_str();
        let mut pairs = token.into_inner();
        let column = column_index(
            pairs
                .next()
                .ok_or(anyhow!(format!("invalid column in '{}'", whole)))?
                .as_str(),
        )?;
        let row = match pairs.next() {
            Some(row) => Some(row.as_str().parse::<u32>()?),
            None => None,
        };
        Ok(CellRef { column, row })
    }

    pub fn is(&self, row: u32, column: u32) -> bool {
        self.column == column && self.row == Some(row)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(f, "{}{}", column_name(self.column), row),
            None => write!(f, "{}", column_name(self.column)),
        }
    }
}

/// An A1 range, possibly open-ended downwards (`AY5:BA`) or column-only (`A:W`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeRef {
    pub start: CellRef,
    pub end: Option<CellRef>,
}

impl RangeRef {
    pub fn parse(token: Pair<'_, Rule>) -> Result<RangeRef> {
        let whole = token.as_str();
        let mut cells = token.into_inner();
        let start = CellRef::parse(
            cells
                .next()
                .ok_or(anyhow!(format!("invalid range: '{}'", whole)))?,
        )?;
        let end = match cells.next() {
            Some(cell) => Some(CellRef::parse(cell)?),
            None => None,
        };
        Ok(RangeRef { start, end })
    }

    pub fn columns(first: u32, last: u32) -> Self {
        Self {
            start: CellRef::column(first),
            end: Some(CellRef::column(last)),
        }
    }

    pub fn first_column(&self) -> u32 {
        self.end
            .map_or(self.start.column, |end| end.column.min(self.start.column))
    }

    pub fn last_column(&self) -> u32 {
        self.end
            .map_or(self.start.column, |end| end.column.max(self.start.column))
    }

    pub fn width(&self) -> u32 {
        self.last_column() - self.first_column() + 1
    }

    pub fn contains_column(&self, column: u32) -> bool {
        (self.first_column()..=self.last_column()).contains(&column)
    }

    pub fn is_column_only(&self) -> bool {
        self.start.row.is_none() && self.end.map_or(true, |end| end.row.is_none())
    }

    /// Resolve into a concrete area, open row bounds end at `last_row`.
    /// `None` when the range holds no rows.
    pub fn area(&self, last_row: u32) -> Option<Area> {
        let top = self.start.row.unwrap_or(1);
        let bottom = match (self.end, self.start.row) {
            (Some(CellRef { row: Some(row), .. }), _) => row,
            (None, Some(row)) => row,
            _ if last_row < top => return None,
            _ => last_row,
        };
        let (top, bottom) = (top.min(bottom), top.max(bottom));
        Some(Area {
            row: top,
            column: self.first_column(),
            rows: bottom - top + 1,
            columns: self.width(),
        })
    }

    /// The columns of this range restricted to `rows` rows starting at `row`.
    pub fn band(&self, row: u32, rows: u32) -> Area {
        Area {
            row,
            column: self.first_column(),
            rows,
            columns: self.width(),
        }
    }
}

impl fmt::Display for RangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}:{}", self.start, end),
            None => write!(f, "{}", self.start),
        }
    }
}

impl FromStr for RangeRef {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parser::parse_a1(s)
    }
}

impl TryFrom<&str> for CellRef {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let range: RangeRef = s.parse()?;
        if range.end.is_some() {
            return Err(anyhow!(format!("expected a single cell, got range '{}'", s)));
        }
        Ok(range.start)
    }
}

/// A rectangular block of cells, 1-based, in `getRange(row, column, rows, columns)` form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Area {
    pub row: u32,
    pub column: u32,
    pub rows: u32,
    pub columns: u32,
}

impl Area {
    pub fn new(row: u32, column: u32, rows: u32, columns: u32) -> Self {
        Self {
            row,
            column,
            rows,
            columns,
        }
    }

    pub fn cell(row: u32, column: u32) -> Self {
        Self::new(row, column, 1, 1)
    }

    pub fn bottom(&self) -> u32 {
        self.row + self.rows - 1
    }

    pub fn right(&self) -> u32 {
        self.column + self.columns - 1
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.columns == 0
    }

    pub fn contains(&self, row: u32, column: u32) -> bool {
        !self.is_empty()
            && (self.row..=self.bottom()).contains(&row)
            && (self.column..=self.right()).contains(&column)
    }

    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (0..self.rows).flat_map(move |r| (0..self.columns).map(move |c| (self.row + r, self.column + c)))
    }
}
