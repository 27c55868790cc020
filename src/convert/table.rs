use calamine::{Data, Range};
use chrono::NaiveDateTime;
use thiserror::Error;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Largest grid (rows x columns, counted from A1) a single sheet may expand to.
pub const DEFAULT_MAX_CELLS: usize = 5_000_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("grid of {rows} x {columns} cells exceeds the limit of {limit} cells")]
pub struct GridTooLarge {
    pub rows: usize,
    pub columns: usize,
    pub limit: usize,
}

/// A single grid cell, decoupled from the reading library.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Error(String),
}

impl Cell {
    /// Text form written to the `value` column. Empty cells become `""`.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => f.to_string(),
            Cell::Bool(b) => b.to_string(),
            Cell::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
            Cell::Error(code) => code.clone(),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Int(i) => Cell::Int(*i),
            Data::Float(f) => Cell::Float(*f),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(value) if dt.is_datetime() => Cell::DateTime(value),
                _ => Cell::Float(dt.as_f64()),
            },
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(e) => Cell::Error(e.to_string()),
        }
    }
}

/// A rectangular sheet grid. Row 0 is data like any other row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    width: usize,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Builds a table from possibly ragged rows, padding short rows with empty cells.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();
        Table { width, rows }
    }

    /// Anchors the used range at A1 so positions equal sheet coordinates.
    ///
    /// A single far-away cell expands the grid to its coordinates, so the
    /// anchored size is checked against `max_cells` before anything is allocated.
    pub fn from_range(range: &Range<Data>, max_cells: usize) -> Result<Self, GridTooLarge> {
        let (Some((start_row, start_col)), Some((end_row, end_col))) = (range.start(), range.end())
        else {
            return Ok(Table::default());
        };
        if range.is_empty() {
            return Ok(Table::default());
        }

        let width = end_col as usize + 1;
        let height = end_row as usize + 1;
        match height.checked_mul(width) {
            Some(cells) if cells <= max_cells => {}
            _ => {
                return Err(GridTooLarge {
                    rows: height,
                    columns: width,
                    limit: max_cells,
                })
            }
        }
        let mut rows = vec![vec![Cell::Empty; width]; height];

        for (offset_row, row) in range.rows().enumerate() {
            let target = &mut rows[start_row as usize + offset_row];
            for (offset_col, data) in row.iter().enumerate() {
                target[start_col as usize + offset_col] = Cell::from(data);
            }
        }

        Ok(Table { width, rows })
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.width == 0
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }
}
