use crate::convert::table::Table;
use crate::model::NormalizedRecord;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, PartialEq)]
pub enum Normalized {
    /// The grid had no cells; the caller warns and moves on.
    SkippedEmpty,
    Records(Vec<NormalizedRecord>),
}

/// Unpivots one sheet into long format, one record per cell in row-major order.
///
/// No header row is detected, so row 0 is emitted like any other row and a
/// grid of R rows by C columns always yields exactly R×C records.
pub fn normalize(sheet_name: &str, grid: &Table, source_path: &Path) -> Normalized {
    if grid.is_empty() {
        return Normalized::SkippedEmpty;
    }

    let source_name: Arc<str> = source_path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default()
        .into();
    let source_path: Arc<str> = source_path.to_string_lossy().into();
    let sheet: Arc<str> = sheet_name.into();

    let mut records = Vec::with_capacity(grid.height() * grid.width());
    for (row, cells) in grid.rows().enumerate() {
        for (column, cell) in cells.iter().enumerate() {
            records.push(NormalizedRecord {
                source_path: Arc::clone(&source_path),
                source_name: Arc::clone(&source_name),
                sheet: Arc::clone(&sheet),
                row: row as u64,
                column: column as u64,
                value: cell.to_text(),
            });
        }
    }

    Normalized::Records(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::table::Cell;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn test_three_by_three_grid() {
        let grid = Table::from_rows(vec![
            vec![text("id"), text("name"), text("tiv")],
            vec![Cell::Int(1), text("Warehouse"), Cell::Float(1250000.5)],
            vec![Cell::Int(2), Cell::Empty, Cell::Bool(false)],
        ]);

        let Normalized::Records(records) =
            normalize("Sheet1", &grid, Path::new("/data/SOV/q1/book.xlsx"))
        else {
            panic!("expected records");
        };

        assert_eq!(records.len(), 9);
        let positions: Vec<(u64, u64)> = records.iter().map(|r| (r.row, r.column)).collect();
        assert_eq!(
            positions,
            vec![
                (0, 0),
                (0, 1),
                (0, 2),
                (1, 0),
                (1, 1),
                (1, 2),
                (2, 0),
                (2, 1),
                (2, 2)
            ]
        );

        assert_eq!(records[0].value, "id");
        assert_eq!(records[5].value, "1250000.5");
        assert_eq!(records[7].value, "");
        assert_eq!(records[8].value, "false");
        assert!(records.iter().all(|r| &*r.source_name == "book.xlsx"));
        assert!(records
            .iter()
            .all(|r| &*r.source_path == "/data/SOV/q1/book.xlsx"));
    }

    #[test]
    fn test_empty_grid_is_skipped() {
        let grid = Table::from_rows(Vec::new());
        assert_eq!(
            normalize("Empty", &grid, Path::new("/a/b.xlsx")),
            Normalized::SkippedEmpty
        );
    }

    #[test]
    fn test_sheet_name_kept_literally() {
        let grid = Table::from_rows(vec![vec![Cell::Int(7)]]);
        let Normalized::Records(records) =
            normalize("Q1 / Loc's & TIV", &grid, Path::new("/a/b.xlsx"))
        else {
            panic!("expected records");
        };
        assert_eq!(&*records[0].sheet, "Q1 / Loc's & TIV");
    }

    #[test]
    fn test_all_empty_row_still_emitted() {
        let grid = Table::from_rows(vec![
            vec![Cell::Empty, Cell::Empty],
            vec![Cell::Int(1), Cell::Int(2)],
        ]);
        let Normalized::Records(records) = normalize("S", &grid, Path::new("/a/b.xlsx")) else {
            panic!("expected records");
        };
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].value, "");
    }
}
