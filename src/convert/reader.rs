use crate::convert::table::Table;
use crate::error::ReadError;
use calamine::{open_workbook, open_workbook_auto_from_rs, Reader, Sheets, Xls, Xlsb, Xlsx};
use std::any::Any;
use std::fs::{self, File};
use std::io::{BufReader, Cursor};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

/// Reading strategy, chosen from the file extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetReader {
    Xlsx,
    Xlsm,
    Xlsb,
    Xls,
    /// Unknown extension: the format is sniffed from the file content.
    Detect,
}

impl SheetReader {
    /// Total over any input; comparison ignores case and a leading dot.
    pub fn for_extension(extension: &str) -> Self {
        match extension.trim_start_matches('.').to_lowercase().as_str() {
            "xlsx" => SheetReader::Xlsx,
            "xlsm" => SheetReader::Xlsm,
            "xlsb" => SheetReader::Xlsb,
            "xls" => SheetReader::Xls,
            _ => SheetReader::Detect,
        }
    }

    pub fn open(self, path: &Path) -> Result<Workbook, ReadError> {
        let open_err = |reason: String| ReadError::Open {
            path: path.to_path_buf(),
            reason,
        };

        match self {
            SheetReader::Xlsx | SheetReader::Xlsm => open_workbook::<Xlsx<_>, _>(path)
                .map(Workbook::Xlsx)
                .map_err(|e| open_err(e.to_string())),
            SheetReader::Xlsb => open_workbook::<Xlsb<_>, _>(path)
                .map(Workbook::Xlsb)
                .map_err(|e| open_err(e.to_string())),
            SheetReader::Xls => open_workbook::<Xls<_>, _>(path)
                .map(Workbook::Xls)
                .map_err(|e| open_err(e.to_string())),
            SheetReader::Detect => {
                let bytes = fs::read(path).map_err(|e| open_err(e.to_string()))?;
                open_workbook_auto_from_rs(Cursor::new(bytes))
                    .map(Workbook::Detected)
                    .map_err(|e| open_err(e.to_string()))
            }
        }
    }
}

pub fn select_reader(extension: &str) -> SheetReader {
    SheetReader::for_extension(extension)
}

/// An open workbook of any supported format.
pub enum Workbook {
    Xlsx(Xlsx<BufReader<File>>),
    Xlsb(Xlsb<BufReader<File>>),
    Xls(Xls<BufReader<File>>),
    Detected(Sheets<Cursor<Vec<u8>>>),
}

impl Workbook {
    pub fn sheet_names(&self) -> Vec<String> {
        match self {
            Workbook::Xlsx(wb) => wb.sheet_names(),
            Workbook::Xlsb(wb) => wb.sheet_names(),
            Workbook::Xls(wb) => wb.sheet_names(),
            Workbook::Detected(wb) => wb.sheet_names(),
        }
    }

    /// Reads one sheet into a [`Table`] of at most `max_cells` cells.
    ///
    /// A panic inside the reading library on malformed sheet XML is turned
    /// into a sheet error, so it costs only this sheet.
    pub fn read_sheet(&mut self, name: &str, max_cells: usize) -> Result<Table, ReadError> {
        let sheet_err = |reason: String| ReadError::Sheet {
            sheet: name.to_string(),
            reason,
        };

        let range = panic::catch_unwind(AssertUnwindSafe(|| match self {
            Workbook::Xlsx(wb) => wb.worksheet_range(name).map_err(|e| e.to_string()),
            Workbook::Xlsb(wb) => wb.worksheet_range(name).map_err(|e| e.to_string()),
            Workbook::Xls(wb) => wb.worksheet_range(name).map_err(|e| e.to_string()),
            Workbook::Detected(wb) => wb.worksheet_range(name).map_err(|e| e.to_string()),
        }))
        .map_err(|payload| sheet_err(format!("reader panicked: {}", panic_message(&*payload))))?
        .map_err(sheet_err)?;

        Table::from_range(&range, max_cells).map_err(|e| sheet_err(e.to_string()))
    }

    /// Sheets in workbook order, each read only when the iterator reaches it.
    pub fn read_all_sheets(&mut self, max_cells: usize) -> SheetIter<'_> {
        let names = self.sheet_names();
        SheetIter {
            workbook: self,
            names: names.into_iter(),
            max_cells,
        }
    }
}

pub struct SheetIter<'a> {
    workbook: &'a mut Workbook,
    names: std::vec::IntoIter<String>,
    max_cells: usize,
}

impl Iterator for SheetIter<'_> {
    type Item = (String, Result<Table, ReadError>);

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.names.next()?;
        let table = self.workbook.read_sheet(&name, self.max_cells);
        Some((name, table))
    }
}

/// Text of a caught panic payload (`&str` or `String`, as `panic!` produces).
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
