#![allow(dead_code)]

use rust_xlsxwriter::Workbook;
use sov_convert::convert::artifact::read_records;
use sov_convert::NormalizedRecord;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

/// A cell to author in a test workbook.
pub enum Value {
    Text(String),
    Number(f64),
    Bool(bool),
    Blank,
}

pub fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

/// Writes an `.xlsx` with one worksheet per entry; sheets with no rows stay empty.
pub fn write_workbook(path: &Path, sheets: &[(&str, Vec<Vec<Value>>)]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }

    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let (r, c) = (r as u32, c as u16);
                match value {
                    Value::Text(s) => {
                        worksheet.write_string(r, c, s.as_str()).unwrap();
                    }
                    Value::Number(n) => {
                        worksheet.write_number(r, c, *n).unwrap();
                    }
                    Value::Bool(b) => {
                        worksheet.write_boolean(r, c, *b).unwrap();
                    }
                    Value::Blank => {}
                }
            }
        }
    }
    workbook.save(path).unwrap();
}

/// A single-sheet workbook holding a `rows` x `cols` grid of text cells.
pub fn write_grid(path: &Path, rows: usize, cols: usize) {
    let grid: Vec<Vec<Value>> = (0..rows)
        .map(|r| {
            (0..cols)
                .map(|c| Value::Text(format!("r{}c{}", r, c)))
                .collect()
        })
        .collect();
    write_workbook(path, &[("Sheet1", grid)]);
}

/// Overwrites one part (e.g. `xl/worksheets/sheet2.xml`) of an existing workbook archive.
pub fn replace_part(path: &Path, part: &str, contents: &str) {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut parts = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        let name = entry.name().to_string();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        parts.push((name, data));
    }
    drop(archive);
    assert!(parts.iter().any(|(name, _)| name == part), "no part {}", part);

    let mut writer = ZipWriter::new(File::create(path).unwrap());
    for (name, data) in parts {
        let options: FileOptions<'_, ()> = FileOptions::default();
        let data = if name == part {
            contents.as_bytes().to_vec()
        } else {
            data
        };
        writer.start_file(name, options).unwrap();
        writer.write_all(&data).unwrap();
    }
    writer.finish().unwrap();
}

pub fn artifacts(output_dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = fs::read_dir(output_dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().map(|e| e == "parquet").unwrap_or(false))
        .collect();
    paths.sort();
    paths
}

/// Every record across every artifact, sorted for stable comparison.
pub fn read_output(output_dir: &Path) -> Vec<NormalizedRecord> {
    let mut records: Vec<NormalizedRecord> = artifacts(output_dir)
        .iter()
        .flat_map(|path| read_records(path).unwrap())
        .collect();
    records.sort_by(|a, b| {
        (&a.source_path, &a.sheet, a.row, a.column).cmp(&(
            &b.source_path,
            &b.sheet,
            b.row,
            b.column,
        ))
    });
    records
}

/// Builds the directory skeleton `dirs` (relative paths) under `root`.
pub fn make_dirs(root: &Path, dirs: &[&str]) {
    for dir in dirs {
        fs::create_dir_all(root.join(dir)).unwrap();
    }
}
