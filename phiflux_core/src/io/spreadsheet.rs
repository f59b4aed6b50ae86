//! Reading and writing the workbooks used for samples, costs and results
//!
//! Workbooks are read with calamine and written with rust_xlsxwriter. Every table used by the
//! analyses has the same shape: an index column of reaction ids followed by numeric columns.
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use indexmap::IndexMap;
use log::warn;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use thiserror::Error;

/// Maximum number of characters Excel allows in a sheet name
const MAX_SHEET_NAME_LENGTH: usize = 31;
/// Maximum number of columns in a worksheet
const MAX_COLUMNS: usize = 16_384;

/// A numeric table indexed by the values in its first column
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexedTable {
    /// Header of the index column
    pub index_name: String,
    /// Headers of the value columns
    pub columns: Vec<String>,
    /// Values of each row, in column order. Missing or non-numeric cells are None
    pub rows: IndexMap<String, Vec<Option<f64>>>,
}

impl IndexedTable {
    pub fn new(index_name: &str, columns: Vec<String>) -> Self {
        IndexedTable {
            index_name: index_name.to_string(),
            columns,
            rows: IndexMap::new(),
        }
    }

    /// Add or replace a row, padding or truncating `values` to the number of columns
    pub fn insert_row(&mut self, id: &str, mut values: Vec<Option<f64>>) {
        values.resize(self.columns.len(), None);
        self.rows.insert(id.to_string(), values);
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// The non-missing values of a column keyed by row id, None if there is no such column
    pub fn column(&self, column: &str) -> Option<IndexMap<String, f64>> {
        let idx = self.column_index(column)?;
        Some(
            self.rows
                .iter()
                .filter_map(|(id, values)| values[idx].map(|v| (id.clone(), v)))
                .collect(),
        )
    }

    pub fn cell(&self, row: &str, column: &str) -> Option<f64> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx).copied().flatten()
    }
}

// region Reading
fn cell_to_f64(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn read_rows<P: AsRef<Path>>(path: P, sheet: &str) -> Result<Vec<Vec<Data>>, SpreadsheetError> {
    let mut workbook = open_workbook_auto(&path)?;
    if !workbook.sheet_names().iter().any(|name| name == sheet) {
        return Err(SpreadsheetError::MissingSheet {
            sheet: sheet.to_string(),
            path: path.as_ref().display().to_string(),
        });
    }
    let range = workbook.worksheet_range(sheet)?;
    Ok(range.rows().map(|row| row.to_vec()).collect())
}

/// Read a sheet whose first row is a header, and whose first column holds the row ids
///
/// Rows with an empty id are skipped. A repeated id replaces the earlier row.
pub fn read_indexed_sheet<P: AsRef<Path>>(
    path: P,
    sheet: &str,
) -> Result<IndexedTable, SpreadsheetError> {
    let rows = read_rows(path, sheet)?;
    let mut rows = rows.into_iter();
    let header = rows
        .next()
        .ok_or_else(|| SpreadsheetError::EmptySheet(sheet.to_string()))?;
    let index_name = header.first().map(cell_to_string).unwrap_or_default();
    let columns: Vec<String> = header.iter().skip(1).map(cell_to_string).collect();
    let mut table = IndexedTable::new(&index_name, columns);
    for row in rows {
        let Some(id) = row.first().map(cell_to_string) else {
            continue;
        };
        if id.is_empty() {
            continue;
        }
        let values = row.iter().skip(1).map(cell_to_f64).collect();
        if table.rows.contains_key(&id) {
            warn!("Sheet {sheet} repeats row {id}, keeping the last one");
        }
        table.insert_row(&id, values);
    }
    Ok(table)
}

/// Read a two column table of reaction id to value, skipping the header row
///
/// With no sheet name the first sheet of the workbook is used. Rows whose value is missing
/// or not a number are skipped.
pub fn read_value_table<P: AsRef<Path>>(
    path: P,
    sheet: Option<&str>,
) -> Result<IndexMap<String, f64>, SpreadsheetError> {
    let sheet = match sheet {
        Some(sheet) => sheet.to_string(),
        None => open_workbook_auto(&path)?
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| SpreadsheetError::EmptySheet(path.as_ref().display().to_string()))?,
    };
    let mut values = IndexMap::new();
    for row in read_rows(&path, &sheet)?.into_iter().skip(1) {
        let (Some(id), Some(value)) = (row.first(), row.get(1)) else {
            continue;
        };
        let id = cell_to_string(id);
        match cell_to_f64(value) {
            Some(v) if !id.is_empty() => {
                values.insert(id, v);
            }
            _ => warn!("Skipping row {id} of sheet {sheet}, value {value} is not a number"),
        }
    }
    Ok(values)
}
// endregion Reading

// region Writing
/// Make a string usable as a worksheet name
///
/// Excel forbids the characters `[ ] : * ? / \` and limits names to 31 characters.
pub fn sheet_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .take(MAX_SHEET_NAME_LENGTH)
        .collect();
    if cleaned.trim().is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    }
}

pub(crate) fn header_format() -> Format {
    Format::new().set_bold()
}

/// Add a new worksheet with the given header row
pub fn add_sheet<'a>(
    workbook: &'a mut Workbook,
    name: &str,
    header: &[&str],
) -> Result<&'a mut Worksheet, SpreadsheetError> {
    if header.len() > MAX_COLUMNS {
        return Err(SpreadsheetError::TooManyColumns(header.len()));
    }
    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name(name))?;
    let format = header_format();
    for (col, title) in header.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &format)?;
    }
    Ok(sheet)
}

/// Write a float, using text for the values a spreadsheet can't store as a number
pub fn write_float(
    sheet: &mut Worksheet,
    row: usize,
    col: usize,
    value: f64,
) -> Result<(), SpreadsheetError> {
    let (row, col) = (row as u32, col as u16);
    if value.is_finite() {
        sheet.write_number(row, col, value)?;
    } else if value.is_nan() {
        sheet.write_string(row, col, "nan")?;
    } else if value > 0. {
        sheet.write_string(row, col, "inf")?;
    } else {
        sheet.write_string(row, col, "-inf")?;
    }
    Ok(())
}

pub fn write_text(
    sheet: &mut Worksheet,
    row: usize,
    col: usize,
    value: &str,
) -> Result<(), SpreadsheetError> {
    sheet.write_string(row as u32, col as u16, value)?;
    Ok(())
}

/// Write an indexed table to a new worksheet
pub fn write_indexed_sheet(
    workbook: &mut Workbook,
    name: &str,
    table: &IndexedTable,
) -> Result<(), SpreadsheetError> {
    let header: Vec<&str> = std::iter::once(table.index_name.as_str())
        .chain(table.columns.iter().map(String::as_str))
        .collect();
    let sheet = add_sheet(workbook, name, &header)?;
    for (row, (id, values)) in table.rows.iter().enumerate() {
        write_text(sheet, row + 1, 0, id)?;
        for (col, value) in values.iter().enumerate() {
            if let Some(value) = value {
                write_float(sheet, row + 1, col + 1, *value)?;
            }
        }
    }
    Ok(())
}

/// Write a two column table of id to value to a new worksheet
pub fn write_value_sheet<'a, I>(
    workbook: &mut Workbook,
    name: &str,
    header: [&str; 2],
    values: I,
) -> Result<(), SpreadsheetError>
where
    I: IntoIterator<Item = (&'a String, &'a f64)>,
{
    let sheet = add_sheet(workbook, name, &header)?;
    for (row, (id, value)) in values.into_iter().enumerate() {
        write_text(sheet, row + 1, 0, id)?;
        write_float(sheet, row + 1, 1, *value)?;
    }
    Ok(())
}
// endregion Writing

#[derive(Debug, Error)]
pub enum SpreadsheetError {
    #[error("Unable to read workbook: {0}")]
    Read(#[from] calamine::Error),
    #[error("Unable to write workbook: {0}")]
    Write(#[from] XlsxError),
    #[error("Workbook {path} has no sheet named {sheet}")]
    MissingSheet { sheet: String, path: String },
    #[error("Sheet {0} is empty")]
    EmptySheet(String),
    #[error("Table has {0} columns, more than a worksheet can hold")]
    TooManyColumns(usize),
}
