use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Date32Type, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Cell, Coercions, SalesDataset, SalesRecord};
use crate::config::ColumnNames;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum LoadError {
    #[error("missing required column '{0}'")]
    MissingColumn(String),
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
    #[error("expected a top-level JSON array of records")]
    NotAnArray,
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the sales dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.tsv` – header row naming the columns (recommended)
/// * `.json`         – `[{ "category": ..., "revenue": ..., ... }, ...]`
/// * `.parquet`      – flat columns, strings / numbers / dates
///
/// Unparseable dates, revenue and quantities become null; the count is logged.
pub fn load_file(path: &Path, columns: &ColumnNames) -> Result<SalesDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let (records, coercions) = match ext.as_str() {
        "csv" | "txt" => {
            let file = std::fs::File::open(path).context("opening CSV")?;
            read_delimited(file, b',', columns)?
        }
        "tsv" | "tab" => {
            let file = std::fs::File::open(path).context("opening TSV")?;
            read_delimited(file, b'\t', columns)?
        }
        "json" => {
            let text = std::fs::read_to_string(path).context("reading JSON file")?;
            read_json(&text, columns)?
        }
        "parquet" | "pq" => read_parquet(path, columns)?,
        other => return Err(LoadError::UnsupportedExtension(other.to_string()).into()),
    };

    if coercions.total() > 0 {
        log::warn!(
            "{}: {} unparseable cells set to null (dates {}, revenue {}, qty {})",
            path.display(),
            coercions.total(),
            coercions.dates,
            coercions.revenue,
            coercions.qty
        );
    }

    Ok(SalesDataset::from_records(records))
}

/// Parse a delimited stream into records.
pub fn read_delimited<R: Read>(
    input: R,
    delimiter: u8,
    columns: &ColumnNames,
) -> Result<(Vec<SalesRecord>, Coercions)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut indices = [0usize; 7];
    for (slot, name) in indices.iter_mut().zip(columns.required()) {
        *slot = headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LoadError::MissingColumn(name.to_string()))?;
    }

    let mut coercions = Coercions::default();
    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        let cells: [Cell; 7] =
            std::array::from_fn(|i| Cell::from_text(row.get(indices[i]).unwrap_or("")));
        records.push(SalesRecord::from_cells(cells, &mut coercions));
    }

    Ok((records, coercions))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')` shape.
/// A key absent from one object is null there; absent from all, an error.
pub fn read_json(text: &str, columns: &ColumnNames) -> Result<(Vec<SalesRecord>, Coercions)> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let rows = root.as_array().ok_or(LoadError::NotAnArray)?;

    let required = columns.required();
    if !rows.is_empty() {
        for name in required {
            let seen = rows
                .iter()
                .any(|r| r.as_object().is_some_and(|o| o.contains_key(name)));
            if !seen {
                return Err(LoadError::MissingColumn(name.to_string()).into());
            }
        }
    }

    let mut coercions = Coercions::default();
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        let cells: [Cell; 7] =
            std::array::from_fn(|c| obj.get(required[c]).map_or(Cell::Null, json_to_cell));
        records.push(SalesRecord::from_cells(cells, &mut coercions));
    }

    Ok((records, coercions))
}

fn json_to_cell(val: &JsonValue) -> Cell {
    match val {
        JsonValue::String(s) => Cell::from_text(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Cell::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Cell::Float(f)
            } else {
                Cell::Text(n.to_string())
            }
        }
        JsonValue::Null => Cell::Null,
        other => Cell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet file as written by `df.to_parquet()` or Polars.
fn read_parquet(path: &Path, columns: &ColumnNames) -> Result<(Vec<SalesRecord>, Coercions)> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let schema = builder.schema().clone();
    let positions: HashMap<&str, usize> = columns
        .required()
        .into_iter()
        .map(|name| {
            schema
                .index_of(name)
                .map(|idx| (name, idx))
                .map_err(|_| LoadError::MissingColumn(name.to_string()))
        })
        .collect::<Result<_, _>>()?;

    let reader = builder.build().context("building parquet reader")?;
    let required = columns.required();

    let mut coercions = Coercions::default();
    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let arrays: Vec<&Arc<dyn Array>> = required
            .iter()
            .map(|name| batch.column(positions[name]))
            .collect();

        for row in 0..batch.num_rows() {
            let mut cells: [Cell; 7] = std::array::from_fn(|_| Cell::Null);
            for (cell, array) in cells.iter_mut().zip(&arrays) {
                *cell = arrow_cell(array, row)
                    .with_context(|| format!("Row {row}: failed to read cell"))?;
            }
            records.push(SalesRecord::from_cells(cells, &mut coercions));
        }
    }

    Ok((records, coercions))
}

/// Extract one cell from an Arrow column.
fn arrow_cell(col: &Arc<dyn Array>, row: usize) -> Result<Cell> {
    if col.is_null(row) {
        return Ok(Cell::Null);
    }
    let cell = match col.data_type() {
        DataType::Utf8 => Cell::from_text(col.as_string::<i32>().value(row)),
        DataType::LargeUtf8 => Cell::from_text(col.as_string::<i64>().value(row)),
        DataType::Int32 => Cell::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => Cell::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => Cell::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => Cell::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Date32 => col
            .as_primitive::<Date32Type>()
            .value_as_date(row)
            .map_or(Cell::Null, Cell::Date),
        _ => {
            let formatter = ArrayFormatter::try_new(&**col, &FormatOptions::default())
                .context("formatting parquet value")?;
            Cell::from_text(&formatter.value(row).to_string())
        }
    };
    Ok(cell)
}
