use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type,
    TimeUnit, TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType, UInt32Type, UInt64Type,
};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Article, ArticleTable, Metric};
use crate::error::SchemaError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// File extensions accepted by [`load_file`].
pub const SUPPORTED_EXTENSIONS: [&str; 8] =
    ["xlsx", "xlsm", "xls", "ods", "parquet", "pq", "csv", "json"];

/// Load an article table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xls` / `.ods` – first worksheet, header row first
/// * `.parquet`                – one column per field
/// * `.csv`                    – header row with column names
/// * `.json`                   – `[{ "date": ..., "text": ..., "like": 3, ... }, ...]`
///
/// Every format must provide `date`, `text`, `fulltext` and the nine
/// metric columns; anything else is ignored.
pub fn load_file(path: &Path) -> Result<ArticleTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "ods" => load_spreadsheet(path),
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }?;

    if table.is_empty() {
        return Err(SchemaError::EmptyTable.into());
    }
    log::debug!("parsed {} articles from {}", table.len(), path.display());
    Ok(table)
}

// ---------------------------------------------------------------------------
// Cell – a raw value before schema validation
// ---------------------------------------------------------------------------

/// A loosely typed source cell. Every format is decoded into cells first
/// and then validated against the article schema in one place.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Empty,
}

impl Cell {
    fn text(s: &str) -> Cell {
        if s.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }

    fn date_or_number(serial: f64) -> Cell {
        match serial_to_date(serial) {
            Some(d) => Cell::Date(d),
            None => Cell::Number(serial),
        }
    }
}

// ---------------------------------------------------------------------------
// Schema: column positions, resolved once per source
// ---------------------------------------------------------------------------

/// Positions of the required columns in a source header.
#[derive(Debug, Clone)]
struct ColumnMap {
    date: usize,
    text: usize,
    fulltext: usize,
    metrics: [usize; Metric::COUNT],
}

impl ColumnMap {
    fn from_headers<S: AsRef<str>>(headers: &[S]) -> Result<Self, SchemaError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.as_ref().trim() == name)
                .ok_or_else(|| SchemaError::MissingColumn(name.to_string()))
        };

        let mut found = [None; Metric::COUNT];
        for (idx, header) in headers.iter().enumerate() {
            if let Some(metric) = Metric::from_column(header.as_ref().trim()) {
                found[metric.index()].get_or_insert(idx);
            }
        }
        let mut metrics = [0; Metric::COUNT];
        for metric in Metric::ALL {
            metrics[metric.index()] = found[metric.index()]
                .ok_or_else(|| SchemaError::MissingColumn(metric.column().to_string()))?;
        }

        Ok(ColumnMap {
            date: find("date")?,
            text: find("text")?,
            fulltext: find("fulltext")?,
            metrics,
        })
    }

    /// Whether the column at `idx` holds article text rather than a
    /// metric or the date.
    fn is_text(&self, idx: usize) -> bool {
        idx == self.text || idx == self.fulltext
    }

    /// Validate one row of cells into an [`Article`].
    fn article(&self, row: usize, cells: &[Cell]) -> Result<Article, SchemaError> {
        let cell = |idx: usize| cells.get(idx).unwrap_or(&Cell::Empty);

        let mut metrics = [None; Metric::COUNT];
        for metric in Metric::ALL {
            metrics[metric.index()] = metric_value(cell(self.metrics[metric.index()]), row, metric)?;
        }

        Ok(Article {
            date: date_value(cell(self.date), row)?,
            text: text_value(cell(self.text)),
            fulltext: text_value(cell(self.fulltext)),
            metrics,
        })
    }
}

fn metric_value(cell: &Cell, row: usize, metric: Metric) -> Result<Option<f64>, SchemaError> {
    let non_numeric = |value: String| SchemaError::NonNumeric {
        row,
        column: metric.column().to_string(),
        value,
    };
    match cell {
        Cell::Number(v) if v.is_nan() => Ok(None),
        Cell::Number(v) => Ok(Some(*v)),
        Cell::Empty => Ok(None),
        Cell::Text(s) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_nan() => Ok(None),
            Ok(v) => Ok(Some(v)),
            Err(_) => Err(non_numeric(s.clone())),
        },
        Cell::Date(d) => Err(non_numeric(d.to_string())),
    }
}

fn date_value(cell: &Cell, row: usize) -> Result<NaiveDate, SchemaError> {
    let parsed = match cell {
        Cell::Date(d) => Some(*d),
        Cell::Text(s) => parse_date(s),
        Cell::Number(n) => number_to_date(*n),
        Cell::Empty => None,
    };
    parsed.ok_or_else(|| SchemaError::InvalidDate {
        row,
        value: match cell {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
            _ => String::new(),
        },
    })
}

fn text_value(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Text(s) => Some(s.clone()),
        Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
        Cell::Number(n) => Some(n.to_string()),
        Cell::Date(d) => Some(d.to_string()),
        Cell::Empty => None,
    }
}

// ---------------------------------------------------------------------------
// Date coercion
// ---------------------------------------------------------------------------

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d.%m.%Y", "%Y/%m/%d"];

/// Parse a textual date or date-time, keeping only the calendar date.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Some(d) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    {
        return Some(d);
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt.date());
    }
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z"))
        .ok()
        .map(|dt| dt.date_naive())
}

/// Spreadsheet serial day numbers (1900 date system, epoch 1899-12-30).
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.floor() as u64))
}

/// A numeric date is either a spreadsheet serial or, when very large,
/// milliseconds since the Unix epoch (as written by `DataFrame.to_json`).
fn number_to_date(n: f64) -> Option<NaiveDate> {
    if n.abs() >= 1e11 {
        DateTime::from_timestamp_millis(n as i64).map(|dt| dt.date_naive())
    } else {
        serial_to_date(n)
    }
}

fn timestamp_to_date(value: i64, unit: &TimeUnit) -> Option<NaiveDate> {
    let dt = match unit {
        TimeUnit::Second => DateTime::from_timestamp(value, 0),
        TimeUnit::Millisecond => DateTime::from_timestamp_millis(value),
        TimeUnit::Microsecond => DateTime::from_timestamp_micros(value),
        TimeUnit::Nanosecond => DateTime::from_timestamp(
            value.div_euclid(1_000_000_000),
            value.rem_euclid(1_000_000_000) as u32,
        ),
    };
    dt.map(|dt| dt.date_naive())
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

/// First worksheet of an Excel / OpenDocument workbook; the first row
/// holds the column names.
fn load_spreadsheet(path: &Path) -> Result<ArticleTable> {
    let mut workbook = open_workbook_auto(path).context("opening spreadsheet")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("Spreadsheet contains no worksheet")?
        .context("reading first worksheet")?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .context("Worksheet has no header row")?
        .iter()
        .map(|c| c.to_string())
        .collect();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut articles = Vec::with_capacity(range.height().saturating_sub(1));
    for (row_no, row) in rows.enumerate() {
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        let cells: Vec<Cell> = row.iter().map(spreadsheet_cell).collect();
        articles.push(columns.article(row_no, &cells)?);
    }

    Ok(ArticleTable::new(articles))
}

fn spreadsheet_cell(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::text(s),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => Cell::date_or_number(dt.as_f64()),
        Data::DateTimeIso(s) => parse_date(s).map(Cell::Date).unwrap_or_else(|| Cell::text(s)),
        // #N/A and friends count as missing, like an empty cell.
        Data::Error(_) | Data::Empty => Cell::Empty,
        other => Cell::text(&other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "date": "2024-01-01",
///     "text": "Teaser",
///     "fulltext": "Body",
///     "haha": 3, "like": 120, ..., "comments_num": null
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<ArticleTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    // Column set is the union of all record keys; absent keys are empty cells.
    let headers: Vec<String> = records
        .iter()
        .filter_map(|r| r.as_object())
        .flat_map(|obj| obj.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut articles = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let cells: Vec<Cell> = headers
            .iter()
            .enumerate()
            .map(|(idx, h)| {
                obj.get(h)
                    .map(|v| json_cell(v, columns.is_text(idx)))
                    .unwrap_or(Cell::Empty)
            })
            .collect();
        articles.push(columns.article(i, &cells)?);
    }

    Ok(ArticleTable::new(articles))
}

/// Numbers in a text column keep their JSON spelling.
fn json_cell(val: &JsonValue, text_column: bool) -> Cell {
    match val {
        JsonValue::String(s) => Cell::text(s),
        JsonValue::Number(n) if text_column => Cell::Text(n.to_string()),
        JsonValue::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
        JsonValue::Null => Cell::Empty,
        other => Cell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one article per record.
fn load_csv(path: &Path) -> Result<ArticleTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut articles = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let cells: Vec<Cell> = record
            .iter()
            .enumerate()
            .map(|(idx, s)| {
                if columns.is_text(idx) {
                    Cell::text(s)
                } else {
                    guess_cell(s)
                }
            })
            .collect();
        articles.push(columns.article(row_no, &cells)?);
    }

    Ok(ArticleTable::new(articles))
}

/// Metric and date cells: numbers where they parse, text otherwise.
fn guess_cell(s: &str) -> Cell {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Cell::Empty;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Cell::Number(v),
        _ => Cell::Text(s.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one column per field.
///
/// Text columns are Utf8/LargeUtf8, metric columns any integer or float
/// type, and `date` may be Date32/Date64, a timestamp, or a string.
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<ArticleTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut articles = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        let headers: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        let columns = ColumnMap::from_headers(&headers)?;

        for row in 0..batch.num_rows() {
            let row_no = articles.len();
            let cells = batch
                .columns()
                .iter()
                .map(|col| arrow_cell(col, row))
                .collect::<Result<Vec<Cell>>>()
                .with_context(|| format!("Row {row_no}"))?;
            articles.push(columns.article(row_no, &cells)?);
        }
    }

    Ok(ArticleTable::new(articles))
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &ArrayRef, row: usize) -> Result<Cell> {
    if col.is_null(row) {
        return Ok(Cell::Empty);
    }
    let cell = match col.data_type() {
        DataType::Utf8 => Cell::text(col.as_string::<i32>().value(row)),
        DataType::LargeUtf8 => Cell::text(col.as_string::<i64>().value(row)),
        DataType::Int16 => Cell::Number(col.as_primitive::<Int16Type>().value(row) as f64),
        DataType::Int32 => Cell::Number(col.as_primitive::<Int32Type>().value(row) as f64),
        DataType::Int64 => Cell::Number(col.as_primitive::<Int64Type>().value(row) as f64),
        DataType::UInt32 => Cell::Number(col.as_primitive::<UInt32Type>().value(row) as f64),
        DataType::UInt64 => Cell::Number(col.as_primitive::<UInt64Type>().value(row) as f64),
        DataType::Float32 => Cell::Number(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => Cell::Number(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => Cell::Text(col.as_boolean().value(row).to_string()),
        DataType::Date32 => {
            let days = col.as_primitive::<Date32Type>().value(row) as i64;
            date_cell(timestamp_to_date(days * 86_400, &TimeUnit::Second))?
        }
        DataType::Date64 => {
            let millis = col.as_primitive::<Date64Type>().value(row);
            date_cell(timestamp_to_date(millis, &TimeUnit::Millisecond))?
        }
        DataType::Timestamp(unit, _) => {
            let value = match unit {
                TimeUnit::Second => col.as_primitive::<TimestampSecondType>().value(row),
                TimeUnit::Millisecond => col.as_primitive::<TimestampMillisecondType>().value(row),
                TimeUnit::Microsecond => col.as_primitive::<TimestampMicrosecondType>().value(row),
                TimeUnit::Nanosecond => col.as_primitive::<TimestampNanosecondType>().value(row),
            };
            date_cell(timestamp_to_date(value, unit))?
        }
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(cell)
}

fn date_cell(date: Option<NaiveDate>) -> Result<Cell> {
    date.map(Cell::Date).context("date out of range")
}
