//! Graph-space point import from CSV or JSON text
//!
//! Both formats yield `{x, y}` pairs. Any malformed row rejects the whole
//! file.

use serde_json::Value;
use std::path::Path;

use crate::transform::GraphPoint;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// CSV row; `row` is the 1-based line, `column` is 1 for X and 2 for Y
    #[error("Row {row}, column {column}: {detail}")]
    MalformedRow {
        row: usize,
        column: usize,
        detail: String,
    },
    /// JSON array element; `index` is 0-based
    #[error("Item {index}: {detail}")]
    MalformedItem { index: usize, detail: String },
    #[error("Invalid JSON format: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("JSON must contain an array of data points")]
    NotAnArray,
    #[error("Unsupported file format: .{0}. Please use .csv or .json")]
    UnsupportedFormat(String),
    #[error("Failed to read import file: {0}")]
    Io(#[from] std::io::Error),
}

/// Import file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Csv,
    Json,
}

impl ImportFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, ImportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Ok(ImportFormat::Csv),
            "json" => Ok(ImportFormat::Json),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse `X,Y` rows, skipping a header row if the first row is not numeric
pub fn parse_csv(content: &str) -> Result<Vec<GraphPoint>, ImportError> {
    let content = content.trim_start_matches('\u{feff}').trim();
    let lines: Vec<&str> = content.lines().collect();

    let has_header = lines.first().is_some_and(|first| {
        let mut cols = first.split(',');
        let x = cols.next().and_then(parse_number);
        let y = cols.next().and_then(parse_number);
        x.is_none() || y.is_none()
    });
    let start = usize::from(has_header);

    let mut points = Vec::with_capacity(lines.len());
    for (idx, line) in lines.iter().enumerate().skip(start) {
        let row = idx + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let cols: Vec<&str> = line.split(',').map(str::trim).collect();
        if cols.len() < 2 {
            return Err(ImportError::MalformedRow {
                row,
                column: 2,
                detail: "Expected at least 2 columns (X, Y)".to_string(),
            });
        }

        let x = parse_number(cols[0]).ok_or_else(|| ImportError::MalformedRow {
            row,
            column: 1,
            detail: format!("X value must be a number. Got: {:?}", cols[0]),
        })?;
        let y = parse_number(cols[1]).ok_or_else(|| ImportError::MalformedRow {
            row,
            column: 2,
            detail: format!("Y value must be a number. Got: {:?}", cols[1]),
        })?;

        points.push(GraphPoint::new(x, y));
    }

    Ok(points)
}

/// Numbers or numeric strings are accepted
fn json_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

/// Parse an array of `{x, y}` objects
pub fn parse_json(content: &str) -> Result<Vec<GraphPoint>, ImportError> {
    let data: Value = serde_json::from_str(content)?;
    let items = data.as_array().ok_or(ImportError::NotAnArray)?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let obj = item.as_object().ok_or_else(|| ImportError::MalformedItem {
                index,
                detail: "Expected an object with x and y properties".to_string(),
            })?;
            let x = json_number(obj.get("x")).ok_or_else(|| ImportError::MalformedItem {
                index,
                detail: format!("x must be a number. Got: {}", display_field(obj.get("x"))),
            })?;
            let y = json_number(obj.get("y")).ok_or_else(|| ImportError::MalformedItem {
                index,
                detail: format!("y must be a number. Got: {}", display_field(obj.get("y"))),
            })?;
            Ok(GraphPoint::new(x, y))
        })
        .collect()
}

fn display_field(value: Option<&Value>) -> String {
    value.map_or_else(|| "missing".to_string(), Value::to_string)
}

pub fn parse(content: &str, format: ImportFormat) -> Result<Vec<GraphPoint>, ImportError> {
    match format {
        ImportFormat::Csv => parse_csv(content),
        ImportFormat::Json => parse_json(content),
    }
}

/// Read and parse a `.csv` or `.json` file
pub fn parse_file(path: &Path) -> Result<Vec<GraphPoint>, ImportError> {
    let format = ImportFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    let points = parse(&content, format)?;
    tracing::info!("Parsed {} points from {:?}", points.len(), path);
    Ok(points)
}
