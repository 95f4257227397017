use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, SheetsError};

/// A single spreadsheet row, cells in column order.
pub type Row = Vec<Value>;

/// Days between the spreadsheet epoch (1899-12-30) and the Unix epoch.
const SERIAL_EPOCH_OFFSET_DAYS: f64 = 25_569.0;
const SECS_IN_DAY: i64 = 24 * 60 * 60;

/// A trader allowed to log in, as stored in the `Users` sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
  pub username: String,
  /// Plaintext or SHA-256 hex, depending on the configured password scheme.
  pub password: String,
}

impl User {
  pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
    Self {
      username: username.into(),
      password: password.into(),
    }
  }

  /// Map a `[username, password]` row.
  pub fn from_row(index: usize, row: &[Value]) -> Result<Self> {
    let username = required_cell("Users", index, row, 0)?;
    let password = required_cell("Users", index, row, 1)?;
    Ok(Self { username, password })
  }
}

/// Current unit balance of a trader, as stored in the `Units` sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Units {
  pub username: String,
  pub units: i64,
}

impl Units {
  pub fn new(username: impl Into<String>, units: i64) -> Self {
    Self {
      username: username.into(),
      units,
    }
  }

  /// Map a `[username, units]` row. A blank balance counts as zero.
  pub fn from_row(index: usize, row: &[Value]) -> Result<Self> {
    let username = required_cell("Units", index, row, 0)?;
    let units = match row.get(1) {
      None => 0,
      Some(Value::Number(n)) => n
        .as_i64()
        .or_else(|| n.as_f64().map(|f| f as i64))
        .ok_or_else(|| malformed("Units", index, format!("bad unit count {n}")))?,
      Some(Value::String(s)) if s.trim().is_empty() => 0,
      Some(Value::String(s)) => s
        .trim()
        .replace(',', "")
        .parse()
        .map_err(|_| malformed("Units", index, format!("bad unit count {s:?}")))?,
      Some(other) => return Err(malformed("Units", index, format!("bad unit count {other}"))),
    };
    Ok(Self { username, units })
  }
}

/// How the Sheets API interprets appended values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueInputOption {
  #[default]
  UserEntered,
  Raw,
}

impl ValueInputOption {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::UserEntered => "USER_ENTERED",
      Self::Raw => "RAW",
    }
  }
}

/// Whether appended rows overwrite empty cells or insert new rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertDataOption {
  #[default]
  Overwrite,
  InsertRows,
}

impl InsertDataOption {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Overwrite => "OVERWRITE",
      Self::InsertRows => "INSERT_ROWS",
    }
  }
}

/// Result of an append call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppendOutcome {
  pub updated_range: Option<String>,
  pub updated_rows: u64,
}

/// Result of a clear call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearOutcome {
  pub cleared_range: Option<String>,
}

/// Body of an append request.
#[derive(Debug, Serialize)]
pub(crate) struct ValueRangeBody<'a> {
  pub values: &'a [Row],
}

/// Spreadsheet serial date for a Unix timestamp: whole days since
/// 1899-12-30 plus the elapsed fraction of the day.
pub fn serial_date(unix_secs: i64) -> f64 {
  let days = unix_secs.div_euclid(SECS_IN_DAY) as f64;
  let secs_of_day = unix_secs.rem_euclid(SECS_IN_DAY) as f64;
  SERIAL_EPOCH_OFFSET_DAYS + days + secs_of_day / SECS_IN_DAY as f64
}

/// Render a cell as text. Sheets returns formatted values as strings, but
/// numbers and booleans show up for unformatted reads.
pub fn cell_text(cell: &Value) -> Option<String> {
  match cell {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

fn required_cell(dataset: &'static str, index: usize, row: &[Value], col: usize) -> Result<String> {
  row
    .get(col)
    .and_then(cell_text)
    .ok_or_else(|| malformed(dataset, index, format!("missing column {col}")))
}

fn malformed(dataset: &'static str, index: usize, reason: String) -> SheetsError {
  SheetsError::MalformedRow {
    dataset,
    index,
    reason,
  }
}
