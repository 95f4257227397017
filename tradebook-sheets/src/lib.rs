pub mod cache;
mod error;
mod models;

pub use cache::{Dataset, DatasetCache, ServiceCache};
pub use error::{Result, SheetsError};
pub use models::{
  AppendOutcome, ClearOutcome, InsertDataOption, Row, Units, User, ValueInputOption, cell_text,
  serial_date,
};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use models::ValueRangeBody;

/// Public endpoint of the Google Sheets API.
pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";

/// Value-level operations against a remote spreadsheet.
#[async_trait]
pub trait SpreadsheetClient: Send + Sync {
  /// Read every row in `range`. An empty range yields no rows.
  async fn query(&self, sheet_id: &str, range: &str) -> Result<Vec<Row>>;

  /// Append `rows` after the last table row found in `range`.
  async fn append(
    &self,
    sheet_id: &str,
    range: &str,
    rows: Vec<Row>,
    input: ValueInputOption,
    insert: InsertDataOption,
  ) -> Result<AppendOutcome>;

  /// Clear all values in `range`, keeping formatting.
  async fn clear(&self, sheet_id: &str, range: &str) -> Result<ClearOutcome>;
}

/// Load the `Users` dataset from `range`.
pub async fn load_users(
  client: &dyn SpreadsheetClient,
  sheet_id: &str,
  range: &str,
) -> Result<Vec<User>> {
  let rows = client.query(sheet_id, range).await?;
  rows
    .iter()
    .enumerate()
    .filter(|(_, row)| !row.is_empty())
    .map(|(index, row)| User::from_row(index, row))
    .collect()
}

/// Load the `Units` dataset from `range`.
pub async fn load_units(
  client: &dyn SpreadsheetClient,
  sheet_id: &str,
  range: &str,
) -> Result<Vec<Units>> {
  let rows = client.query(sheet_id, range).await?;
  rows
    .iter()
    .enumerate()
    .filter(|(_, row)| !row.is_empty())
    .map(|(index, row)| Units::from_row(index, row))
    .collect()
}

// ============================================================================
// Google Sheets REST client
// ============================================================================

#[derive(Debug, Deserialize)]
struct ValueRange {
  #[serde(default)]
  values: Option<Vec<Row>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendValuesResponse {
  #[serde(default)]
  updates: Option<UpdateValuesResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateValuesResponse {
  #[serde(default)]
  updated_range: Option<String>,
  #[serde(default)]
  updated_rows: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClearValuesResponse {
  #[serde(default)]
  cleared_range: Option<String>,
}

/// Sheets v4 client authenticating with a bearer access token.
#[derive(Clone)]
pub struct GoogleSheetsClient {
  http: reqwest::Client,
  base_url: Url,
  access_token: String,
}

impl GoogleSheetsClient {
  pub fn new(
    base_url: &str,
    access_token: impl Into<String>,
    timeout: Duration,
  ) -> Result<Self> {
    let http = reqwest::Client::builder().timeout(timeout).build()?;
    let base_url =
      Url::parse(base_url).map_err(|e| SheetsError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
    Ok(Self {
      http,
      base_url,
      access_token: access_token.into(),
    })
  }

  /// `{base}/v4/spreadsheets/{id}/values/{range}{suffix}`, each part encoded
  /// as a single path segment.
  fn values_url(&self, sheet_id: &str, range: &str, suffix: &str) -> Url {
    let mut url = self.base_url.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
      segments
        .pop_if_empty()
        .extend(["v4", "spreadsheets", sheet_id, "values"])
        .push(&format!("{range}{suffix}"));
    }
    url
  }

  async fn send<T: DeserializeOwned>(
    &self,
    request: reqwest::RequestBuilder,
    operation: &'static str,
  ) -> Result<T> {
    let response = request.bearer_auth(&self.access_token).send().await?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(SheetsError::Status {
        status: status.as_u16(),
        body,
      });
    }

    response
      .json::<Option<T>>()
      .await?
      .ok_or(SheetsError::NullResponse(operation))
  }
}

#[async_trait]
impl SpreadsheetClient for GoogleSheetsClient {
  async fn query(&self, sheet_id: &str, range: &str) -> Result<Vec<Row>> {
    let url = self.values_url(sheet_id, range, "");
    let value_range: ValueRange = self.send(self.http.get(url), "get").await?;
    let rows = value_range.values.unwrap_or_default();
    debug!(%range, rows = rows.len(), "queried sheet");
    Ok(rows)
  }

  async fn append(
    &self,
    sheet_id: &str,
    range: &str,
    rows: Vec<Row>,
    input: ValueInputOption,
    insert: InsertDataOption,
  ) -> Result<AppendOutcome> {
    let url = self.values_url(sheet_id, range, ":append");
    let request = self
      .http
      .post(url)
      .query(&[
        ("valueInputOption", input.as_str()),
        ("insertDataOption", insert.as_str()),
      ])
      .json(&ValueRangeBody { values: &rows });

    let response: AppendValuesResponse = self.send(request, "append").await?;
    let updates = response.updates;
    let outcome = AppendOutcome {
      updated_range: updates.as_ref().and_then(|u| u.updated_range.clone()),
      updated_rows: updates.and_then(|u| u.updated_rows).unwrap_or(0),
    };
    debug!(%range, rows = outcome.updated_rows, "appended to sheet");
    Ok(outcome)
  }

  async fn clear(&self, sheet_id: &str, range: &str) -> Result<ClearOutcome> {
    let url = self.values_url(sheet_id, range, ":clear");
    let response: ClearValuesResponse = self
      .send(self.http.post(url).json(&json!({})), "clear")
      .await?;
    debug!(%range, "cleared sheet range");
    Ok(ClearOutcome {
      cleared_range: response.cleared_range,
    })
  }
}
