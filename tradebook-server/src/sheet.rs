use std::sync::Arc;

use serde_json::json;
use tracing::info;
use tradebook_sheets::{
    AppendOutcome, ClearOutcome, Dataset, InsertDataOption, ServiceCache, SheetsError,
    SpreadsheetClient, Units, User, ValueInputOption, load_units, load_users, serial_date,
};

/// Where each dataset lives in the spreadsheet.
#[derive(Debug, Clone)]
pub struct SheetLayout {
    pub spreadsheet_id: String,
    pub users_range: String,
    pub units_range: String,
    pub trades_range: String,
}

impl From<&crate::config::Config> for SheetLayout {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            spreadsheet_id: config.spreadsheet_id.clone(),
            users_range: config.users_range.clone(),
            units_range: config.units_range.clone(),
            trades_range: config.trades_range.clone(),
        }
    }
}

/// The trading spreadsheet: cached datasets plus the trade log.
pub struct TradingSheet {
    client: Arc<dyn SpreadsheetClient>,
    cache: ServiceCache,
    layout: SheetLayout,
}

impl TradingSheet {
    pub fn new(client: Arc<dyn SpreadsheetClient>, layout: SheetLayout) -> Self {
        Self {
            client,
            cache: ServiceCache::new(),
            layout,
        }
    }

    pub async fn users(&self) -> Result<Arc<Vec<User>>, SheetsError> {
        self.cache.users(|| self.fetch_users()).await
    }

    pub async fn refresh_users(&self) -> Result<Arc<Vec<User>>, SheetsError> {
        let users = self.cache.refresh_users(|| self.fetch_users()).await?;
        info!(count = users.len(), "refreshed users");
        Ok(users)
    }

    pub async fn units(&self) -> Result<Arc<Vec<Units>>, SheetsError> {
        self.cache.units(|| self.fetch_units()).await
    }

    pub async fn refresh_units(&self) -> Result<Arc<Vec<Units>>, SheetsError> {
        let units = self.cache.refresh_units(|| self.fetch_units()).await?;
        info!(count = units.len(), "refreshed units");
        Ok(units)
    }

    /// Balance for one trader, matched case-insensitively.
    pub async fn balance(&self, username: &str) -> Result<Option<i64>, SheetsError> {
        let units = self.units().await?;
        Ok(units
            .iter()
            .find(|u| crate::helpers::eq_ignore_case(&u.username, username))
            .map(|u| u.units))
    }

    /// Append `[serial_date, username, units]` to the trade log.
    pub async fn record_trade(
        &self,
        username: &str,
        units: i64,
        now: i64,
    ) -> Result<AppendOutcome, SheetsError> {
        let row = vec![json!(serial_date(now)), json!(username), json!(units)];
        let outcome = self
            .client
            .append(
                &self.layout.spreadsheet_id,
                &self.layout.trades_range,
                vec![row],
                ValueInputOption::UserEntered,
                InsertDataOption::InsertRows,
            )
            .await?;
        info!(%username, units, "recorded trade");
        Ok(outcome)
    }

    pub async fn clear_trades(&self) -> Result<ClearOutcome, SheetsError> {
        let outcome = self
            .client
            .clear(&self.layout.spreadsheet_id, &self.layout.trades_range)
            .await?;
        info!(range = %self.layout.trades_range, "cleared trades");
        Ok(outcome)
    }

    pub fn is_cached(&self, dataset: Dataset) -> bool {
        self.cache.is_populated(dataset)
    }

    async fn fetch_users(&self) -> Result<Vec<User>, SheetsError> {
        load_users(
            self.client.as_ref(),
            &self.layout.spreadsheet_id,
            &self.layout.users_range,
        )
        .await
    }

    async fn fetch_units(&self) -> Result<Vec<Units>, SheetsError> {
        load_units(
            self.client.as_ref(),
            &self.layout.spreadsheet_id,
            &self.layout.units_range,
        )
        .await
    }
}
