pub mod auth;
pub mod error;

pub use auth::{ServiceAccountKey, TokenProvider};
pub use error::{Result, SheetsError};

use std::time::Duration;

use serde_json::json;
use tracing::debug;
use url::Url;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

pub struct SheetsClient {
    client: reqwest::Client,
    tokens: TokenProvider,
    spreadsheet_id: String,
}

impl SheetsClient {
    pub fn new(key: ServiceAccountKey, spreadsheet_id: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SheetsError::Network(e.to_string()))?;

        Ok(Self {
            client,
            tokens: TokenProvider::new(key)?,
            spreadsheet_id: spreadsheet_id.to_string(),
        })
    }

    /// Build a client straight from the contents of a key file.
    pub fn from_credentials_json(json: &str, spreadsheet_id: &str) -> Result<Self> {
        Self::new(ServiceAccountKey::from_json(json)?, spreadsheet_id)
    }

    /// Append one row after the last row of `range` (usually a worksheet name).
    pub async fn append_row(&self, range: &str, row: &[String]) -> Result<()> {
        let url = append_url(&self.spreadsheet_id, range)?;
        let token = self.tokens.access_token(&self.client).await?;

        debug!(range, cells = row.len(), "Appending row to spreadsheet");

        let resp = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "values": [row] }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SheetsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

fn append_url(spreadsheet_id: &str, range: &str) -> Result<Url> {
    let mut url = Url::parse(SHEETS_API_BASE).map_err(|e| SheetsError::Network(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| SheetsError::Network("sheets base URL cannot be a base".to_string()))?
        .push(spreadsheet_id)
        .push("values")
        .push(&format!("{range}:append"));
    // Scraped text is stored verbatim; a leading '=' must not become a formula.
    url.query_pairs_mut()
        .append_pair("valueInputOption", "RAW")
        .append_pair("insertDataOption", "INSERT_ROWS");
    Ok(url)
}
