use async_trait::async_trait;
use tracing::debug;

use jobwatch_common::{JobWatchError, PostingRecord};
use sheets_client::SheetsClient;

use super::backend::PostingStore;

/// Appends records as rows of a Google Sheets worksheet.
pub struct SheetsStore {
    client: SheetsClient,
    worksheet: String,
}

impl SheetsStore {
    pub fn new(client: SheetsClient, worksheet: impl Into<String>) -> Self {
        Self {
            client,
            worksheet: worksheet.into(),
        }
    }

    pub fn from_credentials(
        credentials_json: &str,
        spreadsheet_id: &str,
        worksheet: &str,
    ) -> Result<Self, JobWatchError> {
        let client = SheetsClient::from_credentials_json(credentials_json, spreadsheet_id)
            .map_err(|e| JobWatchError::Config(format!("Google Sheets client: {e}")))?;
        Ok(Self::new(client, worksheet))
    }
}

#[async_trait]
impl PostingStore for SheetsStore {
    async fn append(&self, record: &PostingRecord) -> Result<(), JobWatchError> {
        self.client
            .append_row(&self.worksheet, &record.to_row())
            .await
            .map_err(|e| JobWatchError::Write(format!("sheet {:?}: {e}", self.worksheet)))?;
        debug!(worksheet = %self.worksheet, link = %record.link, "Record appended to sheet");
        Ok(())
    }

    fn name(&self) -> &str {
        "sheets"
    }
}
