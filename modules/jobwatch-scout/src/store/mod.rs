pub mod backend;
pub mod csv;
pub mod multi;
pub mod noop;
pub mod sheets;

use std::sync::Arc;

use jobwatch_common::{Config, JobWatchError, StorageTarget};

pub use backend::PostingStore;
pub use csv::CsvStore;
pub use multi::MultiStore;
pub use noop::NoopStore;
pub use sheets::SheetsStore;

/// Build the store selected by `STORAGE_TARGET`.
pub fn from_config(config: &Config) -> Result<Arc<dyn PostingStore>, JobWatchError> {
    let sheets = || -> Result<Arc<dyn PostingStore>, JobWatchError> {
        let sheets = config.sheets.as_ref().ok_or_else(|| {
            JobWatchError::Config("Google Sheets settings are missing".to_string())
        })?;
        let store = SheetsStore::from_credentials(
            &sheets.credentials_json,
            &sheets.spreadsheet_id,
            &sheets.worksheet_name,
        )?;
        Ok(Arc::new(store))
    };

    let csv = || Arc::new(CsvStore::new(&config.csv_path)) as Arc<dyn PostingStore>;

    let store: Arc<dyn PostingStore> = match config.storage_target {
        StorageTarget::Csv => csv(),
        StorageTarget::Sheets => sheets()?,
        StorageTarget::Both => Arc::new(MultiStore::new(vec![csv(), sheets()?])),
    };
    Ok(store)
}
